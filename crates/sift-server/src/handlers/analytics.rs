//! Analytics handlers: summary, category breakdown, monthly trends

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::{AppError, AppState, AuthUser};
use sift_core::models::{CategorySpending, Direction, MonthlyTotal, Summary};

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// GET /api/analytics/summary - Income/expense totals for a period
///
/// Defaults to the current month when no range is given.
pub async fn analytics_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<Summary>, AppError> {
    let today = Utc::now().date_naive();
    let end = params.end_date.unwrap_or(today);
    let start = params
        .start_date
        .unwrap_or_else(|| end.with_day(1).unwrap_or(end));

    let summary = state.db.summary(user.id, start, end)?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct ByCategoryParams {
    /// "DEBIT" (default) or "CREDIT"
    #[serde(rename = "type")]
    pub direction: Option<String>,
}

/// GET /api/analytics/by-category - Spending breakdown by category
pub async fn analytics_by_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ByCategoryParams>,
) -> Result<Json<Vec<CategorySpending>>, AppError> {
    let direction = match params.direction.as_deref() {
        Some(raw) => raw
            .parse::<Direction>()
            .map_err(|e| AppError::bad_request(&e))?,
        None => Direction::Debit,
    };

    let breakdown = state.db.spending_by_category(user.id, direction)?;
    Ok(Json(breakdown))
}

#[derive(Debug, Deserialize)]
pub struct ByMonthParams {
    pub months: Option<i64>,
}

/// GET /api/analytics/by-month - Monthly trends per direction
pub async fn analytics_by_month(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ByMonthParams>,
) -> Result<Json<Vec<MonthlyTotal>>, AppError> {
    let months = params.months.unwrap_or(6).clamp(1, 120);
    let trends = state.db.monthly_trends(user.id, months)?;
    Ok(Json(trends))
}
