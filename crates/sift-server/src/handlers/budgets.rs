//! Budget CRUD handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{AppError, AppState, AuthUser, SuccessResponse};
use sift_core::models::Budget;

/// GET /api/budgets
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Budget>>, AppError> {
    let budgets = state.db.list_budgets(user.id)?;
    Ok(Json(budgets))
}

/// GET /api/budgets/:id
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Budget>, AppError> {
    let budget = state
        .db
        .get_budget(id, user.id)?
        .ok_or_else(|| AppError::not_found("Budget not found"))?;
    Ok(Json(budget))
}

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    pub category_id: i64,
    pub amount: Decimal,
    /// Any day within the month; snapped to the first
    pub month: NaiveDate,
}

/// POST /api/budgets
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateBudgetRequest>,
) -> Result<Json<Budget>, AppError> {
    let budget = state
        .db
        .create_budget(user.id, req.category_id, req.amount, req.month)?;
    Ok(Json(budget))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    pub amount: Decimal,
}

/// PATCH /api/budgets/:id
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBudgetRequest>,
) -> Result<Json<Budget>, AppError> {
    let budget = state.db.update_budget(id, user.id, req.amount)?;
    Ok(Json(budget))
}

/// DELETE /api/budgets/:id
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_budget(id, user.id)?;
    Ok(Json(SuccessResponse { success: true }))
}
