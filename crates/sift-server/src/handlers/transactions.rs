//! Transaction CRUD and category-assignment handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState, AuthUser, SuccessResponse, MAX_PAGE_LIMIT};
use sift_core::db::TransactionQuery;
use sift_core::models::{Direction, NewTransaction, Transaction};
use sift_core::rules;

#[derive(Debug, Deserialize)]
pub struct ListTransactionsParams {
    /// Filter by direction ("DEBIT", "CREDIT", "NEUTRAL")
    #[serde(rename = "type")]
    pub direction: Option<String>,
    pub category: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/transactions - List with optional filters
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListTransactionsParams>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let direction = match params.direction.as_deref() {
        Some(raw) => Some(
            raw.parse::<Direction>()
                .map_err(|e| AppError::bad_request(&e))?,
        ),
        None => None,
    };

    let query = TransactionQuery {
        direction,
        category_id: params.category,
        start_date: params.start_date,
        end_date: params.end_date,
        limit: params.limit.unwrap_or(100).clamp(1, MAX_PAGE_LIMIT),
        offset: params.offset.unwrap_or(0).max(0),
    };

    let transactions = state.db.list_transactions(user.id, &query)?;
    Ok(Json(transactions))
}

/// POST /api/transactions - Create a single transaction manually
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    let tx = state.db.insert_transaction(user.id, &req)?;
    Ok(Json(tx))
}

/// GET /api/transactions/:id
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    let tx = state
        .db
        .get_transaction(id, user.id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    Ok(Json(tx))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub direction: Option<Direction>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// PATCH /api/transactions/:id - Partial update
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, AppError> {
    let tx = state.db.update_transaction(
        id,
        user.id,
        req.date,
        req.amount,
        req.direction,
        req.description.as_deref(),
        req.notes.as_deref(),
    )?;
    Ok(Json(tx))
}

/// DELETE /api/transactions/:id
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_transaction(id, user.id)?;
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub category_id: i64,
    /// Derive a keyword rule from this transaction and backfill other
    /// uncategorized transactions that match it
    #[serde(default = "default_create_rule")]
    pub create_rule: bool,
}

fn default_create_rule() -> bool {
    true
}

#[derive(Serialize)]
pub struct UpdateCategoryResponse {
    pub transaction: Transaction,
    /// Keyword of the rule that was created or updated, when create_rule
    pub rule_keyword: Option<String>,
    /// How many other uncategorized transactions the rule was applied to
    pub backfilled: usize,
}

/// PATCH /api/transactions/:id/category - Assign a category
///
/// With `create_rule` (the default), a keyword derived from this
/// transaction's description is upserted as a rule and re-applied to every
/// other currently-uncategorized transaction that contains it.
pub async fn update_transaction_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<UpdateCategoryResponse>, AppError> {
    let transaction = state
        .db
        .set_transaction_category(id, user.id, Some(req.category_id))?;

    let mut rule_keyword = None;
    let mut backfilled = 0;

    if req.create_rule {
        let keyword = rules::derive_keyword(&transaction.description);
        if !keyword.is_empty() {
            state.db.upsert_rule(user.id, &keyword, req.category_id, 0)?;
            backfilled = state
                .db
                .apply_rule_to_uncategorized(user.id, &keyword, req.category_id)?;
            info!(
                keyword = %keyword,
                backfilled,
                "Created category rule from assignment"
            );
            rule_keyword = Some(keyword);
        }
    }

    Ok(Json(UpdateCategoryResponse {
        transaction,
        rule_keyword,
        backfilled,
    }))
}
