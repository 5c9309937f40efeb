//! Category rule handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, AuthUser, SuccessResponse};
use sift_core::models::CategoryRule;

/// GET /api/rules - The user's rules in matching order
pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CategoryRule>>, AppError> {
    let rules = state.db.list_rules(user.id)?;
    Ok(Json(rules))
}

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub keyword: String,
    pub category_id: i64,
    #[serde(default)]
    pub priority: i32,
}

/// POST /api/rules - Create or update the rule for this keyword
pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<Json<CategoryRule>, AppError> {
    if state
        .db
        .get_visible_category(req.category_id, user.id)?
        .is_none()
    {
        return Err(AppError::not_found("Category not found"));
    }

    let rule = state
        .db
        .upsert_rule(user.id, &req.keyword, req.category_id, req.priority)?;
    Ok(Json(rule))
}

/// DELETE /api/rules/:id
pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_rule(id, user.id)?;
    Ok(Json(SuccessResponse { success: true }))
}
