//! Authentication handlers: registration, login, and profile

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState, AuthUser, SuccessResponse};
use sift_core::models::User;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// POST /api/auth/register - Create an account and issue a session token
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.db.create_user(&req.username, &req.email, &req.password)?;
    let token = state.db.create_session(user.id)?;

    info!(user = %user.username, "Registered new user");

    Ok(Json(AuthResponse { user, token }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/login - Verify credentials and issue a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.db.authenticate(&req.username, &req.password)?;
    let token = state.db.create_session(user.id)?;

    Ok(Json(AuthResponse { user, token }))
}

/// POST /api/auth/logout - Revoke the presented session token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    if let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
    {
        state.db.delete_session(token.trim())?;
    }
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/auth/me - The authenticated user's profile
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    let user = state
        .db
        .get_user(user.id)?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub email: String,
}

/// PATCH /api/auth/me - Update the authenticated user's profile
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateMeRequest>,
) -> Result<Json<User>, AppError> {
    let user = state.db.update_user_email(user.id, &req.email)?;
    Ok(Json(user))
}
