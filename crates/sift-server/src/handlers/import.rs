//! Statement upload (preview) and bulk persistence handlers
//!
//! The upload endpoint runs the ingestion pipeline and returns a preview;
//! nothing is stored until the caller sends the reviewed transactions to
//! the bulk endpoint. Persisting row N failing never aborts row N+1: the
//! bulk response is an explicit partial result.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState, AuthUser, MAX_UPLOAD_SIZE};
use sift_core::ingest::{ingest, RejectionCounts};
use sift_core::models::{
    ColumnMapping, NewTransaction, ParsedTransaction, RoleOverrides, Transaction,
};
use sift_core::rules;

/// Response for the upload endpoint
#[derive(Serialize)]
pub struct UploadResponse {
    pub transactions: Vec<ParsedTransaction>,
    pub column_mapping: ColumnMapping,
    pub total_count: usize,
    pub rejected: RejectionCounts,
}

/// POST /api/transactions/upload - Run the ingestion pipeline on an upload
///
/// Expects multipart form with:
/// - file: CSV or spreadsheet statement (required, max 10MB)
/// - date_column / amount_column / description_column: manual overrides
///   (optional; used when auto-detection fails or picks wrong)
pub async fn upload_statement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename = String::new();
    let mut overrides = RoleOverrides::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read file data"))?;

                if bytes.len() > MAX_UPLOAD_SIZE {
                    return Err(AppError::bad_request(&format!(
                        "File too large. Maximum size is {} MB",
                        MAX_UPLOAD_SIZE / 1024 / 1024
                    )));
                }

                file_data = Some(bytes.to_vec());
            }
            "date_column" | "amount_column" | "description_column" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read column override"))?;
                let value = Some(value).filter(|v| !v.trim().is_empty());
                match name.as_str() {
                    "date_column" => overrides.date = value,
                    "amount_column" => overrides.amount = value,
                    _ => overrides.description = value,
                }
            }
            _ => {}
        }
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("No file provided"))?;

    let mut outcome = ingest(&file_data, &filename, &overrides)?;

    // Pre-fill category suggestions from the user's rules; the caller
    // decides what to persist.
    let user_rules = state.db.list_rules(user.id)?;
    rules::apply_suggestions(&mut outcome.transactions, &user_rules);

    info!(
        user = %user.username,
        file = %filename,
        parsed = outcome.transactions.len(),
        dropped = outcome.rejected.total(),
        "Processed statement upload"
    );

    Ok(Json(UploadResponse {
        total_count: outcome.transactions.len(),
        transactions: outcome.transactions,
        column_mapping: outcome.column_mapping,
        rejected: outcome.rejected,
    }))
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    pub transactions: Vec<NewTransaction>,
}

/// One failed row in a bulk create
#[derive(Serialize)]
pub struct BulkCreateError {
    pub index: usize,
    pub error: String,
}

/// Response for the bulk endpoint: successes plus per-row failures in one
/// value, never an all-or-nothing error.
#[derive(Serialize)]
pub struct BulkCreateResponse {
    pub created: usize,
    pub errors: Vec<BulkCreateError>,
    pub transactions: Vec<Transaction>,
}

/// POST /api/transactions/bulk - Persist a reviewed preview
pub async fn bulk_create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BulkCreateRequest>,
) -> Result<Json<BulkCreateResponse>, AppError> {
    if req.transactions.is_empty() {
        return Err(AppError::bad_request("No transactions provided"));
    }

    let mut created = Vec::new();
    let mut errors = Vec::new();

    for (index, tx) in req.transactions.iter().enumerate() {
        match state.db.insert_transaction(user.id, tx) {
            Ok(stored) => created.push(stored),
            Err(e) => errors.push(BulkCreateError {
                index,
                error: e.to_string(),
            }),
        }
    }

    info!(
        user = %user.username,
        created = created.len(),
        failed = errors.len(),
        "Bulk create complete"
    );

    Ok(Json(BulkCreateResponse {
        created: created.len(),
        errors,
        transactions: created,
    }))
}
