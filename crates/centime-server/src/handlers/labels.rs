//! Transaction label handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse};
use centime_core::models::Label;

/// Request body for attaching a label
#[derive(Debug, Deserialize)]
pub struct AddLabelRequest {
    pub name: String,
}

/// GET /api/transactions/:id/labels - List a transaction's labels
pub async fn list_labels(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Label>>, AppError> {
    state
        .db
        .get_transaction(id)?
        .ok_or_else(|| AppError::not_found(&format!("Transaction {} not found", id)))?;

    let labels = state.db.list_labels(id)?;
    Ok(Json(labels))
}

/// POST /api/transactions/:id/labels - Attach a label to a transaction
pub async fn add_label(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Label>, AppError> {
    state
        .db
        .get_transaction(id)?
        .ok_or_else(|| AppError::not_found(&format!("Transaction {} not found", id)))?;

    let bytes = axum::body::to_bytes(request.into_body(), 1024)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: AddLabelRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    if req.name.trim().is_empty() {
        return Err(AppError::bad_request("Label name must not be empty"));
    }

    let label = state.db.add_label(id, req.name.trim())?;
    Ok(Json(label))
}

/// DELETE /api/labels/:id - Remove a label
pub async fn delete_label(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_label(id)? {
        return Err(AppError::not_found(&format!("Label {} not found", id)));
    }

    Ok(Json(SuccessResponse { success: true }))
}
