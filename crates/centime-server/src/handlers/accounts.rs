//! Bank account handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse};
use centime_core::models::{BankAccount, NewBankAccount};

/// Request body for creating a bank account
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub user_id: i64,
    pub name: String,
    pub account_number: String,
    pub bank_name: String,
    #[serde(default)]
    pub invert_amounts: bool,
}

/// POST /api/accounts - Create a bank account
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<BankAccount>, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: CreateAccountRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    state
        .db
        .get_user(req.user_id)?
        .ok_or_else(|| AppError::not_found(&format!("User {} not found", req.user_id)))?;

    let account = state
        .db
        .create_account(&NewBankAccount {
            user_id: req.user_id,
            name: req.name,
            account_number: req.account_number,
            bank_name: req.bank_name,
            invert_amounts: req.invert_amounts,
        })
        .map_err(|e| match e {
            centime_core::Error::Database(_) => {
                AppError::bad_request("Account number already registered")
            }
            other => AppError::from(other),
        })?;

    Ok(Json(account))
}

/// GET /api/accounts/:id - Get a single account
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BankAccount>, AppError> {
    let account = state
        .db
        .get_account(id)?
        .ok_or_else(|| AppError::not_found(&format!("Account {} not found", id)))?;

    Ok(Json(account))
}

/// DELETE /api/accounts/:id - Delete an account and its transactions
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_account(id)? {
        return Err(AppError::not_found(&format!("Account {} not found", id)));
    }

    Ok(Json(SuccessResponse { success: true }))
}
