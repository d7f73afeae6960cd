//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse, MAX_PAGE_LIMIT};
use centime_core::models::{NewTransaction, Transaction};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    pub account_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/transactions - List transactions, optionally for one account
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let limit = query.limit.unwrap_or(100).clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let transactions = state
        .db
        .list_transactions(query.account_id, limit, offset)?;

    Ok(Json(transactions))
}

/// Request body for manually creating a transaction
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub account_id: i64,
    /// "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD"
    pub date: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recipient: String,
}

/// POST /api/transactions - Manually create a transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Transaction>, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 64)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: CreateTransactionRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    state
        .db
        .get_account(req.account_id)?
        .ok_or_else(|| AppError::not_found(&format!("Account {} not found", req.account_id)))?;

    let date = parse_request_date(&req.date)
        .ok_or_else(|| AppError::bad_request(&format!("Invalid date: {}", req.date)))?;

    let transaction = state.db.create_transaction(
        req.account_id,
        &NewTransaction {
            date,
            amount: req.amount,
            currency: req.currency,
            description: req.description,
            recipient: req.recipient,
            raw_data: None,
        },
    )?;

    Ok(Json(transaction))
}

/// DELETE /api/transactions/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_transaction(id)? {
        return Err(AppError::not_found(&format!(
            "Transaction {} not found",
            id
        )));
    }

    Ok(Json(SuccessResponse { success: true }))
}

fn parse_request_date(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
