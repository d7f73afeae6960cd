//! User registration and login handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use centime_core::auth;
use centime_core::models::{BankAccount, NewUser, User};

/// Request body for registering a user
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    #[serde(default = "default_currency")]
    pub preferred_currency: String,
    /// Plain-text password provided during registration
    pub password: String,
}

fn default_currency() -> String {
    "CHF".to_string()
}

/// POST /api/users - Register a new user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<User>, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: CreateUserRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::bad_request("Invalid email address"));
    }

    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(AppError::bad_request("Email already registered"));
    }

    let password_hash = auth::hash_password(&req.password)
        .map_err(|_| AppError::internal("Failed to hash password"))?;

    let user = state.db.create_user(&NewUser {
        email: req.email,
        name: req.name,
        preferred_currency: req.preferred_currency,
        password_hash,
    })?;

    Ok(Json(user))
}

/// GET /api/users - List all users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = state.db.list_users()?;
    Ok(Json(users))
}

/// GET /api/users/:id/accounts - List a user's bank accounts
pub async fn list_user_accounts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<BankAccount>>, AppError> {
    state
        .db
        .get_user(id)?
        .ok_or_else(|| AppError::not_found(&format!("User {} not found", id)))?;

    let accounts = state.db.list_accounts_for_user(id)?;
    Ok(Json(accounts))
}

/// Request body for logging in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token issued on successful login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// POST /api/login - Verify credentials and issue a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<TokenResponse>, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: LoginRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let user = state.db.get_user_by_email(&req.email)?;
    let verified = match &user {
        Some(user) => auth::verify_password(&req.password, &user.password_hash)
            .map_err(|_| AppError::internal("Failed to verify password"))?,
        None => false,
    };

    if !verified {
        return Err(AppError::bad_request("Incorrect email or password"));
    }

    Ok(Json(TokenResponse {
        access_token: auth::issue_token(),
        token_type: "bearer".to_string(),
    }))
}
