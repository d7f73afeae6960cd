//! Centime Web Server
//!
//! Axum-based REST API for the Centime personal finance tracker.
//!
//! - User registration, login, bank account and transaction management
//! - Statement upload endpoints driving the ingestion pipeline
//! - Restrictive CORS policy, security headers, input size limits
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info};

use centime_core::ai::{AiBackend, AiClient};
use centime_core::db::Database;
use centime_core::error::Error as CoreError;

mod handlers;

/// Maximum statement upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    /// Inference backend for AI-assisted column mapping, if configured
    pub ai: Option<AiClient>,
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let ai = AiClient::from_env();
    match ai {
        Some(ref client) => {
            info!(
                "Inference backend configured: {} (model: {})",
                client.host(),
                client.model()
            );
        }
        None => {
            info!("Inference backend not configured (set OLLAMA_HOST to enable AI mapping)");
        }
    }
    create_router_with_ai(db, config, ai)
}

/// Create the application router with an explicit AI client (for testing)
pub fn create_router_with_ai(db: Database, config: ServerConfig, ai: Option<AiClient>) -> Router {
    let state = Arc::new(AppState { db, ai });

    let api_routes = Router::new()
        // Users
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/users/:id/accounts", get(handlers::list_user_accounts))
        .route("/login", post(handlers::login))
        // Accounts
        .route("/accounts", post(handlers::create_account))
        .route(
            "/accounts/:id",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        // Statement import
        .route("/accounts/:id/import", post(handlers::import_statement))
        .route(
            "/accounts/:id/import/json",
            post(handlers::import_statement_json),
        )
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/:id", axum::routing::delete(handlers::delete_transaction))
        // Labels
        .route(
            "/transactions/:id/labels",
            get(handlers::list_labels).post(handlers::add_label),
        )
        .route("/labels/:id", axum::routing::delete(handlers::delete_label));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_ai_connection().await;

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log inference backend connection status
async fn check_ai_connection() {
    match AiClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "Inference backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                tracing::warn!(
                    "Inference backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("Inference backend not configured (set OLLAMA_HOST to enable AI mapping)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

/// Map an ingestion error to its client-facing status category
///
/// Structural and input errors are the client's problem and carry their
/// descriptive message; infrastructure errors stay sanitized.
pub(crate) fn map_ingest_error(err: CoreError) -> AppError {
    match err {
        CoreError::NotFound(_) => AppError::not_found(&err.to_string()),
        CoreError::EmptyInput
        | CoreError::MalformedRow { .. }
        | CoreError::MappingInference(_)
        | CoreError::MissingRequiredFields(_)
        | CoreError::AmountParse(_)
        | CoreError::InvalidData(_)
        | CoreError::Csv(_) => AppError::bad_request(&err.to_string()),
        other => AppError::from(other),
    }
}
