//! Statement import handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{map_ingest_error, AppError, AppState, MAX_UPLOAD_SIZE};
use centime_core::ingest::{
    ingest_statement, FieldMapping, IngestOptions, MappingMode, RowError, RowShape,
};
use centime_core::models::Transaction;

/// Response for the import endpoints
#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub skipped: usize,
    /// The column mapping the rows were normalized with
    pub mapping: FieldMapping,
    pub transactions: Vec<Transaction>,
    /// Rows skipped due to value errors
    pub row_errors: Vec<RowError>,
}

/// POST /api/accounts/:id/import - Import transactions from a statement file
///
/// Expects multipart form with:
/// - file: statement file (required, max 10MB)
/// - strategy: mapping strategy, "default" or "infer" (optional)
/// - model: inference model override (optional)
pub async fn import_statement(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut strategy: Option<String> = None;
    let mut model_override: Option<String> = None;

    // Extract fields from multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
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
            "strategy" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read strategy"))?;
                if !value.is_empty() {
                    strategy = Some(value);
                }
            }
            "model" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read model"))?;
                if !value.is_empty() {
                    model_override = Some(value);
                }
            }
            _ => {}
        }
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("Missing file field"))?;

    let options = ImportRequestOptions {
        strategy,
        model: model_override,
        ..Default::default()
    };
    import_core(&state, account_id, file_data, options).await
}

/// Request body for the JSON import variant
#[derive(Debug, Default, Deserialize)]
pub struct ImportJsonRequest {
    /// Base64-encoded statement file content
    pub data: String,
    /// Mapping strategy, "default" or "infer"
    #[serde(default)]
    pub strategy: Option<String>,
    /// Inference model override
    #[serde(default)]
    pub model: Option<String>,
    /// Pad/truncate uneven rows instead of rejecting them
    #[serde(default)]
    pub lenient_rows: bool,
    /// Fail rows with non-numeric amounts instead of defaulting to 0
    #[serde(default)]
    pub strict_amounts: bool,
    /// Abort the whole upload on the first row error
    #[serde(default)]
    pub fail_fast: bool,
}

/// POST /api/accounts/:id/import/json - Import a statement via JSON body
///
/// Same pipeline as the multipart endpoint with the file transported as
/// base64; exposes the full option set and suits scripted clients and tests.
pub async fn import_statement_json(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<i64>,
    Json(req): Json<ImportJsonRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    use base64::Engine;

    let file_data = base64::engine::general_purpose::STANDARD
        .decode(&req.data)
        .map_err(|e| AppError::bad_request(&format!("Invalid base64 data: {}", e)))?;

    if file_data.len() > MAX_UPLOAD_SIZE {
        return Err(AppError::bad_request(&format!(
            "File too large. Maximum size is {} MB",
            MAX_UPLOAD_SIZE / 1024 / 1024
        )));
    }

    let options = ImportRequestOptions {
        strategy: req.strategy,
        model: req.model,
        lenient_rows: req.lenient_rows,
        strict_amounts: req.strict_amounts,
        fail_fast: req.fail_fast,
    };
    import_core(&state, account_id, file_data, options).await
}

/// Client-supplied import options, before validation
#[derive(Debug, Default)]
struct ImportRequestOptions {
    strategy: Option<String>,
    model: Option<String>,
    lenient_rows: bool,
    strict_amounts: bool,
    fail_fast: bool,
}

/// Core import logic shared by the multipart and JSON endpoints
async fn import_core(
    state: &AppState,
    account_id: i64,
    file_data: Vec<u8>,
    request: ImportRequestOptions,
) -> Result<Json<ImportResponse>, AppError> {
    let mode = match request.strategy.as_deref() {
        None | Some("default") => MappingMode::Default,
        Some("infer") => MappingMode::Infer,
        Some(other) => {
            return Err(AppError::bad_request(&format!(
                "Unknown mapping strategy: {}",
                other
            )))
        }
    };

    // Apply model override if specified
    let effective_ai = match (state.ai.as_ref(), request.model.as_deref()) {
        (Some(ai), Some(model)) => Some(ai.with_model(model)),
        (Some(ai), None) => Some(ai.clone()),
        _ => None,
    };

    let options = IngestOptions {
        mode,
        row_shape: if request.lenient_rows {
            RowShape::Lenient
        } else {
            RowShape::Strict
        },
        strict_amounts: request.strict_amounts,
        fail_fast: request.fail_fast,
        ..Default::default()
    };

    let report = ingest_statement(
        &state.db,
        effective_ai.as_ref(),
        account_id,
        &file_data,
        &options,
    )
    .await
    .map_err(map_ingest_error)?;

    info!(
        account_id,
        imported = report.created.len(),
        skipped = report.row_errors.len(),
        file_size = file_data.len(),
        "statement import complete"
    );

    Ok(Json(ImportResponse {
        imported: report.created.len(),
        skipped: report.row_errors.len(),
        mapping: report.mapping,
        transactions: report.created,
        row_errors: report.row_errors,
    }))
}
