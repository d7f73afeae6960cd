//! Statement ingestion pipeline
//!
//! Turns a raw bank statement export into persisted transactions:
//!
//! ```text
//! bytes -> reader -> (headers, rows) -> mapper -> mapping
//!       -> normalizer (mapping x rows) -> transactions -> storage
//! ```
//!
//! Structural problems (missing account, empty file, unresolvable mapping)
//! abort the whole upload. Value problems in individual rows are isolated:
//! the row is skipped and reported, unless fail-fast is requested. Rows are
//! processed and persisted in source order, and previously created rows are
//! not rolled back when a later row fails.

mod mapper;
mod normalize;
mod reader;
mod sniff;

pub use mapper::{
    resolve_mapping, DefaultStrategy, FieldMapping, InferenceStrategy, MappingStrategy,
    DEFAULT_SAMPLE_SIZE, REQUIRED_FIELDS, TARGET_FIELDS,
};
pub use normalize::{NormalizerConfig, RowNormalizer, FALLBACK_CURRENCY};
pub use reader::{read_table, RawTable, RowShape};
pub use sniff::{sniff_delimiter, SNIFF_SAMPLE_LEN};

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::ai::AiClient;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::Transaction;

/// How the column mapping is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingMode {
    /// Exact-name heuristic, no external calls
    #[default]
    Default,
    /// Ask the configured inference backend
    Infer,
}

/// Ingestion policy knobs
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub mode: MappingMode,
    pub row_shape: RowShape,
    /// Non-numeric amount cells fail the row instead of defaulting to 0
    pub strict_amounts: bool,
    /// Abort the whole upload on the first row error
    pub fail_fast: bool,
    /// Reuse the account's stored mapping when it fits the upload's layout
    pub reuse_stored_mapping: bool,
    /// Rows sampled into the inference prompt
    pub sample_size: usize,
    /// Override for the per-run processing timestamp (date fallback).
    /// Defaults to the current time when unset.
    pub processed_at: Option<NaiveDateTime>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            mode: MappingMode::Default,
            row_shape: RowShape::Strict,
            strict_amounts: false,
            fail_fast: false,
            reuse_stored_mapping: true,
            sample_size: DEFAULT_SAMPLE_SIZE,
            processed_at: None,
        }
    }
}

/// A row that failed normalization and was skipped
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    /// 1-based line number in the source file, counting the header row
    pub row: usize,
    pub message: String,
}

/// Outcome of one statement upload
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Created transactions, in source-row order
    pub created: Vec<Transaction>,
    /// The mapping the rows were normalized with
    pub mapping: FieldMapping,
    /// Rows skipped due to value errors (empty unless partial failures)
    pub row_errors: Vec<RowError>,
}

/// Ingest a statement file for an account
///
/// `ai` is only consulted for `MappingMode::Infer`; passing `None` in that
/// mode is a `MappingInference` error. The resolved mapping is persisted to
/// the account for reuse by later uploads with the same layout.
pub async fn ingest_statement(
    db: &Database,
    ai: Option<&AiClient>,
    account_id: i64,
    data: &[u8],
    options: &IngestOptions,
) -> Result<IngestReport> {
    // Account existence gates everything; the file is not even parsed for
    // an unknown account.
    let account = db
        .get_account(account_id)?
        .ok_or_else(|| Error::NotFound(format!("Account {} not found", account_id)))?;

    let fallback_currency = db
        .get_user(account.user_id)?
        .map(|user| user.preferred_currency)
        .unwrap_or_else(|| FALLBACK_CURRENCY.to_string());

    let table = read_table(data, options.row_shape)?;

    let mapping = resolve_table_mapping(ai, &account.mapping, &table, options).await?;

    let missing = mapping.missing_required();
    if !missing.is_empty() {
        return Err(Error::MissingRequiredFields(missing));
    }

    let processed_at = options
        .processed_at
        .unwrap_or_else(|| Utc::now().naive_utc());
    let normalizer = RowNormalizer::new(
        &table.headers,
        &mapping,
        NormalizerConfig {
            fallback_currency,
            fallback_date: processed_at,
            strict_amounts: options.strict_amounts,
            invert_amounts: account.invert_amounts,
        },
    );

    let mut created = Vec::new();
    let mut row_errors = Vec::new();

    for (i, row) in table.rows.iter().enumerate() {
        let line = i + 2;
        match normalizer.normalize(row) {
            Ok(new_tx) => {
                let tx = db.create_transaction(account_id, &new_tx)?;
                debug!(line, transaction_id = tx.id, "created transaction");
                created.push(tx);
            }
            Err(e) if options.fail_fast => return Err(e),
            Err(e) => {
                debug!(line, error = %e, "skipping row");
                row_errors.push(RowError {
                    row: line,
                    message: e.to_string(),
                });
            }
        }
    }

    db.update_account_mapping(account_id, &mapping)?;

    info!(
        account_id,
        created = created.len(),
        skipped = row_errors.len(),
        "statement ingested"
    );

    Ok(IngestReport {
        created,
        mapping,
        row_errors,
    })
}

/// Pick the mapping source: stored layout match, else the configured strategy
async fn resolve_table_mapping(
    ai: Option<&AiClient>,
    stored: &Option<FieldMapping>,
    table: &RawTable,
    options: &IngestOptions,
) -> Result<FieldMapping> {
    if options.reuse_stored_mapping {
        if let Some(stored) = stored {
            if !stored.is_empty() && stored.matches_headers(&table.headers) {
                debug!("reusing stored account mapping");
                let mut mapping = stored.clone();
                mapping.validate_against(&table.headers);
                return Ok(mapping);
            }
        }
    }

    match options.mode {
        MappingMode::Default => resolve_mapping(&DefaultStrategy, table).await,
        MappingMode::Infer => {
            let client = ai.ok_or_else(|| {
                Error::MappingInference("no inference backend configured".into())
            })?;
            let strategy = InferenceStrategy::with_sample_size(client, options.sample_size);
            resolve_mapping(&strategy, table).await
        }
    }
}
