//! Per-row normalization into the transaction schema
//!
//! Applies a resolved `FieldMapping` to each statement row, coercing cells
//! into typed fields with policy-defined defaults. Pure transformation: no
//! I/O and no clock reads, so the same mapping and row always produce the
//! same output.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::NewTransaction;

use super::mapper::FieldMapping;

/// Currency used when neither the row nor the account owner supplies one
pub const FALLBACK_CURRENCY: &str = "CHF";

/// Per-run normalization policy
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Substituted when a row's currency cell is unmapped or empty
    pub fallback_currency: String,
    /// Substituted when a row's date is unmapped or unparseable. Captured
    /// once per ingest run so repeated normalization is deterministic.
    pub fallback_date: NaiveDateTime,
    /// Treat non-numeric amount cells as an error instead of defaulting to 0
    pub strict_amounts: bool,
    /// Negate parsed amounts (account-level sign convention)
    pub invert_amounts: bool,
}

/// Applies one mapping to statement rows
pub struct RowNormalizer<'a> {
    headers: &'a [String],
    config: NormalizerConfig,
    date_idx: Option<usize>,
    amount_idx: Option<usize>,
    currency_idx: Option<usize>,
    description_idx: Option<usize>,
    recipient_idx: Option<usize>,
}

impl<'a> RowNormalizer<'a> {
    /// Resolve the mapping's column names to positions up front
    ///
    /// The mapping must already satisfy the validation post-condition, so a
    /// mapped name that is absent from `headers` is treated as unmapped.
    pub fn new(headers: &'a [String], mapping: &FieldMapping, config: NormalizerConfig) -> Self {
        let index_of = |column: &Option<String>| {
            column
                .as_deref()
                .and_then(|name| headers.iter().position(|h| h == name))
        };
        Self {
            headers,
            date_idx: index_of(&mapping.date),
            amount_idx: index_of(&mapping.amount),
            currency_idx: index_of(&mapping.currency),
            description_idx: index_of(&mapping.description),
            recipient_idx: index_of(&mapping.recipient),
            config,
        }
    }

    /// Normalize one raw row into a transaction record
    pub fn normalize(&self, row: &[String]) -> Result<NewTransaction> {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(|c| c.trim());

        let raw_data = Some(row_to_json(self.headers, row));

        let date = match cell(self.date_idx) {
            Some(value) if !value.is_empty() => match parse_date(value) {
                Some(date) => date,
                None => {
                    warn!(value, "unparseable date, falling back to processing time");
                    self.config.fallback_date
                }
            },
            _ => self.config.fallback_date,
        };

        let mut amount = match cell(self.amount_idx) {
            Some(value) if !value.is_empty() => match parse_amount(value) {
                Ok(amount) => amount,
                Err(e) if self.config.strict_amounts => return Err(e),
                Err(_) => {
                    warn!(value, "unparseable amount, defaulting to 0");
                    0.0
                }
            },
            _ => 0.0,
        };
        if self.config.invert_amounts {
            amount = -amount;
        }

        let currency = match cell(self.currency_idx) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => self.config.fallback_currency.clone(),
        };

        let description = cell(self.description_idx).unwrap_or_default().to_string();
        let recipient = cell(self.recipient_idx).unwrap_or_default().to_string();

        Ok(NewTransaction {
            date,
            amount,
            currency,
            description,
            recipient,
            raw_data,
        })
    }
}

/// Snapshot the entire original row as a JSON object, mapped or not
fn row_to_json(headers: &[String], row: &[String]) -> String {
    let mut map = serde_json::Map::new();
    for (i, header) in headers.iter().enumerate() {
        let value = row.get(i).cloned().unwrap_or_default();
        map.insert(header.clone(), Value::String(value));
    }
    json!(map).to_string()
}

/// Parse a date or datetime string in common statement formats
fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let date_formats = [
        "%Y-%m-%d", // 2024-01-15
        "%d.%m.%Y", // 15.01.2024
        "%m/%d/%Y", // 01/15/2024
        "%d/%m/%Y", // 15/01/2024
        "%m/%d/%y", // 01/15/24
        "%d-%m-%Y", // 15-01-2024
    ];
    for fmt in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Parse an amount string, handling currency symbols and grouping marks
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', '\'', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::AmountParse(s.to_string()))
}
