//! Error types for Centime

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("statement file contains no rows")]
    EmptyInput,

    #[error("row {line} has {found} fields, expected {expected}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("column mapping inference failed: {0}")]
    MappingInference(String),

    #[error("required fields could not be mapped: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    #[error("unable to parse amount: {0}")]
    AmountParse(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Auth error: {0}")]
    Auth(String),
}

pub type Result<T> = std::result::Result<T, Error>;
