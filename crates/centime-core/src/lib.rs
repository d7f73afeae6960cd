//! Centime Core Library
//!
//! Shared functionality for the Centime personal finance tracker:
//! - Database access and migrations
//! - Statement ingestion pipeline (delimiter sniffing, tolerant CSV
//!   reading, column mapping, row normalization)
//! - Pluggable text-generation backends for AI-assisted column mapping
//! - Password hashing and login token issuance

pub mod ai;
pub mod auth;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AiBackend, AiClient, MockBackend, OllamaBackend};
pub use db::Database;
pub use error::{Error, Result};
pub use ingest::{
    ingest_statement, FieldMapping, IngestOptions, IngestReport, MappingMode, RawTable, RowError,
    RowShape,
};
