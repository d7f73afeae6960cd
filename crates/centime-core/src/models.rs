//! Domain models for Centime

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::FieldMapping;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    /// Currency used when an imported row carries none
    pub preferred_currency: String,
    /// Argon2id hash, never exposed over the API
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A new user to be registered (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub preferred_currency: String,
    pub password_hash: String,
}

/// A bank account owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub account_number: String,
    pub bank_name: String,
    /// Column mapping learned from a previous statement upload, reused when
    /// a later upload has the same layout
    pub mapping: Option<FieldMapping>,
    /// Negate imported amounts (banks that report debits with flipped sign)
    pub invert_amounts: bool,
    pub created_at: DateTime<Utc>,
}

/// A new bank account to be created (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewBankAccount {
    pub user_id: i64,
    pub name: String,
    pub account_number: String,
    pub bank_name: String,
    pub invert_amounts: bool,
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub date: NaiveDateTime,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub recipient: String,
    /// Verbatim JSON snapshot of the original statement row, kept for audit
    /// even when the mapping was partial or wrong
    pub raw_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A normalized transaction produced by the ingestion pipeline
/// (before DB insertion)
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: NaiveDateTime,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub recipient: String,
    pub raw_data: Option<String>,
}

/// A free-form label attached to a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub transaction_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
