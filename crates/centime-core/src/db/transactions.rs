//! Transaction operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{NewTransaction, Transaction};

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(2)?;
    let created_at_str: String = row.get(8)?;
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        date: chrono::NaiveDateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_default(),
        amount: row.get(3)?,
        currency: row.get(4)?,
        description: row.get(5)?,
        recipient: row.get(6)?,
        raw_data: row.get(7)?,
        created_at: parse_datetime(&created_at_str),
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, account_id, date, amount, currency, description, recipient, raw_data, created_at";

impl Database {
    /// Persist a normalized transaction, assigning its id and timestamp
    pub fn create_transaction(&self, account_id: i64, tx: &NewTransaction) -> Result<Transaction> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (account_id, date, amount, currency, description, recipient, raw_data)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                account_id,
                tx.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                tx.amount,
                tx.currency,
                tx.description,
                tx.recipient,
                tx.raw_data,
            ],
        )?;
        let id = conn.last_insert_rowid();

        let created = conn.query_row(
            &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
            params![id],
            row_to_transaction,
        )?;
        Ok(created)
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
                params![id],
                row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// List transactions, optionally scoped to one account
    pub fn list_transactions(
        &self,
        account_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let transactions = if let Some(account_id) = account_id {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM transactions WHERE account_id = ? ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
                TRANSACTION_COLUMNS
            ))?;
            let rows = stmt.query_map(params![account_id, limit, offset], row_to_transaction)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM transactions ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
                TRANSACTION_COLUMNS
            ))?;
            let rows = stmt.query_map(params![limit, offset], row_to_transaction)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        Ok(transactions)
    }

    /// Delete a transaction; returns false when absent
    pub fn delete_transaction(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }
}
