//! Bank account operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::ingest::FieldMapping;
use crate::models::{BankAccount, NewBankAccount};

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<BankAccount> {
    let mapping_json: Option<String> = row.get(5)?;
    let created_at_str: String = row.get(7)?;
    Ok(BankAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        account_number: row.get(3)?,
        bank_name: row.get(4)?,
        mapping: mapping_json.and_then(|json| serde_json::from_str(&json).ok()),
        invert_amounts: row.get(6)?,
        created_at: parse_datetime(&created_at_str),
    })
}

const ACCOUNT_COLUMNS: &str =
    "id, user_id, name, account_number, bank_name, field_mapping, invert_amounts, created_at";

impl Database {
    /// Create a bank account for a user
    pub fn create_account(&self, account: &NewBankAccount) -> Result<BankAccount> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO accounts (user_id, name, account_number, bank_name, invert_amounts) VALUES (?, ?, ?, ?, ?)",
            params![
                account.user_id,
                account.name,
                account.account_number,
                account.bank_name,
                account.invert_amounts
            ],
        )?;
        let id = conn.last_insert_rowid();

        let created = conn.query_row(
            &format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS),
            params![id],
            row_to_account,
        )?;
        Ok(created)
    }

    /// Get an account by ID
    pub fn get_account(&self, id: i64) -> Result<Option<BankAccount>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS),
                params![id],
                row_to_account,
            )
            .optional()?;
        Ok(account)
    }

    /// List accounts owned by a user
    pub fn list_accounts_for_user(&self, user_id: i64) -> Result<Vec<BankAccount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM accounts WHERE user_id = ? ORDER BY name",
            ACCOUNT_COLUMNS
        ))?;

        let accounts = stmt
            .query_map(params![user_id], row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Delete an account and its transactions; returns false when absent
    pub fn delete_account(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        // ON DELETE CASCADE removes dependent transactions and labels
        let deleted = conn.execute("DELETE FROM accounts WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Persist a resolved statement mapping for reuse by later uploads
    pub fn update_account_mapping(&self, id: i64, mapping: &FieldMapping) -> Result<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(mapping)?;
        conn.execute(
            "UPDATE accounts SET field_mapping = ? WHERE id = ?",
            params![json, id],
        )?;
        Ok(())
    }
}
