//! Transaction label operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::Label;

fn row_to_label(row: &rusqlite::Row<'_>) -> rusqlite::Result<Label> {
    let created_at_str: String = row.get(3)?;
    Ok(Label {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Attach a label to a transaction
    pub fn add_label(&self, transaction_id: i64, name: &str) -> Result<Label> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO labels (transaction_id, name) VALUES (?, ?)",
            params![transaction_id, name],
        )?;
        let id = conn.last_insert_rowid();

        let created = conn.query_row(
            "SELECT id, transaction_id, name, created_at FROM labels WHERE id = ?",
            params![id],
            row_to_label,
        )?;
        Ok(created)
    }

    /// List labels attached to a transaction
    pub fn list_labels(&self, transaction_id: i64) -> Result<Vec<Label>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, transaction_id, name, created_at FROM labels WHERE transaction_id = ? ORDER BY id",
        )?;

        let labels = stmt
            .query_map(params![transaction_id], row_to_label)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(labels)
    }

    /// Delete a label; returns false when absent
    pub fn delete_label(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM labels WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }
}
