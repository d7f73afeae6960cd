//! User operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{NewUser, User};

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_at_str: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        preferred_currency: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: parse_datetime(&created_at_str),
    })
}

const USER_COLUMNS: &str = "id, email, name, preferred_currency, password_hash, created_at";

impl Database {
    /// Register a new user
    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (email, name, preferred_currency, password_hash) VALUES (?, ?, ?, ?)",
            params![
                user.email,
                user.name,
                user.preferred_currency,
                user.password_hash
            ],
        )?;
        let id = conn.last_insert_rowid();

        let created = conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
            params![id],
            row_to_user,
        )?;
        Ok(created)
    }

    /// Get a user by ID
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by email address
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;

        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }
}
