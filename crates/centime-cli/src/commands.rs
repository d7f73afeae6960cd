//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use centime_core::ai::{AiBackend, AiClient};
use centime_core::auth;
use centime_core::db::Database;
use centime_core::ingest::{ingest_statement, IngestOptions, MappingMode, RowShape};
use centime_core::models::{NewBankAccount, NewUser};

pub fn open_db(path: &Path) -> Result<Database> {
    let path_str = path.to_string_lossy();
    Database::new(&path_str).with_context(|| format!("Failed to open database at {}", path_str))
}

pub async fn cmd_serve(db: Database, host: &str, port: u16) -> Result<()> {
    centime_server::serve(db, host, port).await
}

pub fn cmd_user_add(
    db: &Database,
    email: &str,
    name: &str,
    currency: &str,
    password: &str,
) -> Result<()> {
    if db.get_user_by_email(email)?.is_some() {
        anyhow::bail!("Email already registered: {}", email);
    }

    let user = db.create_user(&NewUser {
        email: email.to_string(),
        name: name.to_string(),
        preferred_currency: currency.to_string(),
        password_hash: auth::hash_password(password)?,
    })?;

    println!("Created user {} ({})", user.id, user.email);
    Ok(())
}

pub fn cmd_user_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;
    if users.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("{:<5} {:<32} {:<24} {}", "ID", "EMAIL", "NAME", "CURRENCY");
    for user in users {
        println!(
            "{:<5} {:<32} {:<24} {}",
            user.id, user.email, user.name, user.preferred_currency
        );
    }
    Ok(())
}

pub fn cmd_account_add(
    db: &Database,
    user_id: i64,
    name: &str,
    number: &str,
    bank: &str,
    invert_amounts: bool,
) -> Result<()> {
    db.get_user(user_id)?
        .with_context(|| format!("User {} not found", user_id))?;

    let account = db.create_account(&NewBankAccount {
        user_id,
        name: name.to_string(),
        account_number: number.to_string(),
        bank_name: bank.to_string(),
        invert_amounts,
    })?;

    println!("Created account {} ({} at {})", account.id, account.name, account.bank_name);
    Ok(())
}

pub fn cmd_account_list(db: &Database, user_id: i64) -> Result<()> {
    let accounts = db.list_accounts_for_user(user_id)?;
    if accounts.is_empty() {
        println!("No accounts for user {}.", user_id);
        return Ok(());
    }

    println!("{:<5} {:<24} {:<16} {}", "ID", "NAME", "NUMBER", "BANK");
    for account in accounts {
        println!(
            "{:<5} {:<24} {:<16} {}",
            account.id, account.name, account.account_number, account.bank_name
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_import(
    db: &Database,
    account_id: i64,
    file: &Path,
    infer: bool,
    lenient: bool,
    strict_amounts: bool,
    fail_fast: bool,
) -> Result<()> {
    let data = std::fs::read(file)
        .with_context(|| format!("Failed to read statement file {}", file.display()))?;

    let ai = if infer {
        let client = AiClient::from_env()
            .context("Inference requested but no backend configured (set OLLAMA_HOST)")?;
        info!(
            "Using inference backend {} (model: {})",
            client.host(),
            client.model()
        );
        Some(client)
    } else {
        None
    };

    let options = IngestOptions {
        mode: if infer {
            MappingMode::Infer
        } else {
            MappingMode::Default
        },
        row_shape: if lenient {
            RowShape::Lenient
        } else {
            RowShape::Strict
        },
        strict_amounts,
        fail_fast,
        ..Default::default()
    };

    let report = ingest_statement(db, ai.as_ref(), account_id, &data, &options).await?;

    println!(
        "Imported {} transaction(s), skipped {} row(s).",
        report.created.len(),
        report.row_errors.len()
    );
    println!("Mapping: {}", serde_json::to_string_pretty(&report.mapping)?);

    for err in &report.row_errors {
        println!("  row {}: {}", err.row, err.message);
    }
    Ok(())
}

pub fn cmd_transactions(db: &Database, account_id: Option<i64>, limit: i64) -> Result<()> {
    let transactions = db.list_transactions(account_id, limit, 0)?;
    if transactions.is_empty() {
        println!("No transactions.");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:>12} {:<5} {:<28} {}",
        "ID", "DATE", "AMOUNT", "CUR", "DESCRIPTION", "RECIPIENT"
    );
    for tx in transactions {
        println!(
            "{:<6} {:<12} {:>12.2} {:<5} {:<28} {}",
            tx.id,
            tx.date.format("%Y-%m-%d"),
            tx.amount,
            tx.currency,
            tx.description,
            tx.recipient
        );
    }
    Ok(())
}
