//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Centime - Personal finance tracker
#[derive(Parser)]
#[command(name = "centime")]
#[command(about = "Self-hosted personal finance tracker with AI-assisted statement import", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "centime.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage bank accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Import transactions from a statement file
    Import {
        /// Account ID to import into
        #[arg(short, long)]
        account: i64,

        /// Statement file to import
        file: PathBuf,

        /// Resolve the column mapping via the inference backend
        ///
        /// Requires OLLAMA_HOST to be set (and optionally OLLAMA_MODEL).
        #[arg(long)]
        infer: bool,

        /// Pad or truncate uneven rows instead of rejecting the file
        #[arg(long)]
        lenient: bool,

        /// Fail rows with non-numeric amounts instead of defaulting to 0
        #[arg(long)]
        strict_amounts: bool,

        /// Abort the whole import on the first row error
        #[arg(long)]
        fail_fast: bool,
    },

    /// List transactions
    Transactions {
        /// Only show transactions for this account
        #[arg(short, long)]
        account: Option<i64>,

        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a new user
    Add {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// Fallback currency for imported rows without one
        #[arg(long, default_value = "CHF")]
        currency: String,

        #[arg(long)]
        password: String,
    },

    /// List registered users
    List,
}

#[derive(Subcommand)]
pub enum AccountAction {
    /// Create a bank account for a user
    Add {
        /// Owning user ID
        #[arg(long)]
        user: i64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        number: String,

        #[arg(long)]
        bank: String,

        /// Negate imported amounts for this account
        #[arg(long)]
        invert_amounts: bool,
    },

    /// List a user's accounts
    List {
        /// Owning user ID
        #[arg(long)]
        user: i64,
    },
}
