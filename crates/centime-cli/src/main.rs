//! Centime CLI - Personal finance tracker
//!
//! Usage:
//!   centime user add --email ... --name ... --password ...
//!   centime account add --user 1 --name "CHF Savings" --number ... --bank ...
//!   centime import --account 1 statement.csv
//!   centime serve --port 3000

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Serve { port, host } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_serve(db, &host, port).await
        }
        Commands::User { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                UserAction::Add {
                    email,
                    name,
                    currency,
                    password,
                } => commands::cmd_user_add(&db, &email, &name, &currency, &password),
                UserAction::List => commands::cmd_user_list(&db),
            }
        }
        Commands::Account { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                AccountAction::Add {
                    user,
                    name,
                    number,
                    bank,
                    invert_amounts,
                } => commands::cmd_account_add(&db, user, &name, &number, &bank, invert_amounts),
                AccountAction::List { user } => commands::cmd_account_list(&db, user),
            }
        }
        Commands::Import {
            account,
            file,
            infer,
            lenient,
            strict_amounts,
            fail_fast,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(
                &db,
                account,
                &file,
                infer,
                lenient,
                strict_amounts,
                fail_fast,
            )
            .await
        }
        Commands::Transactions { account, limit } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_transactions(&db, account, limit)
        }
    }
}
