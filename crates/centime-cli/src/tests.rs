//! CLI tests

use clap::Parser;

use crate::cli::{AccountAction, Cli, Commands, UserAction};
use crate::commands;

use centime_core::db::Database;
use centime_core::models::{NewBankAccount, NewUser};

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("centime.db");
    let db = Database::new(&path.to_string_lossy()).unwrap();
    (dir, db)
}

fn seed_account(db: &Database) -> i64 {
    let user = db
        .create_user(&NewUser {
            email: "max.mustermann@example.com".to_string(),
            name: "Max Mustermann".to_string(),
            preferred_currency: "CHF".to_string(),
            password_hash: "$argon2id$stub".to_string(),
        })
        .unwrap();
    db.create_account(&NewBankAccount {
        user_id: user.id,
        name: "CHF Savings".to_string(),
        account_number: "1234567890".to_string(),
        bank_name: "Revolut".to_string(),
        invert_amounts: false,
    })
    .unwrap()
    .id
}

#[test]
fn test_parse_serve() {
    let cli = Cli::try_parse_from(["centime", "serve", "--port", "8080"]).unwrap();
    match cli.command {
        Commands::Serve { port, host } => {
            assert_eq!(port, 8080);
            assert_eq!(host, "127.0.0.1");
        }
        _ => panic!("expected serve command"),
    }
}

#[test]
fn test_parse_user_add() {
    let cli = Cli::try_parse_from([
        "centime", "user", "add", "--email", "a@b.ch", "--name", "A", "--password", "pw",
    ])
    .unwrap();
    match cli.command {
        Commands::User {
            action:
                UserAction::Add {
                    email, currency, ..
                },
        } => {
            assert_eq!(email, "a@b.ch");
            assert_eq!(currency, "CHF");
        }
        _ => panic!("expected user add command"),
    }
}

#[test]
fn test_parse_import_flags() {
    let cli = Cli::try_parse_from([
        "centime",
        "import",
        "--account",
        "3",
        "statement.csv",
        "--infer",
        "--strict-amounts",
    ])
    .unwrap();
    match cli.command {
        Commands::Import {
            account,
            infer,
            lenient,
            strict_amounts,
            fail_fast,
            ..
        } => {
            assert_eq!(account, 3);
            assert!(infer);
            assert!(!lenient);
            assert!(strict_amounts);
            assert!(!fail_fast);
        }
        _ => panic!("expected import command"),
    }
}

#[test]
fn test_parse_account_list_requires_user() {
    assert!(Cli::try_parse_from(["centime", "account", "list"]).is_err());
    let cli = Cli::try_parse_from(["centime", "account", "list", "--user", "1"]).unwrap();
    match cli.command {
        Commands::Account {
            action: AccountAction::List { user },
        } => assert_eq!(user, 1),
        _ => panic!("expected account list command"),
    }
}

#[test]
fn test_cmd_user_add_and_list() {
    let (_dir, db) = test_db();
    commands::cmd_user_add(&db, "a@b.ch", "A", "CHF", "password").unwrap();
    assert_eq!(db.list_users().unwrap().len(), 1);

    // Duplicate registration fails
    assert!(commands::cmd_user_add(&db, "a@b.ch", "A", "CHF", "password").is_err());
}

#[test]
fn test_cmd_account_add_requires_user() {
    let (_dir, db) = test_db();
    assert!(commands::cmd_account_add(&db, 99, "X", "1", "Bank", false).is_err());
}

#[tokio::test]
async fn test_cmd_import_round_trip() {
    let (dir, db) = test_db();
    let account_id = seed_account(&db);

    let file = dir.path().join("statement.csv");
    std::fs::write(
        &file,
        "date,amount,description\n2024-01-05,42.50,Coffee\n2024-01-06,9.90,Tea\n",
    )
    .unwrap();

    commands::cmd_import(&db, account_id, &file, false, false, false, false)
        .await
        .unwrap();

    let transactions = db.list_transactions(Some(account_id), 100, 0).unwrap();
    assert_eq!(transactions.len(), 2);
}

#[tokio::test]
async fn test_cmd_import_missing_file() {
    let (dir, db) = test_db();
    let account_id = seed_account(&db);

    let missing = dir.path().join("nope.csv");
    assert!(
        commands::cmd_import(&db, account_id, &missing, false, false, false, false)
            .await
            .is_err()
    );
}
