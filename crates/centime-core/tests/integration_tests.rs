//! Integration tests for centime-core
//!
//! These tests exercise the full statement upload workflow: account lookup,
//! tabular reading, column mapping, normalization, and persistence.

use chrono::NaiveDate;

use centime_core::ai::{AiClient, MockBackend};
use centime_core::db::Database;
use centime_core::error::Error;
use centime_core::ingest::{ingest_statement, IngestOptions, MappingMode, RowShape};
use centime_core::models::{NewBankAccount, NewUser};

fn setup_account(db: &Database) -> i64 {
    setup_account_with(db, "CHF", false)
}

fn setup_account_with(db: &Database, currency: &str, invert_amounts: bool) -> i64 {
    let user = db
        .create_user(&NewUser {
            email: format!("user-{}@example.com", unique_suffix()),
            name: "Max Mustermann".to_string(),
            preferred_currency: currency.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        })
        .unwrap();

    db.create_account(&NewBankAccount {
        user_id: user.id,
        name: "CHF Savings".to_string(),
        account_number: format!("CH-{}", user.id),
        bank_name: "Revolut".to_string(),
        invert_amounts,
    })
    .unwrap()
    .id
}

fn unique_suffix() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A statement whose headers exactly match the transaction schema
fn identity_csv() -> &'static str {
    "date,amount,description,recipient,currency\n\
     2024-01-05,42.50,Coffee,Cafe Luna,CHF\n\
     2024-01-06,9.90,Tea,Tea House,CHF\n"
}

#[tokio::test]
async fn test_identity_import() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let report = ingest_statement(
        &db,
        None,
        account_id,
        identity_csv().as_bytes(),
        &IngestOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.created.len(), 2);
    assert!(report.row_errors.is_empty());
    assert_eq!(report.mapping.date.as_deref(), Some("date"));
    assert_eq!(report.mapping.currency.as_deref(), Some("currency"));

    let tx = &report.created[0];
    assert_eq!(
        tx.date,
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    );
    assert_eq!(tx.amount, 42.50);
    assert_eq!(tx.currency, "CHF");
    assert_eq!(tx.description, "Coffee");
    assert_eq!(tx.recipient, "Cafe Luna");

    // Created order mirrors source-row order
    assert_eq!(report.created[1].description, "Tea");

    // The resolved mapping is persisted for later uploads
    let account = db.get_account(account_id).unwrap().unwrap();
    assert_eq!(account.mapping, Some(report.mapping));
}

#[tokio::test]
async fn test_unmatched_headers_fail_required_check() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    // Close-but-not-exact names: the default strategy maps nothing
    let csv = "Date,Amt,Desc\n2024-01-05,42.50,Coffee\n";
    match ingest_statement(&db, None, account_id, csv.as_bytes(), &IngestOptions::default()).await {
        Err(Error::MissingRequiredFields(missing)) => {
            assert_eq!(missing, vec!["date", "amount"]);
        }
        other => panic!("expected MissingRequiredFields, got {:?}", other),
    }
    assert!(db.list_transactions(Some(account_id), 100, 0).unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_amount_defaults_to_zero_and_row_is_kept() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let csv = "date,amount\n2024-01-05,abc\n";
    let report = ingest_statement(&db, None, account_id, csv.as_bytes(), &IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].amount, 0.0);
    assert!(report.created[0]
        .raw_data
        .as_deref()
        .unwrap()
        .contains(r#""amount":"abc""#));
}

#[tokio::test]
async fn test_unknown_account_fails_before_parsing() {
    let db = Database::in_memory().unwrap();

    // An empty file would be EmptyInput if the reader ran; the account
    // check comes first
    match ingest_statement(&db, None, 4242, b"", &IngestOptions::default()).await {
        Err(Error::NotFound(message)) => assert!(message.contains("4242")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_file_is_rejected() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    assert!(matches!(
        ingest_statement(&db, None, account_id, b"", &IngestOptions::default()).await,
        Err(Error::EmptyInput)
    ));
}

#[tokio::test]
async fn test_inferred_import_with_foreign_headers() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let ai = AiClient::Mock(MockBackend::with_response(
        r#"{"date":"Buchungsdatum","amount":"Betrag","currency":"Währung","description":"Buchungstext","recipient":"Empfänger"}"#,
    ));

    let csv = "Buchungsdatum;Betrag;Währung;Buchungstext;Empfänger\n\
               05.01.2024;42.50;CHF;Kaffee;Cafe Luna\n";
    let options = IngestOptions {
        mode: MappingMode::Infer,
        ..Default::default()
    };

    let report = ingest_statement(&db, Some(&ai), account_id, csv.as_bytes(), &options)
        .await
        .unwrap();

    assert_eq!(report.created.len(), 1);
    let tx = &report.created[0];
    assert_eq!(tx.amount, 42.50);
    assert_eq!(tx.description, "Kaffee");
    assert_eq!(tx.recipient, "Cafe Luna");
    assert_eq!(
        tx.date,
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    );
}

#[tokio::test]
async fn test_inferred_import_without_backend_fails() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let options = IngestOptions {
        mode: MappingMode::Infer,
        ..Default::default()
    };
    assert!(matches!(
        ingest_statement(&db, None, account_id, identity_csv().as_bytes(), &options).await,
        Err(Error::MappingInference(_))
    ));
}

#[tokio::test]
async fn test_hallucinated_mapping_is_not_trusted() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    // The backend invents a date column; validation downgrades it and the
    // required-field check rejects the upload
    let ai = AiClient::Mock(MockBackend::with_response(
        r#"{"date":"Phantom Column","amount":"amount","currency":null,"description":null,"recipient":null}"#,
    ));

    let csv = "when,amount\n2024-01-05,42.50\n";
    let options = IngestOptions {
        mode: MappingMode::Infer,
        ..Default::default()
    };

    match ingest_statement(&db, Some(&ai), account_id, csv.as_bytes(), &options).await {
        Err(Error::MissingRequiredFields(missing)) => assert_eq!(missing, vec!["date"]),
        other => panic!("expected MissingRequiredFields, got {:?}", other),
    }
}

#[tokio::test]
async fn test_partial_failure_report_in_strict_amount_mode() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let csv = "date,amount,description\n\
               2024-01-05,10.00,First\n\
               2024-01-06,broken,Second\n\
               2024-01-07,30.00,Third\n";
    let options = IngestOptions {
        strict_amounts: true,
        ..Default::default()
    };

    let report = ingest_statement(&db, None, account_id, csv.as_bytes(), &options)
        .await
        .unwrap();

    assert_eq!(report.created.len(), 2);
    assert_eq!(report.created[0].description, "First");
    assert_eq!(report.created[1].description, "Third");

    assert_eq!(report.row_errors.len(), 1);
    assert_eq!(report.row_errors[0].row, 3);
    assert!(report.row_errors[0].message.contains("broken"));

    // Successful rows stay persisted; there is no batch rollback
    assert_eq!(db.list_transactions(Some(account_id), 100, 0).unwrap().len(), 2);
}

#[tokio::test]
async fn test_fail_fast_aborts_on_first_row_error() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let csv = "date,amount\n\
               2024-01-05,10.00\n\
               2024-01-06,broken\n\
               2024-01-07,30.00\n";
    let options = IngestOptions {
        strict_amounts: true,
        fail_fast: true,
        ..Default::default()
    };

    match ingest_statement(&db, None, account_id, csv.as_bytes(), &options).await {
        Err(Error::AmountParse(value)) => assert_eq!(value, "broken"),
        other => panic!("expected AmountParse, got {:?}", other),
    }

    // Rows created before the failure are kept (no rollback)
    assert_eq!(db.list_transactions(Some(account_id), 100, 0).unwrap().len(), 1);
}

#[tokio::test]
async fn test_stored_mapping_reused_for_same_layout() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let ai = AiClient::Mock(MockBackend::with_response(
        r#"{"date":"Buchungsdatum","amount":"Betrag","currency":null,"description":null,"recipient":null}"#,
    ));
    let csv = "Buchungsdatum;Betrag\n05.01.2024;42.50\n";
    let options = IngestOptions {
        mode: MappingMode::Infer,
        ..Default::default()
    };
    ingest_statement(&db, Some(&ai), account_id, csv.as_bytes(), &options)
        .await
        .unwrap();

    // Second upload with the same layout succeeds in default mode and with
    // no backend at all: the stored mapping is reused
    let csv = "Buchungsdatum;Betrag\n06.01.2024;9.90\n";
    let report = ingest_statement(&db, None, account_id, csv.as_bytes(), &IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].amount, 9.90);
    assert_eq!(report.mapping.date.as_deref(), Some("Buchungsdatum"));
}

#[tokio::test]
async fn test_stored_mapping_ignored_for_different_layout() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let ai = AiClient::Mock(MockBackend::with_response(
        r#"{"date":"Buchungsdatum","amount":"Betrag","currency":null,"description":null,"recipient":null}"#,
    ));
    let csv = "Buchungsdatum;Betrag\n05.01.2024;42.50\n";
    let options = IngestOptions {
        mode: MappingMode::Infer,
        ..Default::default()
    };
    ingest_statement(&db, Some(&ai), account_id, csv.as_bytes(), &options)
        .await
        .unwrap();

    // A later upload with schema-named headers falls back to the default
    // strategy because the stored columns are absent
    let report = ingest_statement(
        &db,
        None,
        account_id,
        identity_csv().as_bytes(),
        &IngestOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(report.mapping.date.as_deref(), Some("date"));
    assert_eq!(report.created.len(), 2);
}

#[tokio::test]
async fn test_currency_falls_back_to_owner_preference() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account_with(&db, "EUR", false);

    let csv = "date,amount\n2024-01-05,10.00\n";
    let report = ingest_statement(&db, None, account_id, csv.as_bytes(), &IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(report.created[0].currency, "EUR");
}

#[tokio::test]
async fn test_inverted_account_negates_amounts() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account_with(&db, "CHF", true);

    let csv = "date,amount\n2024-01-05,42.50\n";
    let report = ingest_statement(&db, None, account_id, csv.as_bytes(), &IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(report.created[0].amount, -42.50);
}

#[tokio::test]
async fn test_unparseable_date_uses_processing_timestamp() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let processed_at = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let options = IngestOptions {
        processed_at: Some(processed_at),
        ..Default::default()
    };

    let csv = "date,amount\nnot a date,10.00\n";
    let report = ingest_statement(&db, None, account_id, csv.as_bytes(), &options)
        .await
        .unwrap();
    assert_eq!(report.created[0].date, processed_at);
}

#[tokio::test]
async fn test_malformed_row_aborts_strict_upload() {
    let db = Database::in_memory().unwrap();
    let account_id = setup_account(&db);

    let csv = "date,amount,description\n2024-01-05,10.00\n";
    match ingest_statement(&db, None, account_id, csv.as_bytes(), &IngestOptions::default()).await {
        Err(Error::MalformedRow { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected MalformedRow, got {:?}", other),
    }

    // The same file passes with the lenient shape policy
    let options = IngestOptions {
        row_shape: RowShape::Lenient,
        ..Default::default()
    };
    let report = ingest_statement(&db, None, account_id, csv.as_bytes(), &options)
        .await
        .unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].description, "");
}
