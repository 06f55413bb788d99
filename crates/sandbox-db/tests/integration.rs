//! Integration tests for the `sandbox-db` data layer.
//!
//! These tests start a real Spanner emulator container per test and need a
//! running Docker daemon. Run with:
//!
//! ```bash
//! cargo test -p sandbox-db -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use futures::future::try_join_all;
use sandbox_db::{
    Connection, DbError, EmulatorOptions, Provisioned, Provisioner, Reader, SpannerAdmin,
    SpannerEmulator, Writer, ddl, run_sample,
};
use sandbox_types::{DatabaseIdentity, NewRow};

// =============================================================================
// Helpers
// =============================================================================

fn identity() -> DatabaseIdentity {
    DatabaseIdentity::parse("sample-project", "sample-instance", "sample-database")
        .expect("valid identity")
}

async fn start_emulator() -> SpannerEmulator {
    SpannerEmulator::start(&EmulatorOptions::default())
        .await
        .expect("Failed to start Spanner emulator -- is Docker running?")
}

/// Start an emulator with the sample instance and database already created.
async fn provisioned_emulator() -> SpannerEmulator {
    let emulator = start_emulator().await;
    let admin = SpannerAdmin::connect(emulator.endpoint())
        .await
        .expect("Failed to connect admin client");
    Provisioner::new(&admin)
        .ensure_topology(&identity())
        .await
        .expect("Failed to provision");
    emulator
}

async fn open(emulator: &SpannerEmulator) -> Connection {
    let connection = Connection::open(&identity(), emulator.endpoint())
        .await
        .expect("Failed to open connection");
    Writer::new(&connection)
        .ensure_table()
        .await
        .expect("Failed to create table");
    connection
}

// =============================================================================
// Provisioning
// =============================================================================

#[tokio::test]
#[ignore = "requires Docker for the Spanner emulator container"]
async fn provisioning_twice_reports_already_existed() {
    let emulator = start_emulator().await;
    let admin = SpannerAdmin::connect(emulator.endpoint())
        .await
        .expect("Failed to connect admin client");
    let provisioner = Provisioner::new(&admin);

    let first = provisioner
        .ensure_topology(&identity())
        .await
        .expect("First provisioning failed");
    assert_eq!(first.instance, Provisioned::Created);
    assert_eq!(first.database, Provisioned::Created);

    let second = provisioner
        .ensure_topology(&identity())
        .await
        .expect("Second provisioning failed");
    assert_eq!(second.instance, Provisioned::AlreadyExisted);
    assert_eq!(second.database, Provisioned::AlreadyExisted);

    emulator.stop().await.expect("Failed to stop emulator");
}

#[tokio::test]
#[ignore = "requires Docker for the Spanner emulator container"]
async fn create_table_is_idempotent() {
    let emulator = provisioned_emulator().await;
    let connection = open(&emulator).await;

    Writer::new(&connection)
        .ensure_table()
        .await
        .expect("Second create table should be a no-op");

    connection.close().await;
    emulator.stop().await.expect("Failed to stop emulator");
}

// =============================================================================
// Writes and reads
// =============================================================================

#[tokio::test]
#[ignore = "requires Docker for the Spanner emulator container"]
async fn committed_insert_is_immediately_readable() {
    let emulator = provisioned_emulator().await;
    let connection = open(&emulator).await;

    let row = NewRow::generate();
    let outcome = Writer::new(&connection)
        .insert(&row)
        .await
        .expect("Insert failed");
    assert_eq!(outcome.id, row.id);
    assert!(outcome.attempts >= 1);

    let stored = Reader::new(&connection)
        .find_by_id(row.id)
        .await
        .expect("Lookup failed")
        .expect("Inserted row not visible");
    assert_eq!(stored.id, row.id);
    assert_eq!(stored.value, row.value);
    assert_eq!(stored.ts, outcome.committed_at);

    connection.close().await;
    emulator.stop().await.expect("Failed to stop emulator");
}

#[tokio::test]
#[ignore = "requires Docker for the Spanner emulator container"]
async fn rows_read_back_newest_commit_first() {
    let emulator = provisioned_emulator().await;
    let connection = open(&emulator).await;
    let writer = Writer::new(&connection);

    let older = NewRow::generate();
    let newer = NewRow::generate();
    let first = writer.insert(&older).await.expect("First insert failed");
    let second = writer.insert(&newer).await.expect("Second insert failed");

    let mut sink = Vec::new();
    let rows = Reader::new(&connection)
        .print_latest(&mut sink)
        .await
        .expect("Query failed");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].value, newer.value);
    assert_eq!(rows[1].value, older.value);
    assert!(rows[0].ts > rows[1].ts, "commit timestamps must increase");
    assert_eq!(rows[0].ts, second.committed_at);
    assert_eq!(rows[1].ts, first.committed_at);

    let printed = String::from_utf8(sink).expect("utf8 output");
    let lines: Vec<&str> = printed.lines().collect();
    assert_eq!(
        lines,
        vec![rows[0].to_string().as_str(), rows[1].to_string().as_str()]
    );
    assert!(lines[0].starts_with(&format!("Row {} inserted at ", newer.value)));

    connection.close().await;
    emulator.stop().await.expect("Failed to stop emulator");
}

#[tokio::test]
#[ignore = "requires Docker for the Spanner emulator container"]
async fn concurrent_inserts_commit_exactly_once_each() {
    let emulator = provisioned_emulator().await;
    let connection = open(&emulator).await;
    let writer = Writer::new(&connection);

    // The emulator runs one read-write transaction at a time, so some of these
    // may abort and retry. The forced-abort case is covered in `writer.rs`.
    let rows: Vec<NewRow> = (0..4).map(|_| NewRow::generate()).collect();
    let outcomes = try_join_all(rows.iter().map(|row| writer.insert(row)))
        .await
        .expect("Concurrent inserts failed");
    assert!(outcomes.iter().all(|o| o.attempts >= 1));

    let reader = Reader::new(&connection);
    for (row, outcome) in rows.iter().zip(&outcomes) {
        let stored = reader
            .find_by_id(row.id)
            .await
            .expect("Lookup failed")
            .expect("Row missing after retry");
        assert_eq!(stored.value, row.value);
        assert_eq!(stored.ts, outcome.committed_at);
    }

    let total = reader
        .for_each_row(ddl::SELECT_ROWS_BY_TS_DESC, |_| Ok(()))
        .await
        .expect("Query failed");
    assert_eq!(total, rows.len(), "retries must not duplicate rows");

    connection.close().await;
    emulator.stop().await.expect("Failed to stop emulator");
}

#[tokio::test]
#[ignore = "requires Docker for the Spanner emulator container"]
async fn duplicate_primary_key_is_not_retried() {
    let emulator = provisioned_emulator().await;
    let connection = open(&emulator).await;
    let writer = Writer::new(&connection);

    let row = NewRow::generate();
    writer.insert(&row).await.expect("First insert failed");

    let err = writer
        .insert(&row)
        .await
        .expect_err("Duplicate key must fail");
    assert!(matches!(err, DbError::Spanner(_)), "unexpected error: {err}");

    connection.close().await;
    emulator.stop().await.expect("Failed to stop emulator");
}

// =============================================================================
// End-to-end sample
// =============================================================================

#[tokio::test]
#[ignore = "requires Docker for the Spanner emulator container"]
async fn sample_run_prints_the_inserted_row() {
    let emulator = start_emulator().await;

    let mut sink = Vec::new();
    let run = run_sample(emulator.endpoint(), &identity(), &mut sink)
        .await
        .expect("Sample run failed");

    assert_eq!(run.rows.len(), 1);
    assert_eq!(run.rows[0].value, run.inserted.value);
    assert_eq!(run.inserted.value, run.inserted.id.to_string());
    assert_eq!(run.write.id, run.inserted.id);
    assert_eq!(run.rows[0].ts, run.write.committed_at);

    let printed = String::from_utf8(sink).expect("utf8 output");
    assert_eq!(printed, format!("{}\n", run.rows[0]));

    emulator.stop().await.expect("Failed to stop emulator");
}

#[tokio::test]
#[ignore = "requires Docker for the Spanner emulator container"]
async fn repeated_sample_runs_accumulate_newest_first() {
    let emulator = start_emulator().await;

    let first = run_sample(emulator.endpoint(), &identity(), &mut std::io::sink())
        .await
        .expect("First run failed");
    let second = run_sample(emulator.endpoint(), &identity(), &mut std::io::sink())
        .await
        .expect("Second run failed");

    assert_eq!(second.topology.instance, Provisioned::AlreadyExisted);
    assert_eq!(second.topology.database, Provisioned::AlreadyExisted);
    assert_eq!(second.rows.len(), 2);
    assert_eq!(second.rows[0].value, second.inserted.value);
    assert_eq!(second.rows[1].value, first.inserted.value);

    emulator.stop().await.expect("Failed to stop emulator");
}
