//! Schema setup and retriable single-row inserts into `test`.
//!
//! Inserts go through the client library's read-write transaction runner.
//! When the emulator aborts a transaction (it allows only one read-write
//! transaction at a time, so concurrent writers routinely abort), the runner
//! discards the buffered mutations and invokes the callback again. The
//! callback therefore rebuilds the mutation from scratch on every attempt.

use core::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use google_cloud_spanner::client::Error as SpannerError;
use google_cloud_spanner::mutation::insert;
use google_cloud_spanner::value::CommitTimestamp;
use sandbox_types::{NewRow, RowId};

use crate::connection::Connection;
use crate::ddl;
use crate::error::DbError;

/// Result of a committed insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Primary key of the inserted row.
    pub id: RowId,
    /// How many times the transaction callback ran before the commit stuck.
    pub attempts: usize,
    /// Commit timestamp of the transaction, which is also the row's `ts`.
    pub committed_at: DateTime<Utc>,
}

/// Writes to the `test` table over an open [`Connection`].
pub struct Writer<'a> {
    connection: &'a Connection,
}

impl<'a> Writer<'a> {
    /// Create a writer over a connection.
    pub const fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }

    /// Create the `test` table if it does not exist yet.
    ///
    /// Safe to call on every run.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rpc`] if the DDL is rejected, e.g. because an
    /// existing `test` table has a different schema.
    pub async fn ensure_table(&self) -> Result<(), DbError> {
        self.connection
            .admin()
            .update_ddl(
                self.connection.identity(),
                vec![ddl::CREATE_TEST_TABLE.to_owned()],
            )
            .await?;
        tracing::info!(table = ddl::TEST_TABLE, "Table ready");
        Ok(())
    }

    /// Insert `row` with `ts` set to the commit timestamp, retrying the whole
    /// transaction on abort.
    ///
    /// The row is visible to readers only after this returns `Ok`, and its
    /// stored `ts` equals [`WriteOutcome::committed_at`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Spanner`] for non-retryable failures (duplicate
    /// key, schema mismatch) and when aborts persist past the retry limit.
    pub async fn insert(&self, row: &NewRow) -> Result<WriteOutcome, DbError> {
        self.insert_with(row, |_attempt| Ok(())).await
    }

    /// [`Writer::insert`] with `interrupt` consulted after the mutation is
    /// buffered on each attempt. An `Err` from `interrupt` ends that attempt
    /// the same way a server-side failure would.
    pub(crate) async fn insert_with<F>(
        &self,
        row: &NewRow,
        interrupt: F,
    ) -> Result<WriteOutcome, DbError>
    where
        F: Fn(usize) -> Result<(), SpannerError>,
    {
        let attempts = AtomicUsize::new(0);

        let (commit_timestamp, ()) = self
            .connection
            .client()
            .read_write_transaction(|tx| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst).saturating_add(1);
                if attempt > 1 {
                    tracing::debug!(id = %row.id, attempt, "Retrying aborted insert");
                }
                let mutation = insert_mutation(row);
                let verdict = interrupt(attempt);
                Box::pin(async move {
                    tx.buffer_write(vec![mutation]);
                    verdict
                })
            })
            .await?;

        let committed_at = commit_timestamp
            .as_ref()
            .and_then(|ts| commit_time(ts.seconds, ts.nanos))
            .ok_or_else(|| {
                DbError::InvalidTimestamp(format!(
                    "{:?}",
                    commit_timestamp.as_ref().map(|ts| (ts.seconds, ts.nanos))
                ))
            })?;

        let attempts = attempts.into_inner();
        tracing::info!(id = %row.id, value = row.value, attempts, %committed_at, "Inserted row");

        Ok(WriteOutcome {
            id: row.id,
            attempts,
            committed_at,
        })
    }
}

/// Convert the commit timestamp returned by the server into UTC.
fn commit_time(seconds: i64, nanos: i32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
}

/// Build the insert mutation for `row`; `ts` carries the commit-timestamp
/// sentinel so the server fills it in at commit.
fn insert_mutation(row: &NewRow) -> google_cloud_googleapis::spanner::v1::Mutation {
    let id = row.id.into_inner();
    insert(
        ddl::TEST_TABLE,
        &["id", "value", "ts"],
        &[&id, &row.value, &CommitTimestamp::new()],
    )
}
