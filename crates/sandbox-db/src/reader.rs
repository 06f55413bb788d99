//! Read queries against `test`.
//!
//! Queries run in single-use read-only transactions and are consumed as a
//! forward-only stream: each row is decoded and handed on as soon as it
//! arrives. A second pass means issuing the query again.

use std::io::Write;

use chrono::{DateTime, Utc};
use google_cloud_spanner::row::Row;
use google_cloud_spanner::statement::Statement;
use sandbox_types::{RowId, StoredRow, TestRow};
use time::OffsetDateTime;

use crate::connection::Connection;
use crate::ddl;
use crate::error::DbError;

/// Reads from the `test` table over an open [`Connection`].
pub struct Reader<'a> {
    connection: &'a Connection,
}

impl<'a> Reader<'a> {
    /// Create a reader over a connection.
    pub const fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }

    /// Run `sql` and pass every row, decoded as `value, ts`, to `on_row` in
    /// the order the server returns them.
    ///
    /// Returns the number of rows seen.
    ///
    /// # Errors
    ///
    /// Returns the first error from the query stream, from decoding, or from
    /// `on_row`. Rows after the failing one are not consumed.
    pub async fn for_each_row<F>(&self, sql: &str, mut on_row: F) -> Result<usize, DbError>
    where
        F: FnMut(TestRow) -> Result<(), DbError>,
    {
        let mut tx = self.connection.client().single().await?;
        let mut rows = tx.query(Statement::new(sql)).await?;

        let mut count: usize = 0;
        while let Some(row) = rows.next().await? {
            on_row(decode_test_row(&row)?)?;
            count = count.saturating_add(1);
        }

        tracing::debug!(sql, rows = count, "Query finished");
        Ok(count)
    }

    /// Run `sql`, write `Row {value} inserted at {ts}` for each row to `sink`
    /// as it is consumed, and return the rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the sink rejects a write, or any error from
    /// [`Reader::for_each_row`].
    pub async fn print_rows<W: Write>(
        &self,
        sql: &str,
        sink: &mut W,
    ) -> Result<Vec<TestRow>, DbError> {
        let mut collected = Vec::new();
        self.for_each_row(sql, |row| {
            writeln!(sink, "{row}")?;
            collected.push(row);
            Ok(())
        })
        .await?;
        sink.flush()?;
        Ok(collected)
    }

    /// Rows newest commit first, printed to `sink`.
    ///
    /// # Errors
    ///
    /// See [`Reader::print_rows`].
    pub async fn print_latest<W: Write>(&self, sink: &mut W) -> Result<Vec<TestRow>, DbError> {
        self.print_rows(ddl::SELECT_ROWS_BY_TS_DESC, sink).await
    }

    /// Look up a single row by primary key.
    ///
    /// # Errors
    ///
    /// Returns any error from the query stream or from decoding.
    pub async fn find_by_id(&self, id: RowId) -> Result<Option<StoredRow>, DbError> {
        let mut statement = Statement::new(ddl::SELECT_ROW_BY_ID);
        statement.add_param("id", &id.into_inner());

        let mut tx = self.connection.client().single().await?;
        let mut rows = tx.query(statement).await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(StoredRow {
            id: RowId::from_raw(row.column_by_name::<i64>("id")?),
            value: row.column_by_name::<String>("value")?,
            ts: to_utc(row.column_by_name::<OffsetDateTime>("ts")?)?,
        }))
    }
}

/// Decode the `value, ts` projection.
fn decode_test_row(row: &Row) -> Result<TestRow, DbError> {
    Ok(TestRow {
        value: row.column_by_name::<String>("value")?,
        ts: to_utc(row.column_by_name::<OffsetDateTime>("ts")?)?,
    })
}

/// Convert a decoded Spanner timestamp into a [`chrono`] UTC timestamp.
fn to_utc(ts: OffsetDateTime) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp(ts.unix_timestamp(), ts.nanosecond())
        .ok_or_else(|| DbError::InvalidTimestamp(ts.to_string()))
}
