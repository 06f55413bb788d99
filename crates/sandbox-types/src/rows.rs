//! Row shapes of the `test` table and primary key generation.
//!
//! The table has three columns: `id INT64` (primary key), `value STRING(MAX)`,
//! and `ts TIMESTAMP` with `allow_commit_timestamp=true`. The client only ever
//! supplies `id` and `value`; `ts` is filled in by the server with the commit
//! timestamp of the inserting transaction.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last microsecond value handed out by [`RowId::generate`].
static LAST_ISSUED_MICROS: AtomicU64 = AtomicU64::new(0);

/// Primary key of a row in the `test` table.
///
/// Ids come from a process-wide, strictly increasing microsecond counter
/// whose bits are reversed before use. Reversal is a bijection, so distinct
/// counter values give distinct ids, while consecutive ids land far apart in
/// the key space instead of all appending at the end of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(i64);

impl RowId {
    /// Generate an id distinct from every other id generated by this process.
    ///
    /// Across runs the counter restarts from the wall clock, so a new run only
    /// avoids earlier ids if it starts after the previous run's counter.
    /// A burst of more than one id per microsecond pushes the counter ahead
    /// of the clock, and a run started inside that lag can reissue ids.
    pub fn generate() -> Self {
        let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0);
        let next = |last: u64| now.max(last.saturating_add(1));
        let previous = LAST_ISSUED_MICROS
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(next(last)))
            .unwrap_or_else(|last| last);
        Self::from_sequence(next(previous))
    }

    /// Map a sequence value to its bit-reversed key.
    const fn from_sequence(sequence: u64) -> Self {
        Self(i64::from_ne_bytes(sequence.reverse_bits().to_ne_bytes()))
    }

    /// Wrap a raw key read back from the database.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Return the raw `INT64` key.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The client-supplied part of an insert into `test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRow {
    /// Primary key.
    pub id: RowId,
    /// Payload stored in the `value` column.
    pub value: String,
}

impl NewRow {
    /// A row with a freshly generated id whose value is the id's text.
    pub fn generate() -> Self {
        let id = RowId::generate();
        Self {
            id,
            value: id.to_string(),
        }
    }
}

/// A row as returned by `select value, ts from test order by ts desc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRow {
    /// The `value` column.
    pub value: String,
    /// Commit timestamp assigned by the server.
    pub ts: DateTime<Utc>,
}

impl fmt::Display for TestRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {} inserted at {}", self.value, self.ts)
    }
}

/// A complete row of `test`, including its primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    /// Primary key.
    pub id: RowId,
    /// The `value` column.
    pub value: String,
    /// Commit timestamp assigned by the server.
    pub ts: DateTime<Utc>,
}
