//! Statement text sent to the emulator.
//!
//! The DDL must stay byte-for-byte identical to what other clients of the
//! same database issue, otherwise `create table if not exists` reports a
//! schema mismatch instead of a no-op.

use sandbox_types::DatabaseId;

/// Name of the table the sandbox writes to.
pub const TEST_TABLE: &str = "test";

/// Idempotent creation of the `test` table.
pub const CREATE_TEST_TABLE: &str = "create table if not exists test \
    (id int64, \
    value string(max), \
    ts timestamp options (allow_commit_timestamp=true)) \
    primary key (id)";

/// Rows newest commit first.
pub const SELECT_ROWS_BY_TS_DESC: &str = "select value, ts from test order by ts desc";

/// Point lookup by primary key. Binds `@id`.
pub const SELECT_ROW_BY_ID: &str = "select id, value, ts from test where id = @id";

/// `CREATE DATABASE` statement for the admin API.
pub fn create_database(database: &DatabaseId) -> String {
    format!("CREATE DATABASE `{database}`")
}
