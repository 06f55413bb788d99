//! The sample workflow: provision, create the table, insert, read back.
//!
//! ```text
//! endpoint
//!   |
//!   +-- Provisioner::ensure_topology()   instance, then database
//!   +-- Connection::scoped()
//!         |-- Writer::ensure_table()     create table if not exists
//!         |-- Writer::insert()           retried read-write transaction
//!         +-- Reader::print_latest()     newest commit first
//! ```

use std::io::Write;

use sandbox_types::{DatabaseIdentity, NewRow, ServiceEndpoint, TestRow};

use crate::admin::SpannerAdmin;
use crate::connection::Connection;
use crate::error::DbError;
use crate::provision::{Provisioner, Topology};
use crate::reader::Reader;
use crate::writer::{WriteOutcome, Writer};

/// Everything one run of the sample produced.
#[derive(Debug, Clone)]
pub struct SampleRun {
    /// What provisioning found.
    pub topology: Topology,
    /// The row this run inserted.
    pub inserted: NewRow,
    /// Commit details of the insert.
    pub write: WriteOutcome,
    /// All rows in `test`, newest first, as printed to the sink.
    pub rows: Vec<TestRow>,
}

/// Run the sample once against the emulator at `endpoint`.
///
/// Each call inserts one fresh row, so repeated calls against the same
/// database accumulate rows.
///
/// # Errors
///
/// Returns the first failure of any step. "Already exists" during
/// provisioning is not a failure.
pub async fn run_sample<W: Write>(
    endpoint: &ServiceEndpoint,
    identity: &DatabaseIdentity,
    sink: &mut W,
) -> Result<SampleRun, DbError> {
    let admin = SpannerAdmin::connect(endpoint).await?;
    let topology = Provisioner::new(&admin).ensure_topology(identity).await?;

    let inserted = NewRow::generate();
    let (write, rows) = Connection::scoped(identity, endpoint, async |connection| {
        let writer = Writer::new(connection);
        writer.ensure_table().await?;
        let write = writer.insert(&inserted).await?;

        let rows = Reader::new(connection).print_latest(sink).await?;
        Ok::<_, DbError>((write, rows))
    })
    .await?;

    Ok(SampleRun {
        topology,
        inserted,
        write,
        rows,
    })
}
