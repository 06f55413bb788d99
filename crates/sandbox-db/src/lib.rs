//! Data layer for the Spanner sandbox.
//!
//! Starts a throwaway Spanner emulator, provisions an instance and database
//! on it, and runs a retriable write followed by an ordered read.
//!
//! # Architecture
//!
//! ```text
//! SpannerEmulator::start() ----> ServiceEndpoint (host:mapped-port)
//!     |
//!     +-- SpannerAdmin ----------> Provisioner (create-if-absent)
//!     |
//!     +-- Connection (scoped) ---> Writer  (DDL, insert in rw transaction)
//!                                  Reader  (query stream -> sink)
//!     |
//! SpannerEmulator::stop()
//! ```
//!
//! # Modules
//!
//! - [`emulator`] -- Emulator container lifecycle
//! - [`admin`] -- Admin RPC trait and its Spanner implementation
//! - [`provision`] -- Idempotent instance/database provisioning
//! - [`connection`] -- Scoped data + admin clients for one database
//! - [`writer`] -- Table DDL and retriable inserts
//! - [`reader`] -- Streaming queries
//! - [`scenario`] -- The end-to-end sample workflow
//! - [`ddl`] -- Statement text
//! - [`error`] -- Shared error types

pub mod admin;
pub mod connection;
pub mod ddl;
pub mod emulator;
pub mod error;
pub mod provision;
pub mod reader;
pub mod scenario;
pub mod writer;

// Re-export primary types for convenience.
pub use admin::{AdminApi, InstanceSpec, SpannerAdmin};
pub use connection::Connection;
pub use emulator::{EmulatorOptions, SpannerEmulator};
pub use error::{AdminError, DbError};
pub use provision::{Provisioned, Provisioner, Topology};
pub use reader::Reader;
pub use scenario::{SampleRun, run_sample};
pub use writer::{WriteOutcome, Writer};
