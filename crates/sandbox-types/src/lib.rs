//! Shared type definitions for the Spanner sandbox.
//!
//! Everything the data layer and the runner binary exchange lives here:
//! validated resource identifiers, the emulator endpoint, and the row shapes
//! written to and read from the `test` table.
//!
//! # Modules
//!
//! - [`ids`] -- Validated project/instance/database ids and the fully
//!   qualified [`DatabaseIdentity`]
//! - [`endpoint`] -- Host and port of a running emulator
//! - [`rows`] -- Row id generation and the row structs of the `test` table

pub mod endpoint;
pub mod ids;
pub mod rows;

// Re-export all public types at crate root for convenience.
pub use endpoint::ServiceEndpoint;
pub use ids::{DatabaseId, DatabaseIdentity, IdError, InstanceId, ProjectId, SegmentKind};
pub use rows::{NewRow, RowId, StoredRow, TestRow};
