//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`testcontainers`] and Spanner client errors with the step that failed.
//! Admin calls report through [`AdminError`] so callers can match on the
//! "already exists" outcome instead of inspecting status codes.
//!
//! Foreign error values are boxed: a gRPC status carries metadata maps and
//! would otherwise make every `Result` in the crate several hundred bytes.

use google_cloud_gax::grpc::{Code, Status};

/// Errors returned by administrative (instance/database) calls.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The resource is already present. Provisioning treats this as success.
    #[error("{resource} already exists")]
    AlreadyExists {
        /// Name of the resource that was being created.
        resource: String,
    },

    /// Any other RPC failure.
    #[error("admin RPC failed: {0}")]
    Rpc(Box<Status>),
}

impl AdminError {
    /// Classify a status returned while creating `resource`.
    pub fn from_status(resource: &str, status: Status) -> Self {
        if status.code() == Code::AlreadyExists {
            Self::AlreadyExists {
                resource: resource.to_owned(),
            }
        } else {
            Self::Rpc(Box::new(status))
        }
    }

    /// Whether this is the benign "already exists" outcome.
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The container engine could not start or stop the emulator.
    ///
    /// This is an environmental precondition and is never retried.
    #[error("emulator container error: {0}")]
    Emulator(Box<testcontainers::TestcontainersError>),

    /// The container engine reported an unusable host address.
    #[error("invalid emulator endpoint: {0}")]
    Endpoint(#[from] sandbox_types::IdError),

    /// Opening a gRPC channel to the emulator failed.
    #[error("connection error: {0}")]
    Connect(Box<google_cloud_gax::conn::Error>),

    /// A data-plane call failed, including a read-write transaction that
    /// kept aborting until its retries were exhausted.
    #[error("Spanner error: {0}")]
    Spanner(Box<google_cloud_spanner::client::Error>),

    /// A raw RPC (query stream, DDL operation) failed.
    #[error("RPC error: {0}")]
    Rpc(Box<Status>),

    /// A provisioning call failed for a reason other than "already exists".
    #[error("admin error: {0}")]
    Admin(#[from] AdminError),

    /// A column could not be decoded into the requested Rust type.
    #[error("row decode error: {0}")]
    Decode(Box<google_cloud_spanner::row::Error>),

    /// A timestamp column held a value outside the range of [`chrono`].
    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(String),

    /// Writing formatted rows to the output sink failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<testcontainers::TestcontainersError> for DbError {
    fn from(err: testcontainers::TestcontainersError) -> Self {
        Self::Emulator(Box::new(err))
    }
}

impl From<google_cloud_gax::conn::Error> for DbError {
    fn from(err: google_cloud_gax::conn::Error) -> Self {
        Self::Connect(Box::new(err))
    }
}

impl From<google_cloud_spanner::client::Error> for DbError {
    fn from(err: google_cloud_spanner::client::Error) -> Self {
        Self::Spanner(Box::new(err))
    }
}

impl From<Status> for DbError {
    fn from(status: Status) -> Self {
        Self::Rpc(Box::new(status))
    }
}

impl From<google_cloud_spanner::row::Error> for DbError {
    fn from(err: google_cloud_spanner::row::Error) -> Self {
        Self::Decode(Box::new(err))
    }
}
