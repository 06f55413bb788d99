//! Error types for the sample runner.
//!
//! [`RunnerError`] is the top-level error that `main` propagates with `?`.

/// Errors that can occur while running the sample.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A configuration value could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// A configured identifier or endpoint is malformed.
    #[error("invalid identifier: {source}")]
    Identity {
        /// The underlying validation error.
        #[from]
        source: sandbox_types::IdError,
    },

    /// The emulator, provisioning, or the read/write workflow failed.
    #[error("database error: {source}")]
    Db {
        /// The underlying data layer error.
        #[from]
        source: sandbox_db::DbError,
    },
}
