//! Entry point for the Spanner emulator sample.
//!
//! Launches (or attaches to) a Spanner emulator, provisions the sample
//! instance and database, inserts one row inside a retried read-write
//! transaction, prints every row newest first, and stops the emulator.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing, to stderr)
//! 2. Load configuration from the environment
//! 3. Start the emulator container, unless `SPANNER_EMULATOR_HOST` is set
//! 4. Run the sample, printing rows to stdout
//! 5. Stop the emulator container

mod config;
mod error;

use sandbox_db::{SpannerEmulator, run_sample};
use sandbox_types::{DatabaseIdentity, ServiceEndpoint};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{EmulatorTarget, RunnerConfig};
use crate::error::RunnerError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the container engine is
/// unavailable, or any step of the sample fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only the printed rows.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("sandbox-runner starting");

    let config = RunnerConfig::from_env()?;
    info!(database = %config.identity, "configuration loaded");

    run(config).await?;

    info!("sandbox-runner finished");
    Ok(())
}

/// Run the sample against the configured emulator.
async fn run(config: RunnerConfig) -> Result<(), RunnerError> {
    match config.emulator {
        EmulatorTarget::External(endpoint) => {
            info!(%endpoint, "using externally managed emulator");
            sample_to_stdout(&endpoint, &config.identity).await
        }
        EmulatorTarget::Launch(options) => {
            let emulator = SpannerEmulator::start(&options).await?;
            let outcome = sample_to_stdout(emulator.endpoint(), &config.identity).await;
            // Stop even when the sample failed; report the sample error first.
            let stopped = emulator.stop().await;
            outcome?;
            stopped?;
            Ok(())
        }
    }
}

/// Run the sample once, printing rows to stdout.
async fn sample_to_stdout(
    endpoint: &ServiceEndpoint,
    identity: &DatabaseIdentity,
) -> Result<(), RunnerError> {
    let mut stdout = std::io::stdout().lock();
    let run = run_sample(endpoint, identity, &mut stdout).await?;
    info!(
        id = %run.inserted.id,
        attempts = run.write.attempts,
        rows = run.rows.len(),
        instance = ?run.topology.instance,
        database = ?run.topology.database,
        "sample complete"
    );
    Ok(())
}
