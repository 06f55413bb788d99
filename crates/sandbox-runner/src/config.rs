//! Configuration for the sample runner.
//!
//! All configuration is loaded from environment variables. The runner needs
//! to know which database to provision and whether to launch its own
//! emulator container or talk to one that is already running.

use std::time::Duration;

use sandbox_db::EmulatorOptions;
use sandbox_types::{DatabaseIdentity, ServiceEndpoint};

use crate::error::RunnerError;

/// Default project id.
const DEFAULT_PROJECT_ID: &str = "sample-project";

/// Default instance id.
const DEFAULT_INSTANCE_ID: &str = "sample-instance";

/// Default database id.
const DEFAULT_DATABASE_ID: &str = "sample-database";

/// Default container time zone.
const DEFAULT_TIMEZONE: &str = "America/Chicago";

/// Where the emulator comes from.
#[derive(Debug, Clone)]
pub enum EmulatorTarget {
    /// Start a fresh container and stop it when the run ends.
    Launch(EmulatorOptions),
    /// Use an emulator somebody else manages; it is left running.
    External(ServiceEndpoint),
}

/// Complete runner configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Database to provision and use.
    pub identity: DatabaseIdentity,
    /// Emulator to run against.
    pub emulator: EmulatorTarget,
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `SANDBOX_PROJECT_ID` -- project id (default `sample-project`)
    /// - `SANDBOX_INSTANCE_ID` -- instance id (default `sample-instance`)
    /// - `SANDBOX_DATABASE_ID` -- database id (default `sample-database`)
    /// - `SPANNER_EMULATOR_HOST` -- `host:port` of a running emulator; when
    ///   set no container is launched
    /// - `EMULATOR_IMAGE` -- container image (default
    ///   `gcr.io/cloud-spanner-emulator/emulator`)
    /// - `EMULATOR_TAG` -- image tag (default `latest`)
    /// - `EMULATOR_TZ` -- container `TZ`, empty to leave unset (default
    ///   `America/Chicago`)
    /// - `EMULATOR_STARTUP_TIMEOUT_SECS` -- readiness timeout (default 60)
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RunnerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_owned());

        let identity = DatabaseIdentity::parse(
            &var_or("SANDBOX_PROJECT_ID", DEFAULT_PROJECT_ID),
            &var_or("SANDBOX_INSTANCE_ID", DEFAULT_INSTANCE_ID),
            &var_or("SANDBOX_DATABASE_ID", DEFAULT_DATABASE_ID),
        )?;

        let emulator = match lookup("SPANNER_EMULATOR_HOST").filter(|v| !v.trim().is_empty()) {
            Some(host) => EmulatorTarget::External(host.parse()?),
            None => EmulatorTarget::Launch(launch_options(&lookup)?),
        };

        Ok(Self { identity, emulator })
    }
}

/// Build container options from the `EMULATOR_*` variables.
fn launch_options<F>(lookup: &F) -> Result<EmulatorOptions, RunnerError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut options = EmulatorOptions::default();

    if let Some(image) = lookup("EMULATOR_IMAGE") {
        options.image = image;
    }
    if let Some(tag) = lookup("EMULATOR_TAG") {
        options = options.with_tag(&tag);
    }

    let timezone = lookup("EMULATOR_TZ").unwrap_or_else(|| DEFAULT_TIMEZONE.to_owned());
    options = options.with_timezone((!timezone.is_empty()).then_some(timezone));

    if let Some(raw) = lookup("EMULATOR_STARTUP_TIMEOUT_SECS") {
        let secs: u64 = raw.parse().map_err(|e| {
            RunnerError::Config(format!("invalid EMULATOR_STARTUP_TIMEOUT_SECS: {e}"))
        })?;
        options = options.with_startup_timeout(Duration::from_secs(secs));
    }

    Ok(options)
}
