//! Ephemeral Spanner emulator running in a container.
//!
//! The emulator listens for gRPC on port 9010 inside the container. That port
//! is published on a free host port chosen by the container engine, so any
//! number of emulators can run side by side (e.g. one per test). The mapped
//! address is returned as a [`ServiceEndpoint`] which callers pass explicitly
//! into every client they build.

use std::time::Duration;

use sandbox_types::ServiceEndpoint;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use crate::error::DbError;

/// Default emulator image.
pub const DEFAULT_IMAGE: &str = "gcr.io/cloud-spanner-emulator/emulator";

/// Default emulator image tag.
pub const DEFAULT_TAG: &str = "latest";

/// gRPC port of the emulator inside the container.
pub const GRPC_PORT: u16 = 9010;

/// Log line the emulator prints once it accepts connections.
const READY_MESSAGE: &str = "Cloud Spanner emulator running";

/// Default time allowed for the container to become ready.
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 60;

/// Options for launching the emulator container.
#[derive(Debug, Clone)]
pub struct EmulatorOptions {
    /// Container image name.
    pub image: String,
    /// Container image tag.
    pub tag: String,
    /// Value for the container's `TZ` variable, if any.
    pub timezone: Option<String>,
    /// How long to wait for the readiness log line.
    pub startup_timeout: Duration,
}

impl Default for EmulatorOptions {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_owned(),
            tag: DEFAULT_TAG.to_owned(),
            timezone: Some("America/Chicago".to_owned()),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
        }
    }
}

impl EmulatorOptions {
    /// Set the image tag.
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        tag.clone_into(&mut self.tag);
        self
    }

    /// Set or clear the container time zone.
    #[must_use]
    pub fn with_timezone(mut self, timezone: Option<String>) -> Self {
        self.timezone = timezone;
        self
    }

    /// Set the startup timeout.
    #[must_use]
    pub const fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}

/// A running emulator container.
///
/// Call [`SpannerEmulator::stop`] to shut it down. If the handle is dropped
/// without stopping, the container is still removed when the handle goes out
/// of scope.
pub struct SpannerEmulator {
    container: ContainerAsync<GenericImage>,
    endpoint: ServiceEndpoint,
}

impl SpannerEmulator {
    /// Start the emulator and wait until it is ready.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Emulator`] if the container engine is unreachable,
    /// the image cannot be pulled, or the emulator never reports ready.
    /// None of these are retried.
    pub async fn start(options: &EmulatorOptions) -> Result<Self, DbError> {
        tracing::info!(
            image = options.image,
            tag = options.tag,
            "Starting Spanner emulator container"
        );

        let image = GenericImage::new(options.image.as_str(), options.tag.as_str())
            .with_exposed_port(GRPC_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(READY_MESSAGE));

        let mut request = image.with_startup_timeout(options.startup_timeout);
        if let Some(tz) = &options.timezone {
            request = request.with_env_var("TZ", tz.as_str());
        }

        let container = request.start().await?;
        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(GRPC_PORT.tcp()).await?;

        let endpoint = ServiceEndpoint::new(host.to_string(), port)?;

        tracing::info!(%endpoint, container_id = container.id(), "Spanner emulator ready");

        Ok(Self {
            container,
            endpoint,
        })
    }

    /// Address clients should connect to.
    pub const fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Stop and remove the container.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Emulator`] if the container engine rejects the stop.
    pub async fn stop(self) -> Result<(), DbError> {
        self.container.stop().await?;
        tracing::info!(endpoint = %self.endpoint, "Spanner emulator stopped");
        Ok(())
    }
}
