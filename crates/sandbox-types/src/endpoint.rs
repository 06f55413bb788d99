//! Network address of a running Spanner emulator.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::IdError;

/// Host and port of the emulator's gRPC endpoint.
///
/// Built once when the emulator comes up (or from `SPANNER_EMULATOR_HOST`)
/// and handed to every client factory. Renders as `host:port`, the format
/// the Spanner client libraries expect for emulator targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    host: String,
    port: u16,
}

impl ServiceEndpoint {
    /// Create an endpoint. The host must be non-empty and the port non-zero.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, IdError> {
        let host = host.into();
        if host.is_empty() || port == 0 {
            return Err(IdError::InvalidEndpoint(format!("{host}:{port}")));
        }
        Ok(Self { host, port })
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServiceEndpoint {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdError::InvalidEndpoint(s.to_owned());
        let (host, port) = s.trim().rsplit_once(':').ok_or_else(invalid)?;
        let port: u16 = port.parse().map_err(|_parse_err| invalid())?;
        Self::new(host, port).map_err(|_endpoint_err| invalid())
    }
}
