//! Idempotent create-if-absent provisioning of instance and database.
//!
//! Both steps issue a create call and treat [`AdminError::AlreadyExists`] as
//! success: the desired end state already holds. Every other error is
//! returned unchanged. The instance is always fully created before the
//! database create is attempted.

use sandbox_types::DatabaseIdentity;

use crate::admin::{AdminApi, InstanceSpec};
use crate::error::AdminError;

/// What a create-if-absent step found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// The resource did not exist and was created by this call.
    Created,
    /// The resource was already present; nothing was changed.
    AlreadyExisted,
}

/// Outcome of provisioning a whole instance/database pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    /// Result of the instance step.
    pub instance: Provisioned,
    /// Result of the database step.
    pub database: Provisioned,
}

/// Ensures instances and databases exist.
pub struct Provisioner<'a, A> {
    admin: &'a A,
}

impl<'a, A: AdminApi> Provisioner<'a, A> {
    /// Create a provisioner over an admin surface.
    pub const fn new(admin: &'a A) -> Self {
        Self { admin }
    }

    /// Create the instance unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns any [`AdminError`] other than `AlreadyExists`.
    pub async fn ensure_instance(&self, spec: &InstanceSpec) -> Result<Provisioned, AdminError> {
        let outcome = swallow_already_exists(self.admin.create_instance(spec).await)?;
        tracing::info!(instance = spec.name, ?outcome, "Instance ready");
        Ok(outcome)
    }

    /// Create the database unless it already exists. The instance must exist.
    ///
    /// # Errors
    ///
    /// Returns any [`AdminError`] other than `AlreadyExists`.
    pub async fn ensure_database(
        &self,
        identity: &DatabaseIdentity,
    ) -> Result<Provisioned, AdminError> {
        let outcome = swallow_already_exists(self.admin.create_database(identity).await)?;
        tracing::info!(database = %identity, ?outcome, "Database ready");
        Ok(outcome)
    }

    /// Ensure the instance and then the database for `identity`.
    ///
    /// # Errors
    ///
    /// Stops at the first step that fails with anything other than
    /// `AlreadyExists`; the database step is not attempted if the instance
    /// step fails.
    pub async fn ensure_topology(
        &self,
        identity: &DatabaseIdentity,
    ) -> Result<Topology, AdminError> {
        let instance = self
            .ensure_instance(&InstanceSpec::for_emulator(identity))
            .await?;
        let database = self.ensure_database(identity).await?;
        Ok(Topology { instance, database })
    }
}

/// Map a create result onto [`Provisioned`], absorbing duplicates.
fn swallow_already_exists(result: Result<(), AdminError>) -> Result<Provisioned, AdminError> {
    match result {
        Ok(()) => Ok(Provisioned::Created),
        Err(AdminError::AlreadyExists { resource }) => {
            tracing::debug!(resource, "Resource already exists, skipping create");
            Ok(Provisioned::AlreadyExisted)
        }
        Err(err) => Err(err),
    }
}
