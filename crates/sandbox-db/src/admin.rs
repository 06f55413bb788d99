//! Administrative RPC surface: instance creation, database creation, DDL.
//!
//! [`AdminApi`] is the seam the provisioner is written against. The
//! production implementation, [`SpannerAdmin`], wraps the Spanner admin
//! client and turns every long-running operation into a single awaited call
//! that returns only once the operation has completed.

use std::future::Future;

use google_cloud_gax::conn::Environment;
use google_cloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, UpdateDatabaseDdlRequest,
};
use google_cloud_googleapis::spanner::admin::instance::v1::{CreateInstanceRequest, Instance};
use google_cloud_spanner::admin::AdminClientConfig;
use google_cloud_spanner::admin::client::Client as AdminClient;
use sandbox_types::{DatabaseIdentity, ServiceEndpoint};

use crate::ddl;
use crate::error::{AdminError, DbError};

/// Instance configuration name the emulator accepts.
pub const EMULATOR_INSTANCE_CONFIG: &str = "emulator-config";

/// Display name given to instances created by the sandbox.
const DEFAULT_DISPLAY_NAME: &str = "Sample Instance";

/// Everything needed to create an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSpec {
    /// `projects/{p}`
    pub parent: String,
    /// Bare instance id.
    pub instance_id: String,
    /// `projects/{p}/instances/{i}`
    pub name: String,
    /// `projects/{p}/instanceConfigs/{config}`
    pub config: String,
    /// Human readable name.
    pub display_name: String,
    /// Number of nodes. The emulator ignores this but requires it set.
    pub node_count: i32,
}

impl InstanceSpec {
    /// Minimal single-node spec on the emulator instance config.
    pub fn for_emulator(identity: &DatabaseIdentity) -> Self {
        Self {
            parent: identity.project_path(),
            instance_id: identity.instance().to_string(),
            name: identity.instance_path(),
            config: identity.instance_config_path(EMULATOR_INSTANCE_CONFIG),
            display_name: DEFAULT_DISPLAY_NAME.to_owned(),
            node_count: 1,
        }
    }
}

/// Administrative operations, each awaited until the server-side operation
/// has finished.
///
/// Implementations must report a duplicate create as
/// [`AdminError::AlreadyExists`] and every other failure as
/// [`AdminError::Rpc`].
pub trait AdminApi {
    /// Create an instance and wait for the operation to complete.
    fn create_instance(
        &self,
        spec: &InstanceSpec,
    ) -> impl Future<Output = Result<(), AdminError>> + Send;

    /// Create a database inside an existing instance and wait for completion.
    fn create_database(
        &self,
        identity: &DatabaseIdentity,
    ) -> impl Future<Output = Result<(), AdminError>> + Send;
}

/// [`AdminApi`] backed by the Spanner admin gRPC client.
pub struct SpannerAdmin {
    client: AdminClient,
}

impl SpannerAdmin {
    /// Connect the admin client to an emulator endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connect`] if the gRPC channel cannot be created.
    pub async fn connect(endpoint: &ServiceEndpoint) -> Result<Self, DbError> {
        let config = AdminClientConfig {
            environment: Environment::Emulator(endpoint.to_string()),
            ..Default::default()
        };
        let client = AdminClient::new(config).await?;
        tracing::debug!(%endpoint, "Connected Spanner admin client");
        Ok(Self { client })
    }

    /// Apply DDL statements to a database and wait for them to take effect.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rpc`] if the request is rejected or the operation
    /// finishes with an error (e.g. malformed DDL).
    pub async fn update_ddl(
        &self,
        identity: &DatabaseIdentity,
        statements: Vec<String>,
    ) -> Result<(), DbError> {
        let count = statements.len();
        let request = UpdateDatabaseDdlRequest {
            database: identity.database_path(),
            statements,
            ..Default::default()
        };
        let mut operation = self
            .client
            .database()
            .update_database_ddl(request, None)
            .await?;
        operation.wait(None).await?;
        tracing::debug!(database = %identity, statements = count, "Applied DDL");
        Ok(())
    }
}

impl AdminApi for SpannerAdmin {
    async fn create_instance(&self, spec: &InstanceSpec) -> Result<(), AdminError> {
        let request = CreateInstanceRequest {
            parent: spec.parent.clone(),
            instance_id: spec.instance_id.clone(),
            instance: Some(Instance {
                name: spec.name.clone(),
                config: spec.config.clone(),
                display_name: spec.display_name.clone(),
                node_count: spec.node_count,
                ..Default::default()
            }),
        };

        let mut operation = self
            .client
            .instance()
            .create_instance(request, None)
            .await
            .map_err(|status| AdminError::from_status(&spec.name, status))?;
        operation
            .wait(None)
            .await
            .map_err(|status| AdminError::from_status(&spec.name, status))?;
        Ok(())
    }

    async fn create_database(&self, identity: &DatabaseIdentity) -> Result<(), AdminError> {
        let name = identity.database_path();
        let request = CreateDatabaseRequest {
            parent: identity.instance_path(),
            create_statement: ddl::create_database(identity.database()),
            ..Default::default()
        };

        let mut operation = self
            .client
            .database()
            .create_database(request, None)
            .await
            .map_err(|status| AdminError::from_status(&name, status))?;
        operation
            .wait(None)
            .await
            .map_err(|status| AdminError::from_status(&name, status))?;
        Ok(())
    }
}
