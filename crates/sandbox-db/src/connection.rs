//! Scoped connection to a single Spanner database.
//!
//! A [`Connection`] bundles the data client (session pool, transactions,
//! queries) with the admin client used for DDL, both pointed at the same
//! emulator endpoint. It is opened for one block of work and closed at the
//! end of that block, whether the block succeeded or not.

use google_cloud_gax::conn::Environment;
use google_cloud_spanner::client::{Client, ClientConfig};
use sandbox_types::{DatabaseIdentity, ServiceEndpoint};

use crate::admin::SpannerAdmin;
use crate::error::DbError;

/// Open data and admin clients bound to one database.
pub struct Connection {
    identity: DatabaseIdentity,
    client: Client,
    admin: SpannerAdmin,
}

impl Connection {
    /// Open a connection to `identity` on the emulator at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connect`] if the admin channel cannot be opened or
    /// [`DbError::Spanner`] if the session pool cannot be created.
    pub async fn open(
        identity: &DatabaseIdentity,
        endpoint: &ServiceEndpoint,
    ) -> Result<Self, DbError> {
        let config = ClientConfig {
            environment: Environment::Emulator(endpoint.to_string()),
            ..Default::default()
        };
        // Admin first: once the data client exists its sessions must be
        // closed explicitly.
        let admin = SpannerAdmin::connect(endpoint).await?;
        let client = Client::new(identity.database_path(), config).await?;

        tracing::info!(database = %identity, %endpoint, "Opened Spanner connection");

        Ok(Self {
            identity: identity.clone(),
            client,
            admin,
        })
    }

    /// Open a connection, run `body` with it, and close it afterwards.
    ///
    /// The connection is closed before the result of `body` is returned,
    /// including when `body` fails.
    ///
    /// # Errors
    ///
    /// Returns the error from opening the connection, or whatever `body`
    /// returns.
    pub async fn scoped<T, E, F>(
        identity: &DatabaseIdentity,
        endpoint: &ServiceEndpoint,
        body: F,
    ) -> Result<T, E>
    where
        F: AsyncFnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        let connection = Self::open(identity, endpoint).await?;
        let result = body(&connection).await;
        connection.close().await;
        result
    }

    /// Database this connection is bound to.
    pub const fn identity(&self) -> &DatabaseIdentity {
        &self.identity
    }

    /// Data client for transactions and queries.
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Admin client for DDL on this database.
    pub const fn admin(&self) -> &SpannerAdmin {
        &self.admin
    }

    /// Delete the pooled sessions and drop both clients.
    pub async fn close(self) {
        self.client.close().await;
        tracing::info!(database = %self.identity, "Closed Spanner connection");
    }
}
