//! MongoDB client handle.

use std::sync::Arc;
use std::time::Duration;

use bson::{Document, doc};
use mongodb::{Client, Database};
use tracing::{debug, info};

use crate::collection::Collection;
use crate::config::MduConfig;
use crate::context::OpContext;
use crate::driver::MongoDriver;
use crate::error::{MduError, MduResult};
use crate::model::Model;

/// A connected client bound to one database.
///
/// The driver pools connections internally; clones share the pool. Build one
/// at startup and pass it (or the collections it hands out) to whatever needs
/// persistence.
#[derive(Clone)]
pub struct MduClient {
    client: Client,
    database: Database,
    config: Arc<MduConfig>,
}

impl MduClient {
    /// Create a client from configuration.
    pub async fn new(config: MduConfig) -> MduResult<Self> {
        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| MduError::config(format!("failed to create client: {}", e)))?;

        let database = client.database(&config.database);

        info!(
            uri = %config.uri,
            database = %config.database,
            "MongoDB client created"
        );

        Ok(Self {
            client,
            database,
            config: Arc::new(config),
        })
    }

    /// Create a builder for the client.
    pub fn builder() -> MduClientBuilder {
        MduClientBuilder::new()
    }

    /// Models of type `M` stored in collection `name`.
    pub fn collection<M: Model>(&self, name: &str) -> Collection<M> {
        Collection::new(MongoDriver::new(self.database.collection::<Document>(name)))
    }

    /// Models of type `M` in the collection named by [`Model::collection_name`].
    pub fn collection_for<M: Model>(&self) -> Collection<M> {
        self.collection(&M::collection_name())
    }

    /// The selected database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &MduConfig {
        &self.config
    }

    /// A context bounded by the configured default timeout.
    pub fn ctx(&self) -> OpContext {
        self.config.ctx()
    }

    /// Round-trip a `ping` to the server.
    pub async fn ping(&self, ctx: &OpContext) -> MduResult<()> {
        ctx.run(async {
            self.database
                .run_command(doc! { "ping": 1 }, None)
                .await
                .map_err(MduError::from)
        })
        .await?;
        Ok(())
    }

    /// Drop a collection and everything in it.
    pub async fn drop_collection(&self, ctx: &OpContext, name: &str) -> MduResult<()> {
        debug!(collection = %name, "Dropping collection");
        ctx.run(async {
            self.database
                .collection::<Document>(name)
                .drop(None)
                .await
                .map_err(MduError::from)
        })
        .await
    }
}

impl std::fmt::Debug for MduClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MduClient")
            .field("database", &self.config.database)
            .finish_non_exhaustive()
    }
}

/// Builder for [`MduClient`].
#[derive(Debug, Default)]
pub struct MduClientBuilder {
    uri: Option<String>,
    database: Option<String>,
    app_name: Option<String>,
    max_pool_size: Option<u32>,
    connect_timeout: Option<Duration>,
    direct_connection: Option<bool>,
    ctx_timeout: Option<Duration>,
}

impl MduClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.direct_connection = Some(enabled);
        self
    }

    /// Set the default context timeout.
    pub fn ctx_timeout(mut self, timeout: Duration) -> Self {
        self.ctx_timeout = Some(timeout);
        self
    }

    fn into_config(self) -> MduResult<MduConfig> {
        let mut builder = MduConfig::builder();

        if let Some(uri) = self.uri {
            builder = builder.uri(uri);
        }
        if let Some(database) = self.database {
            builder = builder.database(database);
        }
        if let Some(app_name) = self.app_name {
            builder = builder.app_name(app_name);
        }
        if let Some(max_pool) = self.max_pool_size {
            builder = builder.max_pool_size(max_pool);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(direct) = self.direct_connection {
            builder = builder.direct_connection(direct);
        }
        if let Some(timeout) = self.ctx_timeout {
            builder = builder.ctx_timeout(timeout);
        }

        builder.build()
    }

    /// Build the client.
    pub async fn build(self) -> MduResult<MduClient> {
        MduClient::new(self.into_config()?).await
    }
}
