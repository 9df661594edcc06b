//! Connection and operation configuration.

use std::env;
use std::time::Duration;

use mongodb::options::{ClientOptions, SelectionCriteria};

use crate::context::OpContext;
use crate::error::{MduError, MduResult};

/// Environment variable holding the connection URI.
pub const ENV_URI: &str = "MDU_URI";
/// Environment variable holding the database name.
pub const ENV_DATABASE: &str = "MDU_DATABASE";
/// Environment variable holding the default context timeout in milliseconds.
pub const ENV_CTX_TIMEOUT_MS: &str = "MDU_CTX_TIMEOUT_MS";

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_APP_NAME: &str = "mdu";
const DEFAULT_CTX_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct MduConfig {
    /// MongoDB connection URI.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout.
    pub server_selection_timeout: Option<Duration>,
    /// Read preference.
    pub read_preference: Option<ReadPreference>,
    /// Retry writes.
    pub retry_writes: Option<bool>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
    /// Bound for contexts made by [`MduConfig::ctx`].
    pub ctx_timeout: Duration,
}

/// Read preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPreference {
    /// Read from primary only.
    #[default]
    Primary,
    /// Read from primary preferred, fallback to secondary.
    PrimaryPreferred,
    /// Read from secondary only.
    Secondary,
    /// Read from secondary preferred, fallback to primary.
    SecondaryPreferred,
    /// Read from nearest member.
    Nearest,
}

impl From<ReadPreference> for mongodb::options::ReadPreference {
    fn from(pref: ReadPreference) -> Self {
        use mongodb::options::ReadPreference as Driver;

        match pref {
            ReadPreference::Primary => Driver::Primary,
            ReadPreference::PrimaryPreferred => Driver::PrimaryPreferred {
                options: Default::default(),
            },
            ReadPreference::Secondary => Driver::Secondary {
                options: Default::default(),
            },
            ReadPreference::SecondaryPreferred => Driver::SecondaryPreferred {
                options: Default::default(),
            },
            ReadPreference::Nearest => Driver::Nearest {
                options: Default::default(),
            },
        }
    }
}

impl Default for MduConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: String::new(),
            app_name: Some(DEFAULT_APP_NAME.to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            read_preference: Some(ReadPreference::Primary),
            retry_writes: Some(true),
            direct_connection: None,
            ctx_timeout: DEFAULT_CTX_TIMEOUT,
        }
    }
}

impl MduConfig {
    /// Configuration for `database` at `uri`, everything else default.
    pub fn from_uri(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Read `MDU_URI`, `MDU_DATABASE` and `MDU_CTX_TIMEOUT_MS`.
    ///
    /// Only the database is required.
    pub fn from_env() -> MduResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MduResult<Self> {
        let mut builder = Self::builder();

        if let Some(uri) = lookup(ENV_URI) {
            builder = builder.uri(uri);
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            builder = builder.database(database);
        }
        if let Some(raw) = lookup(ENV_CTX_TIMEOUT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                MduError::config(format!("{ENV_CTX_TIMEOUT_MS} must be milliseconds, got {raw:?}"))
            })?;
            builder = builder.ctx_timeout(Duration::from_millis(millis));
        }

        builder.build()
    }

    /// Create a builder for configuration.
    pub fn builder() -> MduConfigBuilder {
        MduConfigBuilder::new()
    }

    /// A fresh context bounded by [`ctx_timeout`](Self::ctx_timeout).
    pub fn ctx(&self) -> OpContext {
        OpContext::with_timeout(self.ctx_timeout)
    }

    /// Convert to the driver's client options.
    pub async fn to_client_options(&self) -> MduResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| MduError::config(format!("failed to parse URI: {}", e)))?;

        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(min_pool) = self.min_pool_size {
            options.min_pool_size = Some(min_pool);
        }
        if let Some(max_pool) = self.max_pool_size {
            options.max_pool_size = Some(max_pool);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            options.connect_timeout = Some(connect_timeout);
        }
        if let Some(selection_timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(selection_timeout);
        }
        if let Some(pref) = self.read_preference {
            options.selection_criteria = Some(SelectionCriteria::ReadPreference(pref.into()));
        }
        if let Some(retry_writes) = self.retry_writes {
            options.retry_writes = Some(retry_writes);
        }
        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }

        Ok(options)
    }
}

/// Builder for [`MduConfig`].
#[derive(Debug, Default)]
pub struct MduConfigBuilder {
    uri: Option<String>,
    database: Option<String>,
    app_name: Option<String>,
    min_pool_size: Option<u32>,
    max_pool_size: Option<u32>,
    connect_timeout: Option<Duration>,
    server_selection_timeout: Option<Duration>,
    read_preference: Option<ReadPreference>,
    retry_writes: Option<bool>,
    direct_connection: Option<bool>,
    ctx_timeout: Option<Duration>,
}

impl MduConfigBuilder {
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

    /// Set the minimum pool size.
    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.min_pool_size = Some(size);
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

    /// Set the server selection timeout.
    pub fn server_selection_timeout(mut self, duration: Duration) -> Self {
        self.server_selection_timeout = Some(duration);
        self
    }

    /// Set the read preference.
    pub fn read_preference(mut self, pref: ReadPreference) -> Self {
        self.read_preference = Some(pref);
        self
    }

    /// Enable or disable retry writes.
    pub fn retry_writes(mut self, enabled: bool) -> Self {
        self.retry_writes = Some(enabled);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.direct_connection = Some(enabled);
        self
    }

    /// Set the bound for contexts made by [`MduConfig::ctx`].
    pub fn ctx_timeout(mut self, timeout: Duration) -> Self {
        self.ctx_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> MduResult<MduConfig> {
        let database = self
            .database
            .filter(|name| !name.is_empty())
            .ok_or_else(|| MduError::config("database name is required"))?;

        Ok(MduConfig {
            uri: self.uri.unwrap_or_else(|| DEFAULT_URI.to_string()),
            database,
            app_name: self.app_name.or(Some(DEFAULT_APP_NAME.to_string())),
            min_pool_size: self.min_pool_size,
            max_pool_size: self.max_pool_size.or(Some(10)),
            connect_timeout: self.connect_timeout.or(Some(Duration::from_secs(10))),
            server_selection_timeout: self
                .server_selection_timeout
                .or(Some(Duration::from_secs(30))),
            read_preference: self.read_preference.or(Some(ReadPreference::Primary)),
            retry_writes: self.retry_writes.or(Some(true)),
            direct_connection: self.direct_connection,
            ctx_timeout: self.ctx_timeout.unwrap_or(DEFAULT_CTX_TIMEOUT),
        })
    }
}
