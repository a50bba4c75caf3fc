//! Store client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::{RedisError, Result};

/// How the client locates the Redis primary.
///
/// Exactly one topology is ever active; the loose "server address or
/// sentinel list" form accepted at the configuration surface is resolved
/// into this enum before any client is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    /// A single server at a fixed `host:port` address.
    Server {
        /// Server address (`host:port`).
        addr: String,
    },
    /// A high-availability deployment discovered through sentinels.
    Sentinel {
        /// Sentinel addresses (`host:port`), tried in order.
        addrs: Vec<String>,
        /// Name of the monitored master.
        master_name: String,
    },
}

impl Topology {
    /// Direct topology.
    pub fn server(addr: impl Into<String>) -> Self {
        Self::Server { addr: addr.into() }
    }

    /// Sentinel topology.
    pub fn sentinel(addrs: Vec<String>, master_name: impl Into<String>) -> Self {
        Self::Sentinel {
            addrs,
            master_name: master_name.into(),
        }
    }

    /// Whether the primary is discovered through sentinels.
    pub fn is_failover(&self) -> bool {
        matches!(self, Self::Sentinel { .. })
    }

    /// Short label for log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Server { .. } => "server",
            Self::Sentinel { .. } => "sentinel",
        }
    }
}

/// Transport security settings.
///
/// Carried as `Option<TlsSettings>`: `None` means plain TCP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSettings {
    /// Skip certificate verification.
    #[serde(default)]
    pub insecure: bool,
}

impl TlsSettings {
    /// Verified TLS.
    pub fn new() -> Self {
        Self::default()
    }

    /// TLS without certificate verification.
    pub fn insecure() -> Self {
        Self { insecure: true }
    }
}

/// Options used to build a [`StoreClient`](crate::StoreClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Connection topology.
    pub topology: Topology,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// Transport security, if any.
    #[serde(default)]
    pub tls: Option<TlsSettings>,
    /// Username for Redis 6+ ACL.
    #[serde(default)]
    pub username: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
    /// Database number.
    #[serde(default)]
    pub database: Option<u8>,
    /// How long a pool checkout waits for a connection.
    #[serde(with = "secs_serde", default = "default_connection_timeout")]
    pub connection_timeout: Duration,
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(5)
}

impl ClientOptions {
    /// Create options for the given topology with a single pooled connection.
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            pool_size: 1,
            tls: None,
            username: None,
            password: None,
            database: None,
            connection_timeout: default_connection_timeout(),
        }
    }

    /// Set the pool size.
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the transport security settings.
    pub fn with_tls(mut self, tls: Option<TlsSettings>) -> Self {
        self.tls = tls;
        self
    }

    /// Set ACL credentials.
    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    /// Set the database number.
    pub fn with_database(mut self, database: Option<u8>) -> Self {
        self.database = database;
        self
    }

    /// Set the pool checkout timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    fn scheme(&self) -> &'static str {
        if self.tls.is_some() {
            "rediss"
        } else {
            "redis"
        }
    }

    fn base_url(&self, addr: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}://{}/", self.scheme(), addr))
            .map_err(|e| RedisError::Config(format!("invalid address '{}': {}", addr, e)))?;
        if matches!(&self.tls, Some(tls) if tls.insecure) {
            url.set_fragment(Some("insecure"));
        }
        Ok(url)
    }

    /// URL for a data connection to `addr`, with auth and database applied.
    ///
    /// Credentials are percent-encoded, so they may contain any character.
    pub fn connection_url(&self, addr: &str) -> Result<String> {
        let mut url = self.base_url(addr)?;
        let invalid = || RedisError::Config(format!("address '{}' cannot carry credentials", addr));

        if let Some(username) = &self.username {
            url.set_username(username).map_err(|_| invalid())?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password)).map_err(|_| invalid())?;
        }
        if let Some(db) = self.database {
            url.set_path(&db.to_string());
        }

        Ok(url.into())
    }

    /// URL for a sentinel connection to `addr`.
    ///
    /// Sentinels share the transport security of the data connection but
    /// not its credentials or database.
    pub fn sentinel_url(&self, addr: &str) -> Result<String> {
        Ok(self.base_url(addr)?.into())
    }
}

/// Join a host and port into an address, bracketing IPv6 hosts.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Serializes a [`Duration`] as whole seconds.
pub mod secs_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
