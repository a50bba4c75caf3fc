//! Producer configuration and its resolution into a ready store client.

use crate::error::{QueueError, QueueResult};
use courier_redis::{ClientOptions, StoreClient, TlsSettings, Topology, secs_serde};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Separator appended to a non-empty namespace.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Pool size used when none is configured.
pub const DEFAULT_POOL_SIZE: u32 = 1;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Producer configuration as supplied by the application.
///
/// This is the loose form: either `server_addr` or `sentinel_addrs` plus
/// `master_name` must be set, and zero values mean "use the default".
/// [`Options::resolve`] validates it into [`ResolvedOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Direct server address (`host:port`).
    pub server_addr: String,

    /// Comma-delimited sentinel addresses.
    pub sentinel_addrs: String,

    /// Sentinel master name.
    pub master_name: String,

    /// Identifies this producer instance; must be unique and non-empty.
    pub process_id: String,

    /// Connection pool size (0 = default of 1).
    pub pool_size: u32,

    /// Transport security for whichever topology is built.
    pub tls: Option<TlsSettings>,

    /// Key prefix isolating this deployment.
    pub namespace: String,

    /// Consumer poll interval (zero = default of 15 seconds).
    #[serde(with = "secs_serde")]
    pub poll_interval: Duration,

    /// Username for Redis 6+ ACL.
    pub username: Option<String>,

    /// Password.
    pub password: Option<String>,

    /// Database number.
    pub database: Option<u8>,
}

impl Options {
    /// Create a builder.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> OptionsBuilder {
        let mut builder = OptionsBuilder::new();

        if let Ok(addr) = std::env::var("COURIER_SERVER_ADDR") {
            builder = builder.server_addr(addr);
        }

        if let Ok(addrs) = std::env::var("COURIER_SENTINEL_ADDRS") {
            builder = builder.sentinel_addrs(addrs);
        }

        if let Ok(name) = std::env::var("COURIER_MASTER_NAME") {
            builder = builder.master_name(name);
        }

        if let Ok(id) = std::env::var("COURIER_PROCESS_ID") {
            builder = builder.process_id(id);
        }

        if let Ok(pool_size) = std::env::var("COURIER_POOL_SIZE")
            && let Ok(size) = pool_size.parse() {
                builder = builder.pool_size(size);
            }

        if let Ok(namespace) = std::env::var("COURIER_NAMESPACE") {
            builder = builder.namespace(namespace);
        }

        if let Ok(interval) = std::env::var("COURIER_POLL_INTERVAL")
            && let Ok(secs) = interval.parse() {
                builder = builder.poll_interval(Duration::from_secs(secs));
            }

        if let Ok(username) = std::env::var("COURIER_USERNAME") {
            builder = builder.username(username);
        }

        if let Ok(password) = std::env::var("COURIER_PASSWORD") {
            builder = builder.password(password);
        }

        if let Ok(db) = std::env::var("COURIER_DATABASE")
            && let Ok(db_num) = db.parse() {
                builder = builder.database(db_num);
            }

        if std::env::var("COURIER_TLS").is_ok() {
            builder = builder.tls(TlsSettings {
                insecure: std::env::var("COURIER_TLS_INSECURE").is_ok(),
            });
        }

        builder
    }

    /// Sentinel addresses parsed from the comma-delimited list, in order.
    pub fn sentinel_addr_list(&self) -> Vec<String> {
        self.sentinel_addrs
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(String::from)
            .collect()
    }

    /// Resolve into a connected store client and derived settings.
    pub fn resolve(self) -> QueueResult<ResolvedOptions> {
        let topology = self.topology()?;
        let settings = self.settings()?;

        let client_options = ClientOptions::new(topology)
            .with_pool_size(settings.pool_size)
            .with_tls(self.tls)
            .with_credentials(self.username, self.password)
            .with_database(self.database);
        let client = StoreClient::new(client_options)?;

        Ok(settings.into_resolved(client))
    }

    /// Resolve around an existing client, which may be shared with other
    /// producers or consumers. Topology, pool, TLS and auth settings are
    /// taken from the client and ignored here.
    pub fn resolve_with_client(self, client: StoreClient) -> QueueResult<ResolvedOptions> {
        let settings = self.settings()?;
        Ok(settings.into_resolved(client))
    }

    fn topology(&self) -> QueueResult<Topology> {
        let server_addr = self.server_addr.trim();
        let sentinel_addrs = self.sentinel_addr_list();
        let master_name = self.master_name.trim();

        match (server_addr.is_empty(), sentinel_addrs.is_empty()) {
            (false, false) => Err(QueueError::Config(
                "server_addr and sentinel_addrs are mutually exclusive".into(),
            )),
            (false, true) => Ok(Topology::server(server_addr)),
            (true, false) if master_name.is_empty() => Err(QueueError::Config(
                "sentinel_addrs requires a master_name".into(),
            )),
            (true, false) => Ok(Topology::sentinel(sentinel_addrs, master_name)),
            (true, true) => Err(QueueError::Config(
                "configuration requires either server_addr or sentinel_addrs".into(),
            )),
        }
    }

    fn settings(&self) -> QueueResult<Settings> {
        if self.process_id.is_empty() {
            return Err(QueueError::Config(
                "configuration requires a process_id, which uniquely identifies this instance"
                    .into(),
            ));
        }

        let pool_size = if self.pool_size == 0 {
            DEFAULT_POOL_SIZE
        } else {
            self.pool_size
        };

        let poll_interval = if self.poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            self.poll_interval
        };

        Ok(Settings {
            namespace: normalize_namespace(&self.namespace),
            process_id: self.process_id.clone(),
            pool_size,
            poll_interval,
        })
    }
}

/// Validated settings shared by both resolution paths.
struct Settings {
    namespace: String,
    process_id: String,
    pool_size: u32,
    poll_interval: Duration,
}

impl Settings {
    fn into_resolved(self, client: StoreClient) -> ResolvedOptions {
        info!(
            process_id = %self.process_id,
            namespace = %self.namespace,
            topology = client.topology().kind(),
            pool_size = client.pool_size(),
            "Producer options resolved"
        );

        ResolvedOptions {
            client,
            namespace: self.namespace,
            process_id: self.process_id,
            poll_interval: self.poll_interval,
        }
    }
}

/// Append the namespace separator once; leave an empty namespace empty.
pub fn normalize_namespace(namespace: &str) -> String {
    if namespace.is_empty() || namespace.ends_with(NAMESPACE_SEPARATOR) {
        namespace.to_string()
    } else {
        format!("{}{}", namespace, NAMESPACE_SEPARATOR)
    }
}

/// Validated producer settings with a ready store client.
///
/// Immutable once built; clones share the same client pool.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    client: StoreClient,
    namespace: String,
    process_id: String,
    poll_interval: Duration,
}

impl ResolvedOptions {
    /// The pooled store client.
    pub fn client(&self) -> &StoreClient {
        &self.client
    }

    /// Normalized namespace (empty, or ending in the separator).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Process identifier.
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// Consumer poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Maximum pooled connections.
    pub fn pool_size(&self) -> u32 {
        self.client.pool_size()
    }
}

/// Builder for [`Options`].
#[derive(Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the direct server address.
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.options.server_addr = addr.into();
        self
    }

    /// Set the comma-delimited sentinel addresses.
    pub fn sentinel_addrs(mut self, addrs: impl Into<String>) -> Self {
        self.options.sentinel_addrs = addrs.into();
        self
    }

    /// Set the sentinel master name.
    pub fn master_name(mut self, name: impl Into<String>) -> Self {
        self.options.master_name = name.into();
        self
    }

    /// Set the process identifier.
    pub fn process_id(mut self, id: impl Into<String>) -> Self {
        self.options.process_id = id.into();
        self
    }

    /// Set the pool size.
    pub fn pool_size(mut self, size: u32) -> Self {
        self.options.pool_size = size;
        self
    }

    /// Enable transport security.
    pub fn tls(mut self, tls: TlsSettings) -> Self {
        self.options.tls = Some(tls);
        self
    }

    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.options.namespace = namespace.into();
        self
    }

    /// Set the poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Set the username (Redis 6+ ACL).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.options.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.options.password = Some(password.into());
        self
    }

    /// Set the database number.
    pub fn database(mut self, db: u8) -> Self {
        self.options.database = Some(db);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Options {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct() -> OptionsBuilder {
        Options::builder().server_addr("localhost:6379").process_id("1")
    }

    #[tokio::test]
    async fn test_pool_size_defaults_to_one() {
        let opts = direct().build().resolve().unwrap();
        assert_eq!(opts.pool_size(), 1);

        let opts = direct().pool_size(20).build().resolve().unwrap();
        assert_eq!(opts.pool_size(), 20);
    }

    #[tokio::test]
    async fn test_tls_config() {
        let opts = direct().pool_size(20).build().resolve().unwrap();
        assert!(opts.client().tls().is_none());

        let opts = direct()
            .tls(TlsSettings::insecure())
            .build()
            .resolve()
            .unwrap();
        assert_eq!(opts.client().tls(), Some(&TlsSettings::insecure()));
    }

    #[tokio::test]
    async fn test_process_id_is_kept() {
        let opts = direct().build().resolve().unwrap();
        assert_eq!(opts.process_id(), "1");

        let opts = direct().process_id("2").build().resolve().unwrap();
        assert_eq!(opts.process_id(), "2");
    }

    #[tokio::test]
    async fn test_requires_topology() {
        let err = Options::builder().process_id("2").build().resolve().unwrap_err();
        assert!(matches!(err, QueueError::Config(_)));
    }

    #[tokio::test]
    async fn test_rejects_both_topologies() {
        let err = direct()
            .sentinel_addrs("localhost:26379")
            .master_name("mymaster")
            .build()
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[tokio::test]
    async fn test_requires_process_id() {
        let err = Options::builder()
            .server_addr("localhost:6379")
            .build()
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("process_id"));

        let err = Options::builder().build().resolve().unwrap_err();
        assert!(matches!(err, QueueError::Config(_)));
    }

    #[tokio::test]
    async fn test_namespace_separator() {
        let opts = direct().build().resolve().unwrap();
        assert_eq!(opts.namespace(), "");

        let opts = direct().namespace("prod").build().resolve().unwrap();
        assert_eq!(opts.namespace(), "prod:");

        let opts = direct().namespace("prod:").build().resolve().unwrap();
        assert_eq!(opts.namespace(), "prod:");
    }

    #[tokio::test]
    async fn test_poll_interval_default() {
        let opts = direct().build().resolve().unwrap();
        assert_eq!(opts.poll_interval(), Duration::from_secs(15));

        let opts = direct()
            .poll_interval(Duration::from_secs(1))
            .build()
            .resolve()
            .unwrap();
        assert_eq!(opts.poll_interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_sentinel_config() {
        let opts = Options::builder()
            .sentinel_addrs("localhost:26379,localhost:46379")
            .master_name("123")
            .process_id("1")
            .poll_interval(Duration::from_secs(1))
            .build()
            .resolve()
            .unwrap();

        assert!(opts.client().is_failover());
        assert_eq!(
            opts.client().topology(),
            &Topology::sentinel(
                vec!["localhost:26379".into(), "localhost:46379".into()],
                "123"
            )
        );
        assert!(opts.client().tls().is_none());
    }

    #[tokio::test]
    async fn test_sentinel_config_tls() {
        let opts = Options::builder()
            .sentinel_addrs("localhost:26379,localhost:46379")
            .master_name("123")
            .process_id("1")
            .tls(TlsSettings::new())
            .build()
            .resolve()
            .unwrap();

        assert!(opts.client().is_failover());
        assert_eq!(opts.client().tls(), Some(&TlsSettings::new()));
    }

    #[tokio::test]
    async fn test_sentinel_config_no_master() {
        let err = Options::builder()
            .sentinel_addrs("localhost:26379,localhost:46379")
            .process_id("1")
            .build()
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("master_name"));
    }

    #[test]
    fn test_sentinel_addr_list_parsing() {
        let options = Options::builder()
            .sentinel_addrs(" a:26379, ,b:26379 ,")
            .build();
        assert_eq!(options.sentinel_addr_list(), vec!["a:26379", "b:26379"]);
    }

    #[tokio::test]
    async fn test_resolve_with_client() {
        let client = StoreClient::new(
            ClientOptions::new(Topology::server("localhost:6379")).with_pool_size(5),
        )
        .unwrap();

        let opts = Options::builder()
            .process_id("shared")
            .namespace("jobs")
            .build()
            .resolve_with_client(client)
            .unwrap();

        assert_eq!(opts.pool_size(), 5);
        assert_eq!(opts.namespace(), "jobs:");
        assert_eq!(opts.poll_interval(), DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test]
    async fn test_resolve_with_client_requires_process_id() {
        let client = StoreClient::new(ClientOptions::new(Topology::server("localhost:6379"))).unwrap();
        let err = Options::default().resolve_with_client(client).unwrap_err();
        assert!(matches!(err, QueueError::Config(_)));
    }

    // The only test touching COURIER_* variables, so nothing races on them.
    #[tokio::test]
    async fn test_from_env() {
        use std::env;

        const VARS: [&str; 8] = [
            "COURIER_SENTINEL_ADDRS",
            "COURIER_MASTER_NAME",
            "COURIER_PROCESS_ID",
            "COURIER_POOL_SIZE",
            "COURIER_POLL_INTERVAL",
            "COURIER_DATABASE",
            "COURIER_TLS",
            "COURIER_TLS_INSECURE",
        ];

        unsafe {
            env::set_var("COURIER_SENTINEL_ADDRS", "10.0.0.1:26379, 10.0.0.2:26379");
            env::set_var("COURIER_MASTER_NAME", "mymaster");
            env::set_var("COURIER_PROCESS_ID", "worker-7");
            env::set_var("COURIER_POOL_SIZE", "8");
            env::set_var("COURIER_POLL_INTERVAL", "3");
            env::set_var("COURIER_DATABASE", "not-a-number");
            env::set_var("COURIER_TLS", "");
            env::set_var("COURIER_TLS_INSECURE", "1");
        }

        let options = Options::from_env().build();
        assert_eq!(options.sentinel_addr_list(), vec!["10.0.0.1:26379", "10.0.0.2:26379"]);
        assert_eq!(options.master_name, "mymaster");
        assert_eq!(options.process_id, "worker-7");
        assert_eq!(options.pool_size, 8);
        assert_eq!(options.poll_interval, Duration::from_secs(3));
        assert_eq!(options.database, None);
        assert_eq!(options.tls, Some(TlsSettings::insecure()));

        unsafe {
            env::remove_var("COURIER_TLS_INSECURE");
            env::set_var("COURIER_POOL_SIZE", "many");
        }
        let options = Options::from_env().build();
        assert_eq!(options.tls, Some(TlsSettings::new()));
        assert_eq!(options.pool_size, 0);

        unsafe {
            env::remove_var("COURIER_TLS");
        }
        let resolved = Options::from_env().build().resolve().unwrap();
        assert!(resolved.client().is_failover());
        assert!(resolved.client().tls().is_none());
        assert_eq!(resolved.pool_size(), DEFAULT_POOL_SIZE);

        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: Options = serde_json::from_str(
            r#"{"server_addr": "localhost:6379", "process_id": "7", "poll_interval": 3}"#,
        )
        .unwrap();

        assert_eq!(options.server_addr, "localhost:6379");
        assert_eq!(options.poll_interval, Duration::from_secs(3));
        assert_eq!(options.pool_size, 0);
        assert!(options.tls.is_none());
    }
}
