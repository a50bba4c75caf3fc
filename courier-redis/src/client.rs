//! Pooled store client.

use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::info;

use crate::{ClientOptions, RedisError, Result, StoreConnectionManager, TlsSettings, Topology};

/// Type alias for the connection pool.
pub type StorePool = Pool<StoreConnectionManager>;

/// A pooled Redis connection.
pub struct StoreConnection<'a> {
    conn: PooledConnection<'a, StoreConnectionManager>,
}

impl<'a> StoreConnection<'a> {
    /// Create a new connection wrapper.
    pub fn new(conn: PooledConnection<'a, StoreConnectionManager>) -> Self {
        Self { conn }
    }
}

impl<'a> Deref for StoreConnection<'a> {
    type Target = MultiplexedConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<'a> DerefMut for StoreConnection<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

/// Shared handle to a pool of Redis connections.
///
/// Cloning is cheap and every clone draws from the same pool, so one client
/// can back several producers and consumers. Building a client never touches
/// the network: connections are opened on first use and connection errors
/// surface there.
#[derive(Clone)]
pub struct StoreClient {
    options: Arc<ClientOptions>,
    pool: StorePool,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Create a client for the given options.
    pub fn new(options: ClientOptions) -> Result<Self> {
        if options.pool_size == 0 {
            return Err(RedisError::Config("pool size must be at least 1".into()));
        }
        if options.connection_timeout.is_zero() {
            return Err(RedisError::Config("connection timeout must be non-zero".into()));
        }

        let manager = StoreConnectionManager::new(options.clone());
        // Multiplexed connections are long-lived, so no reaper task is needed.
        let pool = Pool::builder()
            .max_size(options.pool_size)
            .connection_timeout(options.connection_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .build_unchecked(manager);

        info!(
            topology = options.topology.kind(),
            pool_size = options.pool_size,
            tls = options.tls.is_some(),
            "Store client prepared"
        );

        Ok(Self {
            options: Arc::new(options),
            pool,
        })
    }

    /// Get the client options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Get the connection topology.
    pub fn topology(&self) -> &Topology {
        &self.options.topology
    }

    /// Maximum pooled connections.
    pub fn pool_size(&self) -> u32 {
        self.options.pool_size
    }

    /// Transport security, if configured.
    pub fn tls(&self) -> Option<&TlsSettings> {
        self.options.tls.as_ref()
    }

    /// Whether the primary is discovered through sentinels.
    pub fn is_failover(&self) -> bool {
        self.options.topology.is_failover()
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &StorePool {
        &self.pool
    }

    /// Get a connection from the pool, waiting for one to free up if all
    /// are in use.
    pub async fn get(&self) -> Result<StoreConnection<'_>> {
        let conn = self.pool.get().await?;
        Ok(StoreConnection::new(conn))
    }

    /// Check if the connection is healthy.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| RedisError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Get pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }
}

/// Connection pool statistics.
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Total connections.
    pub connections: u32,
    /// Idle connections.
    pub idle_connections: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_is_lazy() {
        // Nothing listens here; construction must still succeed.
        let client = StoreClient::new(ClientOptions::new(Topology::server("127.0.0.1:1"))).unwrap();

        assert_eq!(client.pool_size(), 1);
        assert_eq!(client.pool_stats().connections, 0);
    }

    #[tokio::test]
    async fn test_zero_pool_size_rejected() {
        let options = ClientOptions::new(Topology::server("localhost:6379")).with_pool_size(0);
        assert!(matches!(StoreClient::new(options), Err(RedisError::Config(_))));
    }

    #[tokio::test]
    async fn test_clones_share_pool() {
        let client = StoreClient::new(
            ClientOptions::new(Topology::server("localhost:6379")).with_pool_size(8),
        )
        .unwrap();
        let other = client.clone();

        assert_eq!(other.pool_size(), 8);
        assert!(Arc::ptr_eq(&client.options, &other.options));
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_health_check() {
        let client = StoreClient::new(ClientOptions::new(Topology::server("localhost:6379"))).unwrap();
        client.health_check().await.unwrap();
    }
}
