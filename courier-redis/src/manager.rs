//! bb8 connection manager for direct and sentinel topologies.

use redis::Value;
use redis::aio::MultiplexedConnection;
use tracing::{debug, warn};

use crate::{ClientOptions, RedisError, Result, Topology, join_host_port};

/// Role a node must report before the pool accepts a connection to it.
const MASTER_ROLE: &str = "master";

/// Opens multiplexed connections to the current Redis primary.
///
/// With a sentinel topology the primary is looked up on every new
/// connection, so a failover is picked up as soon as the pool replaces a
/// broken connection. A node a sentinel reports is only used once it
/// answers `ROLE` as a master; stale sentinels are skipped.
#[derive(Debug, Clone)]
pub struct StoreConnectionManager {
    options: ClientOptions,
}

impl StoreConnectionManager {
    /// Create a manager for the given options.
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }

    /// The options this manager connects with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    async fn open(&self, addr: &str) -> Result<MultiplexedConnection> {
        let client = redis::Client::open(self.options.connection_url(addr)?)
            .map_err(|e| RedisError::Connection(e.to_string()))?;
        client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RedisError::Connection(e.to_string()))
    }

    async fn connect_via_sentinels(
        &self,
        addrs: &[String],
        master_name: &str,
    ) -> Result<MultiplexedConnection> {
        for sentinel in addrs {
            let master = match self.query_sentinel(sentinel, master_name).await {
                Ok(Some((host, port))) => join_host_port(&host, port),
                Ok(None) => {
                    debug!(sentinel = %sentinel, master = %master_name, "Sentinel does not know master");
                    continue;
                }
                Err(e) => {
                    warn!(sentinel = %sentinel, error = %e, "Sentinel unreachable, trying next");
                    continue;
                }
            };

            let mut conn = match self.open(&master).await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(sentinel = %sentinel, addr = %master, error = %e, "Reported master unreachable, trying next");
                    continue;
                }
            };

            match query_role(&mut conn).await {
                Ok(role) if role == MASTER_ROLE => {
                    debug!(sentinel = %sentinel, master = %master_name, addr = %master, "Resolved master");
                    return Ok(conn);
                }
                Ok(role) => {
                    warn!(sentinel = %sentinel, addr = %master, role = %role, "Reported master is not a master, trying next");
                }
                Err(e) => {
                    warn!(sentinel = %sentinel, addr = %master, error = %e, "Role check failed, trying next");
                }
            }
        }

        Err(RedisError::Sentinel(format!(
            "no sentinel in [{}] reported a reachable master '{}'",
            addrs.join(","),
            master_name
        )))
    }

    async fn query_sentinel(&self, addr: &str, master_name: &str) -> Result<Option<(String, u16)>> {
        let client = redis::Client::open(self.options.sentinel_url(addr)?)
            .map_err(|e| RedisError::Connection(e.to_string()))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RedisError::Connection(e.to_string()))?;

        let reply: Option<(String, u16)> = redis::cmd("SENTINEL")
            .arg("get-master-addr-by-name")
            .arg(master_name)
            .query_async(&mut conn)
            .await?;
        Ok(reply)
    }
}

async fn query_role(conn: &mut MultiplexedConnection) -> Result<String> {
    let reply: Vec<Value> = redis::cmd("ROLE").query_async(conn).await?;
    parse_role(&reply)
}

/// Extract the role name from a `ROLE` reply.
fn parse_role(reply: &[Value]) -> Result<String> {
    match reply.first() {
        Some(Value::BulkString(bytes)) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        Some(Value::SimpleString(role)) => Ok(role.clone()),
        other => Err(RedisError::UnexpectedReply(format!("ROLE returned {:?}", other))),
    }
}

impl bb8::ManageConnection for StoreConnectionManager {
    type Connection = MultiplexedConnection;
    type Error = RedisError;

    async fn connect(&self) -> Result<Self::Connection> {
        match &self.options.topology {
            Topology::Server { addr } => self.open(addr).await,
            Topology::Sentinel { addrs, master_name } => {
                self.connect_via_sentinels(addrs, master_name).await
            }
        }
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<()> {
        let pong: String = redis::cmd("PING").query_async(conn).await?;
        match pong.as_str() {
            "PONG" => Ok(()),
            other => Err(RedisError::UnexpectedReply(other.to_string())),
        }
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb8::ManageConnection;

    #[tokio::test]
    async fn test_empty_sentinel_list_fails() {
        let manager = StoreConnectionManager::new(ClientOptions::new(Topology::sentinel(
            Vec::new(),
            "mymaster",
        )));

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, RedisError::Sentinel(_)));
        assert!(err.to_string().contains("mymaster"));
    }

    #[tokio::test]
    async fn test_unreachable_sentinels_are_skipped() {
        let manager = StoreConnectionManager::new(ClientOptions::new(Topology::sentinel(
            vec!["127.0.0.1:1".into(), "127.0.0.1:2".into()],
            "mymaster",
        )));

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, RedisError::Sentinel(_)));
        assert!(err.to_string().contains("127.0.0.1:1,127.0.0.1:2"));
    }

    #[test]
    fn test_parse_master_role() {
        let reply = vec![
            Value::BulkString(b"master".to_vec()),
            Value::Int(3129659),
            Value::Array(vec![]),
        ];
        assert_eq!(parse_role(&reply).unwrap(), MASTER_ROLE);
    }

    #[test]
    fn test_parse_replica_role() {
        let reply = vec![
            Value::BulkString(b"slave".to_vec()),
            Value::BulkString(b"10.0.0.1".to_vec()),
            Value::Int(6379),
            Value::BulkString(b"connected".to_vec()),
            Value::Int(3129659),
        ];
        assert_ne!(parse_role(&reply).unwrap(), MASTER_ROLE);

        let reply = vec![Value::SimpleString("sentinel".into())];
        assert_eq!(parse_role(&reply).unwrap(), "sentinel");
    }

    #[test]
    fn test_parse_empty_role_reply() {
        assert!(matches!(parse_role(&[]), Err(RedisError::UnexpectedReply(_))));
    }
}
