//! # Courier Redis
//!
//! Redis store client used by the Courier job producer.
//!
//! ## Features
//!
//! - **Two topologies**: a fixed server address, or a sentinel set that
//!   reports the current master
//! - **Connection Pooling**: bounded pool of multiplexed connections via bb8
//! - **Optional TLS**: applied the same way to either topology
//! - **Lazy connect**: building a client never touches the network
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_redis::{ClientOptions, StoreClient, Topology};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ClientOptions::new(Topology::sentinel(
//!         vec!["localhost:26379".into(), "localhost:26380".into()],
//!         "mymaster",
//!     ))
//!     .with_pool_size(10);
//!
//!     let client = StoreClient::new(options)?;
//!     let mut conn = client.get().await?;
//!
//!     let _: () = redis::cmd("SET")
//!         .arg("key")
//!         .arg("value")
//!         .query_async(&mut *conn)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod manager;

pub use client::{PoolStats, StoreClient, StoreConnection, StorePool};
pub use config::{ClientOptions, TlsSettings, Topology, join_host_port, secs_serde};
pub use error::{RedisError, Result};
pub use manager::StoreConnectionManager;

// Re-export redis crate for convenience
pub use redis;
pub use redis::AsyncCommands;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::client::{StoreClient, StoreConnection};
    pub use crate::config::{ClientOptions, TlsSettings, Topology};
    pub use crate::error::{RedisError, Result};
    pub use redis::AsyncCommands;
}
