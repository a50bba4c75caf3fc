//! Store abstraction the producer writes through, and its Redis implementation.

use crate::error::QueueResult;
use async_trait::async_trait;
use courier_redis::{AsyncCommands, StoreClient};

/// Key of the set holding every known queue name.
pub const QUEUES_KEY: &str = "queues";

/// Key prefix of the per-queue ready lists.
pub const QUEUE_KEY_PREFIX: &str = "queue:";

/// Key of the sorted set holding scheduled jobs.
pub const SCHEDULE_KEY: &str = "schedule";

/// Storage operations the producer needs.
#[async_trait]
pub trait Store: Send + Sync {
    /// Register a queue. Succeeds if it already exists.
    async fn create_queue(&self, queue: &str) -> QueueResult<()>;

    /// Append a serialized envelope to a queue's ready list.
    async fn push_immediate(&self, queue: &str, payload: String) -> QueueResult<()>;

    /// Add a serialized envelope to the scheduled set, scored by `at`.
    async fn insert_scheduled(&self, at: f64, payload: String) -> QueueResult<()>;
}

/// Redis-backed store using the Sidekiq key layout.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: StoreClient,
    namespace: String,
}

impl RedisStore {
    /// Create a store. `namespace` is used verbatim as a key prefix and
    /// should already be normalized.
    pub fn new(client: StoreClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Get the underlying client.
    pub fn client(&self) -> &StoreClient {
        &self.client
    }

    /// Build a namespaced key.
    pub fn key(&self, suffix: &str) -> String {
        format!("{}{}", self.namespace, suffix)
    }

    /// Key of a queue's ready list.
    pub fn queue_key(&self, queue: &str) -> String {
        self.key(&format!("{}{}", QUEUE_KEY_PREFIX, queue))
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn create_queue(&self, queue: &str) -> QueueResult<()> {
        let mut conn = self.client.get().await?;
        let _: () = conn.sadd(self.key(QUEUES_KEY), queue).await?;
        Ok(())
    }

    async fn push_immediate(&self, queue: &str, payload: String) -> QueueResult<()> {
        let mut conn = self.client.get().await?;
        let _: () = conn.lpush(self.queue_key(queue), payload).await?;
        Ok(())
    }

    async fn insert_scheduled(&self, at: f64, payload: String) -> QueueResult<()> {
        let mut conn = self.client.get().await?;
        let _: () = conn.zadd(self.key(SCHEDULE_KEY), payload, at).await?;
        Ok(())
    }
}
