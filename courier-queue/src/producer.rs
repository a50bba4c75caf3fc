//! Producer: turns job requests into stored envelopes.

use crate::envelope::{EnqueueOptions, Envelope, epoch_seconds, now_seconds};
use crate::error::{QueueError, QueueResult};
use crate::jid::generate_jid;
use crate::options::{Options, ResolvedOptions};
use crate::store::{RedisStore, Store};
use chrono::{DateTime, Utc};
use courier_redis::StoreClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Enqueues jobs for a separate consumer process.
///
/// A job whose execution time is still in the future goes to the scheduled
/// set; anything due now goes straight onto its queue. The producer holds no
/// per-call state, so one instance can be shared across tasks.
///
/// # Examples
///
/// ```no_run
/// use courier_queue::*;
/// use serde_json::json;
/// use std::time::Duration;
///
/// # async fn example() -> QueueResult<()> {
/// let producer = Producer::new(
///     Options::builder()
///         .server_addr("localhost:6379")
///         .process_id("web-1")
///         .namespace("prod")
///         .build(),
/// )?;
///
/// let jid = producer
///     .enqueue("default", "SendEmail", json!({"to": "a@b.com"}))
///     .await?;
/// assert_eq!(jid.len(), 24);
///
/// producer
///     .enqueue_in("default", "Ping", Duration::from_secs(3600), ())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Producer {
    options: ResolvedOptions,
    store: Arc<dyn Store>,
}

impl Producer {
    /// Create a producer with its own store client.
    pub fn new(options: Options) -> QueueResult<Self> {
        Ok(Self::from_resolved(options.resolve()?))
    }

    /// Create a producer around an existing client, e.g. one shared with
    /// other producers or consumers.
    pub fn with_redis_client(options: Options, client: StoreClient) -> QueueResult<Self> {
        Ok(Self::from_resolved(options.resolve_with_client(client)?))
    }

    /// Create a producer writing to the Redis store of resolved options.
    pub fn from_resolved(options: ResolvedOptions) -> Self {
        let store = RedisStore::new(options.client().clone(), options.namespace());
        Self::with_store(options, Arc::new(store))
    }

    /// Create a producer writing to an arbitrary store.
    pub fn with_store(options: ResolvedOptions, store: Arc<dyn Store>) -> Self {
        Self { options, store }
    }

    /// Get the store client.
    pub fn client(&self) -> &StoreClient {
        self.options.client()
    }

    /// Get the resolved options.
    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// Enqueue a job to run now. The envelope carries no `at`.
    pub async fn enqueue<A: Serialize>(
        &self,
        queue: &str,
        class: &str,
        args: A,
    ) -> QueueResult<String> {
        self.enqueue_with_options(queue, class, args, EnqueueOptions::new())
            .await
    }

    /// Enqueue a job to run after `delay`.
    pub async fn enqueue_in<A: Serialize>(
        &self,
        queue: &str,
        class: &str,
        delay: Duration,
        args: A,
    ) -> QueueResult<String> {
        self.enqueue_in_with_options(queue, class, delay, args, EnqueueOptions::new())
            .await
    }

    /// Enqueue a job to run after `delay`, replacing `options.at`.
    pub async fn enqueue_in_with_options<A: Serialize>(
        &self,
        queue: &str,
        class: &str,
        delay: Duration,
        args: A,
        options: EnqueueOptions,
    ) -> QueueResult<String> {
        let now = now_seconds();
        let options = options.at_seconds(now + delay.as_secs_f64());
        self.dispatch(now, queue, class, args, options).await
    }

    /// Enqueue a job to run at `at`.
    pub async fn enqueue_at<A: Serialize>(
        &self,
        queue: &str,
        class: &str,
        at: DateTime<Utc>,
        args: A,
    ) -> QueueResult<String> {
        let options = EnqueueOptions::new().at_seconds(epoch_seconds(at));
        self.enqueue_with_options(queue, class, args, options).await
    }

    /// Enqueue a job with explicit options. An unset `at` means now.
    pub async fn enqueue_with_options<A: Serialize>(
        &self,
        queue: &str,
        class: &str,
        args: A,
        options: EnqueueOptions,
    ) -> QueueResult<String> {
        self.dispatch(now_seconds(), queue, class, args, options).await
    }

    /// Build, serialize and store one envelope, given the current time.
    ///
    /// `now < at` goes to the scheduled set; `now >= at` goes to the queue.
    /// Nothing is rolled back on failure.
    pub(crate) async fn dispatch<A: Serialize>(
        &self,
        now: f64,
        queue: &str,
        class: &str,
        args: A,
        options: EnqueueOptions,
    ) -> QueueResult<String> {
        let jid = generate_jid()?;
        let args =
            serde_json::to_value(args).map_err(|e| QueueError::Serialization(e.to_string()))?;

        let envelope = Envelope::build(queue, class, args, options, jid, now);
        let payload = envelope.to_json()?;
        let Envelope { jid, .. } = envelope;

        if now < options.at {
            self.store.insert_scheduled(options.at, payload).await?;
            debug!(jid = %jid, queue, class, at = options.at, "Job scheduled");
            return Ok(jid);
        }

        self.store.create_queue(queue).await?;
        self.store.push_immediate(queue, payload).await?;
        debug!(jid = %jid, queue, class, "Job enqueued");

        Ok(jid)
    }
}
