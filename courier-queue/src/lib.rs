//! Sidekiq-compatible job producer for Courier.
//!
//! Turns a job request into a record in Redis that a separate worker
//! process picks up later:
//! - 🔌 Direct or sentinel topologies, optional TLS, pooled connections
//! - 🆔 Random 24-character hex job ids
//! - ⏰ Immediate, delayed and scheduled jobs
//! - 📦 Wire envelope compatible with Sidekiq-style consumers
//!
//! ## Configuration
//!
//! ```
//! use courier_queue::Options;
//! use std::time::Duration;
//!
//! let options = Options::builder()
//!     .sentinel_addrs("10.0.0.1:26379,10.0.0.2:26379")
//!     .master_name("mymaster")
//!     .process_id("api-1")
//!     .namespace("prod")
//!     .pool_size(10)
//!     .poll_interval(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(options.sentinel_addr_list().len(), 2);
//! ```
//!
//! ## Envelopes
//!
//! ```
//! use courier_queue::{EnqueueOptions, Envelope};
//! use serde_json::json;
//!
//! let envelope = Envelope::build(
//!     "default",
//!     "SendEmail",
//!     json!({"to": "a@b.com"}),
//!     EnqueueOptions::new().with_retry(true),
//!     "0123456789abcdef01234567",
//!     1_700_000_000.0,
//! );
//!
//! let wire = envelope.to_json().unwrap();
//! assert!(wire.contains("\"retry\":true"));
//! assert!(!wire.contains("\"at\""));
//! ```
//!
//! ## Enqueueing
//!
//! ```no_run
//! use courier_queue::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QueueError> {
//!     let producer = Producer::new(Options::from_env().build())?;
//!
//!     let jid = producer
//!         .enqueue("default", "SendEmail", json!({"to": "a@b.com"}))
//!         .await?;
//!     println!("enqueued {}", jid);
//!
//!     Ok(())
//! }
//! ```

pub mod envelope;
pub mod error;
pub mod jid;
pub mod options;
pub mod producer;
pub mod store;

pub use envelope::{EnqueueOptions, Envelope, JobArgs, epoch_seconds, now_seconds};
pub use error::{QueueError, QueueResult};
pub use jid::{generate_jid, is_valid_jid};
pub use options::{Options, OptionsBuilder, ResolvedOptions};
pub use producer::Producer;
pub use store::{RedisStore, Store};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::envelope::{EnqueueOptions, Envelope};
    pub use crate::error::{QueueError, QueueResult};
    pub use crate::options::{Options, ResolvedOptions};
    pub use crate::producer::Producer;
    pub use crate::store::Store;
}
