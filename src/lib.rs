// Courier - a Sidekiq-compatible background job producer for Rust
//
// This library turns job requests into Redis records that a separate
// worker process picks up, over direct or sentinel-managed Redis.

// Re-export the producer
pub use courier_queue::*;

// Re-export the store client
pub use courier_redis;

/// Prelude for common imports.
pub mod prelude {
    pub use courier_queue::prelude::*;
    pub use courier_redis::{ClientOptions, StoreClient, TlsSettings, Topology};
}
