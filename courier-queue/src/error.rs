//! Error types for producer operations.

use courier_redis::RedisError;
use thiserror::Error;

/// Result type for producer operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Producer errors.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The secure random source could not produce a job id
    #[error("Job id generation failed: {0}")]
    Identifier(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Store client error
    #[error("Store error: {0}")]
    Store(#[from] RedisError),

    /// Redis error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl QueueError {
    /// Whether the error came from the store rather than from this producer.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Redis(_))
    }
}
