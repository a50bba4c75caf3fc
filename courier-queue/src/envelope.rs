//! Job envelope: the wire record shared with consumers.

use crate::error::{QueueError, QueueResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job arguments payload.
pub type JobArgs = serde_json::Value;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Seconds since the epoch with sub-second precision.
pub fn epoch_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / NANOS_PER_SECOND
}

/// Current wall-clock time as [`epoch_seconds`].
pub fn now_seconds() -> f64 {
    epoch_seconds(Utc::now())
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

/// Scheduling and retry options, flattened into the envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnqueueOptions {
    /// Retries already attempted
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub retry_count: u32,

    /// Whether the consumer may retry the job on failure
    #[serde(default, skip_serializing_if = "is_false")]
    pub retry: bool,

    /// Intended execution time in epoch seconds (0 = unset)
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub at: f64,
}

impl EnqueueOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable retries.
    pub fn with_retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    /// Set the retry count.
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Set the execution time in epoch seconds.
    pub fn at_seconds(mut self, at: f64) -> Self {
        self.at = at;
        self
    }

    /// Set the execution time.
    pub fn at(self, time: DateTime<Utc>) -> Self {
        self.at_seconds(epoch_seconds(time))
    }
}

/// A job record as stored and later read by a consumer.
///
/// Field names and omission rules are part of the wire contract:
/// `queue` is dropped when empty, and the [`EnqueueOptions`] fields sit
/// beside `class`/`args`/`jid` and are dropped when zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Queue name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub queue: String,

    /// Job class name
    pub class: String,

    /// Job arguments
    pub args: JobArgs,

    /// Job id
    pub jid: String,

    /// Creation time in epoch seconds
    pub enqueued_at: f64,

    /// Scheduling and retry options
    #[serde(flatten)]
    pub options: EnqueueOptions,
}

impl Envelope {
    /// Build an envelope. The job id and creation time are supplied by the
    /// caller so that construction itself is deterministic.
    pub fn build(
        queue: impl Into<String>,
        class: impl Into<String>,
        args: JobArgs,
        options: EnqueueOptions,
        jid: impl Into<String>,
        now: f64,
    ) -> Self {
        Self {
            queue: queue.into(),
            class: class.into(),
            args,
            jid: jid.into(),
            enqueued_at: now,
            options,
        }
    }

    /// Intended execution time in epoch seconds.
    pub fn at(&self) -> f64 {
        self.options.at
    }

    /// Serialize to the canonical wire form.
    pub fn to_json(&self) -> QueueResult<String> {
        serde_json::to_string(self).map_err(|e| QueueError::Serialization(e.to_string()))
    }

    /// Parse the wire form.
    pub fn from_json(json: &str) -> QueueResult<Self> {
        serde_json::from_str(json).map_err(|e| QueueError::Deserialization(e.to_string()))
    }
}
