//! Error types for the NATS worker.
//!
//! Processors report failures as a [`ProcessingError`] tagged with an
//! [`ErrorCategory`]. The worker turns the category and the delivery count
//! into a [`Disposition`]: redeliver later, or dead-letter and terminate.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error categories determine what happens to a failed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Temporary failure (upstream unavailable, publish failed).
    /// Nak with exponential backoff until `max_deliver` is reached.
    Transient,

    /// Redelivery cannot help (malformed payload, unknown discriminant).
    /// Dead-letter and terminate on first failure.
    Permanent,
}

impl ErrorCategory {
    /// Base backoff delay in milliseconds.
    pub fn base_backoff_ms(&self) -> u64 {
        match self {
            ErrorCategory::Transient => 1000, // 1s
            ErrorCategory::Permanent => 0,
        }
    }

    /// Maximum backoff delay in milliseconds.
    pub fn max_backoff_ms(&self) -> u64 {
        match self {
            ErrorCategory::Transient => 60_000, // 1 min
            ErrorCategory::Permanent => 0,
        }
    }

    /// Backoff delay for the given number of previous deliveries.
    pub fn backoff_delay_ms(&self, previous_deliveries: u64) -> u64 {
        if *self == ErrorCategory::Permanent {
            return 0;
        }

        let exponent = u32::try_from(previous_deliveries).unwrap_or(u32::MAX);
        let delay = self
            .base_backoff_ms()
            .saturating_mul(2u64.saturating_pow(exponent));
        delay.min(self.max_backoff_ms())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Permanent => "permanent",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the worker does with a message whose processing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Nak with the given delay so JetStream redelivers it.
    Retry(Duration),
    /// Copy to the dead-letter stream, then terminate.
    DeadLetter,
}

impl Disposition {
    /// Decide the fate of a failed message.
    ///
    /// `delivery_count` is 1 on the first delivery. A transient failure on the
    /// last allowed delivery is dead-lettered rather than nak'd. A
    /// non-positive `max_deliver` means unlimited redelivery.
    pub fn for_failure(category: ErrorCategory, delivery_count: u64, max_deliver: i64) -> Self {
        match category {
            ErrorCategory::Permanent => Disposition::DeadLetter,
            ErrorCategory::Transient => {
                let exhausted = max_deliver > 0 && delivery_count >= max_deliver as u64;
                if exhausted {
                    Disposition::DeadLetter
                } else {
                    let previous = delivery_count.saturating_sub(1);
                    Disposition::Retry(Duration::from_millis(category.backoff_delay_ms(previous)))
                }
            }
        }
    }
}

/// Error returned by a [`crate::MessageProcessor`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{category} error: {message}")]
pub struct ProcessingError {
    message: String,
    category: ErrorCategory,
}

impl ProcessingError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category,
        }
    }

    /// Create a transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Transient, message)
    }

    /// Create a permanent error.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Permanent, message)
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error that can occur in NATS worker operations.
#[derive(Debug, Error)]
pub enum NatsError {
    /// NATS connection error
    #[error("NATS connection error: {0}")]
    Connection(#[from] async_nats::ConnectError),

    /// JetStream error
    #[error("JetStream error: {0}")]
    JetStream(String),

    /// Consumer error
    #[error("Consumer error: {0}")]
    Consumer(String),

    /// Publish error
    #[error("Publish error: {0}")]
    Publish(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NatsError {
    /// Create a JetStream error from an async_nats error.
    pub fn from_jetstream_error(error: impl std::fmt::Display) -> Self {
        Self::JetStream(error.to_string())
    }

    /// Create a publish error.
    pub fn publish_error(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Create a consumer error.
    pub fn consumer_error(msg: impl Into<String>) -> Self {
        Self::Consumer(msg.into())
    }
}
