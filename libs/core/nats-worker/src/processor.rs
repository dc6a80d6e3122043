//! Processor trait for message execution.

use crate::consumer::InboundMessage;
use crate::error::ProcessingError;
use async_trait::async_trait;

/// Message processor trait.
///
/// The worker hands every fetched message to the processor and settles it
/// from the result:
///
/// * `Ok(())` - ack
/// * `Err` with [`crate::ErrorCategory::Transient`] - nak with backoff, dead-letter once
///   `max_deliver` is reached
/// * `Err` with [`crate::ErrorCategory::Permanent`] - dead-letter and term
#[async_trait]
pub trait MessageProcessor: Send + Sync + 'static {
    /// Process one message.
    async fn process(&self, message: &InboundMessage) -> Result<(), ProcessingError>;

    /// Used for logging and metrics labels.
    fn name(&self) -> &'static str;
}
