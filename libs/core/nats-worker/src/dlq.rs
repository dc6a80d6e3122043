//! Dead Letter Queue management for NATS.

use crate::consumer::{stream_info, InboundMessage, StreamInfo};
use crate::error::{ErrorCategory, NatsError};
use async_nats::jetstream::stream::Config as JetStreamConfig;
use async_nats::jetstream::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Manager for Dead Letter Queue operations.
pub struct DlqManager {
    jetstream: Arc<Context>,
    dlq_stream: String,
}

impl DlqManager {
    /// Create a new DLQ manager.
    pub fn new(jetstream: Arc<Context>, dlq_stream: &str) -> Self {
        Self {
            jetstream,
            dlq_stream: dlq_stream.to_string(),
        }
    }

    /// Subject that dead letters are published to.
    pub fn subject(&self) -> String {
        dlq_subject(&self.dlq_stream)
    }

    /// Ensure the DLQ stream exists.
    pub async fn ensure_stream(&self) -> Result<(), NatsError> {
        match self.jetstream.get_stream(&self.dlq_stream).await {
            Ok(_) => {
                debug!(stream = %self.dlq_stream, "DLQ stream already exists");
                Ok(())
            }
            Err(_) => {
                info!(stream = %self.dlq_stream, "Creating DLQ stream");

                self.jetstream
                    .create_stream(JetStreamConfig {
                        name: self.dlq_stream.clone(),
                        subjects: vec![format!("{}.>", self.dlq_stream.to_lowercase())],
                        max_messages: 10_000,
                        max_age: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
                        ..Default::default()
                    })
                    .await
                    .map_err(NatsError::from_jetstream_error)?;

                info!(stream = %self.dlq_stream, "DLQ stream created");
                Ok(())
            }
        }
    }

    /// Copy a failed message to the DLQ.
    pub async fn move_to_dlq(
        &self,
        message: &InboundMessage,
        error: &str,
        category: ErrorCategory,
    ) -> Result<u64, NatsError> {
        let entry = DlqEntry::new(message, error, category);
        let payload = serde_json::to_vec(&entry)?;

        let ack = self
            .jetstream
            .publish(self.subject(), payload.into())
            .await
            .map_err(|e| NatsError::publish_error(e.to_string()))?
            .await
            .map_err(|e| NatsError::publish_error(e.to_string()))?;

        debug!(
            subject = %message.subject,
            original_sequence = message.sequence,
            dlq_sequence = ack.sequence,
            "Moved message to DLQ"
        );

        Ok(ack.sequence)
    }

    /// Get DLQ stream info.
    pub async fn stream_info(&self) -> Result<StreamInfo, NatsError> {
        stream_info(&self.jetstream, &self.dlq_stream).await
    }
}

fn dlq_subject(dlq_stream: &str) -> String {
    format!("{}.failed", dlq_stream.to_lowercase())
}

/// Entry stored in the Dead Letter Queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqEntry {
    /// Subject the message arrived on
    pub subject: String,
    /// Original payload, lossily decoded as UTF-8
    pub payload: String,
    /// Error message that caused the failure
    pub error: String,
    /// `transient` or `permanent`
    pub category: String,
    /// Original stream sequence number
    pub original_sequence: u64,
    /// Delivery attempts when the message was dead-lettered
    pub delivery_count: u64,
    /// When the message was dead-lettered
    pub failed_at: chrono::DateTime<Utc>,
}

impl DlqEntry {
    pub fn new(message: &InboundMessage, error: &str, category: ErrorCategory) -> Self {
        Self {
            subject: message.subject.clone(),
            payload: String::from_utf8_lossy(&message.payload).into_owned(),
            error: error.to_string(),
            category: category.to_string(),
            original_sequence: message.sequence,
            delivery_count: message.delivery_count,
            failed_at: Utc::now(),
        }
    }
}
