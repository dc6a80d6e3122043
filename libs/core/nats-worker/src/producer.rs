//! NATS JetStream producer.

use crate::error::NatsError;
use async_nats::jetstream::Context;
use async_nats::jetstream::stream::Config as JetStreamConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Publishes JSON payloads to a single JetStream subject and waits for the
/// server ack.
#[derive(Clone)]
pub struct NatsProducer {
    jetstream: Arc<Context>,
    subject: String,
}

impl NatsProducer {
    /// Create a new NATS producer.
    pub fn new(jetstream: Context, subject: impl Into<String>) -> Self {
        Self::from_arc(Arc::new(jetstream), subject)
    }

    /// Create from an Arc (for sharing).
    pub fn from_arc(jetstream: Arc<Context>, subject: impl Into<String>) -> Self {
        Self {
            jetstream,
            subject: subject.into(),
        }
    }

    /// Get the subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Make sure a stream named `stream_name` captures this producer's subject.
    ///
    /// Without a capturing stream JetStream publishes fail with "no responders".
    pub async fn ensure_stream(&self, stream_name: &str) -> Result<(), NatsError> {
        if self.jetstream.get_stream(stream_name).await.is_ok() {
            debug!(stream = %stream_name, "Outbound stream already exists");
            return Ok(());
        }

        info!(stream = %stream_name, subject = %self.subject, "Creating outbound stream");
        self.jetstream
            .create_stream(JetStreamConfig {
                name: stream_name.to_string(),
                subjects: vec![self.subject.clone()],
                max_messages: 100_000,
                max_age: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
                ..Default::default()
            })
            .await
            .map_err(NatsError::from_jetstream_error)?;

        Ok(())
    }

    /// Serialize `value` and publish it.
    ///
    /// Returns the stream sequence number of the published message.
    pub async fn send<T: Serialize + ?Sized>(&self, value: &T) -> Result<u64, NatsError> {
        let payload = serde_json::to_vec(value)?;

        let ack = self
            .jetstream
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| NatsError::publish_error(e.to_string()))?
            .await
            .map_err(|e| NatsError::publish_error(e.to_string()))?;

        debug!(
            subject = %self.subject,
            stream = %ack.stream,
            sequence = ack.sequence,
            "Published message"
        );

        Ok(ack.sequence)
    }
}
