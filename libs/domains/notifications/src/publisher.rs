//! Hand-off of built envelopes to the outbound subject.

use crate::envelope::NotificationEnvelope;
use async_trait::async_trait;
use nats_worker::NatsProducer;
use thiserror::Error;
use tracing::info;

/// Subject consumed by the email renderer.
pub const DEFAULT_NOTIFICATIONS_SUBJECT: &str = "notifications.email";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to publish notification to '{subject}': {message}")]
pub struct PublishError {
    pub subject: String,
    pub message: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, envelope: &NotificationEnvelope) -> Result<(), PublishError>;
}

/// Publishes to JetStream and waits for the server ack. Never retries; the
/// broker redelivers the inbound event instead.
#[derive(Clone)]
pub struct JetStreamPublisher {
    producer: NatsProducer,
}

impl JetStreamPublisher {
    pub fn new(producer: NatsProducer) -> Self {
        Self { producer }
    }

    pub fn subject(&self) -> &str {
        self.producer.subject()
    }
}

#[async_trait]
impl NotificationPublisher for JetStreamPublisher {
    async fn publish(&self, envelope: &NotificationEnvelope) -> Result<(), PublishError> {
        let sequence = self
            .producer
            .send(envelope)
            .await
            .map_err(|e| PublishError {
                subject: self.producer.subject().to_string(),
                message: e.to_string(),
            })?;

        info!(
            subject = %self.producer.subject(),
            sequence,
            template = %envelope.email_message_type(),
            recipients = envelope.email_addresses().len(),
            "Notification published"
        );
        Ok(())
    }
}
