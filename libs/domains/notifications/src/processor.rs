//! Broker boundary: runs the router for each message and reports the
//! failure category back to the worker, which decides ack, nak or term.

use crate::error::DispatchError;
use crate::handlers::NotificationHandlers;
use crate::routes::EventRoute;
use async_trait::async_trait;
use metrics::{counter, histogram};
use nats_worker::{InboundMessage, MessageProcessor, ProcessingError};
use std::time::Instant;
use tracing::{error, info};

pub struct NotificationProcessor {
    handlers: NotificationHandlers,
}

impl NotificationProcessor {
    pub fn new(handlers: NotificationHandlers) -> Self {
        Self { handlers }
    }

    pub fn handlers(&self) -> &NotificationHandlers {
        &self.handlers
    }
}

impl From<DispatchError> for ProcessingError {
    fn from(err: DispatchError) -> Self {
        ProcessingError::new(err.category(), err.to_string())
    }
}

/// Label for metrics. Arbitrary subjects are collapsed so the label set stays bounded.
fn subject_label(subject: &str) -> &'static str {
    EventRoute::from_subject(subject)
        .map(|route| route.subject())
        .unwrap_or("unknown")
}

#[async_trait]
impl MessageProcessor for NotificationProcessor {
    async fn process(&self, message: &InboundMessage) -> Result<(), ProcessingError> {
        let subject = subject_label(&message.subject);
        counter!("dispatcher_events_received_total", "subject" => subject).increment(1);

        let start = Instant::now();
        let result = self
            .handlers
            .dispatch(&message.subject, &message.payload)
            .await;
        histogram!("dispatcher_event_duration_seconds", "subject" => subject)
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                counter!(
                    "dispatcher_events_handled_total",
                    "subject" => subject,
                    "outcome" => outcome.as_str()
                )
                .increment(1);
                info!(
                    subject = %message.subject,
                    sequence = message.sequence,
                    outcome = outcome.as_str(),
                    "Event handled"
                );
                Ok(())
            }
            Err(err) => {
                let category = err.category();
                counter!(
                    "dispatcher_events_failed_total",
                    "subject" => subject,
                    "category" => category.as_str()
                )
                .increment(1);
                error!(
                    subject = %message.subject,
                    sequence = message.sequence,
                    delivery_count = message.delivery_count,
                    kind = err.kind(),
                    category = %category,
                    error = %err,
                    "Event handling failed"
                );
                Err(err.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "notification_dispatcher"
    }
}
