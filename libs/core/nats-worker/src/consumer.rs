//! NATS JetStream pull consumer.

use crate::config::WorkerConfig;
use crate::error::NatsError;
use async_nats::jetstream::consumer::pull::Config as ConsumerConfig;
use async_nats::jetstream::consumer::{AckPolicy, Consumer};
use async_nats::jetstream::stream::Config as JetStreamConfig;
use async_nats::jetstream::{AckKind, Context};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A raw message as seen by a processor: subject, payload and delivery metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub subject: String,
    pub payload: Vec<u8>,
    /// Stream sequence number.
    pub sequence: u64,
    /// Number of delivery attempts, 1 on first delivery.
    pub delivery_count: u64,
}

impl InboundMessage {
    pub fn new(subject: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
            sequence: 0,
            delivery_count: 1,
        }
    }

    /// Check if this is a redelivery.
    pub fn is_redelivery(&self) -> bool {
        self.delivery_count > 1
    }
}

/// Consumer for receiving messages from NATS JetStream.
pub struct NatsConsumer {
    jetstream: Arc<Context>,
    consumer: Consumer<ConsumerConfig>,
    config: WorkerConfig,
}

impl NatsConsumer {
    /// Ensure the stream and durable consumer exist and bind to the consumer.
    pub async fn connect(jetstream: Arc<Context>, config: WorkerConfig) -> Result<Self, NatsError> {
        ensure_stream(&jetstream, &config).await?;
        let consumer = ensure_consumer(&jetstream, &config).await?;

        Ok(Self {
            jetstream,
            consumer,
            config,
        })
    }

    /// Get the stream name.
    pub fn stream_name(&self) -> &str {
        &self.config.stream_name
    }

    /// Get the consumer name.
    pub fn consumer_name(&self) -> &str {
        &self.config.consumer_name
    }

    /// Fetch a batch of messages.
    ///
    /// Returns an empty batch when nothing arrives before the fetch timeout.
    pub async fn fetch(&self, batch_size: usize) -> Result<Vec<NatsMessage>, NatsError> {
        let mut messages = self
            .consumer
            .fetch()
            .max_messages(batch_size)
            .expires(self.config.fetch_timeout)
            .messages()
            .await
            .map_err(NatsError::from_jetstream_error)?;

        let mut result = Vec::new();

        while let Some(msg) = messages.next().await {
            match msg {
                Ok(message) => {
                    let (sequence, delivery_count) = match message.info() {
                        Ok(info) => (info.stream_sequence, info.delivered.max(1) as u64),
                        Err(e) => {
                            warn!(error = %e, "Failed to get message info, using defaults");
                            (0, 1)
                        }
                    };

                    let inbound = InboundMessage {
                        subject: message.subject.to_string(),
                        payload: message.payload.to_vec(),
                        sequence,
                        delivery_count,
                    };

                    result.push(NatsMessage { inbound, message });
                }
                Err(e) => {
                    warn!(error = %e, "Error receiving message");
                }
            }
        }

        Ok(result)
    }

    /// Get stream info.
    pub async fn stream_info(&self) -> Result<StreamInfo, NatsError> {
        stream_info(&self.jetstream, &self.config.stream_name).await
    }
}

async fn ensure_stream(jetstream: &Context, config: &WorkerConfig) -> Result<(), NatsError> {
    match jetstream.get_stream(&config.stream_name).await {
        Ok(_) => {
            debug!(stream = %config.stream_name, "Stream already exists");
            Ok(())
        }
        Err(_) => {
            info!(
                stream = %config.stream_name,
                subjects = ?config.subjects,
                "Creating stream"
            );

            jetstream
                .create_stream(JetStreamConfig {
                    name: config.stream_name.clone(),
                    subjects: config.subjects.clone(),
                    max_messages: 100_000,
                    max_age: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
                    ..Default::default()
                })
                .await
                .map_err(NatsError::from_jetstream_error)?;

            info!(stream = %config.stream_name, "Stream created");
            Ok(())
        }
    }
}

async fn ensure_consumer(
    jetstream: &Context,
    config: &WorkerConfig,
) -> Result<Consumer<ConsumerConfig>, NatsError> {
    let stream = jetstream
        .get_stream(&config.stream_name)
        .await
        .map_err(NatsError::from_jetstream_error)?;

    match stream
        .get_consumer::<ConsumerConfig>(&config.consumer_name)
        .await
    {
        Ok(consumer) => {
            debug!(consumer = %config.consumer_name, "Consumer already exists");
            Ok(consumer)
        }
        Err(_) => {
            info!(
                consumer = %config.consumer_name,
                stream = %config.stream_name,
                max_deliver = config.max_deliver,
                "Creating consumer"
            );

            let consumer = stream
                .create_consumer(ConsumerConfig {
                    durable_name: Some(config.consumer_name.clone()),
                    name: Some(config.consumer_name.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: config.ack_wait,
                    max_deliver: config.max_deliver,
                    ..Default::default()
                })
                .await
                .map_err(NatsError::from_jetstream_error)?;

            info!(consumer = %config.consumer_name, "Consumer created");
            Ok(consumer)
        }
    }
}

pub(crate) async fn stream_info(jetstream: &Context, name: &str) -> Result<StreamInfo, NatsError> {
    let mut stream = jetstream
        .get_stream(name)
        .await
        .map_err(NatsError::from_jetstream_error)?;

    let info = stream.info().await.map_err(NatsError::from_jetstream_error)?;

    Ok(StreamInfo {
        stream_name: name.to_string(),
        messages: info.state.messages,
        bytes: info.state.bytes,
        first_sequence: info.state.first_sequence,
        last_sequence: info.state.last_sequence,
        consumer_count: info.state.consumer_count as i64,
    })
}

/// A message received from NATS with its raw handle for ack/nak/term.
pub struct NatsMessage {
    pub inbound: InboundMessage,
    message: async_nats::jetstream::Message,
}

impl NatsMessage {
    /// Acknowledge the message (successful processing).
    pub async fn ack(self) -> Result<(), NatsError> {
        self.message
            .ack()
            .await
            .map_err(|e| NatsError::consumer_error(e.to_string()))
    }

    /// Negative acknowledge with delay.
    pub async fn nak_with_delay(self, delay: Duration) -> Result<(), NatsError> {
        self.message
            .ack_with(AckKind::Nak(Some(delay)))
            .await
            .map_err(|e| NatsError::consumer_error(e.to_string()))
    }

    /// Mark as permanently failed (won't be redelivered).
    pub async fn term(self) -> Result<(), NatsError> {
        self.message
            .ack_with(AckKind::Term)
            .await
            .map_err(|e| NatsError::consumer_error(e.to_string()))
    }
}

/// Stream information.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub stream_name: String,
    pub messages: u64,
    pub bytes: u64,
    pub first_sequence: u64,
    pub last_sequence: u64,
    pub consumer_count: i64,
}
