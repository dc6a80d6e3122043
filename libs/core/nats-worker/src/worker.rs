//! NATS JetStream worker loop.

use crate::config::WorkerConfig;
use crate::consumer::{NatsConsumer, NatsMessage, StreamInfo};
use crate::dlq::DlqManager;
use crate::error::{Disposition, NatsError, ProcessingError};
use crate::health::HealthState;
use crate::metrics::NatsMetrics;
use crate::processor::MessageProcessor;
use async_nats::jetstream::Context;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// NATS JetStream worker.
pub struct NatsWorker<P: MessageProcessor> {
    consumer: NatsConsumer,
    dlq: Arc<DlqManager>,
    processor: Arc<P>,
    config: WorkerConfig,
    metrics: Arc<NatsMetrics>,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    health: Option<HealthState>,
}

impl<P: MessageProcessor> NatsWorker<P> {
    /// Create a new NATS worker, provisioning the stream, consumer and DLQ stream.
    pub async fn new(
        jetstream: Context,
        processor: P,
        config: WorkerConfig,
    ) -> Result<Self, NatsError> {
        let jetstream = Arc::new(jetstream);
        let processor_name = processor.name();

        let consumer = NatsConsumer::connect(jetstream.clone(), config.clone()).await?;
        let dlq = Arc::new(DlqManager::new(jetstream.clone(), &config.dlq_stream));
        let metrics = Arc::new(NatsMetrics::new(&config.stream_name, processor_name));

        dlq.ensure_stream().await?;

        Ok(Self {
            consumer,
            dlq,
            processor: Arc::new(processor),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
            in_flight: Arc::new(AtomicUsize::new(0)),
            config,
            metrics,
            health: None,
        })
    }

    /// Report stream connectivity into a health server's state.
    pub fn with_health(mut self, health: HealthState) -> Self {
        self.health = Some(health);
        self
    }

    /// Run the worker loop until `shutdown_rx` flips to true.
    ///
    /// A batch that is already being processed runs to completion before the
    /// loop exits, so no fetched message is left unsettled.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), NatsError> {
        info!(
            stream = %self.config.stream_name,
            consumer = %self.config.consumer_name,
            max_concurrent = self.config.max_concurrent_jobs,
            max_deliver = self.config.max_deliver,
            "Starting NATS worker"
        );

        self.set_connected(true, None).await;

        loop {
            if *shutdown_rx.borrow() {
                info!("Shutdown signal received, stopping worker");
                break;
            }

            let messages = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        info!("Shutdown channel closed, stopping worker");
                        break;
                    }
                    continue;
                }
                fetched = self.consumer.fetch(self.config.batch_size) => fetched,
            };

            match messages {
                Ok(messages) => {
                    self.set_connected(true, None).await;
                    self.process_batch(messages).await;
                }
                Err(e) => {
                    error!(error = %e, "Error fetching batch");
                    self.set_connected(false, Some(e.to_string())).await;
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }

        info!("NATS worker stopped");
        Ok(())
    }

    async fn set_connected(&self, connected: bool, error: Option<String>) {
        if let Some(health) = &self.health {
            health.set_stream_connected(connected, error).await;
        }
    }

    /// Process a fetched batch, at most `max_concurrent_jobs` at a time.
    async fn process_batch(&self, messages: Vec<NatsMessage>) {
        if messages.is_empty() {
            return;
        }

        let mut join_set: JoinSet<()> = JoinSet::new();

        for message in messages {
            self.metrics.message_received();

            if message.inbound.is_redelivery() {
                debug!(
                    subject = %message.inbound.subject,
                    sequence = message.inbound.sequence,
                    delivery_count = message.inbound.delivery_count,
                    "Processing redelivered message"
                );
            }

            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(error = %e, "Concurrency semaphore closed");
                    break;
                }
            };

            let processor = self.processor.clone();
            let dlq = self.dlq.clone();
            let metrics = self.metrics.clone();
            let in_flight = self.in_flight.clone();
            let max_deliver = self.config.max_deliver;

            join_set.spawn(async move {
                metrics.in_flight(in_flight.fetch_add(1, Ordering::SeqCst) + 1);

                let subject = message.inbound.subject.clone();
                let sequence = message.inbound.sequence;
                if let Err(e) =
                    Self::process_message(message, processor.as_ref(), &dlq, &metrics, max_deliver)
                        .await
                {
                    error!(
                        subject = %subject,
                        sequence = sequence,
                        error = %e,
                        "Failed to settle message"
                    );
                }

                metrics.in_flight(in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1));
                drop(permit);
            });
        }

        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Message task panicked");
            }
        }
    }

    async fn process_message(
        message: NatsMessage,
        processor: &P,
        dlq: &DlqManager,
        metrics: &NatsMetrics,
        max_deliver: i64,
    ) -> Result<(), NatsError> {
        let start = Instant::now();
        let result = processor.process(&message.inbound).await;
        let duration = start.elapsed();

        match result {
            Ok(()) => {
                let subject = message.inbound.subject.clone();
                let sequence = message.inbound.sequence;
                message.ack().await?;
                metrics.message_processed(duration);

                debug!(
                    subject = %subject,
                    sequence = sequence,
                    duration_ms = duration.as_millis(),
                    "Message processed successfully"
                );
            }
            Err(e) => {
                Self::handle_error(message, e, dlq, metrics, max_deliver).await?;
            }
        }

        Ok(())
    }

    async fn handle_error(
        message: NatsMessage,
        error: ProcessingError,
        dlq: &DlqManager,
        metrics: &NatsMetrics,
        max_deliver: i64,
    ) -> Result<(), NatsError> {
        let category = error.category();
        let delivery_count = message.inbound.delivery_count;

        metrics.message_failed(category.as_str());

        match Disposition::for_failure(category, delivery_count, max_deliver) {
            Disposition::Retry(delay) => {
                warn!(
                    subject = %message.inbound.subject,
                    sequence = message.inbound.sequence,
                    error = %error,
                    delivery_count = delivery_count,
                    delay_ms = delay.as_millis(),
                    "Transient error, will retry"
                );

                metrics.message_retried();
                message.nak_with_delay(delay).await?;
            }
            Disposition::DeadLetter => {
                warn!(
                    subject = %message.inbound.subject,
                    sequence = message.inbound.sequence,
                    category = %category,
                    error = %error,
                    delivery_count = delivery_count,
                    "Moving message to DLQ"
                );

                dlq.move_to_dlq(&message.inbound, error.message(), category)
                    .await?;
                metrics.message_moved_to_dlq();

                message.term().await?;
            }
        }

        Ok(())
    }

    /// Get stream info.
    pub async fn stream_info(&self) -> Result<StreamInfo, NatsError> {
        self.consumer.stream_info().await
    }

    /// Get DLQ info.
    pub async fn dlq_info(&self) -> Result<StreamInfo, NatsError> {
        self.dlq.stream_info().await
    }
}
