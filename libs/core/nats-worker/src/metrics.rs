//! Prometheus metrics for NATS worker.

use crate::error::NatsError;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tracing::info;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder.
///
/// Subsequent calls return the handle installed by the first one.
pub fn init_metrics() -> Result<PrometheusHandle, NatsError> {
    PROMETHEUS_HANDLE
        .get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| NatsError::Config(format!("prometheus recorder: {e}")))?;
            info!("Prometheus metrics initialized");
            Ok(handle)
        })
        .cloned()
}

/// Metrics for NATS worker.
#[derive(Clone)]
pub struct NatsMetrics {
    stream_name: String,
    processor_name: String,
}

impl NatsMetrics {
    /// Create new metrics.
    pub fn new(stream_name: &str, processor_name: &str) -> Self {
        Self {
            stream_name: stream_name.to_string(),
            processor_name: processor_name.to_string(),
        }
    }

    /// Record a message received.
    pub fn message_received(&self) {
        counter!(
            "nats_worker_messages_received_total",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    /// Record a message processed and acked.
    pub fn message_processed(&self, duration: Duration) {
        counter!(
            "nats_worker_messages_processed_total",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);

        histogram!(
            "nats_worker_message_duration_seconds",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .record(duration.as_secs_f64());
    }

    /// Record a failed message.
    pub fn message_failed(&self, error_category: &str) {
        counter!(
            "nats_worker_messages_failed_total",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone(),
            "category" => error_category.to_string()
        )
        .increment(1);
    }

    /// Record a message moved to DLQ.
    pub fn message_moved_to_dlq(&self) {
        counter!(
            "nats_worker_messages_moved_to_dlq_total",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    /// Record a message nak'd for redelivery.
    pub fn message_retried(&self) {
        counter!(
            "nats_worker_messages_retried_total",
            "stream" => self.stream_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    /// Update in-flight gauge.
    pub fn in_flight(&self, count: usize) {
        gauge!(
            "nats_worker_in_flight_messages",
            "stream" => self.stream_name.clone()
        )
        .set(count as f64);
    }
}
