//! Configuration for NATS JetStream workers.

use std::time::Duration;

/// Stream configuration trait (type-safe constants).
///
/// Implement this trait to describe a stream, its subjects and its
/// durable consumer.
///
/// ```rust,ignore
/// struct OrdersStream;
///
/// impl StreamConfig for OrdersStream {
///     const STREAM_NAME: &'static str = "ORDERS";
///     const CONSUMER_NAME: &'static str = "order-worker";
///     const DLQ_STREAM: &'static str = "ORDERS_DLQ";
///     const SUBJECTS: &'static [&'static str] = &["orders.>"];
/// }
/// ```
pub trait StreamConfig {
    /// JetStream stream name
    const STREAM_NAME: &'static str;

    /// Durable consumer name, shared by every worker instance
    const CONSUMER_NAME: &'static str;

    /// Dead letter queue stream name
    const DLQ_STREAM: &'static str;

    /// Subjects captured by the stream
    const SUBJECTS: &'static [&'static str];

    /// Maximum deliveries before a transient failure is dead-lettered
    const MAX_DELIVER: i64 = 10;

    /// Ack wait timeout in seconds
    const ACK_WAIT_SECS: u64 = 30;
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// JetStream stream name
    pub stream_name: String,

    /// Durable consumer name
    pub consumer_name: String,

    /// Subjects captured by the stream
    pub subjects: Vec<String>,

    /// Dead letter queue stream name
    pub dlq_stream: String,

    /// Batch size for fetching messages
    pub batch_size: usize,

    /// How long a pull request waits for messages
    pub fetch_timeout: Duration,

    /// Maximum deliveries before DLQ
    pub max_deliver: i64,

    /// Ack wait timeout
    pub ack_wait: Duration,

    /// Maximum messages processed at once
    pub max_concurrent_jobs: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            stream_name: "JOBS".to_string(),
            consumer_name: "worker".to_string(),
            subjects: vec![">".to_string()],
            dlq_stream: "JOBS_DLQ".to_string(),
            batch_size: 10,
            fetch_timeout: Duration::from_secs(5),
            max_deliver: 10,
            ack_wait: Duration::from_secs(30),
            max_concurrent_jobs: 4,
        }
    }
}

impl WorkerConfig {
    /// Create a new worker configuration with the given stream name.
    pub fn new(stream_name: impl Into<String>) -> Self {
        let stream_name = stream_name.into();
        let dlq_stream = format!("{}_DLQ", &stream_name);
        Self {
            stream_name,
            dlq_stream,
            ..Default::default()
        }
    }

    /// Create from a StreamConfig trait.
    pub fn from_stream<S: StreamConfig>() -> Self {
        Self {
            stream_name: S::STREAM_NAME.to_string(),
            consumer_name: S::CONSUMER_NAME.to_string(),
            subjects: S::SUBJECTS.iter().map(|s| s.to_string()).collect(),
            dlq_stream: S::DLQ_STREAM.to_string(),
            max_deliver: S::MAX_DELIVER,
            ack_wait: Duration::from_secs(S::ACK_WAIT_SECS),
            ..Default::default()
        }
    }

    /// Set the stream name. The DLQ stream follows unless set explicitly afterwards.
    pub fn with_stream_name(mut self, name: impl Into<String>) -> Self {
        self.stream_name = name.into();
        self.dlq_stream = format!("{}_DLQ", self.stream_name);
        self
    }

    /// Set the durable consumer name.
    pub fn with_consumer_name(mut self, name: impl Into<String>) -> Self {
        self.consumer_name = name.into();
        self
    }

    /// Set the DLQ stream name.
    pub fn with_dlq_stream(mut self, name: impl Into<String>) -> Self {
        self.dlq_stream = name.into();
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the maximum deliveries.
    pub fn with_max_deliver(mut self, max_deliver: i64) -> Self {
        self.max_deliver = max_deliver;
        self
    }

    /// Set the maximum concurrent jobs.
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max.max(1);
        self
    }
}
