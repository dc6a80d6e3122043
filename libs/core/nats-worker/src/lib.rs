//! NATS JetStream worker framework.
//!
//! Pulls messages from a durable JetStream consumer, hands each one to a
//! [`MessageProcessor`] and settles it from the result.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌────────────────┐     ┌──────────────────┐
//! │   NATS JetStream    │────▶│   NatsWorker   │────▶│ MessageProcessor │
//! │   (Durable Stream)  │     │ (pull, settle) │     │  (Your Logic)    │
//! └─────────────────────┘     └────────────────┘     └──────────────────┘
//!                                     │
//!                                     ▼
//!                            ┌─────────────────┐
//!                            │   DLQ Stream    │
//!                            │ (Dead Letters)  │
//!                            └─────────────────┘
//! ```
//!
//! # Settlement
//!
//! | Result | Action |
//! |--------|--------|
//! | `Ok(())` | ack |
//! | transient error, deliveries left | nak with exponential delay |
//! | transient error, `max_deliver` reached | DLQ copy, term |
//! | permanent error | DLQ copy, term |
//!
//! # Example
//!
//! ```rust,ignore
//! use nats_worker::{NatsWorker, StreamConfig, WorkerConfig};
//!
//! let worker = NatsWorker::new(
//!     jetstream,
//!     processor,
//!     WorkerConfig::from_stream::<OrdersStream>(),
//! ).await?;
//!
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod consumer;
mod dlq;
mod error;
mod health;
pub mod metrics;
mod processor;
mod producer;
mod worker;

pub use config::{StreamConfig, WorkerConfig};
pub use consumer::{InboundMessage, NatsConsumer, NatsMessage, StreamInfo};
pub use dlq::{DlqEntry, DlqManager};
pub use error::{Disposition, ErrorCategory, NatsError, ProcessingError};
pub use health::{HealthServer, HealthState, HealthStatus};
pub use metrics::{init_metrics, NatsMetrics};
pub use processor::MessageProcessor;
pub use producer::NatsProducer;
pub use worker::NatsWorker;
