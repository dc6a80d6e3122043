//! JetStream layout for inbound domain events.

use nats_worker::StreamConfig;

/// Inbound events from feed ingestion, funding claims, declarations and contracts.
pub struct NotificationEventsStream;

impl StreamConfig for NotificationEventsStream {
    const STREAM_NAME: &'static str = "NOTIFICATION_EVENTS";
    const CONSUMER_NAME: &'static str = "notification-dispatcher";
    const DLQ_STREAM: &'static str = "NOTIFICATION_EVENTS_DLQ";
    const SUBJECTS: &'static [&'static str] = &[
        "feed-read.>",
        "funding-claims.>",
        "subcontractor-declarations.>",
        "contracts.>",
    ];
    const MAX_DELIVER: i64 = 10;
}

/// Stream that captures outbound envelopes for the email renderer.
pub const OUTBOUND_STREAM: &str = "NOTIFICATIONS";
