//! Startup configuration, read once from the environment.

use core_config::{env_or_default, env_parse_or, env_required, ConfigError, FromEnv};
use domain_notifications::{NotificationEventsStream, DEFAULT_NOTIFICATIONS_SUBJECT, OUTBOUND_STREAM};
use nats_worker::StreamConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub nats_url: String,
    pub events_stream: String,
    pub events_consumer: String,
    pub notifications_subject: String,
    pub notifications_stream: String,
    pub max_deliver: i64,
    pub max_concurrent_handlers: usize,
    pub health_port: u16,
    pub funding_claims_api_url: String,
    pub subcontractor_declarations_api_url: String,
    pub organisations_api_url: String,
    pub audit_api_url: String,
    pub upstream_api_token: Option<String>,
    pub upstream_timeout: Duration,
}

impl FromEnv for DispatcherConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let upstream_api_token = std::env::var("UPSTREAM_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            nats_url: env_or_default("NATS_URL", "nats://localhost:4222"),
            events_stream: env_or_default("EVENTS_STREAM", NotificationEventsStream::STREAM_NAME),
            events_consumer: env_or_default(
                "EVENTS_CONSUMER",
                NotificationEventsStream::CONSUMER_NAME,
            ),
            notifications_subject: env_or_default(
                "NOTIFICATIONS_SUBJECT",
                DEFAULT_NOTIFICATIONS_SUBJECT,
            ),
            notifications_stream: env_or_default("NOTIFICATIONS_STREAM", OUTBOUND_STREAM),
            max_deliver: env_parse_or("MAX_DELIVER", NotificationEventsStream::MAX_DELIVER)?,
            max_concurrent_handlers: env_parse_or("MAX_CONCURRENT_HANDLERS", 10)?,
            health_port: env_parse_or("HEALTH_PORT", 8081)?,
            funding_claims_api_url: env_required("FUNDING_CLAIMS_API_URL")?,
            subcontractor_declarations_api_url: env_required(
                "SUBCONTRACTOR_DECLARATIONS_API_URL",
            )?,
            organisations_api_url: env_required("ORGANISATIONS_API_URL")?,
            audit_api_url: env_required("AUDIT_API_URL")?,
            upstream_api_token,
            upstream_timeout: Duration::from_secs(env_parse_or("UPSTREAM_TIMEOUT_SECS", 30)?),
        })
    }
}
