//! Notification Dispatcher Service
//!
//! Consumes domain events from NATS JetStream and publishes email
//! notification requests for the downstream renderer.
//!
//! ## Architecture
//!
//! ```text
//! NATS JetStream (NOTIFICATION_EVENTS stream)
//!   ↓ (Pull Consumer: notification-dispatcher)
//! NatsWorker<NotificationProcessor>
//!   ↓ (validate, enrich over HTTP, resolve template)
//! NotificationHandlers
//!   ↓                          ↓ (no recipients)
//! notifications.email      Audit API
//! ```
//!
//! Failed events are nak'd with backoff when the failure is transient and
//! copied to `NOTIFICATION_EVENTS_DLQ` then terminated when it is not.

pub mod config;

use config::DispatcherConfig;
use core_config::{EnvSettings, Environment, FromEnv};
use domain_notifications::{
    DomainApiClient, HttpAuditSink, HttpFundingClaimsApi, HttpRecipientsApi,
    HttpSubcontractorDeclarationsApi, JetStreamPublisher, NotificationHandlers,
    NotificationProcessor,
};
use eyre::{Result, WrapErr};
use nats_worker::{init_metrics, HealthServer, NatsProducer, NatsWorker, WorkerConfig};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Run the dispatcher until SIGINT or SIGTERM.
pub async fn run() -> Result<()> {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let metrics_handle = init_metrics().wrap_err("Failed to install Prometheus recorder")?;

    info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        environment = ?environment,
        "Starting notification dispatcher"
    );

    let config = DispatcherConfig::from_env().wrap_err("Invalid dispatcher configuration")?;

    info!(url = %config.nats_url, "Connecting to NATS...");
    let nats_client = async_nats::connect(&config.nats_url)
        .await
        .wrap_err_with(|| format!("Failed to connect to NATS at {}", config.nats_url))?;
    let jetstream = async_nats::jetstream::new(nats_client);
    info!("Connected to NATS, JetStream context created");

    let handlers = build_handlers(&config, jetstream.clone()).await?;

    let worker_config = WorkerConfig::from_stream::<domain_notifications::NotificationEventsStream>()
        .with_stream_name(config.events_stream.clone())
        .with_consumer_name(config.events_consumer.clone())
        .with_max_deliver(config.max_deliver)
        .with_max_concurrent_jobs(config.max_concurrent_handlers);

    info!(
        stream = %worker_config.stream_name,
        consumer = %worker_config.consumer_name,
        dlq = %worker_config.dlq_stream,
        max_deliver = worker_config.max_deliver,
        "Worker configuration loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let health_server = HealthServer::new(config.health_port).with_metrics(metrics_handle);
    let health_state = health_server.state();
    let health_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = health_server.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    let worker = NatsWorker::new(jetstream, NotificationProcessor::new(handlers), worker_config)
        .await
        .wrap_err("Failed to create NATS worker")?
        .with_health(health_state);

    info!("NATS worker created, starting processing...");
    worker
        .run(shutdown_rx)
        .await
        .wrap_err("NATS worker stopped with an error")?;

    info!("Notification dispatcher stopped");
    Ok(())
}

async fn build_handlers(
    config: &DispatcherConfig,
    jetstream: async_nats::jetstream::Context,
) -> Result<NotificationHandlers> {
    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
        .wrap_err("Failed to build HTTP client")?;

    let api = |base_url: &str| {
        DomainApiClient::new(http.clone(), base_url)
            .with_bearer_token(config.upstream_api_token.clone())
            .with_timeout(config.upstream_timeout)
    };

    let producer = NatsProducer::new(jetstream, config.notifications_subject.clone());
    producer
        .ensure_stream(&config.notifications_stream)
        .await
        .wrap_err("Failed to provision outbound notifications stream")?;

    Ok(NotificationHandlers::new(
        Arc::new(EnvSettings),
        Arc::new(HttpFundingClaimsApi::new(api(&config.funding_claims_api_url))),
        Arc::new(HttpSubcontractorDeclarationsApi::new(api(
            &config.subcontractor_declarations_api_url,
        ))),
        Arc::new(HttpRecipientsApi::new(api(&config.organisations_api_url))),
        Arc::new(JetStreamPublisher::new(producer)),
        Arc::new(HttpAuditSink::new(api(&config.audit_api_url))),
    ))
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }
}
