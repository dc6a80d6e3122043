//! Health endpoints for K8s probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::info;

/// Body of `/health` and `/ready`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub stream_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Stream connectivity as last seen by the worker loop.
#[derive(Clone, Default)]
pub struct HealthState {
    inner: Arc<RwLock<HealthStatus>>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of the latest fetch. A successful fetch clears `error`.
    pub async fn set_stream_connected(&self, connected: bool, error: Option<String>) {
        let mut status = self.inner.write().await;
        status.stream_connected = connected;
        if connected {
            status.last_error = None;
        } else if error.is_some() {
            status.last_error = error;
        }
    }

    pub async fn status(&self) -> HealthStatus {
        self.inner.read().await.clone()
    }
}

/// Health server for K8s probes and Prometheus scraping.
pub struct HealthServer {
    port: u16,
    state: HealthState,
    metrics_handle: Option<PrometheusHandle>,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            state: HealthState::new(),
            metrics_handle: None,
        }
    }

    /// Set the metrics handle for /metrics endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Get the health state for updates.
    pub fn state(&self) -> HealthState {
        self.state.clone()
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .with_state(self.state.clone());

        if let Some(handle) = self.metrics_handle.clone() {
            router = router.route(
                "/metrics",
                get(move || {
                    let handle = handle.clone();
                    async move { handle.render() }
                }),
            );
        }

        router
    }

    /// Serve until `shutdown` flips to true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let router = self.router();
        let addr = format!("0.0.0.0:{}", self.port);

        info!(addr = %addr, "Starting health server");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown.borrow() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        info!("Health server stopped");
        Ok(())
    }
}

/// Liveness. A lost NATS connection is retried by the worker, not by a restart.
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.status().await))
}

async fn ready_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.status().await;
    let code = if status.stream_connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
