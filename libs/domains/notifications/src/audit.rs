//! Fire-and-forget audit trail for notifications that were not sent.

use crate::enrichment::DomainApiClient;
use crate::envelope::RequestingService;
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum AuditAction {
    NotificationSkipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum AuditSeverity {
    Information,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub message: String,
    pub subject_id: String,
    pub action: AuditAction,
    pub severity: AuditSeverity,
    pub actor: RequestingService,
}

impl AuditRecord {
    /// Record for an event that resolved to nobody to notify.
    pub fn no_recipients(actor: RequestingService, subject_id: impl Into<String>, detail: &str) -> Self {
        let subject_id = subject_id.into();
        Self {
            message: format!("No eligible recipients for {detail} {subject_id}; notification skipped"),
            subject_id,
            action: AuditAction::NotificationSkipped,
            severity: AuditSeverity::Warning,
            actor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("audit write failed: {0}")]
pub struct AuditError(pub String);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Writes audit records through the handler's own path. Failures are logged
/// and dropped so that auditing never changes a handler's outcome.
pub async fn record_audit(sink: &dyn AuditSink, record: &AuditRecord) {
    if let Err(e) = sink.record(record).await {
        warn!(
            subject_id = %record.subject_id,
            actor = %record.actor,
            error = %e,
            "Failed to write audit record"
        );
    }
}

/// Posts records to `{base}/api/audit`.
pub struct HttpAuditSink {
    api: DomainApiClient,
}

impl HttpAuditSink {
    pub fn new(api: DomainApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let url = format!("{}/api/audit", self.api.base_url());
        debug!(url = %url, subject_id = %record.subject_id, "Posting audit record");

        let response = self
            .api
            .request(Method::POST, &url)
            .json(record)
            .send()
            .await
            .map_err(|e| AuditError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError(format!("POST {url} returned HTTP {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record() -> AuditRecord {
        AuditRecord::no_recipients(RequestingService::Contracts, "7", "contract")
    }

    #[test]
    fn test_record_wire_shape() {
        assert_eq!(
            serde_json::to_value(record()).unwrap(),
            json!({
                "message": "No eligible recipients for contract 7; notification skipped",
                "subjectId": "7",
                "action": "NotificationSkipped",
                "severity": "Warning",
                "actor": "Contracts"
            })
        );
    }

    #[tokio::test]
    async fn test_http_sink_posts_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/audit"))
            .and(body_json(serde_json::to_value(record()).unwrap()))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let sink = HttpAuditSink::new(DomainApiClient::new(Client::new(), server.uri()));
        sink.record(&record()).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_sink_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/audit"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sink = HttpAuditSink::new(DomainApiClient::new(Client::new(), server.uri()));
        assert!(sink.record(&record()).await.is_err());
    }

    #[tokio::test]
    async fn test_record_audit_swallows_failures() {
        let mut sink = MockAuditSink::new();
        sink.expect_record()
            .times(1)
            .returning(|_| Err(AuditError("down".to_string())));

        record_audit(&sink, &record()).await;
    }
}
