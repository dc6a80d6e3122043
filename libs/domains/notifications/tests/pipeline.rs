//! End-to-end dispatch through the public API with in-memory collaborators.

use core_config::StaticSettings;
use domain_notifications::enrichment::{FundingClaim, RecipientRole, SubcontractorDeclaration};
use domain_notifications::handlers::{
    CONTRACTS_PORTAL_URL, FEED_READ_NOTIFICATION_ADDRESS, FUNDING_CLAIMS_PORTAL_URL,
};
use domain_notifications::memory::{InMemoryDomainApi, InMemoryPublisher, RecordingAuditSink};
use domain_notifications::{
    AuditSeverity, DispatchError, EmailMessageType, HandlerOutcome, NotificationHandlers,
    NotificationProcessor, RequestingService,
};
use nats_worker::{Disposition, ErrorCategory, InboundMessage, MessageProcessor};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const UKPRN: i32 = 10000001;

struct Harness {
    handlers: NotificationHandlers,
    publisher: InMemoryPublisher,
    audit: RecordingAuditSink,
}

fn settings() -> StaticSettings {
    StaticSettings::new()
        .with(FEED_READ_NOTIFICATION_ADDRESS, "feeds@example.com")
        .with(FUNDING_CLAIMS_PORTAL_URL, "https://claims.example.com")
        .with(CONTRACTS_PORTAL_URL, "https://contracts.example.com")
}

fn claim(id: i32) -> FundingClaim {
    FundingClaim {
        id,
        ukprn: UKPRN,
        organisation_name: "Example College".to_string(),
        collection_name: "2324 Mid Year".to_string(),
        signing_deadline: Some("2024-01-05T22:06:45".parse().unwrap()),
    }
}

fn upstream() -> InMemoryDomainApi {
    InMemoryDomainApi::new()
        .with_funding_claim(claim(1))
        .with_recipients(
            UKPRN,
            RecipientRole::FundingClaimsSignatory,
            ["signer@example.com", " signer@example.com ", "deputy@example.com"],
        )
}

fn harness(api: InMemoryDomainApi, publisher: InMemoryPublisher, audit: RecordingAuditSink) -> Harness {
    let api = Arc::new(api);
    let handlers = NotificationHandlers::new(
        Arc::new(settings()),
        api.clone(),
        api.clone(),
        api,
        Arc::new(publisher.clone()),
        Arc::new(audit.clone()),
    );
    Harness {
        handlers,
        publisher,
        audit,
    }
}

fn default_harness() -> Harness {
    harness(upstream(), InMemoryPublisher::new(), RecordingAuditSink::new())
}

mod publish_tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_to_sign_publishes_one_envelope() {
        let h = default_harness();

        let outcome = h
            .handlers
            .dispatch("funding-claims.claim.ready-to-sign", br#"{"id":1}"#)
            .await
            .unwrap();
        assert!(matches!(outcome, HandlerOutcome::Published(_)));

        let published = h.publisher.published().await;
        assert_eq!(published.len(), 1);

        let envelope = &published[0];
        assert_eq!(envelope.email_message_type(), EmailMessageType::FundingClaimReadyToSign);
        assert_eq!(envelope.requesting_service(), RequestingService::FundingClaims);
        assert_eq!(envelope.email_addresses().len(), 2);
        assert!(h.audit.records().await.is_empty());

        let wire = serde_json::to_value(envelope).unwrap();
        assert_eq!(wire["emailMessageType"], json!("FundingClaimReadyToSign_v1"));
        assert_eq!(
            wire["emailPersonalisation"]["personalisation"]["signingDeadline"],
            json!("5 January 2024 at 10:06pm")
        );
    }

    #[tokio::test]
    async fn test_identical_input_yields_identical_envelopes() {
        let h = default_harness();

        for _ in 0..2 {
            h.handlers
                .dispatch("funding-claims.claim.ready-to-sign", br#"{"id":1}"#)
                .await
                .unwrap();
        }

        let published = h.publisher.published().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[0], published[1]);
        assert_eq!(
            serde_json::to_string(&published[0]).unwrap(),
            serde_json::to_string(&published[1]).unwrap()
        );
    }

    #[tokio::test]
    async fn test_declaration_submitted() {
        let api = InMemoryDomainApi::new()
            .with_declaration(SubcontractorDeclaration {
                id: 12,
                ukprn: UKPRN,
                organisation_name: "Example College".to_string(),
                period: "2324".to_string(),
                declaration_type: "Full".to_string(),
                submitted_at: None,
                submitted_by: None,
            })
            .with_recipients(
                UKPRN,
                RecipientRole::SubcontractorDeclarationViewer,
                ["viewer@example.com"],
            );
        let h = harness(api, InMemoryPublisher::new(), RecordingAuditSink::new());

        h.handlers
            .dispatch("subcontractor-declarations.submitted", br#"{"id":12}"#)
            .await
            .unwrap();

        let published = h.publisher.published().await;
        assert_eq!(
            published[0].email_message_type(),
            EmailMessageType::SubcontractorDeclarationFullSubmitted
        );
        assert!(!published[0].personalisation().contains_key("submittedBy"));
    }
}

mod audit_tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_recipients_audits_once_and_publishes_nothing() {
        let api = InMemoryDomainApi::new().with_funding_claim(claim(1));
        let h = harness(api, InMemoryPublisher::new(), RecordingAuditSink::new());

        let outcome = h
            .handlers
            .dispatch("funding-claims.claim.signed", br#"{"id":1}"#)
            .await
            .unwrap();
        assert_eq!(outcome.as_str(), "audited");

        let records = h.audit.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject_id, "1");
        assert_eq!(records[0].severity, AuditSeverity::Warning);
        assert_eq!(h.publisher.published_count().await, 0);
    }

    #[tokio::test]
    async fn test_blank_addresses_count_as_no_recipients() {
        let api = InMemoryDomainApi::new()
            .with_funding_claim(claim(1))
            .with_recipients(UKPRN, RecipientRole::FundingClaimsSignatory, ["  ", ""]);
        let h = harness(api, InMemoryPublisher::new(), RecordingAuditSink::new());

        let outcome = h
            .handlers
            .dispatch("funding-claims.claim.ready-to-sign", br#"{"id":1}"#)
            .await
            .unwrap();

        assert!(matches!(outcome, HandlerOutcome::Audited(_)));
        assert_eq!(h.audit.records().await.len(), 1);
        assert_eq!(h.publisher.published_count().await, 0);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_the_event() {
        let payload = json!({
            "id": 7,
            "contractNumber": "CON-1234",
            "contractVersion": 2,
            "contractTitle": "Adult education budget",
            "ukprn": UKPRN,
            "changeType": "Approved"
        });
        let h = harness(
            InMemoryDomainApi::new(),
            InMemoryPublisher::new(),
            RecordingAuditSink::failing("audit api down"),
        );

        let outcome = h
            .handlers
            .dispatch("contracts.lifecycle", &serde_json::to_vec(&payload).unwrap())
            .await
            .unwrap();

        assert!(matches!(outcome, HandlerOutcome::Audited(_)));
        assert_eq!(h.audit.records().await.len(), 1);
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_failure_propagates_without_audit() {
        let h = harness(
            upstream(),
            InMemoryPublisher::failing("no responders"),
            RecordingAuditSink::new(),
        );

        let err = h
            .handlers
            .dispatch("funding-claims.claim.ready-to-sign", br#"{"id":1}"#)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Publish(_)));
        assert_eq!(err.category(), ErrorCategory::Transient);
        assert!(h.audit.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_outage_is_retried_then_dead_lettered() {
        let h = harness(
            InMemoryDomainApi::unavailable(),
            InMemoryPublisher::new(),
            RecordingAuditSink::new(),
        );
        let processor = NotificationProcessor::new(h.handlers);

        let mut message = InboundMessage::new("funding-claims.claim.ready-to-sign", br#"{"id":1}"#.to_vec());
        let err = processor.process(&message).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Transient);
        assert_eq!(
            Disposition::for_failure(err.category(), message.delivery_count, 10),
            Disposition::Retry(Duration::from_secs(1))
        );

        message.delivery_count = 10;
        let err = processor.process(&message).await.unwrap_err();
        assert_eq!(
            Disposition::for_failure(err.category(), message.delivery_count, 10),
            Disposition::DeadLetter
        );
    }

    #[tokio::test]
    async fn test_poison_messages_are_dead_lettered_immediately() {
        let processor = NotificationProcessor::new(default_harness().handlers);

        for (subject, payload) in [
            ("payments.refunded", &b"{}"[..]),
            ("feed-read.exception", &b"[1,2"[..]),
            ("feed-read.threshold-warning", &b"{}"[..]),
        ] {
            let message = InboundMessage::new(subject, payload.to_vec());
            let err = processor.process(&message).await.unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Permanent, "{subject}");
            assert_eq!(
                Disposition::for_failure(err.category(), 1, 10),
                Disposition::DeadLetter
            );
        }
    }

    #[tokio::test]
    async fn test_missing_setting_is_transient() {
        let api = Arc::new(upstream());
        let publisher = InMemoryPublisher::new();
        let handlers = NotificationHandlers::new(
            Arc::new(StaticSettings::new()),
            api.clone(),
            api.clone(),
            api,
            Arc::new(publisher.clone()),
            Arc::new(RecordingAuditSink::new()),
        );

        let err = handlers
            .dispatch("funding-claims.claim.ready-to-sign", br#"{"id":1}"#)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Configuration(_)));
        assert_eq!(err.category(), ErrorCategory::Transient);
        assert_eq!(publisher.published_count().await, 0);
    }
}
