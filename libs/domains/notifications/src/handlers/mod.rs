//! One handler per inbound event type.
//!
//! ```text
//! Received → Validated → [Enriched] → TemplateResolved → EnvelopeBuilt → Published
//! Received → Validated → Enriched(zero recipients) → Audited
//! ```
//!
//! Any failing step returns its error unchanged; nothing is retried here.

mod contracts;
mod declarations;
mod feed_read;
mod funding_claims;

use crate::audit::{AuditRecord, AuditSink, record_audit};
use crate::enrichment::{
    FundingClaimsApi, RecipientRole, RecipientsApi, SubcontractorDeclarationsApi,
};
use crate::envelope::{NotificationEnvelope, Personalisation, RequestingService};
use crate::error::DispatchResult;
use crate::publisher::NotificationPublisher;
use crate::templates::EmailMessageType;
use core_config::SettingsProvider;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Operations mailbox that receives feed-read alerts.
pub const FEED_READ_NOTIFICATION_ADDRESS: &str = "FEED_READ_NOTIFICATION_ADDRESS";
pub const FUNDING_CLAIMS_PORTAL_URL: &str = "FUNDING_CLAIMS_PORTAL_URL";
pub const CONTRACTS_PORTAL_URL: &str = "CONTRACTS_PORTAL_URL";

/// How an invocation ended when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    Published(NotificationEnvelope),
    Audited(AuditRecord),
}

impl HandlerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerOutcome::Published(_) => "published",
            HandlerOutcome::Audited(_) => "audited",
        }
    }

    pub fn envelope(&self) -> Option<&NotificationEnvelope> {
        match self {
            HandlerOutcome::Published(envelope) => Some(envelope),
            HandlerOutcome::Audited(_) => None,
        }
    }
}

/// Stateless collaborators shared by every invocation.
#[derive(Clone)]
pub struct NotificationHandlers {
    settings: Arc<dyn SettingsProvider>,
    funding_claims: Arc<dyn FundingClaimsApi>,
    declarations: Arc<dyn SubcontractorDeclarationsApi>,
    recipients: Arc<dyn RecipientsApi>,
    publisher: Arc<dyn NotificationPublisher>,
    audit: Arc<dyn AuditSink>,
}

impl NotificationHandlers {
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        funding_claims: Arc<dyn FundingClaimsApi>,
        declarations: Arc<dyn SubcontractorDeclarationsApi>,
        recipients: Arc<dyn RecipientsApi>,
        publisher: Arc<dyn NotificationPublisher>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            settings,
            funding_claims,
            declarations,
            recipients,
            publisher,
            audit,
        }
    }

    /// Trimmed, non-blank, deduplicated addresses. Empty means the event is audited.
    async fn eligible_recipients(
        &self,
        ukprn: i32,
        role: RecipientRole,
    ) -> DispatchResult<BTreeSet<String>> {
        let recipients = self.recipients.eligible_recipients(ukprn, role).await?;
        Ok(recipients
            .iter()
            .map(|r| r.email.trim())
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn publish<I>(
        &self,
        recipients: I,
        service: RequestingService,
        template: EmailMessageType,
        personalisation: Personalisation,
    ) -> DispatchResult<HandlerOutcome>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let envelope = NotificationEnvelope::build(recipients, service, template, personalisation)?;
        self.publisher.publish(&envelope).await?;

        info!(
            service = %service,
            template = %template,
            recipients = envelope.email_addresses().len(),
            "Notification dispatched"
        );
        Ok(HandlerOutcome::Published(envelope))
    }

    async fn audit_no_recipients(
        &self,
        service: RequestingService,
        subject_id: String,
        detail: &str,
    ) -> HandlerOutcome {
        warn!(service = %service, subject_id = %subject_id, "No eligible recipients");

        let record = AuditRecord::no_recipients(service, subject_id, detail);
        record_audit(self.audit.as_ref(), &record).await;
        HandlerOutcome::Audited(record)
    }
}
