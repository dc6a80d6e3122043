//! In-memory collaborators for tests.

use crate::audit::{AuditError, AuditRecord, AuditSink};
use crate::enrichment::{
    FundingClaim, FundingClaimsApi, Recipient, RecipientRole, RecipientsApi, Reconciliation,
    SubcontractorDeclaration, SubcontractorDeclarationsApi, UpstreamFetchError,
};
use crate::envelope::NotificationEnvelope;
use crate::publisher::{DEFAULT_NOTIFICATIONS_SUBJECT, NotificationPublisher, PublishError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Captures published envelopes.
#[derive(Clone, Default)]
pub struct InMemoryPublisher {
    published: Arc<Mutex<Vec<NotificationEnvelope>>>,
    failure: Option<String>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every publish fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            published: Arc::default(),
            failure: Some(message.into()),
        }
    }

    pub async fn published(&self) -> Vec<NotificationEnvelope> {
        self.published.lock().await.clone()
    }

    pub async fn published_count(&self) -> usize {
        self.published.lock().await.len()
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryPublisher {
    async fn publish(&self, envelope: &NotificationEnvelope) -> Result<(), PublishError> {
        if let Some(message) = &self.failure {
            return Err(PublishError {
                subject: DEFAULT_NOTIFICATIONS_SUBJECT.to_string(),
                message: message.clone(),
            });
        }
        self.published.lock().await.push(envelope.clone());
        Ok(())
    }
}

/// Captures audit records.
#[derive(Clone, Default)]
pub struct RecordingAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
    failure: Option<String>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that counts attempts but rejects every write.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            records: Arc::default(),
            failure: Some(message.into()),
        }
    }

    /// Every record passed to the sink, including rejected ones.
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.lock().await.push(record.clone());
        match &self.failure {
            Some(message) => Err(AuditError(message.clone())),
            None => Ok(()),
        }
    }
}

/// Fixed upstream data keyed by id and by organisation/role.
#[derive(Clone, Default)]
pub struct InMemoryDomainApi {
    funding_claims: HashMap<i32, FundingClaim>,
    reconciliations: HashMap<i32, Reconciliation>,
    declarations: HashMap<i32, SubcontractorDeclaration>,
    recipients: HashMap<(i32, RecipientRole), Vec<Recipient>>,
    unavailable: bool,
}

impl InMemoryDomainApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the upstream were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_funding_claim(mut self, claim: FundingClaim) -> Self {
        self.funding_claims.insert(claim.id, claim);
        self
    }

    pub fn with_reconciliation(mut self, reconciliation: Reconciliation) -> Self {
        self.reconciliations.insert(reconciliation.id, reconciliation);
        self
    }

    pub fn with_declaration(mut self, declaration: SubcontractorDeclaration) -> Self {
        self.declarations.insert(declaration.id, declaration);
        self
    }

    pub fn with_recipients(
        mut self,
        ukprn: i32,
        role: RecipientRole,
        emails: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.recipients.insert(
            (ukprn, role),
            emails.into_iter().map(Recipient::new).collect(),
        );
        self
    }

    fn check_available(&self, url: &str) -> Result<(), UpstreamFetchError> {
        if self.unavailable {
            return Err(UpstreamFetchError::Transport {
                url: url.to_string(),
                message: "upstream unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn lookup<T: Clone>(
    map: &HashMap<i32, T>,
    entity: &'static str,
    id: i32,
) -> Result<T, UpstreamFetchError> {
    map.get(&id)
        .cloned()
        .ok_or_else(|| UpstreamFetchError::NotFound {
            entity,
            id: id.to_string(),
        })
}

#[async_trait]
impl FundingClaimsApi for InMemoryDomainApi {
    async fn funding_claim(&self, id: i32) -> Result<FundingClaim, UpstreamFetchError> {
        self.check_available("memory://funding-claims")?;
        lookup(&self.funding_claims, "FundingClaim", id)
    }

    async fn reconciliation(&self, id: i32) -> Result<Reconciliation, UpstreamFetchError> {
        self.check_available("memory://reconciliations")?;
        lookup(&self.reconciliations, "Reconciliation", id)
    }
}

#[async_trait]
impl SubcontractorDeclarationsApi for InMemoryDomainApi {
    async fn declaration(&self, id: i32) -> Result<SubcontractorDeclaration, UpstreamFetchError> {
        self.check_available("memory://subcontractor-declarations")?;
        lookup(&self.declarations, "SubcontractorDeclaration", id)
    }
}

#[async_trait]
impl RecipientsApi for InMemoryDomainApi {
    async fn eligible_recipients(
        &self,
        ukprn: i32,
        role: RecipientRole,
    ) -> Result<Vec<Recipient>, UpstreamFetchError> {
        self.check_available("memory://organisations")?;
        Ok(self
            .recipients
            .get(&(ukprn, role))
            .cloned()
            .unwrap_or_default())
    }
}
