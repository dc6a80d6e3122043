//! Subject to handler routing.

use crate::error::{DispatchError, DispatchResult};
use crate::events::FundingClaimNotification;
use crate::handlers::{HandlerOutcome, NotificationHandlers};
use serde::de::DeserializeOwned;
use strum::IntoEnumIterator;

/// Every inbound subject the dispatcher handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventRoute {
    FeedReadException,
    FeedReadThresholdWarning,
    FundingClaim(FundingClaimNotification),
    SubcontractorDeclarationSubmitted,
    ContractLifecycle,
}

impl EventRoute {
    pub fn subject(&self) -> &'static str {
        match self {
            EventRoute::FeedReadException => "feed-read.exception",
            EventRoute::FeedReadThresholdWarning => "feed-read.threshold-warning",
            EventRoute::FundingClaim(n) => match n {
                FundingClaimNotification::ClaimReadyToSign => "funding-claims.claim.ready-to-sign",
                FundingClaimNotification::ClaimSigned => "funding-claims.claim.signed",
                FundingClaimNotification::ReconciliationReadyToSign => {
                    "funding-claims.reconciliation.ready-to-sign"
                }
                FundingClaimNotification::ReconciliationSigned => {
                    "funding-claims.reconciliation.signed"
                }
            },
            EventRoute::SubcontractorDeclarationSubmitted => "subcontractor-declarations.submitted",
            EventRoute::ContractLifecycle => "contracts.lifecycle",
        }
    }

    pub fn from_subject(subject: &str) -> Option<Self> {
        Self::all().into_iter().find(|route| route.subject() == subject)
    }

    pub fn all() -> Vec<Self> {
        let mut routes = vec![EventRoute::FeedReadException, EventRoute::FeedReadThresholdWarning];
        routes.extend(FundingClaimNotification::iter().map(EventRoute::FundingClaim));
        routes.push(EventRoute::SubcontractorDeclarationSubmitted);
        routes.push(EventRoute::ContractLifecycle);
        routes
    }
}

fn decode<T: DeserializeOwned>(payload: &[u8]) -> DispatchResult<T> {
    serde_json::from_slice(payload).map_err(|e| DispatchError::Deserialization(e.to_string()))
}

impl NotificationHandlers {
    /// Decode `payload` for `subject` and run its handler.
    pub async fn dispatch(&self, subject: &str, payload: &[u8]) -> DispatchResult<HandlerOutcome> {
        let route = EventRoute::from_subject(subject)
            .ok_or_else(|| DispatchError::UnknownSubject(subject.to_string()))?;

        match route {
            EventRoute::FeedReadException => {
                self.handle_feed_read_exception(&decode(payload)?).await
            }
            EventRoute::FeedReadThresholdWarning => {
                self.handle_feed_read_threshold_warning(&decode(payload)?)
                    .await
            }
            EventRoute::FundingClaim(notification) => {
                self.handle_funding_claim(notification, &decode(payload)?)
                    .await
            }
            EventRoute::SubcontractorDeclarationSubmitted => {
                self.handle_subcontractor_declaration_submitted(&decode(payload)?)
                    .await
            }
            EventRoute::ContractLifecycle => {
                self.handle_contract_lifecycle(&decode(payload)?).await
            }
        }
    }
}
