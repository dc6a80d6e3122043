//! Inbound domain events, one shape per broker subject.
//!
//! Missing fields deserialize to their default so that the validator, not the
//! deserializer, decides whether an event is usable.

use crate::timestamp::SourceTimestamp;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Raised by feed ingestion when an entry or the feed itself cannot be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedReadExceptionEvent {
    /// Wire name of a [`FeedReadExceptionType`].
    #[serde(rename = "type")]
    pub exception_type: String,
    pub bookmark: Uuid,
    pub url: String,
}

/// Raised when feed ingestion falls too far behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedReadThresholdWarningEvent {
    pub start: Option<SourceTimestamp>,
    pub now: Option<SourceTimestamp>,
    pub bookmark_id: Uuid,
    pub last_page_url: String,
}

/// State change of a funding claim or reconciliation. The subject says which.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FundingClaimEvent {
    pub id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubcontractorDeclarationSubmittedEvent {
    pub id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContractLifecycleEvent {
    pub id: i32,
    pub contract_number: String,
    pub contract_version: i32,
    pub contract_title: String,
    pub ukprn: i32,
    /// Wire name of a [`ContractChangeType`].
    pub change_type: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum FeedReadExceptionType {
    InvalidEntry,
    FeedUnavailable,
    BookmarkNotFound,
    DuplicateEntry,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum FundingClaimNotification {
    ClaimReadyToSign,
    ClaimSigned,
    ReconciliationReadyToSign,
    ReconciliationSigned,
}

impl FundingClaimNotification {
    /// Whether the event's id refers to a reconciliation rather than a claim.
    pub fn is_reconciliation(&self) -> bool {
        matches!(
            self,
            FundingClaimNotification::ReconciliationReadyToSign
                | FundingClaimNotification::ReconciliationSigned
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum SubcontractorDeclarationType {
    Full,
    Nil,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum ContractChangeType {
    ReadyToSign,
    Approved,
    ManuallyApproved,
    WithdrawnByAgency,
    WithdrawnByProvider,
}
