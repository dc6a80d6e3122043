use crate::timestamp::SourceTimestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingClaim {
    pub id: i32,
    pub ukprn: i32,
    pub organisation_name: String,
    pub collection_name: String,
    #[serde(default)]
    pub signing_deadline: Option<SourceTimestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub id: i32,
    pub ukprn: i32,
    pub organisation_name: String,
    pub collection_name: String,
    #[serde(default)]
    pub signing_deadline: Option<SourceTimestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcontractorDeclaration {
    pub id: i32,
    pub ukprn: i32,
    pub organisation_name: String,
    pub period: String,
    /// Wire name of a [`crate::events::SubcontractorDeclarationType`].
    pub declaration_type: String,
    #[serde(default)]
    pub submitted_at: Option<SourceTimestamp>,
    #[serde(default)]
    pub submitted_by: Option<String>,
}

/// A user allowed to receive notifications for an organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Recipient {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
        }
    }
}

/// Organisation role that makes a user eligible for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
pub enum RecipientRole {
    FundingClaimsSignatory,
    SubcontractorDeclarationViewer,
    ContractSignatory,
}
