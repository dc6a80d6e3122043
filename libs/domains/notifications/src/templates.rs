//! Discriminant to downstream template mapping.
//!
//! Each resolver parses the raw wire value into its enumeration and maps it
//! with an exhaustive `match`, so adding a variant without a template is a
//! compile error. A value that does not parse is a [`TemplateResolutionError`].

use crate::events::{
    ContractChangeType, FeedReadExceptionType, FundingClaimNotification,
    SubcontractorDeclarationType,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// Versioned template ids understood by the email renderer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum EmailMessageType {
    #[serde(rename = "FeedReadInvalidEntry_v1")]
    #[strum(serialize = "FeedReadInvalidEntry_v1")]
    FeedReadInvalidEntry,
    #[serde(rename = "FeedReadFeedUnavailable_v1")]
    #[strum(serialize = "FeedReadFeedUnavailable_v1")]
    FeedReadFeedUnavailable,
    #[serde(rename = "FeedReadBookmarkNotFound_v1")]
    #[strum(serialize = "FeedReadBookmarkNotFound_v1")]
    FeedReadBookmarkNotFound,
    #[serde(rename = "FeedReadDuplicateEntry_v1")]
    #[strum(serialize = "FeedReadDuplicateEntry_v1")]
    FeedReadDuplicateEntry,
    #[serde(rename = "FeedReadThresholdWarning_v1")]
    #[strum(serialize = "FeedReadThresholdWarning_v1")]
    FeedReadThresholdWarning,

    #[serde(rename = "FundingClaimReadyToSign_v1")]
    #[strum(serialize = "FundingClaimReadyToSign_v1")]
    FundingClaimReadyToSign,
    #[serde(rename = "FundingClaimSigned_v1")]
    #[strum(serialize = "FundingClaimSigned_v1")]
    FundingClaimSigned,
    #[serde(rename = "ReconciliationReadyToSign_v1")]
    #[strum(serialize = "ReconciliationReadyToSign_v1")]
    ReconciliationReadyToSign,
    #[serde(rename = "ReconciliationSigned_v1")]
    #[strum(serialize = "ReconciliationSigned_v1")]
    ReconciliationSigned,

    #[serde(rename = "SubcontractorDeclarationFullSubmitted_v1")]
    #[strum(serialize = "SubcontractorDeclarationFullSubmitted_v1")]
    SubcontractorDeclarationFullSubmitted,
    #[serde(rename = "SubcontractorDeclarationNilSubmitted_v1")]
    #[strum(serialize = "SubcontractorDeclarationNilSubmitted_v1")]
    SubcontractorDeclarationNilSubmitted,

    #[serde(rename = "ContractReadyToSign_v1")]
    #[strum(serialize = "ContractReadyToSign_v1")]
    ContractReadyToSign,
    #[serde(rename = "ContractApproved_v1")]
    #[strum(serialize = "ContractApproved_v1")]
    ContractApproved,
    #[serde(rename = "ContractManuallyApproved_v1")]
    #[strum(serialize = "ContractManuallyApproved_v1")]
    ContractManuallyApproved,
    #[serde(rename = "ContractWithdrawnByAgency_v1")]
    #[strum(serialize = "ContractWithdrawnByAgency_v1")]
    ContractWithdrawnByAgency,
    #[serde(rename = "ContractWithdrawnByProvider_v1")]
    #[strum(serialize = "ContractWithdrawnByProvider_v1")]
    ContractWithdrawnByProvider,
}

/// No template exists for a discriminant value. Signals a mapping that was
/// not updated when the producer added a variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no email template for {discriminant} value '{value}'")]
pub struct TemplateResolutionError {
    pub discriminant: &'static str,
    pub value: String,
}

fn parse_discriminant<E: FromStr>(
    discriminant: &'static str,
    raw: &str,
) -> Result<E, TemplateResolutionError> {
    raw.parse::<E>().map_err(|_| TemplateResolutionError {
        discriminant,
        value: raw.to_string(),
    })
}

pub fn feed_read_exception_template(raw: &str) -> Result<EmailMessageType, TemplateResolutionError> {
    let exception = parse_discriminant::<FeedReadExceptionType>("FeedReadExceptionType", raw)?;
    Ok(match exception {
        FeedReadExceptionType::InvalidEntry => EmailMessageType::FeedReadInvalidEntry,
        FeedReadExceptionType::FeedUnavailable => EmailMessageType::FeedReadFeedUnavailable,
        FeedReadExceptionType::BookmarkNotFound => EmailMessageType::FeedReadBookmarkNotFound,
        FeedReadExceptionType::DuplicateEntry => EmailMessageType::FeedReadDuplicateEntry,
    })
}

pub fn funding_claim_template(notification: FundingClaimNotification) -> EmailMessageType {
    match notification {
        FundingClaimNotification::ClaimReadyToSign => EmailMessageType::FundingClaimReadyToSign,
        FundingClaimNotification::ClaimSigned => EmailMessageType::FundingClaimSigned,
        FundingClaimNotification::ReconciliationReadyToSign => {
            EmailMessageType::ReconciliationReadyToSign
        }
        FundingClaimNotification::ReconciliationSigned => EmailMessageType::ReconciliationSigned,
    }
}

pub fn subcontractor_declaration_template(
    raw: &str,
) -> Result<EmailMessageType, TemplateResolutionError> {
    let declaration =
        parse_discriminant::<SubcontractorDeclarationType>("SubcontractorDeclarationType", raw)?;
    Ok(match declaration {
        SubcontractorDeclarationType::Full => EmailMessageType::SubcontractorDeclarationFullSubmitted,
        SubcontractorDeclarationType::Nil => EmailMessageType::SubcontractorDeclarationNilSubmitted,
    })
}

pub fn contract_change_template(raw: &str) -> Result<EmailMessageType, TemplateResolutionError> {
    let change = parse_discriminant::<ContractChangeType>("ContractChangeType", raw)?;
    Ok(match change {
        ContractChangeType::ReadyToSign => EmailMessageType::ContractReadyToSign,
        ContractChangeType::Approved => EmailMessageType::ContractApproved,
        ContractChangeType::ManuallyApproved => EmailMessageType::ContractManuallyApproved,
        ContractChangeType::WithdrawnByAgency => EmailMessageType::ContractWithdrawnByAgency,
        ContractChangeType::WithdrawnByProvider => EmailMessageType::ContractWithdrawnByProvider,
    })
}
