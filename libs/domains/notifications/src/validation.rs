//! Structural checks on inbound events.
//!
//! Every event is validated before any I/O. Fields are checked in declaration
//! order and the first failure wins.

use crate::events::{
    ContractChangeType, ContractLifecycleEvent, FeedReadExceptionEvent, FeedReadExceptionType,
    FeedReadThresholdWarningEvent, FundingClaimEvent, SubcontractorDeclarationSubmittedEvent,
};
use crate::timestamp::SourceTimestamp;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required string is absent, empty or whitespace.
    #[error("required value '{field}' is missing")]
    MissingValue { field: &'static str },

    /// A structured value is at its default or outside its enumeration.
    #[error("'{field}' is invalid: {reason}")]
    InvalidStructure { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingValue { field } => *field,
            ValidationError::InvalidStructure { field, .. } => *field,
        }
    }

    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidStructure {
            field,
            reason: reason.into(),
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn require_text<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingValue { field });
    }
    Ok(trimmed)
}

pub fn require_id(field: &'static str, value: i32) -> Result<i32, ValidationError> {
    if value == 0 {
        return Err(ValidationError::invalid(field, "must not be 0"));
    }
    Ok(value)
}

pub fn require_uuid(field: &'static str, value: &Uuid) -> Result<Uuid, ValidationError> {
    if value.is_nil() {
        return Err(ValidationError::invalid(field, "must not be the nil UUID"));
    }
    Ok(*value)
}

pub fn require_timestamp<'a>(
    field: &'static str,
    value: &'a Option<SourceTimestamp>,
) -> Result<&'a SourceTimestamp, ValidationError> {
    match value {
        Some(ts) if !ts.is_unset() => Ok(ts),
        _ => Err(ValidationError::invalid(field, "timestamp is not set")),
    }
}

/// Parse a raw discriminant into its enumeration.
pub fn require_discriminant<E: FromStr>(
    field: &'static str,
    value: &str,
) -> Result<E, ValidationError> {
    value
        .parse::<E>()
        .map_err(|_| ValidationError::invalid(field, format!("unknown value '{value}'")))
}

impl Validate for FeedReadExceptionEvent {
    fn validate(&self) -> Result<(), ValidationError> {
        require_discriminant::<FeedReadExceptionType>("type", &self.exception_type)?;
        require_uuid("bookmark", &self.bookmark)?;
        require_text("url", &self.url)?;
        Ok(())
    }
}

impl Validate for FeedReadThresholdWarningEvent {
    fn validate(&self) -> Result<(), ValidationError> {
        require_timestamp("start", &self.start)?;
        require_timestamp("now", &self.now)?;
        require_uuid("bookmarkId", &self.bookmark_id)?;
        require_text("lastPageUrl", &self.last_page_url)?;
        Ok(())
    }
}

impl Validate for FundingClaimEvent {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id("id", self.id)?;
        Ok(())
    }
}

impl Validate for SubcontractorDeclarationSubmittedEvent {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id("id", self.id)?;
        Ok(())
    }
}

impl Validate for ContractLifecycleEvent {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id("id", self.id)?;
        require_text("contractNumber", &self.contract_number)?;
        require_id("contractVersion", self.contract_version)?;
        require_id("ukprn", self.ukprn)?;
        require_discriminant::<ContractChangeType>("changeType", &self.change_type)?;
        Ok(())
    }
}
