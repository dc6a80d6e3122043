//! Outbound notification envelope.

use crate::templates::EmailMessageType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// The domain on whose behalf a notification is sent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum RequestingService {
    FeedRead,
    FundingClaims,
    SubcontractorDeclarations,
    Contracts,
}

/// Template variables, kept in key order so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Personalisation(BTreeMap<String, Value>);

impl Personalisation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Adds the entry only when `value` is present.
    pub fn with_optional<V: Into<Value>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderPreconditionError {
    #[error("notification envelope needs at least one recipient")]
    NoRecipients,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailPersonalisation {
    personalisation: Personalisation,
}

/// The message handed to the email renderer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEnvelope {
    email_addresses: BTreeSet<String>,
    requesting_service: RequestingService,
    email_message_type: EmailMessageType,
    email_personalisation: EmailPersonalisation,
}

impl NotificationEnvelope {
    /// Trims addresses, drops blanks and collapses duplicates. Fails when no
    /// address survives.
    pub fn build<I>(
        recipients: I,
        requesting_service: RequestingService,
        email_message_type: EmailMessageType,
        personalisation: Personalisation,
    ) -> Result<Self, BuilderPreconditionError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let email_addresses: BTreeSet<String> = recipients
            .into_iter()
            .map(|r| r.as_ref().trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        if email_addresses.is_empty() {
            return Err(BuilderPreconditionError::NoRecipients);
        }

        Ok(Self {
            email_addresses,
            requesting_service,
            email_message_type,
            email_personalisation: EmailPersonalisation { personalisation },
        })
    }

    pub fn email_addresses(&self) -> &BTreeSet<String> {
        &self.email_addresses
    }

    pub fn requesting_service(&self) -> RequestingService {
        self.requesting_service
    }

    pub fn email_message_type(&self) -> EmailMessageType {
        self.email_message_type
    }

    pub fn personalisation(&self) -> &Personalisation {
        &self.email_personalisation.personalisation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn personalisation() -> Personalisation {
        Personalisation::new()
            .with("organisationName", "Example College")
            .with("contractVersion", 2)
    }

    #[test]
    fn test_addresses_are_trimmed_and_deduped() {
        let envelope = NotificationEnvelope::build(
            [" a@example.com", "b@example.com", "a@example.com ", "   ", ""],
            RequestingService::Contracts,
            EmailMessageType::ContractApproved,
            personalisation(),
        )
        .unwrap();

        let addresses: Vec<_> = envelope.email_addresses().iter().cloned().collect();
        assert_eq!(addresses, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_no_usable_recipient_fails() {
        let err = NotificationEnvelope::build(
            Vec::<String>::new(),
            RequestingService::FeedRead,
            EmailMessageType::FeedReadThresholdWarning,
            Personalisation::new(),
        )
        .unwrap_err();
        assert_eq!(err, BuilderPreconditionError::NoRecipients);

        let err = NotificationEnvelope::build(
            ["  "],
            RequestingService::FeedRead,
            EmailMessageType::FeedReadThresholdWarning,
            Personalisation::new(),
        )
        .unwrap_err();
        assert_eq!(err, BuilderPreconditionError::NoRecipients);
    }

    #[test]
    fn test_wire_shape() {
        let envelope = NotificationEnvelope::build(
            ["signer@example.com"],
            RequestingService::FundingClaims,
            EmailMessageType::FundingClaimReadyToSign,
            personalisation(),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "emailAddresses": ["signer@example.com"],
                "requestingService": "FundingClaims",
                "emailMessageType": "FundingClaimReadyToSign_v1",
                "emailPersonalisation": {
                    "personalisation": {
                        "contractVersion": 2,
                        "organisationName": "Example College"
                    }
                }
            })
        );
    }

    #[test]
    fn test_optional_personalisation_entries() {
        let p = Personalisation::new()
            .with_optional("signingDeadline", None::<String>)
            .with_optional("submittedBy", Some("Pat"));

        assert!(!p.contains_key("signingDeadline"));
        assert_eq!(p.get("submittedBy"), Some(&json!("Pat")));
        assert_eq!(p.len(), 1);
    }
}
