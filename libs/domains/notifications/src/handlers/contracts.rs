use super::{CONTRACTS_PORTAL_URL, HandlerOutcome, NotificationHandlers};
use crate::enrichment::RecipientRole;
use crate::envelope::{Personalisation, RequestingService};
use crate::error::DispatchResult;
use crate::events::ContractLifecycleEvent;
use crate::templates::contract_change_template;
use crate::validation::Validate;
use tracing::instrument;

impl NotificationHandlers {
    #[instrument(
        skip(self, event),
        fields(id = event.id, contract_number = %event.contract_number, change_type = %event.change_type)
    )]
    pub async fn handle_contract_lifecycle(
        &self,
        event: &ContractLifecycleEvent,
    ) -> DispatchResult<HandlerOutcome> {
        event.validate()?;
        let template = contract_change_template(&event.change_type)?;

        let recipients = self
            .eligible_recipients(event.ukprn, RecipientRole::ContractSignatory)
            .await?;
        if recipients.is_empty() {
            return Ok(self
                .audit_no_recipients(RequestingService::Contracts, event.id.to_string(), "contract")
                .await);
        }

        let portal_url = self.settings.required(CONTRACTS_PORTAL_URL)?;
        let personalisation = Personalisation::new()
            .with("contractNumber", event.contract_number.as_str())
            .with("contractVersion", event.contract_version)
            .with("contractTitle", event.contract_title.as_str())
            .with("portalUrl", portal_url);

        self.publish(
            recipients,
            RequestingService::Contracts,
            template,
            personalisation,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Mocks;
    use super::*;
    use crate::audit::AuditError;
    use crate::enrichment::{Recipient, UpstreamFetchError};
    use crate::error::DispatchError;
    use crate::templates::EmailMessageType;
    use serde_json::json;

    fn event(change_type: &str) -> ContractLifecycleEvent {
        ContractLifecycleEvent {
            id: 7,
            contract_number: "CON-1234".to_string(),
            contract_version: 2,
            contract_title: "Adult education budget".to_string(),
            ukprn: 10000001,
            change_type: change_type.to_string(),
        }
    }

    #[tokio::test]
    async fn test_withdrawn_by_agency() {
        let mut mocks = Mocks::new();
        mocks
            .recipients
            .expect_eligible_recipients()
            .withf(|ukprn, role| *ukprn == 10000001 && *role == RecipientRole::ContractSignatory)
            .times(1)
            .returning(|_, _| Ok(vec![Recipient::new("signer@example.com")]));
        mocks.publisher.expect_publish().times(1).returning(|_| Ok(()));
        let handlers = mocks.into_handlers();

        let outcome = handlers
            .handle_contract_lifecycle(&event("WithdrawnByAgency"))
            .await
            .unwrap();
        let envelope = outcome.envelope().unwrap();

        assert_eq!(
            envelope.email_message_type(),
            EmailMessageType::ContractWithdrawnByAgency
        );
        assert_eq!(envelope.personalisation().get("contractVersion"), Some(&json!(2)));
        assert_eq!(
            envelope.personalisation().get("portalUrl"),
            Some(&json!("https://contracts.example.com"))
        );
    }

    #[tokio::test]
    async fn test_unknown_change_type_fails_validation_without_io() {
        let handlers = Mocks::new().into_handlers();

        let err = handlers
            .handle_contract_lifecycle(&event("Shredded"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_handler() {
        let mut mocks = Mocks::new();
        mocks
            .recipients
            .expect_eligible_recipients()
            .returning(|_, _| Ok(Vec::new()));
        mocks
            .audit
            .expect_record()
            .times(1)
            .returning(|_| Err(AuditError("audit api down".to_string())));
        mocks.publisher.expect_publish().never();
        let handlers = mocks.into_handlers();

        let outcome = handlers
            .handle_contract_lifecycle(&event("Approved"))
            .await
            .unwrap();

        assert_eq!(outcome.as_str(), "audited");
    }

    #[tokio::test]
    async fn test_recipient_lookup_failure_propagates() {
        let mut mocks = Mocks::new();
        mocks.recipients.expect_eligible_recipients().returning(|_, _| {
            Err(UpstreamFetchError::Transport {
                url: "http://orgs".to_string(),
                message: "timed out".to_string(),
            })
        });
        mocks.publisher.expect_publish().never();
        let handlers = mocks.into_handlers();

        let err = handlers
            .handle_contract_lifecycle(&event("ReadyToSign"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::UpstreamFetch(_)));
    }
}
