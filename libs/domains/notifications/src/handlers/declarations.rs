use super::{HandlerOutcome, NotificationHandlers};
use crate::enrichment::RecipientRole;
use crate::envelope::{Personalisation, RequestingService};
use crate::error::DispatchResult;
use crate::events::SubcontractorDeclarationSubmittedEvent;
use crate::formatting::format_optional_display_date;
use crate::templates::subcontractor_declaration_template;
use crate::validation::Validate;
use tracing::instrument;

impl NotificationHandlers {
    #[instrument(skip(self, event), fields(id = event.id))]
    pub async fn handle_subcontractor_declaration_submitted(
        &self,
        event: &SubcontractorDeclarationSubmittedEvent,
    ) -> DispatchResult<HandlerOutcome> {
        event.validate()?;

        let declaration = self.declarations.declaration(event.id).await?;
        let recipients = self
            .eligible_recipients(declaration.ukprn, RecipientRole::SubcontractorDeclarationViewer)
            .await?;
        if recipients.is_empty() {
            return Ok(self
                .audit_no_recipients(
                    RequestingService::SubcontractorDeclarations,
                    event.id.to_string(),
                    "subcontractor declaration",
                )
                .await);
        }

        let template = subcontractor_declaration_template(&declaration.declaration_type)?;
        let personalisation = Personalisation::new()
            .with("organisationName", declaration.organisation_name)
            .with("period", declaration.period)
            .with_optional(
                "submittedAt",
                format_optional_display_date(declaration.submitted_at.as_ref()),
            )
            .with_optional("submittedBy", declaration.submitted_by);

        self.publish(
            recipients,
            RequestingService::SubcontractorDeclarations,
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
    use crate::enrichment::{Recipient, SubcontractorDeclaration};
    use crate::error::DispatchError;
    use crate::templates::EmailMessageType;
    use serde_json::json;

    fn declaration(declaration_type: &str) -> SubcontractorDeclaration {
        SubcontractorDeclaration {
            id: 5,
            ukprn: 10000001,
            organisation_name: "Example College".to_string(),
            period: "2324".to_string(),
            declaration_type: declaration_type.to_string(),
            submitted_at: Some("2024-10-05T22:06:45".parse().unwrap()),
            submitted_by: Some("Pat Provider".to_string()),
        }
    }

    #[tokio::test]
    async fn test_nil_declaration_uses_nil_template() {
        let mut mocks = Mocks::new();
        mocks
            .declarations
            .expect_declaration()
            .returning(|_| Ok(declaration("Nil")));
        mocks
            .recipients
            .expect_eligible_recipients()
            .withf(|_, role| *role == RecipientRole::SubcontractorDeclarationViewer)
            .returning(|_, _| Ok(vec![Recipient::new("viewer@example.com")]));
        mocks.publisher.expect_publish().times(1).returning(|_| Ok(()));
        let handlers = mocks.into_handlers();

        let outcome = handlers
            .handle_subcontractor_declaration_submitted(&SubcontractorDeclarationSubmittedEvent {
                id: 5,
            })
            .await
            .unwrap();
        let envelope = outcome.envelope().unwrap();

        assert_eq!(
            envelope.email_message_type(),
            EmailMessageType::SubcontractorDeclarationNilSubmitted
        );
        assert_eq!(
            envelope.personalisation().get("submittedAt"),
            Some(&json!("5 October 2024 at 11:06pm"))
        );
        assert_eq!(envelope.personalisation().get("submittedBy"), Some(&json!("Pat Provider")));
    }

    #[tokio::test]
    async fn test_unknown_declaration_type_is_template_error() {
        let mut mocks = Mocks::new();
        mocks
            .declarations
            .expect_declaration()
            .returning(|_| Ok(declaration("Partial")));
        mocks
            .recipients
            .expect_eligible_recipients()
            .returning(|_, _| Ok(vec![Recipient::new("viewer@example.com")]));
        mocks.publisher.expect_publish().never();
        let handlers = mocks.into_handlers();

        let err = handlers
            .handle_subcontractor_declaration_submitted(&SubcontractorDeclarationSubmittedEvent {
                id: 5,
            })
            .await
            .unwrap_err();

        match err {
            DispatchError::TemplateResolution(e) => assert_eq!(e.value, "Partial"),
            other => panic!("expected template error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unset_submitted_at_is_omitted() {
        let mut mocks = Mocks::new();
        mocks.declarations.expect_declaration().returning(|_| {
            Ok(SubcontractorDeclaration {
                submitted_at: Some("0001-01-01T00:00:00".parse().unwrap()),
                ..declaration("Full")
            })
        });
        mocks
            .recipients
            .expect_eligible_recipients()
            .returning(|_, _| Ok(vec![Recipient::new("viewer@example.com")]));
        mocks.publisher.expect_publish().times(1).returning(|_| Ok(()));
        let handlers = mocks.into_handlers();

        let outcome = handlers
            .handle_subcontractor_declaration_submitted(&SubcontractorDeclarationSubmittedEvent {
                id: 5,
            })
            .await
            .unwrap();

        assert!(!outcome.envelope().unwrap().personalisation().contains_key("submittedAt"));
    }

    #[tokio::test]
    async fn test_no_viewers_is_audited() {
        let mut mocks = Mocks::new();
        mocks
            .declarations
            .expect_declaration()
            .returning(|_| Ok(declaration("Full")));
        mocks
            .recipients
            .expect_eligible_recipients()
            .returning(|_, _| Ok(Vec::new()));
        mocks.audit.expect_record().times(1).returning(|_| Ok(()));
        mocks.publisher.expect_publish().never();
        let handlers = mocks.into_handlers();

        let outcome = handlers
            .handle_subcontractor_declaration_submitted(&SubcontractorDeclarationSubmittedEvent {
                id: 5,
            })
            .await
            .unwrap();

        assert_eq!(outcome.as_str(), "audited");
    }
}
