use super::{FUNDING_CLAIMS_PORTAL_URL, HandlerOutcome, NotificationHandlers};
use crate::enrichment::RecipientRole;
use crate::envelope::{Personalisation, RequestingService};
use crate::error::DispatchResult;
use crate::events::{FundingClaimEvent, FundingClaimNotification};
use crate::formatting::format_optional_display_date;
use crate::templates::funding_claim_template;
use crate::timestamp::SourceTimestamp;
use crate::validation::Validate;
use tracing::instrument;

/// The fields a claim and a reconciliation have in common.
struct ClaimSummary {
    ukprn: i32,
    organisation_name: String,
    collection_name: String,
    signing_deadline: Option<SourceTimestamp>,
}

impl NotificationHandlers {
    /// Notify the organisation's signatories that a claim or reconciliation
    /// changed state. `notification` comes from the subject the event arrived on.
    #[instrument(skip(self, event), fields(id = event.id))]
    pub async fn handle_funding_claim(
        &self,
        notification: FundingClaimNotification,
        event: &FundingClaimEvent,
    ) -> DispatchResult<HandlerOutcome> {
        event.validate()?;

        let summary = if notification.is_reconciliation() {
            let r = self.funding_claims.reconciliation(event.id).await?;
            ClaimSummary {
                ukprn: r.ukprn,
                organisation_name: r.organisation_name,
                collection_name: r.collection_name,
                signing_deadline: r.signing_deadline,
            }
        } else {
            let c = self.funding_claims.funding_claim(event.id).await?;
            ClaimSummary {
                ukprn: c.ukprn,
                organisation_name: c.organisation_name,
                collection_name: c.collection_name,
                signing_deadline: c.signing_deadline,
            }
        };

        let recipients = self
            .eligible_recipients(summary.ukprn, RecipientRole::FundingClaimsSignatory)
            .await?;
        if recipients.is_empty() {
            let detail = if notification.is_reconciliation() {
                "reconciliation"
            } else {
                "funding claim"
            };
            return Ok(self
                .audit_no_recipients(RequestingService::FundingClaims, event.id.to_string(), detail)
                .await);
        }

        let template = funding_claim_template(notification);
        let portal_url = self.settings.required(FUNDING_CLAIMS_PORTAL_URL)?;
        let personalisation = Personalisation::new()
            .with("organisationName", summary.organisation_name)
            .with("collectionName", summary.collection_name)
            .with_optional(
                "signingDeadline",
                format_optional_display_date(summary.signing_deadline.as_ref()),
            )
            .with("portalUrl", portal_url);

        self.publish(
            recipients,
            RequestingService::FundingClaims,
            template,
            personalisation,
        )
        .await
    }
}
