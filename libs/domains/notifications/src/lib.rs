//! Notification dispatcher domain.
//!
//! Turns domain events (feed ingestion problems, funding claim and
//! reconciliation state changes, subcontractor declarations, contract
//! lifecycle changes) into email notification envelopes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ NOTIFICATION_EVENTS │  ← JetStream, one subject per event type
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │ NotificationProcessor│ ← error category → ack / nak / term
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │ NotificationHandlers│  ← validate, enrich, resolve template
//! └─────┬─────────┬─────┘
//!       │         │
//! ┌─────▼───┐ ┌───▼─────┐
//! │Publisher│ │AuditSink│  ← notifications.email / zero recipients
//! └─────────┘ └─────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{NotificationHandlers, NotificationProcessor};
//!
//! let handlers = NotificationHandlers::new(settings, claims, declarations, recipients, publisher, audit);
//! let outcome = handlers.dispatch("funding-claims.claim.ready-to-sign", br#"{"id":1}"#).await?;
//! ```

pub mod audit;
pub mod enrichment;
pub mod envelope;
pub mod error;
pub mod events;
pub mod formatting;
pub mod handlers;
pub mod memory;
pub mod processor;
pub mod publisher;
pub mod routes;
pub mod streams;
pub mod templates;
pub mod timestamp;
pub mod validation;

pub use audit::{AuditAction, AuditError, AuditRecord, AuditSeverity, AuditSink, HttpAuditSink};
pub use enrichment::{
    DomainApiClient, FundingClaimsApi, HttpFundingClaimsApi, HttpRecipientsApi,
    HttpSubcontractorDeclarationsApi, Recipient, RecipientRole, RecipientsApi,
    SubcontractorDeclarationsApi, UpstreamFetchError,
};
pub use envelope::{
    BuilderPreconditionError, NotificationEnvelope, Personalisation, RequestingService,
};
pub use error::{DispatchError, DispatchResult};
pub use formatting::{format_display_date, format_optional_display_date, format_utc_display_date};
pub use handlers::{HandlerOutcome, NotificationHandlers};
pub use processor::NotificationProcessor;
pub use publisher::{
    DEFAULT_NOTIFICATIONS_SUBJECT, JetStreamPublisher, NotificationPublisher, PublishError,
};
pub use routes::EventRoute;
pub use streams::{NotificationEventsStream, OUTBOUND_STREAM};
pub use templates::{EmailMessageType, TemplateResolutionError};
pub use timestamp::SourceTimestamp;
pub use validation::{Validate, ValidationError};
