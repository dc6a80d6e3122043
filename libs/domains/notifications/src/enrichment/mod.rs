//! Read-side clients for the upstream domain APIs.
//!
//! Entities are fetched on demand and never cached. An empty recipient list
//! is a valid answer, not an error.

mod http;
mod models;

pub use http::{
    DomainApiClient, HttpFundingClaimsApi, HttpRecipientsApi, HttpSubcontractorDeclarationsApi,
};
pub use models::{FundingClaim, Recipient, RecipientRole, Reconciliation, SubcontractorDeclaration};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamFetchError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Connection failures and timeouts.
    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("GET {url} returned an unreadable body: {message}")]
    Decode { url: String, message: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundingClaimsApi: Send + Sync {
    async fn funding_claim(&self, id: i32) -> Result<FundingClaim, UpstreamFetchError>;

    async fn reconciliation(&self, id: i32) -> Result<Reconciliation, UpstreamFetchError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubcontractorDeclarationsApi: Send + Sync {
    async fn declaration(&self, id: i32) -> Result<SubcontractorDeclaration, UpstreamFetchError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipientsApi: Send + Sync {
    /// Users of organisation `ukprn` holding `role`. May be empty.
    async fn eligible_recipients(
        &self,
        ukprn: i32,
        role: RecipientRole,
    ) -> Result<Vec<Recipient>, UpstreamFetchError>;
}
