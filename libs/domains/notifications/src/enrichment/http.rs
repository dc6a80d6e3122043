//! reqwest-backed implementations of the enrichment traits.

use super::{
    FundingClaim, FundingClaimsApi, Recipient, RecipientRole, RecipientsApi, Reconciliation,
    SubcontractorDeclaration, SubcontractorDeclarationsApi, UpstreamFetchError,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Shared GET plumbing for one upstream API.
#[derive(Debug, Clone)]
pub struct DomainApiClient {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
}

impl DomainApiClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: None,
            timeout: None,
        }
    }

    /// Static token sent as `Authorization: Bearer`. Acquiring it is the caller's job.
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request builder with the bearer token and timeout applied.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        request
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        entity: &'static str,
        id: String,
    ) -> Result<T, UpstreamFetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, entity, id = %id, "Fetching upstream entity");

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|e| UpstreamFetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamFetchError::NotFound { entity, id });
        }
        if !status.is_success() {
            return Err(UpstreamFetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamFetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        serde_json::from_slice(&body).map_err(|e| UpstreamFetchError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

pub struct HttpFundingClaimsApi {
    api: DomainApiClient,
}

impl HttpFundingClaimsApi {
    pub fn new(api: DomainApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FundingClaimsApi for HttpFundingClaimsApi {
    async fn funding_claim(&self, id: i32) -> Result<FundingClaim, UpstreamFetchError> {
        self.api
            .get_json(&format!("/api/funding-claims/{id}"), "FundingClaim", id.to_string())
            .await
    }

    async fn reconciliation(&self, id: i32) -> Result<Reconciliation, UpstreamFetchError> {
        self.api
            .get_json(
                &format!("/api/reconciliations/{id}"),
                "Reconciliation",
                id.to_string(),
            )
            .await
    }
}

pub struct HttpSubcontractorDeclarationsApi {
    api: DomainApiClient,
}

impl HttpSubcontractorDeclarationsApi {
    pub fn new(api: DomainApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SubcontractorDeclarationsApi for HttpSubcontractorDeclarationsApi {
    async fn declaration(&self, id: i32) -> Result<SubcontractorDeclaration, UpstreamFetchError> {
        self.api
            .get_json(
                &format!("/api/subcontractor-declarations/{id}"),
                "SubcontractorDeclaration",
                id.to_string(),
            )
            .await
    }
}

pub struct HttpRecipientsApi {
    api: DomainApiClient,
}

impl HttpRecipientsApi {
    pub fn new(api: DomainApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RecipientsApi for HttpRecipientsApi {
    async fn eligible_recipients(
        &self,
        ukprn: i32,
        role: RecipientRole,
    ) -> Result<Vec<Recipient>, UpstreamFetchError> {
        self.api
            .get_json(
                &format!("/api/organisations/{ukprn}/recipients?role={role}"),
                "Organisation",
                ukprn.to_string(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> DomainApiClient {
        DomainApiClient::new(Client::new(), server.uri())
    }

    #[tokio::test]
    async fn test_fetches_funding_claim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/funding-claims/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "ukprn": 10000001,
                "organisationName": "Example College",
                "collectionName": "2324 Mid Year",
                "signingDeadline": "2024-01-05T22:06:45"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let claim = HttpFundingClaimsApi::new(api(&server))
            .funding_claim(1)
            .await
            .unwrap();

        assert_eq!(claim.ukprn, 10000001);
        assert_eq!(claim.collection_name, "2324 Mid Year");
        assert!(claim.signing_deadline.is_some());
    }

    #[tokio::test]
    async fn test_not_found_is_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/reconciliations/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = HttpFundingClaimsApi::new(api(&server))
            .reconciliation(9)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            UpstreamFetchError::NotFound {
                entity: "Reconciliation",
                id: "9".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/subcontractor-declarations/3"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = HttpSubcontractorDeclarationsApi::new(api(&server))
            .declaration(3)
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamFetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_bad_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/funding-claims/2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = HttpFundingClaimsApi::new(api(&server))
            .funding_claim(2)
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamFetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = DomainApiClient::new(Client::new(), "http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));

        let err = HttpFundingClaimsApi::new(client)
            .funding_claim(1)
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamFetchError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_recipients_query_role_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organisations/10000001/recipients"))
            .and(query_param("role", "ContractSignatory"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "email": "signer@example.com", "displayName": "Sam Signer" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = api(&server).with_bearer_token(Some("s3cret".to_string()));
        let recipients = HttpRecipientsApi::new(client)
            .eligible_recipients(10000001, RecipientRole::ContractSignatory)
            .await
            .unwrap();

        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].email, "signer@example.com");
    }

    #[tokio::test]
    async fn test_empty_recipient_list_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organisations/42/recipients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let recipients = HttpRecipientsApi::new(api(&server))
            .eligible_recipients(42, RecipientRole::FundingClaimsSignatory)
            .await
            .unwrap();

        assert!(recipients.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = DomainApiClient::new(Client::new(), "http://api.example.com/");
        assert_eq!(client.base_url(), "http://api.example.com");
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let client = DomainApiClient::new(Client::new(), "http://x")
            .with_bearer_token(Some("  ".to_string()));
        assert!(client.bearer_token.is_none());
    }
}
