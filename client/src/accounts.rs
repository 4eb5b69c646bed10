use finlab_types::{Iban, RiskStatus};

use crate::{ApiError, Backend};

#[derive(Debug, Clone)]
pub struct AccountService {
    backend: Backend,
}

impl AccountService {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// `GET /accounts/{iban}`, or `GET /api/{version}/accounts/{iban}` when an
    /// API version is configured: screening decision for one account.
    pub async fn lookup(&self, iban: &Iban) -> Result<RiskStatus, ApiError> {
        tracing::debug!(%iban, "Looking up IBAN");
        let url = match self.backend.api_version() {
            Some(version) => self
                .backend
                .endpoint(&["api", version, "accounts", iban.as_str()]),
            None => self.backend.endpoint(&["accounts", iban.as_str()]),
        };
        let request = self.backend.http().get(url);

        let response = self.backend.pipeline().send(request).await?;
        let body = response.text().await.map_err(ApiError::Transport)?;
        if body.trim().is_empty() {
            return Err(ApiError::Decode("lookup returned an empty status".to_string()));
        }
        Ok(RiskStatus::parse(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::AccountService;
    use crate::{AuthPipeline, Backend, BackendConfig, Navigation, TokenStore};
    use finlab_types::{ApiKey, Iban, RiskStatus, SessionToken};
    use reqwest::StatusCode;
    use tokio::sync::mpsc;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(
        server: &MockServer,
        tokens: &TokenStore,
    ) -> (AccountService, mpsc::UnboundedReceiver<Navigation>) {
        let key = ApiKey::new("test-key").unwrap();
        let config = BackendConfig::new(Url::parse(&server.uri()).unwrap(), key.clone()).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let pipeline = AuthPipeline::new(key, tokens.clone()).with_navigator(tx);
        (
            AccountService::new(Backend::new(config, pipeline).unwrap()),
            rx,
        )
    }

    fn versioned_service(server: &MockServer, version: &str) -> AccountService {
        let key = ApiKey::new("test-key").unwrap();
        let config = BackendConfig::new(Url::parse(&server.uri()).unwrap(), key.clone())
            .unwrap()
            .with_api_version(Some(version.to_string()));
        let pipeline = AuthPipeline::new(key, TokenStore::new());
        AccountService::new(Backend::new(config, pipeline).unwrap())
    }

    async fn mount_status(server: &MockServer, iban: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/accounts/{iban}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn lookup_returns_each_status() {
        let server = MockServer::start().await;
        mount_status(&server, "GB33BUKB20201555555555", "ALLOW").await;
        mount_status(&server, "FR1420041010050500013M02606", "\"BLOCK\"").await;
        mount_status(&server, "DE89370400440532013000", "review").await;

        let (service, _rx) = service(&server, &TokenStore::new());
        let cases = [
            ("GB33BUKB20201555555555", RiskStatus::Allow),
            ("FR1420041010050500013M02606", RiskStatus::Block),
            ("DE89370400440532013000", RiskStatus::Review),
        ];
        for (iban, expected) in cases {
            let status = service.lookup(&Iban::parse(iban).unwrap()).await.unwrap();
            assert_eq!(status, expected, "{iban}");
        }
    }

    #[tokio::test]
    async fn lookup_carries_api_key_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/GB33BUKB20201555555555"))
            .and(header("X-API-KEY", "test-key"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ALLOW"))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = TokenStore::new();
        tokens.set(SessionToken::new("abc").unwrap());
        let (service, _rx) = service(&server, &tokens);
        let iban = Iban::parse("GB33BUKB20201555555555").unwrap();
        assert_eq!(service.lookup(&iban).await.unwrap(), RiskStatus::Allow);
    }

    #[tokio::test]
    async fn lookup_without_session_sends_no_authorization() {
        let server = MockServer::start().await;
        mount_status(&server, "GB33BUKB20201555555555", "ALLOW").await;

        let (service, _rx) = service(&server, &TokenStore::new());
        let iban = Iban::parse("GB33BUKB20201555555555").unwrap();
        service.lookup(&iban).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
        assert_eq!(requests[0].headers.get("x-api-key").unwrap(), "test-key");
    }

    #[tokio::test]
    async fn not_found_is_reported_without_ending_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/INVALID123"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let tokens = TokenStore::new();
        tokens.set(SessionToken::new("abc").unwrap());
        let (service, mut rx) = service(&server, &tokens);
        let err = service
            .lookup(&Iban::parse("INVALID123").unwrap())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(tokens.exists());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unauthorized_ends_session_and_still_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/GB33BUKB20201555555555"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let tokens = TokenStore::new();
        tokens.set(SessionToken::new("expired").unwrap());
        let (service, mut rx) = service(&server, &tokens);
        let err = service
            .lookup(&Iban::parse("GB33BUKB20201555555555").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(!tokens.exists());
        assert_eq!(rx.try_recv().unwrap(), Navigation::Login);
    }

    #[tokio::test]
    async fn versioned_lookup_goes_under_api_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/GB33BUKB20201555555555"))
            .respond_with(ResponseTemplate::new(200).set_body_string("BLOCK"))
            .expect(1)
            .mount(&server)
            .await;

        let service = versioned_service(&server, "v1");
        let iban = Iban::parse("GB33BUKB20201555555555").unwrap();
        assert_eq!(service.lookup(&iban).await.unwrap(), RiskStatus::Block);
    }

    #[tokio::test]
    async fn unversioned_lookup_stays_at_root() {
        let server = MockServer::start().await;
        mount_status(&server, "GB33BUKB20201555555555", "ALLOW").await;

        let (service, _rx) = service(&server, &TokenStore::new());
        let iban = Iban::parse("GB33BUKB20201555555555").unwrap();
        service.lookup(&iban).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.path(), "/accounts/GB33BUKB20201555555555");
    }
}
