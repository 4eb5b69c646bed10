//! HTTP client for the FinLab risk-screening backend.
//!
//! # Architecture
//!
//! - [`TokenStore`] - the single in-memory session token plus clear listeners
//! - [`AuthPipeline`] - explicit request stage that attaches `X-API-KEY` and
//!   `Authorization: Bearer`, and ends the session on 401
//! - [`Backend`] - base URL + shared `reqwest::Client` + pipeline
//! - [`AuthService`], [`AccountService`], [`ResultsService`] - stateless wrappers
//!   around the five backend endpoints
//!
//! ```text
//! service -> Backend::endpoint() -> reqwest builder -> AuthPipeline::send() -> ApiError | Response
//! ```
//!
//! # Error Handling
//!
//! Every call returns [`ApiError`]. Nothing is retried. The only status with a
//! side effect is 401, handled inside the pipeline before the error reaches the
//! caller.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod pipeline;
pub mod results;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

pub use accounts::AccountService;
pub use auth::AuthService;
pub use error::ApiError;
pub use finlab_types;
pub use pipeline::{API_KEY_HEADER, AuthPipeline, Navigation, auth_headers};
pub use results::ResultsService;
pub use session::{ListenerId, TokenStore};

use finlab_types::ApiKey;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum BackendConfigError {
    #[error("base URL {0} cannot carry a path")]
    NotABase(Url),
    #[error("base URL scheme must be http or https, got {0}")]
    Scheme(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Connection settings for one backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    base_url: Url,
    api_key: ApiKey,
    connect_timeout: Duration,
    api_version: Option<String>,
}

impl BackendConfig {
    pub fn new(base_url: Url, api_key: ApiKey) -> Result<Self, BackendConfigError> {
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(BackendConfigError::Scheme(base_url.scheme().to_string()));
        }
        if base_url.cannot_be_a_base() {
            return Err(BackendConfigError::NotABase(base_url));
        }

        Ok(Self {
            base_url,
            api_key,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            api_version: None,
        })
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Route account lookups under `/api/{version}`. Blank values are ignored.
    #[must_use]
    pub fn with_api_version(mut self, version: Option<String>) -> Self {
        self.api_version = version
            .map(|v| v.trim().trim_matches('/').to_string())
            .filter(|v| !v.is_empty());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    #[must_use]
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }
}

fn build_http_client(config: &BackendConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .build()
}

/// Shared handle to one backend; cheap to clone.
#[derive(Debug, Clone)]
pub struct Backend {
    inner: Arc<BackendInner>,
}

#[derive(Debug)]
struct BackendInner {
    base_url: Url,
    api_version: Option<String>,
    http: reqwest::Client,
    pipeline: AuthPipeline,
}

impl Backend {
    pub fn new(config: BackendConfig, pipeline: AuthPipeline) -> Result<Self, BackendConfigError> {
        let http = build_http_client(&config).map_err(BackendConfigError::Client)?;
        tracing::info!(
            base_url = %config.base_url,
            api_version = config.api_version.as_deref().unwrap_or("none"),
            "Backend client ready"
        );
        Ok(Self {
            inner: Arc::new(BackendInner {
                base_url: config.base_url,
                api_version: config.api_version,
                http,
                pipeline,
            }),
        })
    }

    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    #[must_use]
    pub fn pipeline(&self) -> &AuthPipeline {
        &self.inner.pipeline
    }

    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.inner.api_version.as_deref()
    }

    /// Append path segments to the base URL, percent-encoding each one.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Read at most `MAX_ERROR_BODY_BYTES` of an error response as lossy UTF-8.
pub async fn read_capped_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                body.extend_from_slice(&chunk);
                if body.len() > MAX_ERROR_BODY_BYTES {
                    body.truncate(MAX_ERROR_BODY_BYTES);
                    let text = String::from_utf8_lossy(&body);
                    return format!("{text}...(truncated)");
                }
            }
            Ok(None) | Err(_) => break,
        }
    }
    String::from_utf8_lossy(&body).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{AuthPipeline, Backend, BackendConfig, BackendConfigError, TokenStore};
    use finlab_types::ApiKey;
    use url::Url;

    fn backend(base: &str) -> Backend {
        let key = ApiKey::new("k").unwrap();
        let config = BackendConfig::new(Url::parse(base).unwrap(), key.clone()).unwrap();
        Backend::new(config, AuthPipeline::new(key, TokenStore::new())).unwrap()
    }

    #[test]
    fn endpoint_appends_segments() {
        let backend = backend("http://localhost:8081");
        assert_eq!(
            backend.endpoint(&["results", "test1"]).as_str(),
            "http://localhost:8081/results/test1"
        );
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let backend = backend("http://localhost:8081/api/v1/");
        assert_eq!(
            backend.endpoint(&["accounts", "DE89370400440532013000"]).as_str(),
            "http://localhost:8081/api/v1/accounts/DE89370400440532013000"
        );
    }

    #[test]
    fn endpoint_encodes_segments() {
        let backend = backend("http://localhost:8081");
        assert_eq!(
            backend.endpoint(&["accounts", "GB33 BUKB/1"]).as_str(),
            "http://localhost:8081/accounts/GB33%20BUKB%2F1"
        );
    }

    #[test]
    fn api_version_is_trimmed_and_blank_is_unset() {
        let key = ApiKey::new("k").unwrap();
        let base = Url::parse("http://localhost:8081").unwrap();
        let config = BackendConfig::new(base.clone(), key.clone())
            .unwrap()
            .with_api_version(Some(" /v1/ ".to_string()));
        assert_eq!(config.api_version(), Some("v1"));

        let config = BackendConfig::new(base, key)
            .unwrap()
            .with_api_version(Some("  ".to_string()));
        assert_eq!(config.api_version(), None);
    }

    #[test]
    fn config_rejects_non_http_scheme() {
        let key = ApiKey::new("k").unwrap();
        let err = BackendConfig::new(Url::parse("ftp://example.com").unwrap(), key).unwrap_err();
        assert!(matches!(err, BackendConfigError::Scheme(_)));
    }
}
