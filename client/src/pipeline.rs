//! Authenticated request stage.
//!
//! Every backend call is built by a service, passed through
//! [`AuthPipeline::authorize`] and dispatched by [`AuthPipeline::send`]:
//!
//! ```text
//! RequestBuilder -> authorize() -> send() -> observe(status) -> Result<Response, ApiError>
//!                   X-API-KEY                401: clear store + Navigation::Login
//!                   Authorization (if token)
//! ```
//!
//! Headers are fixed when `authorize` runs. A request dispatched before a
//! concurrent 401 clears the store keeps the bearer header it was built with.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::sync::mpsc;

use finlab_types::{ApiKey, SessionToken};

use crate::error::ApiError;
use crate::read_capped_error_body;
use crate::session::TokenStore;

pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Where the application should go after a pipeline side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The session is gone; show the unauthenticated entry point.
    Login,
}

/// Build the authentication headers for one request.
///
/// The API key is always present. `Authorization` is present only when a token
/// is given. Values that cannot be encoded as header values are omitted and
/// logged.
#[must_use]
pub fn auth_headers(api_key: &ApiKey, token: Option<&SessionToken>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    match HeaderValue::from_str(api_key.expose()) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }
        Err(e) => tracing::warn!(%e, "API key is not a valid header value; omitting"),
    }

    if let Some(token) = token {
        match HeaderValue::from_str(&token.bearer()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => tracing::warn!(%e, "Session token is not a valid header value; omitting"),
        }
    }

    headers
}

#[derive(Debug, Clone)]
pub struct AuthPipeline {
    api_key: ApiKey,
    tokens: TokenStore,
    navigator: Option<mpsc::UnboundedSender<Navigation>>,
}

impl AuthPipeline {
    #[must_use]
    pub fn new(api_key: ApiKey, tokens: TokenStore) -> Self {
        Self {
            api_key,
            tokens,
            navigator: None,
        }
    }

    /// Deliver [`Navigation::Login`] on this channel whenever a 401 is observed.
    #[must_use]
    pub fn with_navigator(mut self, navigator: mpsc::UnboundedSender<Navigation>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Attach the API key and, if a session exists right now, the bearer token.
    #[must_use]
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.tokens.get();
        request.headers(auth_headers(&self.api_key, token.as_ref()))
    }

    /// Apply the response-side policy: a 401 ends the session.
    pub fn observe(&self, status: StatusCode) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }

        tracing::warn!("Backend answered 401; clearing session");
        self.tokens.clear();
        if let Some(navigator) = &self.navigator
            && navigator.send(Navigation::Login).is_err()
        {
            tracing::debug!("Navigation receiver dropped");
        }
    }

    /// Authorize, dispatch, observe, and map non-2xx responses to [`ApiError`].
    ///
    /// The 401 side effect never replaces the error: callers still receive
    /// [`ApiError::Unauthorized`].
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        self.observe(status);

        if status.is_success() {
            return Ok(response);
        }

        let body = read_capped_error_body(response).await;
        tracing::debug!(%status, "Backend request failed");
        Err(ApiError::from_status(status, body))
    }
}
