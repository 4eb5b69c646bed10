//! Login and logout against the gateway's `/auth` endpoints.

use serde::Serialize;
use serde_json::json;

use finlab_types::SessionToken;

use crate::{ApiError, Backend};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    backend: Backend,
}

impl AuthService {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// `POST /auth/login`. The response body is the token as plain text.
    ///
    /// Storing the token is the caller's decision.
    pub async fn login(&self, username: &str) -> Result<SessionToken, ApiError> {
        tracing::info!(username, "Logging in");
        let url = self.backend.endpoint(&["auth", "login"]);
        let request = self
            .backend
            .http()
            .post(url)
            .json(&LoginRequest { username });

        let response = self.backend.pipeline().send(request).await?;
        let body = response.text().await.map_err(ApiError::Transport)?;
        SessionToken::new(body.trim())
            .map_err(|_| ApiError::Decode("login returned an empty token".to_string()))
    }

    /// `POST /auth/logout` with an empty JSON object.
    pub async fn logout(&self) -> Result<(), ApiError> {
        tracing::info!("Logging out");
        let url = self.backend.endpoint(&["auth", "logout"]);
        let request = self.backend.http().post(url).json(&json!({}));
        self.backend.pipeline().send(request).await?;
        Ok(())
    }
}
