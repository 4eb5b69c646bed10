use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single backend call.
///
/// Callers branch on [`ApiError::status`]; the UI only distinguishes 401, which
/// the pipeline has already acted on by the time the error is returned.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unauthorized: {body}")]
    Unauthorized { body: String },
    #[error("not found: {body}")]
    NotFound { body: String },
    #[error("client error {status}: {body}")]
    Client { status: StatusCode, body: String },
    #[error("server error {status}: {body}")]
    Server { status: StatusCode, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success response.
    #[must_use]
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { body },
            StatusCode::NOT_FOUND => ApiError::NotFound { body },
            status if status.is_server_error() => ApiError::Server { status, body },
            status => ApiError::Client { status, body },
        }
    }

    /// HTTP status behind the failure, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            ApiError::Client { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::Decode(_) => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
