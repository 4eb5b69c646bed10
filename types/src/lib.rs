//! Core domain types for the FinLab console.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod results;
mod sanitize;
mod severity;

pub use results::{TestResultListItem, TestResultSummary, format_execution_date};
pub use sanitize::sanitize_display_text;
pub use severity::{Severity, classify};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Credentials
// ============================================================================

/// Opaque session credential returned by the login endpoint.
///
/// The value is never printed through `Debug`; use [`SessionToken::expose`] at the
/// single place it is written into a header.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

#[derive(Debug, Error)]
#[error("session token must not be empty")]
pub struct EmptyTokenError;

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyTokenError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyTokenError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<redacted>)")
    }
}

impl TryFrom<String> for SessionToken {
    type Error = EmptyTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SessionToken {
    type Error = EmptyTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Static key sent as `X-API-KEY` on every backend request.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

#[derive(Debug, Error)]
#[error("API key must not be empty")]
pub struct EmptyApiKeyError;

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyApiKeyError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Err(EmptyApiKeyError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// Operator-entered account number, trimmed and non-empty.
///
/// No checksum validation happens here: the backend decides whether the
/// account is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iban(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("IBAN must not be empty")]
pub struct EmptyIbanError;

impl Iban {
    pub fn parse(raw: &str) -> Result<Self, EmptyIbanError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(EmptyIbanError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Iban {
    type Error = EmptyIbanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Iban> for String {
    fn from(value: Iban) -> Self {
        value.0
    }
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Screening decision for an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RiskStatus {
    Allow,
    Review,
    Block,
    /// Anything the backend returned that is not one of the known decisions.
    Unrecognized(String),
}

impl RiskStatus {
    /// Parse a lookup response body.
    ///
    /// Accepts a bare word (`ALLOW`) or a JSON string (`"allow"`), in any case.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let trimmed = body.trim();
        let word = serde_json::from_str::<String>(trimmed).unwrap_or_else(|_| trimmed.to_string());
        match word.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => RiskStatus::Allow,
            "REVIEW" => RiskStatus::Review,
            "BLOCK" => RiskStatus::Block,
            _ => RiskStatus::Unrecognized(word),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            RiskStatus::Allow => "ALLOW",
            RiskStatus::Review => "REVIEW",
            RiskStatus::Block => "BLOCK",
            RiskStatus::Unrecognized(raw) => raw,
        }
    }

    /// Style class used by the lookup history; `None` renders unstyled.
    #[must_use]
    pub fn style_class(&self) -> Option<&'static str> {
        match self {
            RiskStatus::Allow => Some("status-allow"),
            RiskStatus::Review => Some("status-review"),
            RiskStatus::Block => Some("status-block"),
            RiskStatus::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiKey, Iban, RiskStatus, SessionToken};

    #[test]
    fn session_token_rejects_blank() {
        assert!(SessionToken::new("").is_err());
        assert!(SessionToken::new("   ").is_err());
        assert!(SessionToken::new("abc").is_ok());
    }

    #[test]
    fn session_token_debug_is_redacted() {
        let token = SessionToken::new("secret-jwt").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-jwt"));
        assert_eq!(token.bearer(), "Bearer secret-jwt");
    }

    #[test]
    fn api_key_trims_and_redacts() {
        let key = ApiKey::new("  k-123 ").unwrap();
        assert_eq!(key.expose(), "k-123");
        assert!(!format!("{key:?}").contains("k-123"));
        assert!(ApiKey::new("").is_err());
    }

    #[test]
    fn iban_is_trimmed() {
        let iban = Iban::parse("  GB33BUKB20201555555555 ").unwrap();
        assert_eq!(iban.as_str(), "GB33BUKB20201555555555");
        assert!(Iban::parse(" \t ").is_err());
    }

    #[test]
    fn risk_status_parses_bare_and_json_bodies() {
        assert_eq!(RiskStatus::parse("ALLOW"), RiskStatus::Allow);
        assert_eq!(RiskStatus::parse("\"REVIEW\""), RiskStatus::Review);
        assert_eq!(RiskStatus::parse("block\n"), RiskStatus::Block);
        assert_eq!(RiskStatus::parse("Allow"), RiskStatus::Allow);
    }

    #[test]
    fn risk_status_keeps_unknown_values() {
        let status = RiskStatus::parse("PENDING");
        assert_eq!(status, RiskStatus::Unrecognized("PENDING".to_string()));
        assert_eq!(status.style_class(), None);
        assert_eq!(status.label(), "PENDING");
    }

    #[test]
    fn risk_status_style_classes() {
        assert_eq!(RiskStatus::Allow.style_class(), Some("status-allow"));
        assert_eq!(RiskStatus::Review.style_class(), Some("status-review"));
        assert_eq!(RiskStatus::Block.style_class(), Some("status-block"));
    }
}
