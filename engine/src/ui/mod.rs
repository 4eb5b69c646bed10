//! UI-facing types for the engine.

mod input;

pub use input::DraftInput;

/// Which view the console is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Login,
    Accounts,
    Results,
}

impl Screen {
    /// Screens reachable from the topbar once a session exists.
    pub const AUTHENTICATED: [Self; 2] = [Self::Accounts, Self::Results];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Accounts => "IBAN Lookup",
            Self::Results => "Stress Test Results",
        }
    }

    #[must_use]
    pub const fn requires_session(self) -> bool {
        !matches!(self, Self::Login)
    }
}

/// UI configuration options derived from config/environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    pub high_contrast: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// One-line message shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}
