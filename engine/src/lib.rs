//! Core engine for the FinLab console - state machine and configuration.
//!
//! This crate contains the `App` state machine without TUI dependencies.
//! Rendering and key handling live in `finlab-tui`.

mod app;
mod config;
mod task;
pub mod ui;

pub use app::{App, LoginView, LookupRecord, LookupView, ResultsView};
pub use config::{
    AppSection, BackendSection, ConfigError, DEFAULT_API_KEY, DEFAULT_BASE_URL, FinlabConfig,
    Settings, config_path, expand_env_vars,
};

// Re-export from crates for public API
pub use finlab_client::{self, ApiError, BackendConfig, BackendConfigError, TokenStore};
pub use finlab_types::{
    self, Iban, RiskStatus, Severity, TestResultListItem, TestResultSummary, classify,
    format_execution_date, sanitize_display_text,
};
