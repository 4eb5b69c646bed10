//! Login form.

use finlab_client::ApiError;
use finlab_types::SessionToken;

use super::App;
use crate::task::{Pending, poll_slot};
use crate::ui::{DraftInput, Screen, StatusLine};

pub(crate) const LOGIN_FAILED: &str = "Login failed";
pub(crate) const USERNAME_REQUIRED: &str = "Please enter a username";

type LoginOutcome = (String, Result<SessionToken, ApiError>);

#[derive(Debug, Default)]
pub struct LoginView {
    username: DraftInput,
    error: Option<String>,
    pending: Option<Pending<LoginOutcome>>,
}

impl LoginView {
    pub(crate) fn new(prefill: Option<String>) -> Self {
        Self {
            username: prefill.map(DraftInput::with_text).unwrap_or_default(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn username(&self) -> &DraftInput {
        &self.username
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Editable username draft; `None` while a login is in flight.
    pub fn login_draft_mut(&mut self) -> Option<&mut DraftInput> {
        if self.login.is_loading() {
            return None;
        }
        Some(&mut self.login.username)
    }

    /// Send the username to `/auth/login`.
    pub fn submit_login(&mut self) {
        if self.login.is_loading() {
            return;
        }
        if self.login.username.is_blank() {
            self.login.error = Some(USERNAME_REQUIRED.to_string());
            return;
        }

        let username = self.login.username.text().trim().to_string();
        self.login.error = None;
        let auth = self.auth.clone();
        self.login.pending = Some(Pending::spawn("login", async move {
            let result = auth.login(&username).await;
            (username, result)
        }));
    }

    pub(super) fn poll_login(&mut self) {
        let Some(outcome) = poll_slot(&mut self.login.pending) else {
            return;
        };

        match outcome {
            Ok((username, Ok(token))) => {
                tracing::info!(username, "Logged in");
                self.tokens.set(token);
                self.login.error = None;
                self.screen = Screen::Accounts;
                self.status = Some(StatusLine::info(format!("Logged in as {username}")));
            }
            Ok((_, Err(e))) => {
                tracing::warn!(status = ?e.status(), "Login failed: {e}");
                self.login.error = Some(LOGIN_FAILED.to_string());
            }
            Err(e) => {
                tracing::error!("{e}");
                self.login.error = Some(LOGIN_FAILED.to_string());
            }
        }
    }
}
