//! IBAN lookup form and its per-session history.

use chrono::{DateTime, Local};

use finlab_client::ApiError;
use finlab_types::{Iban, RiskStatus};

use super::App;
use crate::task::{Pending, poll_slot};
use crate::ui::DraftInput;

pub(crate) const IBAN_REQUIRED: &str = "Please enter an IBAN";
pub(crate) const LOOKUP_FAILED: &str = "Failed to lookup IBAN";

type LookupOutcome = (Iban, Result<RiskStatus, ApiError>);

/// One completed lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRecord {
    pub iban: Iban,
    pub status: RiskStatus,
    pub looked_up_at: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct LookupView {
    draft: DraftInput,
    /// Newest first.
    history: Vec<LookupRecord>,
    error: Option<String>,
    pending: Option<Pending<LookupOutcome>>,
}

impl LookupView {
    #[must_use]
    pub fn draft(&self) -> &DraftInput {
        &self.draft
    }

    #[must_use]
    pub fn history(&self) -> &[LookupRecord] {
        &self.history
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Forget an in-flight lookup; its result will never be applied.
    pub(crate) fn reset_pending(&mut self) {
        self.pending = None;
    }
}

impl App {
    pub fn lookup_draft_mut(&mut self) -> &mut DraftInput {
        &mut self.lookup.draft
    }

    /// Look up the drafted IBAN. Blank input never reaches the backend.
    pub fn submit_lookup(&mut self) {
        if self.lookup.is_loading() {
            return;
        }
        let Ok(iban) = Iban::parse(self.lookup.draft.text()) else {
            self.lookup.error = Some(IBAN_REQUIRED.to_string());
            return;
        };

        self.lookup.error = None;
        let accounts = self.accounts.clone();
        self.lookup.pending = Some(Pending::spawn("iban lookup", async move {
            let result = accounts.lookup(&iban).await;
            (iban, result)
        }));
    }

    pub fn clear_history(&mut self) {
        self.lookup.clear_history();
    }

    pub(super) fn poll_lookup(&mut self) {
        let Some(outcome) = poll_slot(&mut self.lookup.pending) else {
            return;
        };

        match outcome {
            Ok((iban, Ok(status))) => {
                tracing::info!(%iban, %status, "IBAN screened");
                self.lookup.history.insert(
                    0,
                    LookupRecord {
                        iban,
                        status,
                        looked_up_at: Local::now(),
                    },
                );
                self.lookup.draft.clear();
            }
            Ok((iban, Err(e))) => {
                tracing::warn!(%iban, status = ?e.status(), "IBAN lookup failed: {e}");
                self.lookup.error = Some(LOOKUP_FAILED.to_string());
            }
            Err(e) => {
                tracing::error!("{e}");
                self.lookup.error = Some(LOOKUP_FAILED.to_string());
            }
        }
    }
}
