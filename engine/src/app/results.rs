//! Stress-test results list and the detail panel.

use std::future::Future;

use finlab_client::ApiError;
use finlab_types::{TestResultListItem, TestResultSummary};

use super::App;
use crate::task::{Pending, poll_slot};

pub(crate) const LOAD_RESULTS_FAILED: &str = "Failed to load test results";
pub(crate) const LOAD_DETAILS_FAILED: &str = "Failed to load test details";

/// Which request occupies the results slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum ResultsRequest {
    #[default]
    List,
    Details,
}

impl ResultsRequest {
    fn failure_message(self) -> &'static str {
        match self {
            Self::List => LOAD_RESULTS_FAILED,
            Self::Details => LOAD_DETAILS_FAILED,
        }
    }
}

#[derive(Debug)]
pub(crate) enum ResultsFetch {
    List(Result<Vec<TestResultListItem>, ApiError>),
    Details(Result<TestResultSummary, ApiError>),
}

#[derive(Debug, Default)]
pub struct ResultsView {
    items: Vec<TestResultListItem>,
    selected: usize,
    details: Option<TestResultSummary>,
    error: Option<String>,
    /// List and detail requests share one slot and one loading flag.
    pending: Option<Pending<ResultsFetch>>,
    in_flight: ResultsRequest,
}

impl ResultsView {
    #[must_use]
    pub fn items(&self) -> &[TestResultListItem] {
        &self.items
    }

    /// Cursor row in the list; meaningless when the list is empty.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected_item(&self) -> Option<&TestResultListItem> {
        self.items.get(self.selected)
    }

    #[must_use]
    pub fn details(&self) -> Option<&TestResultSummary> {
        self.details.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub(crate) fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

impl App {
    /// Fetch `/results` again.
    pub fn reload_results(&mut self) {
        if self.results.is_loading() {
            return;
        }
        let service = self.results_service.clone();
        self.spawn_results_fetch(ResultsRequest::List, async move {
            ResultsFetch::List(service.list().await)
        });
    }

    /// Load the summary for the row under the cursor.
    pub fn view_selected_details(&mut self) {
        if let Some(test_id) = self.results.selected_item().map(|item| item.test_id.clone()) {
            self.view_details(test_id);
        }
    }

    pub fn view_details(&mut self, test_id: String) {
        if self.results.is_loading() {
            return;
        }
        let service = self.results_service.clone();
        self.spawn_results_fetch(ResultsRequest::Details, async move {
            ResultsFetch::Details(service.summary(&test_id).await)
        });
    }

    pub(super) fn spawn_results_fetch<F>(&mut self, request: ResultsRequest, future: F)
    where
        F: Future<Output = ResultsFetch> + Send + 'static,
    {
        let label = match request {
            ResultsRequest::List => "results list",
            ResultsRequest::Details => "results summary",
        };
        self.results.error = None;
        self.results.in_flight = request;
        self.results.pending = Some(Pending::spawn(label, future));
    }

    pub fn close_details(&mut self) {
        self.results.details = None;
    }

    pub fn select_next_result(&mut self) {
        self.results.select_next();
    }

    pub fn select_prev_result(&mut self) {
        self.results.select_prev();
    }

    pub(super) fn poll_results(&mut self) {
        let Some(outcome) = poll_slot(&mut self.results.pending) else {
            return;
        };

        match outcome {
            Ok(ResultsFetch::List(Ok(items))) => {
                self.results.selected = self.results.selected.min(items.len().saturating_sub(1));
                self.results.items = items;
            }
            Ok(ResultsFetch::List(Err(e))) => {
                tracing::warn!(status = ?e.status(), "Loading test results failed: {e}");
                self.results.error = Some(LOAD_RESULTS_FAILED.to_string());
            }
            Ok(ResultsFetch::Details(Ok(summary))) => {
                self.results.details = Some(summary);
            }
            Ok(ResultsFetch::Details(Err(e))) => {
                tracing::warn!(status = ?e.status(), "Loading test details failed: {e}");
                self.results.error = Some(LOAD_DETAILS_FAILED.to_string());
            }
            Err(e) => {
                tracing::error!("{e}");
                self.results.error = Some(self.results.in_flight.failure_message().to_string());
            }
        }
    }
}
