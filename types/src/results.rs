//! Load-test result models as served by the results endpoints.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{Severity, classify};

/// One row of `GET /results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultListItem {
    pub test_id: String,
    pub test_name: String,
    pub execution_date: String,
    pub file_name: String,
}

/// Body of `GET /results/{testId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultSummary {
    pub test_id: String,
    pub test_name: String,
    pub execution_date: String,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub error_rate: f64,
    pub average_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub p90_response_time: f64,
    pub p95_response_time: f64,
    pub throughput: f64,
}

impl TestResultSummary {
    #[must_use]
    pub fn average_severity(&self) -> Severity {
        classify(&self.test_name, self.average_response_time)
    }

    #[must_use]
    pub fn p90_severity(&self) -> Severity {
        classify(&self.test_name, self.p90_response_time)
    }

    #[must_use]
    pub fn p95_severity(&self) -> Severity {
        classify(&self.test_name, self.p95_response_time)
    }
}

const WIRE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Render a zone-less `executionDate` as `YYYY-MM-DD HH:MM`.
///
/// Values that do not parse are returned unchanged.
#[must_use]
pub fn format_execution_date(raw: &str) -> String {
    WIRE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map_or_else(
            || raw.to_string(),
            |parsed| parsed.format("%Y-%m-%d %H:%M").to_string(),
        )
}
