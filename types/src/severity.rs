//! Response-time severity buckets for the results screen.

/// Threshold (ms) applied to tests whose name mentions "normal".
const NORMAL_LOAD_THRESHOLD_MS: f64 = 500.0;
/// Threshold (ms) applied to every other test category.
const DEFAULT_THRESHOLD_MS: f64 = 1000.0;
/// Fraction of the threshold below which a value is still good.
const GOOD_FRACTION: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Good,
    Warning,
    Bad,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Good => "good",
            Severity::Warning => "warning",
            Severity::Bad => "bad",
        }
    }
}

/// Bucket a response-time value for a test category.
///
/// Pure and total for non-negative values. Negative inputs fall into `Good`
/// but carry no meaning.
#[must_use]
pub fn classify(category: &str, value: f64) -> Severity {
    let threshold = if category.to_lowercase().contains("normal") {
        NORMAL_LOAD_THRESHOLD_MS
    } else {
        DEFAULT_THRESHOLD_MS
    };

    if value < threshold * GOOD_FRACTION {
        Severity::Good
    } else if value < threshold {
        Severity::Warning
    } else {
        Severity::Bad
    }
}
