use crate::criteria::CriterionOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three outcomes of one review iteration (spec.md §4.3 judgment rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Judgment {
    Pass,
    Reject,
    Retry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub judgment: Judgment,
    pub criteria_results: Vec<CriterionOutcome>,
    /// Populated only when `judgment` is `Reject`; the failed-criteria detail
    /// text fed into the next modification prompt.
    pub rejection_details: Vec<String>,
}
