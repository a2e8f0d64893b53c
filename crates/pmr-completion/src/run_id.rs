//! Run-id format: `YYYYMMDD-HHmmss-MMM-<shortsha>-<cmdHash>` (spec.md §4.4).
//!
//! The completion protocol never constructs a run id itself — each QA gate
//! stamps its own result with one, typically derived from wall-clock time
//! plus the commit and command that produced it. This module only
//! validates shape, since AC2/AC4 need to compare run ids for equality,
//! not reconstruct them.

use once_cell::sync::Lazy;
use regex::Regex;

static RUN_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{8}-\d{6}-\d{3}-[0-9a-f]{7,40}-[0-9a-f]{8,64}$").expect("valid regex")
});

#[must_use]
pub fn is_well_formed(run_id: &str) -> bool {
    RUN_ID_PATTERN.is_match(run_id)
}
