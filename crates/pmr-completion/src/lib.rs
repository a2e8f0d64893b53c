//! Completion Protocol (spec.md §4.4): judges whether a run's accumulated
//! QA gate results are COMPLETE, FAILING, or NO_EVIDENCE, enforcing run-id
//! freshness and consistency rather than trusting whatever gate results a
//! caller happens to hand it.

pub mod error;
pub mod parsers;
pub mod protocol;
pub mod run_id;
pub mod types;

pub use error::CompletionError;
pub use parsers::{extract_failing_tests, FailingTest, TestScope};
pub use protocol::judge_completion;
pub use types::{CompletionVerdict, FinalStatus, GateResult, GateSummary};
