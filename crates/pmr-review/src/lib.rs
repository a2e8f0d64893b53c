//! Review Loop: re-prompts the executor until its output satisfies every
//! quality criterion or the iteration budget is exhausted (spec.md §4.3).
//!
//! A policy evaluates a set of named conditions against accumulated
//! evidence and returns a verdict, generalized here from a single
//! pass/fail gate into an iterate-until-pass loop that owns re-invoking
//! the executor itself, via
//! the [`ReviewExecutor`] trait rather than a concrete dependency on
//! `pmr-executor` (keeping this crate usable in isolation and in tests).

pub mod criteria;
pub mod error;
pub mod goal_drift;
pub mod prompt;
pub mod types;

pub use criteria::{CriterionId, CriterionOutcome};
pub use error::ReviewError;
pub use prompt::{DefaultModificationPromptAssembler, ModificationPromptAssembler};
pub use types::{IterationRecord, Judgment};

use async_trait::async_trait;
use chrono::Utc;
use pmr_types::{BlockedReason, ExecutorResult, ExecutorStatus};
use std::time::Duration;

/// Small pause before a RETRY re-invokes with the same prompt (spec.md
/// §4.3): long enough to let a transient failure (a flaky spawn, a
/// momentary timeout) clear without the loop re-running back to back.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Decouples the loop from any particular executor implementation so it can
/// be driven by `pmr-executor`'s `TaskExecutor` in production and by a
/// scripted stub in tests.
#[async_trait]
pub trait ReviewExecutor: Send + Sync {
    async fn run_with_prompt(&self, prompt: &str) -> Result<ExecutorResult, ReviewError>;
}

/// What to do once `max_iterations` is exhausted without a PASS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationPolicy {
    /// Report the last result as INCOMPLETE; the task may be retried later.
    ToIncomplete,
    /// Report the last result as an ERROR; the task needs operator attention.
    ToError,
}

impl From<EscalationPolicy> for ExecutorStatus {
    fn from(policy: EscalationPolicy) -> Self {
        match policy {
            EscalationPolicy::ToIncomplete => ExecutorStatus::Incomplete,
            EscalationPolicy::ToError => ExecutorStatus::Error,
        }
    }
}

pub struct ReviewLoopConfig {
    pub max_iterations: u32,
    pub escalate_on_max: EscalationPolicy,
    pub goal_drift_guard_active: bool,
    pub assembler: Box<dyn ModificationPromptAssembler>,
}

impl Default for ReviewLoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            escalate_on_max: EscalationPolicy::ToIncomplete,
            goal_drift_guard_active: false,
            assembler: Box::new(DefaultModificationPromptAssembler),
        }
    }
}

pub struct ReviewOutcome {
    pub final_result: ExecutorResult,
    pub final_judgment: Judgment,
    pub iterations: Vec<IterationRecord>,
    pub escalated: bool,
    /// Set only when `escalated` is true: the status
    /// `config.escalate_on_max` maps the exhausted/non-retryable outcome
    /// onto (spec.md §4.3 "if escalate_on_max -> INCOMPLETE; else ERROR").
    /// Callers deriving a session-level status from this outcome must
    /// prefer this over `final_result.status` whenever it is set.
    pub escalated_status: Option<ExecutorStatus>,
}

pub struct ReviewLoop<E: ReviewExecutor> {
    executor: E,
    config: ReviewLoopConfig,
}

impl<E: ReviewExecutor> ReviewLoop<E> {
    pub fn new(executor: E, config: ReviewLoopConfig) -> Self {
        Self { executor, config }
    }

    /// Runs `original_prompt` through the executor, reviewing and
    /// re-prompting until PASS or the iteration budget runs out.
    pub async fn run(&self, original_prompt: &str) -> Result<ReviewOutcome, ReviewError> {
        let mut iterations = Vec::new();
        let mut current_prompt = original_prompt.to_string();
        let mut last_result: Option<ExecutorResult> = None;

        for iteration in 1..=self.config.max_iterations {
            let started_at = Utc::now();
            let result = self
                .executor
                .run_with_prompt(&current_prompt)
                .await
                .map_err(|err| match err {
                    ReviewError::ExecutorFailed { reason, .. } => ReviewError::ExecutorFailed { iteration, reason },
                    other => other,
                })?;

            let mut outcomes = criteria::evaluate_all(&result);
            if self.config.goal_drift_guard_active {
                outcomes.extend(goal_drift::evaluate_all(original_prompt, &result));
            }

            let judgment = judge(&result, &outcomes);
            let ended_at = Utc::now();
            let rejection_details: Vec<String> = outcomes
                .iter()
                .filter(|o| !o.passed)
                .map(|o| o.detail.clone())
                .collect();

            iterations.push(IterationRecord {
                iteration,
                started_at,
                ended_at,
                judgment,
                criteria_results: outcomes,
                rejection_details: rejection_details.clone(),
            });

            let is_last_iteration = iteration == self.config.max_iterations;
            match judgment {
                Judgment::Pass => {
                    return Ok(ReviewOutcome {
                        final_result: result,
                        final_judgment: Judgment::Pass,
                        iterations,
                        escalated: false,
                        escalated_status: None,
                    });
                }
                Judgment::Retry if !is_last_iteration => {
                    tokio::time::sleep(RETRY_DELAY).await;
                    last_result = Some(result);
                }
                Judgment::Reject if !is_last_iteration => {
                    current_prompt = self.config.assembler.build(original_prompt, &rejection_details);
                    last_result = Some(result);
                }
                _ => {
                    return Ok(ReviewOutcome {
                        final_result: result,
                        final_judgment: judgment,
                        iterations,
                        escalated: true,
                        escalated_status: Some(self.config.escalate_on_max.into()),
                    });
                }
            }
        }

        // Unreachable when max_iterations >= 1, kept for exhaustiveness.
        Ok(ReviewOutcome {
            final_result: last_result.expect("at least one iteration always runs"),
            final_judgment: Judgment::Reject,
            iterations,
            escalated: true,
            escalated_status: Some(self.config.escalate_on_max.into()),
        })
    }
}

/// PASS when every mandatory criterion passes. A transient failure
/// (ERROR/BLOCKED status, or a "timeout" marker in the output) is RETRY —
/// the same prompt may succeed if re-run. Anything else is REJECT, meaning
/// the prompt itself needs modification before the next attempt.
fn judge(result: &ExecutorResult, outcomes: &[CriterionOutcome]) -> Judgment {
    if outcomes.iter().all(|o| o.passed) {
        return Judgment::Pass;
    }

    let is_transient = matches!(result.status, ExecutorStatus::Error | ExecutorStatus::Blocked)
        || matches!(result.blocked_reason, Some(BlockedReason::Timeout))
        || result.output.to_lowercase().contains("timeout");

    if is_transient {
        Judgment::Retry
    } else {
        Judgment::Reject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct ScriptedExecutor {
        responses: Mutex<Vec<ExecutorResult>>,
        calls: AtomicU32,
        prompts_seen: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        fn new(responses: Vec<ExecutorResult>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicU32::new(0),
                prompts_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReviewExecutor for ScriptedExecutor {
        async fn run_with_prompt(&self, prompt: &str) -> Result<ExecutorResult, ReviewError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts_seen.lock().unwrap().push(prompt.to_string());
            let mut responses = self.responses.lock().unwrap();
            Ok(responses.remove(0))
        }
    }

    fn complete_with_file(path: &str) -> ExecutorResult {
        ExecutorResult {
            executed: true,
            output: "Wrote the file.".into(),
            files_modified: vec![path.to_string()],
            verified_files: vec![pmr_types::VerifiedFile {
                path: path.to_string(),
                exists: true,
                size: Some(10),
                content_preview: Some("hello".into()),
            }],
            unverified_files: Vec::new(),
            duration_ms: 10,
            status: ExecutorStatus::Complete,
            working_directory: std::path::PathBuf::from("."),
            blocked_reason: None,
            terminated_by: None,
            clarification: None,
        }
    }

    fn reject_with_todo() -> ExecutorResult {
        ExecutorResult {
            executed: true,
            output: "// TODO: finish later".into(),
            files_modified: Vec::new(),
            verified_files: Vec::new(),
            unverified_files: Vec::new(),
            duration_ms: 5,
            status: ExecutorStatus::Complete,
            working_directory: std::path::PathBuf::from("."),
            blocked_reason: None,
            terminated_by: None,
            clarification: None,
        }
    }

    fn error_result() -> ExecutorResult {
        ExecutorResult {
            executed: true,
            output: "spawn failed".into(),
            files_modified: Vec::new(),
            verified_files: Vec::new(),
            unverified_files: Vec::new(),
            duration_ms: 1,
            status: ExecutorStatus::Error,
            working_directory: std::path::PathBuf::from("."),
            blocked_reason: None,
            terminated_by: None,
            clarification: None,
        }
    }

    #[tokio::test]
    async fn passes_immediately_when_first_attempt_is_clean() {
        let executor = ScriptedExecutor::new(vec![complete_with_file("README.md")]);
        let review = ReviewLoop::new(executor, ReviewLoopConfig::default());
        let outcome = review.run("Create README.md").await.unwrap();
        assert_eq!(outcome.final_judgment, Judgment::Pass);
        assert_eq!(outcome.iterations.len(), 1);
        assert!(!outcome.escalated);
    }

    #[tokio::test]
    async fn rejects_then_passes_on_second_attempt() {
        let executor = ScriptedExecutor::new(vec![reject_with_todo(), complete_with_file("README.md")]);
        let review = ReviewLoop::new(executor, ReviewLoopConfig::default());
        let outcome = review.run("Create README.md").await.unwrap();
        assert_eq!(outcome.final_judgment, Judgment::Pass);
        assert_eq!(outcome.iterations.len(), 2);
        assert_eq!(outcome.iterations[0].judgment, Judgment::Reject);
    }

    #[tokio::test]
    async fn retry_reuses_the_original_prompt_unmodified() {
        let executor = ScriptedExecutor::new(vec![error_result(), complete_with_file("README.md")]);
        let review = ReviewLoop::new(executor, ReviewLoopConfig::default());
        let outcome = review.run("Create README.md").await.unwrap();
        assert_eq!(outcome.iterations[0].judgment, Judgment::Retry);
        assert_eq!(outcome.final_judgment, Judgment::Pass);
        let prompts = review.executor.prompts_seen.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], "Create README.md");
        assert_eq!(prompts[1], "Create README.md");
    }

    #[tokio::test]
    async fn escalates_to_incomplete_after_exhausting_budget() {
        let executor =
            ScriptedExecutor::new(vec![reject_with_todo(), reject_with_todo(), reject_with_todo()]);
        let config = ReviewLoopConfig {
            max_iterations: 3,
            ..ReviewLoopConfig::default()
        };
        let review = ReviewLoop::new(executor, config);
        let outcome = review.run("Create README.md").await.unwrap();
        assert_eq!(outcome.iterations.len(), 3);
        assert!(outcome.escalated);
        assert_eq!(outcome.final_judgment, Judgment::Reject);
    }
}
