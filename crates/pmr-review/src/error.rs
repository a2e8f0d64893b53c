use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("executor invocation failed during review iteration {iteration}: {reason}")]
    ExecutorFailed { iteration: u32, reason: String },

    /// A goal-drift evaluator raised an error rather than returning a
    /// verdict. Fail-closed per spec.md §4.3: treated as REJECT, never
    /// silently skipped.
    #[error("goal-drift evaluator {check} errored: {reason}")]
    GoalDriftEvaluatorFailed { check: &'static str, reason: String },
}
