//! Task-type gating (spec.md §4.2).
//!
//! A `BLOCKED` outcome is fatal only for `DANGEROUS_OP` tasks. For every
//! other task type the runner downgrades the block to `INCOMPLETE` and
//! attaches a templated fallback question rather than surfacing raw
//! executor prose — a closed dispatch table indexed by task type rather
//! than open inheritance.

use pmr_types::{BlockedReason, ExecutorStatus, TaskType};

/// What to do with a `BLOCKED` result for a given task type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Leave the block in place; this task type cannot be safely retried
    /// without a human.
    KeepBlocked,
    /// Downgrade to `INCOMPLETE` with a templated fallback question.
    DowngradeToIncomplete { fallback_question: String },
}

#[must_use]
pub fn apply_guard(task_type: TaskType, blocked_reason: BlockedReason) -> GuardDecision {
    if matches!(task_type, TaskType::DangerousOp) {
        return GuardDecision::KeepBlocked;
    }

    let fallback_question = match blocked_reason {
        BlockedReason::InteractivePrompt => {
            "The executor asked a question it expected a human to answer. \
             Please confirm how to proceed and I will resume."
                .to_string()
        }
        BlockedReason::Timeout => {
            "The executor did not finish within the allotted time. \
             Should I retry with a longer budget, or narrow the task?"
                .to_string()
        }
        BlockedReason::StdinRequired => {
            "The executor required interactive input that cannot be \
             supplied automatically. Please clarify the task so it can \
             run non-interactively."
                .to_string()
        }
    };

    GuardDecision::DowngradeToIncomplete { fallback_question }
}

/// Derives the final status for a task from its raw blocked state and the
/// guard's decision, per the closed dispatch table above.
#[must_use]
pub fn final_status(task_type: TaskType, blocked_reason: BlockedReason) -> ExecutorStatus {
    match apply_guard(task_type, blocked_reason) {
        GuardDecision::KeepBlocked => ExecutorStatus::Blocked,
        GuardDecision::DowngradeToIncomplete { .. } => ExecutorStatus::Incomplete,
    }
}
