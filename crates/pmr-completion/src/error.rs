use thiserror::Error;

/// Protocol-level errors abort the completion verdict outright rather than
/// being folded into a status (spec.md §4.4, §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error(
        "gate results disagree on run id: expected {expected}, found {found} from gate {gate_name}"
    )]
    StaleRun {
        expected: String,
        found: String,
        gate_name: String,
    },

    #[error("gate results mix {count} distinct run ids; refusing to aggregate")]
    MixedRunIds { count: usize },

    #[error("malformed run id: {0}")]
    InvalidRunIdFormat(String),
}
