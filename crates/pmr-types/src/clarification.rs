//! Structured clarification signals. The runner never generates prose; it
//! emits one of these and leaves rendering to the mediation layer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationReason {
    TargetFileExists,
    TargetFileAmbiguous,
    TargetActionAmbiguous,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarificationSignal {
    pub clarification_needed: bool,
    pub clarification_reason: ClarificationReason,
    pub target_file: Option<String>,
    pub original_prompt: String,
}

impl ClarificationSignal {
    #[must_use]
    pub fn new(
        reason: ClarificationReason,
        target_file: Option<String>,
        original_prompt: impl Into<String>,
    ) -> Self {
        Self {
            clarification_needed: true,
            clarification_reason: reason,
            target_file,
            original_prompt: original_prompt.into(),
        }
    }
}
