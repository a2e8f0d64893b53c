//! Q1-Q6 quality criteria (spec.md §4.3). Each criterion is a pure function
//! over an [`ExecutorResult`], scored independently and combined by
//! [`crate::judgment::judge`] — the same "dispatch table" shape the design
//! notes use for task types, reused here for criteria ids.

use once_cell::sync::Lazy;
use pmr_types::ExecutorResult;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionId {
    Q1FilesVerified,
    Q2NoTodoFixme,
    Q3NoOmissionMarkers,
    Q4NoIncompleteSyntax,
    Q5EvidencePresent,
    Q6NoEarlyTermination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub id: CriterionId,
    pub passed: bool,
    pub detail: String,
}

fn outcome(id: CriterionId, passed: bool, detail: impl Into<String>) -> CriterionOutcome {
    CriterionOutcome {
        id,
        passed,
        detail: detail.into(),
    }
}

/// Runs every Q1-Q6 criterion against one executor result.
#[must_use]
pub fn evaluate_all(result: &ExecutorResult) -> Vec<CriterionOutcome> {
    vec![
        q1_files_verified(result),
        q2_no_todo_fixme(result),
        q3_no_omission_markers(result),
        q4_no_incomplete_syntax(result),
        q5_evidence_present(result),
        q6_no_early_termination(result),
    ]
}

/// Q1: `unverified_files` empty; if files were claimed, at least one must
/// have been verified.
#[must_use]
pub fn q1_files_verified(result: &ExecutorResult) -> CriterionOutcome {
    if !result.unverified_files.is_empty() {
        return outcome(
            CriterionId::Q1FilesVerified,
            false,
            format!("unverified files present: {:?}", result.unverified_files),
        );
    }
    if !result.files_modified.is_empty() && result.verified_files.iter().all(|f| !f.exists) {
        return outcome(
            CriterionId::Q1FilesVerified,
            false,
            "files were claimed but none verified to exist",
        );
    }
    outcome(CriterionId::Q1FilesVerified, true, "no unverified claims")
}

const TODO_MARKERS: [&str; 5] = ["TODO", "FIXME", "TBD", "HACK", "XXX"];

/// Q2: neither the raw output nor any verified file's content preview may
/// contain a TODO/FIXME/TBD/HACK/XXX marker.
#[must_use]
pub fn q2_no_todo_fixme(result: &ExecutorResult) -> CriterionOutcome {
    let mut haystacks: Vec<&str> = vec![result.output.as_str()];
    for file in &result.verified_files {
        if let Some(preview) = &file.content_preview {
            haystacks.push(preview.as_str());
        }
    }

    for marker in TODO_MARKERS {
        if haystacks.iter().any(|text| contains_word(text, marker)) {
            return outcome(
                CriterionId::Q2NoTodoFixme,
                false,
                format!("found marker: {marker}"),
            );
        }
    }
    outcome(CriterionId::Q2NoTodoFixme, true, "no omission markers found")
}

/// True when `needle` appears in `haystack` as a whole word, not merely as
/// a substring of some longer word (so "HACK" doesn't match inside
/// "hijack" or "shack").
fn contains_word(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.to_uppercase();
    let needle = needle.to_uppercase();
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(offset) = haystack[start..].find(&needle) {
        let idx = start + offset;
        let before_ok = idx == 0 || !bytes[idx - 1].is_ascii_alphanumeric();
        let after = idx + needle.len();
        let after_ok = after >= bytes.len() || !bytes[after].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return true;
        }
        start = idx + 1;
    }
    false
}

static TRAILING_ELLIPSIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\.\.(?:\s|$)").expect("valid regex"));

const OMISSION_PHRASES: [&str; 3] = ["remaining", "etc.", "以下同様"];

/// Q3: no `...` that isn't immediately followed by a word character (a
/// genuine mid-sentence ellipsis like `wait... really?` is allowed; one
/// trailing off at end-of-line or end-of-output is an omission marker), and
/// none of the omission phrases.
#[must_use]
pub fn q3_no_omission_markers(result: &ExecutorResult) -> CriterionOutcome {
    if TRAILING_ELLIPSIS.is_match(&result.output) {
        return outcome(
            CriterionId::Q3NoOmissionMarkers,
            false,
            "trailing ellipsis suggests omitted content",
        );
    }
    for phrase in OMISSION_PHRASES {
        if result.output.to_lowercase().contains(&phrase.to_lowercase()) {
            return outcome(
                CriterionId::Q3NoOmissionMarkers,
                false,
                format!("found omission phrase: {phrase}"),
            );
        }
    }
    outcome(CriterionId::Q3NoOmissionMarkers, true, "no omission markers found")
}

const INCOMPLETE_SYNTAX_PHRASES: [&str; 2] = ["truncated", "cut off"];

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z0-9_+-]*\n(.*?)```").expect("valid regex"));

fn brackets_balanced(code: &str) -> bool {
    let mut stack = Vec::new();
    for ch in code.chars() {
        match ch {
            '(' | '[' | '{' => stack.push(ch),
            ')' => {
                if stack.pop() != Some('(') {
                    return false;
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            }
            '}' => {
                if stack.pop() != Some('{') {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

/// Q4: every fenced code block's brackets/braces/parens balance, and the
/// output carries no explicit truncation marker.
#[must_use]
pub fn q4_no_incomplete_syntax(result: &ExecutorResult) -> CriterionOutcome {
    let lower = result.output.to_lowercase();
    for phrase in INCOMPLETE_SYNTAX_PHRASES {
        if lower.contains(phrase) {
            return outcome(
                CriterionId::Q4NoIncompleteSyntax,
                false,
                format!("found marker: {phrase}"),
            );
        }
    }

    for capture in FENCE.captures_iter(&result.output) {
        let code = &capture[1];
        if !brackets_balanced(code) {
            return outcome(
                CriterionId::Q4NoIncompleteSyntax,
                false,
                "unbalanced brackets in fenced code block",
            );
        }
    }

    outcome(CriterionId::Q4NoIncompleteSyntax, true, "syntax balanced")
}

/// Q5: either verified files exist, or the executor ran successfully and
/// reported a non-empty modified-file list.
#[must_use]
pub fn q5_evidence_present(result: &ExecutorResult) -> CriterionOutcome {
    let has_verified = result.verified_files.iter().any(|f| f.exists);
    let has_claimed_success = result.executed && !result.files_modified.is_empty();
    if has_verified || has_claimed_success {
        outcome(CriterionId::Q5EvidencePresent, true, "evidence present")
    } else {
        outcome(CriterionId::Q5EvidencePresent, false, "no evidence of work done")
    }
}

const EARLY_TERMINATION_PHRASES: [&str; 3] = ["完了しました", "this completes", "done."];

/// Q6: none of the early-termination phrases appear, unless evidence is
/// also present (a legitimate completion statement alongside real work).
#[must_use]
pub fn q6_no_early_termination(result: &ExecutorResult) -> CriterionOutcome {
    let lower = result.output.to_lowercase();
    let has_phrase = EARLY_TERMINATION_PHRASES
        .iter()
        .any(|phrase| lower.contains(&phrase.to_lowercase()));

    if !has_phrase {
        return outcome(CriterionId::Q6NoEarlyTermination, true, "no early-termination phrase");
    }

    if q5_evidence_present(result).passed {
        outcome(
            CriterionId::Q6NoEarlyTermination,
            true,
            "completion phrase present but backed by evidence",
        )
    } else {
        outcome(
            CriterionId::Q6NoEarlyTermination,
            false,
            "completion phrase present without supporting evidence",
        )
    }
}
