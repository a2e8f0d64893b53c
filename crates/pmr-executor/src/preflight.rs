//! Pre-flight clarification gate (spec.md §4.2).
//!
//! Runs before the child process is ever spawned. Emits a structured
//! [`ClarificationSignal`] — never prose — when the prompt is create-type
//! with an existing target, or either create- or modify-type with a truly
//! ambiguous target.

use once_cell::sync::Lazy;
use pmr_types::{ClarificationReason, ClarificationSignal};
use regex::Regex;
use std::path::Path;

const CREATE_VERBS: &[&str] = &[
    "create", "make", "write", "add", "update",
    "作成", "作る", "書く", "追加", "更新",
];

const MODIFY_VERBS: &[&str] = &[
    "modify", "edit", "change", "fix", "refactor", "adjust",
    "修正", "変更", "直す", "編集",
];

static FILENAME_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_][A-Za-z0-9_\-./]{2,}").expect("valid regex"));

/// A token is "too generic to be a filename" if it is a pronoun, a bare
/// verb, or otherwise carries no path-like shape. We require at least 3
/// characters (spec.md §4.2, §9) and prefer tokens carrying a `.` extension
/// when more than one candidate is present.
fn extract_filename_candidate(prompt: &str) -> Option<String> {
    let mut best: Option<String> = None;
    for capture in FILENAME_CANDIDATE.find_iter(prompt) {
        let token = capture.as_str();
        if is_stopword(token) {
            continue;
        }
        let has_extension = token.contains('.') && !token.ends_with('.');
        match &best {
            None => best = Some(token.to_string()),
            Some(current) if has_extension && !current.contains('.') => {
                best = Some(token.to_string());
            }
            _ => {}
        }
    }
    best
}

fn is_stopword(token: &str) -> bool {
    matches!(
        token.to_lowercase().as_str(),
        "the" | "this" | "that" | "it" | "and" | "for" | "with" | "file" | "please" | "bug"
    )
}

/// True when one of `verbs` appears in `prompt_lower` as a whole word, not
/// merely as a substring of some longer word (so "add" doesn't match
/// inside "address", nor "fix" inside "prefix"/"suffix"). ASCII-only: the
/// Japanese verbs carry no ASCII-alphanumeric neighbors to worry about.
fn contains_verb(prompt_lower: &str, verbs: &[&str]) -> bool {
    let bytes = prompt_lower.as_bytes();
    verbs.iter().any(|verb| {
        let mut start = 0;
        while let Some(offset) = prompt_lower[start..].find(verb) {
            let idx = start + offset;
            let before_ok = idx == 0 || !bytes[idx - 1].is_ascii_alphanumeric();
            let after = idx + verb.len();
            let after_ok = after >= bytes.len() || !bytes[after].is_ascii_alphanumeric();
            if before_ok && after_ok {
                return true;
            }
            start = idx + 1;
        }
        false
    })
}

/// Returns `Some(signal)` when the executor must not be spawned; `None`
/// when the prompt clears the gate.
#[must_use]
pub fn gate_prompt(prompt: &str, project_root: &Path) -> Option<ClarificationSignal> {
    let lower = prompt.to_lowercase();
    let is_create = contains_verb(&lower, CREATE_VERBS);
    let is_modify = contains_verb(&lower, MODIFY_VERBS);

    if is_create {
        return match extract_filename_candidate(prompt) {
            None => Some(ClarificationSignal::new(
                ClarificationReason::TargetFileAmbiguous,
                None,
                prompt,
            )),
            Some(target) => {
                if project_root.join(&target).is_file() {
                    Some(ClarificationSignal::new(
                        ClarificationReason::TargetFileExists,
                        Some(target),
                        prompt,
                    ))
                } else {
                    None
                }
            }
        };
    }

    if is_modify {
        return match extract_filename_candidate(prompt) {
            None => Some(ClarificationSignal::new(
                ClarificationReason::TargetActionAmbiguous,
                None,
                prompt,
            )),
            Some(_) => None,
        };
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_with_existing_target_blocks_spawn() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();

        let signal = gate_prompt("Create config.json", dir.path()).unwrap();
        assert_eq!(signal.clarification_reason, ClarificationReason::TargetFileExists);
        assert_eq!(signal.target_file.as_deref(), Some("config.json"));
    }

    #[test]
    fn create_with_new_target_proceeds() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate_prompt("Create README.md with '# Project' as the first line", dir.path());
        assert!(signal.is_none());
    }

    #[test]
    fn create_with_no_filename_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate_prompt("create it", dir.path()).unwrap();
        assert_eq!(signal.clarification_reason, ClarificationReason::TargetFileAmbiguous);
    }

    #[test]
    fn modify_with_no_filename_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate_prompt("fix the bug", dir.path()).unwrap();
        assert_eq!(signal.clarification_reason, ClarificationReason::TargetActionAmbiguous);
    }

    #[test]
    fn modify_with_named_target_proceeds() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate_prompt("fix the bug in parser.rs", dir.path());
        assert!(signal.is_none());
    }

    #[test]
    fn unrelated_prompt_proceeds() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate_prompt("summarize the README", dir.path());
        assert!(signal.is_none());
    }

    #[test]
    fn classifying_same_prompt_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let a = gate_prompt("fix the bug", dir.path());
        let b = gate_prompt("fix the bug", dir.path());
        assert_eq!(a.map(|s| s.clarification_reason), b.map(|s| s.clarification_reason));
    }

    #[test]
    fn verb_inside_a_longer_word_does_not_trigger_the_gate() {
        let dir = tempfile::tempdir().unwrap();
        // "add" is a substring of "address" and "fix" of "prefix"; neither
        // prompt is a create/modify task, so the gate must not fire.
        assert!(gate_prompt("Normalize the IP address format", dir.path()).is_none());
        assert!(gate_prompt("Rename the prefix used in logs", dir.path()).is_none());
    }
}
