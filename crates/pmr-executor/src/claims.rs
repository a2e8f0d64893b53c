//! Self-claim extraction (spec.md §4.2 step 5): the executor's raw output
//! narrates which files it touched, but that narrative is never trusted
//! directly — it only seeds the `claimed` side of
//! [`pmr_evidence::verifier::reconcile_claims`], which checks each mention
//! against the disk-verified set.
//!
//! Grounded on `preflight::FILENAME_CANDIDATE`: the same path-shaped token
//! regex, widened here to collect every match in the output instead of the
//! single best candidate a pre-flight check needs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static CLAIMED_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_][A-Za-z0-9_\-./]*\.[A-Za-z0-9_]+").expect("valid regex"));

/// Extracts every extension-bearing, path-shaped token mentioned in the
/// executor's raw output, deduplicated in first-seen order. Trailing
/// punctuation from prose (a period ending a sentence, a closing
/// quote/paren) is stripped since it is never part of the path itself.
#[must_use]
pub fn extract_claimed_paths(output: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut claims = Vec::new();
    for capture in CLAIMED_PATH.find_iter(output) {
        let token = capture.as_str().trim_end_matches(['.', ',', ')', '`', '\'', '"', ':', ';']);
        if token.is_empty() {
            continue;
        }
        if seen.insert(token.to_string()) {
            claims.push(token.to_string());
        }
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_single_mentioned_file() {
        let claims = extract_claimed_paths("I wrote docs/guide.md with the new section.");
        assert_eq!(claims, vec!["docs/guide.md".to_string()]);
    }

    #[test]
    fn dedups_repeated_mentions() {
        let claims = extract_claimed_paths("Created README.md. README.md now has a title.");
        assert_eq!(claims, vec!["README.md".to_string()]);
    }

    #[test]
    fn ignores_prose_with_no_filenames() {
        assert!(extract_claimed_paths("Summarized the project for the team.").is_empty());
    }

    #[test]
    fn strips_trailing_sentence_punctuation() {
        let claims = extract_claimed_paths("Updated `config.json`, then verified it.");
        assert_eq!(claims, vec!["config.json".to_string()]);
    }
}
