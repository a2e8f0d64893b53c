//! Prompt-size timeout heuristic (spec.md §4.2).
//!
//! A prompt that names a large or open-ended scope ("entire", "all files",
//! "refactor the whole") gets a longer overall timeout and a longer silence
//! log interval, on the theory that a long-running but still-progressing
//! executor should not be mistaken for a stalled one. A size-classified
//! timing profile rather than fixed byte caps.

const DEFAULT_SOFT_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_OVERALL_TIMEOUT_MS: u64 = 600_000;
const DEFAULT_SILENCE_LOG_INTERVAL_MS: u64 = 30_000;

const LARGE_SCOPE_OVERALL_TIMEOUT_MS: u64 = 1_800_000;
const LARGE_SCOPE_SILENCE_LOG_INTERVAL_MS: u64 = 60_000;

const LARGE_SCOPE_KEYWORDS: &[&str] = &[
    "entire", "whole project", "all files", "every file", "codebase",
    "repository-wide", "across the repo", "migrate", "rewrite",
];

/// The three supervision timers (spec.md §4.2). Only `overall_timeout_ms`
/// (absent `disable_overall_timeout`) ever terminates the child; the soft
/// timeout is warning-only and the silence-log interval is a heartbeat.
/// Silence alone must never terminate — there is deliberately no
/// "idle timeout" field here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutProfile {
    /// Warning-only. Fires once; never terminates the child.
    pub soft_timeout_ms: u64,
    pub overall_timeout_ms: u64,
    pub silence_log_interval_ms: u64,
    pub disable_overall_timeout: bool,
}

impl Default for TimeoutProfile {
    fn default() -> Self {
        Self {
            soft_timeout_ms: DEFAULT_SOFT_TIMEOUT_MS,
            overall_timeout_ms: DEFAULT_OVERALL_TIMEOUT_MS,
            silence_log_interval_ms: DEFAULT_SILENCE_LOG_INTERVAL_MS,
            disable_overall_timeout: false,
        }
    }
}

/// Derives a timeout profile from the prompt text, then applies any
/// operator overrides (env-sourced; see `pmr_config::env`).
#[must_use]
pub fn derive_profile(
    prompt: &str,
    soft_timeout_override_ms: Option<u64>,
    silence_log_interval_override_ms: Option<u64>,
) -> TimeoutProfile {
    let lower = prompt.to_lowercase();
    let is_large_scope = LARGE_SCOPE_KEYWORDS.iter().any(|kw| lower.contains(kw));

    let mut profile = if is_large_scope {
        TimeoutProfile {
            overall_timeout_ms: LARGE_SCOPE_OVERALL_TIMEOUT_MS,
            silence_log_interval_ms: LARGE_SCOPE_SILENCE_LOG_INTERVAL_MS,
            ..TimeoutProfile::default()
        }
    } else {
        TimeoutProfile::default()
    };

    if let Some(soft_ms) = soft_timeout_override_ms {
        profile.soft_timeout_ms = soft_ms;
    }
    if let Some(silence_ms) = silence_log_interval_override_ms {
        profile.silence_log_interval_ms = silence_ms;
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_prompt_gets_default_profile() {
        let profile = derive_profile("Add a unit test for parse_header", None, None);
        assert_eq!(profile, TimeoutProfile::default());
    }

    #[test]
    fn large_scope_prompt_gets_longer_timers() {
        let profile = derive_profile("Refactor the entire codebase to use async/await", None, None);
        assert_eq!(profile.overall_timeout_ms, LARGE_SCOPE_OVERALL_TIMEOUT_MS);
        assert_eq!(profile.silence_log_interval_ms, LARGE_SCOPE_SILENCE_LOG_INTERVAL_MS);
    }

    #[test]
    fn operator_overrides_win_over_heuristic() {
        let profile = derive_profile("migrate the whole project", Some(42), Some(7));
        assert_eq!(profile.soft_timeout_ms, 42);
        assert_eq!(profile.silence_log_interval_ms, 7);
    }
}
