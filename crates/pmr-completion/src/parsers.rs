//! Best-effort Mocha/Jest-style failing-test extraction (spec.md §4.4, §9
//! Open Questions: "exact scope of the parser is left to implementation
//! discretion"). Resolved in DESIGN.md: line-pattern matching only, no
//! attempt to reconstruct a full AST of the test report. Consumers that
//! need an authoritative failure set should read the machine-readable
//! report directly — these parsers exist for the completion verdict's
//! human-facing `failing_gates` summary only.

use once_cell::sync::Lazy;
use regex::Regex;

/// Jest: `  ✕ some test name (12 ms)` or `  ✗ some test name`.
static JEST_FAILURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*[✕✗]\s+(.+?)(?:\s+\(\d+\s*ms\))?\s*$").expect("valid regex"));

/// Mocha: `  1) some test name` or `  1) some suite some test name:`.
static MOCHA_FAILURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\d+\)\s+(.+?):?\s*$").expect("valid regex"));

static OUT_OF_SCOPE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)external|integration|e2e|third[- ]?party").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestScope {
    InScope,
    OutOfScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailingTest {
    pub name: String,
    pub scope: TestScope,
}

fn scope_for(name: &str) -> TestScope {
    if OUT_OF_SCOPE_PATTERN.is_match(name) {
        TestScope::OutOfScope
    } else {
        TestScope::InScope
    }
}

/// Extracts failing-test names from raw gate output, trying Jest-style
/// markers first and falling back to Mocha-style numbered failures.
/// Returns an empty vec (not an error) when nothing matches — absence of a
/// recognizable pattern is not itself evidence of failure or success.
#[must_use]
pub fn extract_failing_tests(raw_output: &str) -> Vec<FailingTest> {
    let mut found: Vec<FailingTest> = JEST_FAILURE
        .captures_iter(raw_output)
        .map(|c| c[1].trim().to_string())
        .map(|name| FailingTest {
            scope: scope_for(&name),
            name,
        })
        .collect();

    if found.is_empty() {
        found = MOCHA_FAILURE
            .captures_iter(raw_output)
            .map(|c| c[1].trim().to_string())
            .map(|name| FailingTest {
                scope: scope_for(&name),
                name,
            })
            .collect();
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_jest_style_failures() {
        let output = "Tests:\n  ✕ adds two numbers (3 ms)\n  ✓ subtracts two numbers (1 ms)\n";
        let failures = extract_failing_tests(output);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "adds two numbers");
        assert_eq!(failures[0].scope, TestScope::InScope);
    }

    #[test]
    fn extracts_mocha_style_failures() {
        let output = "  2 passing\n  1 failing\n\n  1) user login e2e flow:\n     AssertionError\n";
        let failures = extract_failing_tests(output);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].scope, TestScope::OutOfScope);
    }

    #[test]
    fn unrecognized_output_yields_no_failures() {
        assert!(extract_failing_tests("build succeeded").is_empty());
    }
}
