//! Deterministic stand-in for the real Claude Code CLI, used only in
//! non-production tests (spec.md §6.2). Never compiled into the default
//! build — gated behind the `dev-tools` Cargo feature and called only from
//! the `pmr-executor-stub` binary.
//!
//! A `--scenario` flag selects canned output/exit behavior, including a
//! `hang` scenario used to exercise timeout handling in integration tests.

use pmr_config::env::RecoveryScenario;
use std::io::Write;
use std::thread;
use std::time::Duration;

/// Process exit disposition for a scenario run. Kept distinct from
/// `std::process::ExitCode` so the binary decides the real exit code and
/// this function stays trivially testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubExit {
    Success,
    Failure,
}

/// Runs the constructed-in behavior for one recovery scenario, writing to
/// the given writers exactly as the real CLI's stdout/stderr would.
///
/// # Panics
/// Hard-aborts via [`pmr_config::env::assert_recovery_stub_safety`] before
/// doing any work if `NODE_ENV=production` — this function must never run
/// against a production environment no matter how it is invoked.
pub fn run_scenario(
    scenario: RecoveryScenario,
    mut stdout: impl Write,
    mut stderr: impl Write,
) -> StubExit {
    pmr_config::env::assert_recovery_stub_safety();

    match scenario {
        RecoveryScenario::Timeout => {
            thread::sleep(Duration::from_secs(10));
            let _ = writeln!(stdout, "stub: completed after an artificial delay");
            StubExit::Success
        }
        RecoveryScenario::Blocked => {
            let _ = writeln!(stdout, "Do you want to proceed? (y/n)");
            StubExit::Success
        }
        RecoveryScenario::FailClosed => {
            let _ = writeln!(stderr, "stub: simulated fatal executor error");
            StubExit::Failure
        }
    }
}
