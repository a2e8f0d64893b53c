//! Environment variable surface (spec.md §6).

use std::time::Duration;

/// Selects the deterministic recovery-stub executor. Active only outside
/// production; see [`is_production`].
#[must_use]
pub fn executor_mode_is_recovery_stub() -> bool {
    std::env::var("PM_EXECUTOR_MODE")
        .map(|v| v == "recovery-stub")
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryScenario {
    Timeout,
    Blocked,
    FailClosed,
}

impl RecoveryScenario {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecoveryScenario::Timeout => "timeout",
            RecoveryScenario::Blocked => "blocked",
            RecoveryScenario::FailClosed => "fail-closed",
        }
    }
}

#[must_use]
pub fn recovery_scenario() -> Option<RecoveryScenario> {
    match std::env::var("PM_RECOVERY_SCENARIO").ok()?.as_str() {
        "timeout" => Some(RecoveryScenario::Timeout),
        "blocked" => Some(RecoveryScenario::Blocked),
        "fail-closed" => Some(RecoveryScenario::FailClosed),
        _ => None,
    }
}

#[must_use]
pub fn is_production() -> bool {
    std::env::var("NODE_ENV").as_deref() == Ok("production")
}

#[must_use]
pub fn cli_test_mode() -> bool {
    std::env::var("CLI_TEST_MODE").as_deref() == Ok("1")
}

#[must_use]
pub fn soft_timeout_override() -> Option<Duration> {
    std::env::var("SOFT_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

#[must_use]
pub fn silence_log_interval_override() -> Option<Duration> {
    std::env::var("SILENCE_LOG_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Fatal systems-safety check: the recovery stub must never activate in
/// production, regardless of how it was requested. Aborts the process on
/// violation per spec.md §7/§9 — this is not a recoverable `Result`.
pub fn assert_recovery_stub_safety() {
    if executor_mode_is_recovery_stub() && is_production() {
        eprintln!(
            "FATAL: PM_EXECUTOR_MODE=recovery-stub requested while NODE_ENV=production. \
             Refusing to start."
        );
        std::process::abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn recovery_scenario_parses_known_values() {
        unsafe {
            std::env::set_var("PM_RECOVERY_SCENARIO", "timeout");
        }
        assert_eq!(recovery_scenario(), Some(RecoveryScenario::Timeout));
        unsafe {
            std::env::remove_var("PM_RECOVERY_SCENARIO");
        }
    }

    #[test]
    #[serial(env)]
    fn unknown_scenario_is_none() {
        unsafe {
            std::env::set_var("PM_RECOVERY_SCENARIO", "bogus");
        }
        assert_eq!(recovery_scenario(), None);
        unsafe {
            std::env::remove_var("PM_RECOVERY_SCENARIO");
        }
    }
}
