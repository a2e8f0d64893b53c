//! Stub Claude CLI for development testing.
//!
//! Mirrors the real executor's interface closely enough to exercise the
//! process supervisor's timeout, interactive-prompt, and failure paths
//! without making real CLI calls. Only built behind `--features dev-tools`.

use clap::{Arg, Command};
use pmr_config::env::RecoveryScenario;
use pmr_executor::stub::{run_scenario, StubExit};
use std::io;

fn main() {
    let matches = Command::new("pmr-executor-stub")
        .about("Deterministic stand-in for the Claude Code CLI")
        .arg(
            Arg::new("scenario")
                .long("scenario")
                .value_name("SCENARIO")
                .help("timeout | blocked | fail-closed")
                .default_value("timeout"),
        )
        .get_matches();

    let scenario = match matches.get_one::<String>("scenario").map(String::as_str) {
        Some("blocked") => RecoveryScenario::Blocked,
        Some("fail-closed") => RecoveryScenario::FailClosed,
        _ => RecoveryScenario::Timeout,
    };

    let stdout = io::stdout();
    let stderr = io::stderr();
    let exit = run_scenario(scenario, stdout.lock(), stderr.lock());
    std::process::exit(match exit {
        StubExit::Success => 0,
        StubExit::Failure => 1,
    });
}
