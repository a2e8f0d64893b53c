//! pm-runner: a task-execution runner that orchestrates natural-language
//! tasks through an external LLM-driven code executor and renders a
//! verified, evidence-based completion verdict.
//!
//! This crate is a thin façade: all behavior lives in the `pmr-*` crates
//! (data model, evidence store, process supervisor, executor, review
//! loop, lifecycle controller, completion protocol, CLI). `main.rs` calls
//! [`run`] and maps its exit code to `std::process::exit`.

pub use pmr_cli::{exit_code_for_status, run, Cli, Commands, PmRunnerError, RunOutcome, Runner};

/// Returns this build's version, used to stamp `Session::created_by_version`
/// so a resumed session can detect a runner version skew against whatever
/// wrote `session.json`.
#[must_use]
pub fn pm_runner_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
