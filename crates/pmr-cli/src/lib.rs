//! CLI dispatch (spec.md §6.1): a thin `clap`-driven shell over
//! [`runner::Runner`] and [`pmr_doctor::DoctorCommand`].
//!
//! This crate owns argument parsing and output formatting; the root
//! `pm-runner` binary is reduced to calling [`run`] and mapping its
//! `Result` to a process exit code.

pub mod args;
pub mod error;
pub mod runner;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

pub use args::{Cli, Commands};
pub use error::PmRunnerError;
pub use runner::{Runner, RunOutcome};

/// Exit codes per spec.md §6: 0=COMPLETE, 1=ERROR, 2=INCOMPLETE/NO_EVIDENCE,
/// 3=INVALID. `PmRunnerError` (the runner failing to produce a verdict at
/// all) always maps to 1, since 2/3 are reserved for an actual session
/// outcome.
#[must_use]
pub fn exit_code_for_status(status: pmr_types::SessionStatus) -> i32 {
    use pmr_types::SessionStatus::{Complete, Error, Incomplete, Invalid, NoEvidence};
    match status {
        Complete => 0,
        Error => 1,
        Incomplete | NoEvidence => 2,
        Invalid => 3,
    }
}

/// Parses `argv`, dispatches to the matching subcommand, prints the
/// result as JSON on stdout, and returns the process exit code the binary
/// should use. Never panics on well-formed input; parse errors are
/// reported by `clap` itself (which exits the process directly, matching
/// its default behavior).
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> Result<i32, PmRunnerError> {
    match cli.command {
        Commands::Run { project, resume } => run_command(project, resume).await,
        Commands::Status { project, session } => status_command(project, session).await,
        Commands::Doctor { project, strict } => doctor_command(project, strict),
    }
}

async fn run_command(project: PathBuf, resume: Option<String>) -> Result<i32, PmRunnerError> {
    info!(project = %project.display(), resume = ?resume, "starting run");
    let runner = Runner::new(project);
    let outcome: RunOutcome = runner.run(resume).await?;
    println!(
        "{}",
        serde_json::json!({
            "session_id": outcome.session_id,
            "final_status": outcome.final_status,
        })
    );
    Ok(exit_code_for_status(outcome.final_status))
}

async fn status_command(project: PathBuf, session: String) -> Result<i32, PmRunnerError> {
    let runner = Runner::new(project);
    let session_state = runner.status(&session).await?;
    println!(
        "{}",
        serde_json::json!({
            "session_id": session_state.id,
            "current_phase": session_state.current_phase,
            "status": session_state.status,
            "completed_phases": session_state.completed_phases,
        })
    );
    Ok(exit_code_for_status(session_state.status))
}

fn doctor_command(project: PathBuf, strict: bool) -> Result<i32, PmRunnerError> {
    let doctor = pmr_doctor::DoctorCommand::new(project);
    let output = doctor.run_with_options_strict(strict);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(if output.ok { 0 } else { 1 })
}
