//! CLI argument definitions (spec.md §6.1): a top-level `Cli` wrapping a
//! `Commands` enum, parsed with clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pm-runner", version, about = "Task-execution runner for Claude Code")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drives the lifecycle controller end to end for every task in
    /// `pm-orchestrator.yaml`.
    Run {
        #[arg(long)]
        project: PathBuf,
        #[arg(long)]
        resume: Option<String>,
    },
    /// Reads `session.json` from the evidence root and prints the current
    /// phase and aggregate status.
    Status {
        #[arg(long)]
        project: PathBuf,
        #[arg(long)]
        session: String,
    },
    /// Validates project recognition, config bounds, and evidence-root
    /// writability without starting a session.
    Doctor {
        #[arg(long)]
        project: PathBuf,
        #[arg(long)]
        strict: bool,
    },
}
