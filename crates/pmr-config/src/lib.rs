//! Configuration discovery and validation for pm-runner.
//!
//! Owns `pm-orchestrator.yaml` parsing, project-path recognition, and the
//! environment-variable surface (spec.md §6). Deliberately thin: this crate
//! has no opinion on *how* a task runs, only on what the caller configured.

pub mod env;
pub mod error;
pub mod orchestrator;
pub mod project;

pub use error::ConfigError;
pub use orchestrator::{Limits, OrchestratorConfig, TaskSpec};
pub use project::{orchestrator_config_path, validate_project_path};
