//! Task Executor + Process Supervisor (spec.md §4.2).
//!
//! Composes the pre-flight clarification gate, before/after file
//! snapshotting, supervised process execution, disk-verification, and
//! task-type guard into one `ExecutorResult` — the full pipeline around a
//! single Claude Code CLI invocation.

pub mod claims;
pub mod error;
pub mod guard;
pub mod preflight;
pub mod process;
pub mod stub;
pub mod timeout_profile;

use error::ExecutorError;
use pmr_config::OrchestratorConfig;
use pmr_evidence::verifier;
use pmr_types::{
    BlockedReason, ExecutorResult, ExecutorStatus, SessionId, Task, TaskType, Terminator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;

/// Which CLI to spawn. Kept as a trait rather than a hardcoded binary path
/// so tests can substitute `pmr-executor-stub` (see `stub` module) without
/// touching the supervisor itself.
///
/// `prompt`/`project_root`/`model` are threaded through so every
/// implementation builds the same `[--prompt, --project, --cwd, --model?]`
/// invocation shape (spec.md §6) rather than each test double reinventing
/// its own argument convention.
pub trait ExecutorCommand: Send + Sync {
    fn build(&self, project_root: &Path, prompt: &str, model: Option<&str>) -> Command;
}

/// Spawns the real Claude Code CLI non-interactively.
pub struct ClaudeCliCommand {
    pub binary: PathBuf,
}

impl ExecutorCommand for ClaudeCliCommand {
    fn build(&self, project_root: &Path, prompt: &str, model: Option<&str>) -> Command {
        let mut command = Command::new(&self.binary);
        command.current_dir(project_root);
        command.arg("--print");
        command.arg("--prompt").arg(prompt);
        command.arg("--project").arg(project_root);
        command.arg("--cwd").arg(project_root);
        if let Some(model) = model {
            command.arg("--model").arg(model);
        }
        command
    }
}

/// Spawns the deterministic `pmr-executor-stub` binary in place of the real
/// CLI (spec.md §6 `PM_EXECUTOR_MODE=recovery-stub`). Only ever constructed
/// behind the `dev-tools` feature, and the constructor re-checks the
/// production gate itself rather than trusting the caller to have checked
/// it first — this is a systems-safety invariant, not an optional check.
#[cfg(feature = "dev-tools")]
pub struct RecoveryStubCommand {
    scenario: pmr_config::env::RecoveryScenario,
}

#[cfg(feature = "dev-tools")]
impl RecoveryStubCommand {
    #[must_use]
    pub fn new(scenario: pmr_config::env::RecoveryScenario) -> Self {
        pmr_config::env::assert_recovery_stub_safety();
        eprintln!(
            "WARNING: PM_EXECUTOR_MODE=recovery-stub is active; every task is served by the \
             deterministic stub executor, not the real Claude Code CLI."
        );
        Self { scenario }
    }

    /// The stub binary is expected to live alongside this process, the way
    /// cargo co-locates every workspace binary in one target directory.
    fn binary_path() -> PathBuf {
        let name = if cfg!(windows) { "pmr-executor-stub.exe" } else { "pmr-executor-stub" };
        match std::env::current_exe() {
            Ok(mut path) => {
                path.set_file_name(name);
                path
            }
            Err(_) => PathBuf::from(name),
        }
    }
}

#[cfg(feature = "dev-tools")]
impl ExecutorCommand for RecoveryStubCommand {
    fn build(&self, project_root: &Path, _prompt: &str, _model: Option<&str>) -> Command {
        let mut command = Command::new(Self::binary_path());
        command.current_dir(project_root);
        command.arg("--scenario").arg(self.scenario.as_str());
        command
    }
}

pub struct TaskExecutor {
    project_root: PathBuf,
    command: Arc<dyn ExecutorCommand>,
    stream: Arc<pmr_stream::OutputStream>,
}

impl TaskExecutor {
    #[must_use]
    pub fn new(
        project_root: PathBuf,
        command: Arc<dyn ExecutorCommand>,
        stream: Arc<pmr_stream::OutputStream>,
    ) -> Self {
        Self {
            project_root,
            command,
            stream,
        }
    }

    /// Runs one task end to end: pre-flight gate, snapshot, supervised
    /// spawn, verification, task-type guard.
    pub async fn execute(
        &self,
        task: &Task,
        session_id: SessionId,
        config: &OrchestratorConfig,
    ) -> Result<ExecutorResult, ExecutorError> {
        let _ = config;

        if let Some(signal) = preflight::gate_prompt(&task.prompt, &self.project_root) {
            tracing::info!(
                task_id = %task.id,
                reason = ?signal.clarification_reason,
                "pre-flight gate blocked spawn",
            );
            return Ok(clarification_result(&self.project_root, signal));
        }

        let max_files = task.limits.max_files as usize;
        let before = verifier::snapshot(&self.project_root, max_files)?;

        let profile = timeout_profile::derive_profile(
            &task.prompt,
            pmr_config::env::soft_timeout_override().map(|d| d.as_millis() as u64),
            pmr_config::env::silence_log_interval_override().map(|d| d.as_millis() as u64),
        );

        let command = self.command.build(
            &self.project_root,
            &task.prompt,
            task.selected_model.as_deref(),
        );
        let outcome = process::run_supervised(
            command,
            profile,
            Arc::clone(&self.stream),
            task.id,
            session_id,
        )
        .await?;

        let after = verifier::snapshot(&self.project_root, max_files)?;
        let modified_paths = verifier::detect_modified(&before, &after);
        let verified_files: Vec<_> = modified_paths
            .iter()
            .map(|path| verifier::verify_file(path, &self.project_root))
            .collect();

        if outcome.timed_out {
            return Ok(blocked_result(
                &self.project_root,
                outcome,
                BlockedReason::Timeout,
                Terminator::OverallTimeout,
                verified_files,
                task.task_type,
            ));
        }

        if let Some(matched) = outcome.interactive_block {
            tracing::warn!(task_id = %task.id, %matched, "interactive prompt; failing closed");
            return Ok(blocked_result_for_interactive(
                &self.project_root,
                matched,
                verified_files,
                task.task_type,
            ));
        }

        let claimed_paths = claims::extract_claimed_paths(&outcome.stdout);
        let unverified_files = verifier::reconcile_claims(&claimed_paths, &verified_files);
        let process_errored = !matches!(outcome.exit_code, Some(0));
        let status = if verified_files.is_empty() {
            if process_errored {
                ExecutorStatus::Error
            } else {
                ExecutorStatus::NoEvidence
            }
        } else if unverified_files.is_empty() {
            ExecutorStatus::Complete
        } else {
            ExecutorStatus::Incomplete
        };

        Ok(ExecutorResult {
            executed: true,
            output: outcome.stdout,
            files_modified: claimed_paths,
            verified_files,
            unverified_files,
            duration_ms: u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
            status,
            working_directory: self.project_root.clone(),
            blocked_reason: None,
            terminated_by: None,
            clarification: None,
        })
    }
}

fn clarification_result(project_root: &Path, signal: pmr_types::ClarificationSignal) -> ExecutorResult {
    ExecutorResult {
        executed: false,
        output: signal.original_prompt.clone(),
        files_modified: Vec::new(),
        verified_files: Vec::new(),
        unverified_files: Vec::new(),
        duration_ms: 0,
        status: ExecutorStatus::NoEvidence,
        working_directory: project_root.to_path_buf(),
        blocked_reason: None,
        terminated_by: None,
        clarification: Some(signal),
    }
}

fn blocked_result(
    project_root: &Path,
    outcome: process::SpawnOutcome,
    blocked_reason: BlockedReason,
    terminated_by: Terminator,
    verified_files: Vec<pmr_types::VerifiedFile>,
    task_type: TaskType,
) -> ExecutorResult {
    let status = guard::final_status(task_type, blocked_reason);
    ExecutorResult {
        executed: true,
        output: outcome.stdout,
        files_modified: Vec::new(),
        verified_files,
        unverified_files: Vec::new(),
        duration_ms: u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
        status,
        working_directory: project_root.to_path_buf(),
        blocked_reason: Some(blocked_reason),
        terminated_by: Some(terminated_by),
        clarification: None,
    }
}

fn blocked_result_for_interactive(
    project_root: &Path,
    matched: String,
    verified_files: Vec<pmr_types::VerifiedFile>,
    task_type: TaskType,
) -> ExecutorResult {
    let status = guard::final_status(task_type, BlockedReason::InteractivePrompt);
    ExecutorResult {
        executed: true,
        output: matched,
        files_modified: Vec::new(),
        verified_files,
        unverified_files: Vec::new(),
        duration_ms: 0,
        status,
        working_directory: project_root.to_path_buf(),
        blocked_reason: Some(BlockedReason::InteractivePrompt),
        terminated_by: Some(Terminator::ReplFailClosed),
        clarification: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmr_types::{GranularityLimits, TaskStatus};

    struct EchoCommand;
    impl ExecutorCommand for EchoCommand {
        fn build(&self, project_root: &Path, _prompt: &str, _model: Option<&str>) -> Command {
            let mut command = Command::new("sh");
            command.current_dir(project_root);
            command.arg("-c").arg("echo done");
            command
        }
    }

    fn task(prompt: &str) -> Task {
        Task {
            id: pmr_types::TaskId::new(),
            prompt: prompt.to_string(),
            task_type: TaskType::Implementation,
            limits: GranularityLimits::default(),
            status: TaskStatus::Pending,
            evidence_refs: Vec::new(),
            files_modified: Vec::new(),
            tests_required_before_implementation: false,
            parent: None,
            subtasks: Vec::new(),
            created_at: chrono::Utc::now(),
            labels: std::collections::HashMap::new(),
            selected_model: None,
        }
    }

    #[tokio::test]
    async fn create_with_existing_target_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();

        let executor = TaskExecutor::new(
            dir.path().to_path_buf(),
            Arc::new(EchoCommand),
            Arc::new(pmr_stream::OutputStream::new(64)),
        );
        let result = executor
            .execute(&task("Create config.json"), SessionId::new(), &minimal_config())
            .await
            .unwrap();
        assert!(!result.executed);
        assert_eq!(result.status, ExecutorStatus::NoEvidence);
        let signal = result.clarification.expect("clarification signal set");
        assert!(signal.clarification_needed);
        assert_eq!(signal.clarification_reason, pmr_types::ClarificationReason::TargetFileExists);
        assert_eq!(signal.target_file.as_deref(), Some("config.json"));
    }

    #[tokio::test]
    async fn no_file_changes_yields_no_evidence() {
        let dir = tempfile::tempdir().unwrap();
        let executor = TaskExecutor::new(
            dir.path().to_path_buf(),
            Arc::new(EchoCommand),
            Arc::new(pmr_stream::OutputStream::new(64)),
        );
        let result = executor
            .execute(&task("summarize the project"), SessionId::new(), &minimal_config())
            .await
            .unwrap();
        assert_eq!(result.status, ExecutorStatus::NoEvidence);
    }

    struct NarratesWithoutWritingCommand;
    impl ExecutorCommand for NarratesWithoutWritingCommand {
        fn build(&self, project_root: &Path, _prompt: &str, _model: Option<&str>) -> Command {
            let mut command = Command::new("sh");
            command.current_dir(project_root);
            command.arg("-c").arg("echo 'Wrote docs/guide.md with the new section.'");
            command
        }
    }

    #[tokio::test]
    async fn narrated_but_unwritten_file_is_flagged_unverified() {
        let dir = tempfile::tempdir().unwrap();
        let executor = TaskExecutor::new(
            dir.path().to_path_buf(),
            Arc::new(NarratesWithoutWritingCommand),
            Arc::new(pmr_stream::OutputStream::new(64)),
        );
        let result = executor
            .execute(&task("document the guide"), SessionId::new(), &minimal_config())
            .await
            .unwrap();
        assert_eq!(result.status, ExecutorStatus::NoEvidence);
        assert_eq!(result.files_modified, vec!["docs/guide.md".to_string()]);
        assert_eq!(result.unverified_files, vec!["docs/guide.md".to_string()]);
        assert!(!result.satisfies_completion_authority());
    }

    struct WritesReadmeCommand;
    impl ExecutorCommand for WritesReadmeCommand {
        fn build(&self, project_root: &Path, _prompt: &str, _model: Option<&str>) -> Command {
            let mut command = Command::new("sh");
            command.current_dir(project_root);
            command
                .arg("-c")
                .arg("printf '# Project\\n' > README.md && echo 'Created README.md.'");
            command
        }
    }

    #[tokio::test]
    async fn disk_verified_write_yields_complete() {
        let dir = tempfile::tempdir().unwrap();
        let executor = TaskExecutor::new(
            dir.path().to_path_buf(),
            Arc::new(WritesReadmeCommand),
            Arc::new(pmr_stream::OutputStream::new(64)),
        );
        let result = executor
            .execute(
                &task("Create README.md with '# Project' as the first line"),
                SessionId::new(),
                &minimal_config(),
            )
            .await
            .unwrap();
        assert_eq!(result.status, ExecutorStatus::Complete);
        assert!(result.unverified_files.is_empty());
        assert!(result.verified_files.iter().any(|f| f.path == "README.md" && f.exists));
        assert!(result.satisfies_completion_authority());
    }

    struct FailsWithoutWritingCommand;
    impl ExecutorCommand for FailsWithoutWritingCommand {
        fn build(&self, project_root: &Path, _prompt: &str, _model: Option<&str>) -> Command {
            let mut command = Command::new("sh");
            command.current_dir(project_root);
            command.arg("-c").arg("echo 'something went wrong' >&2; exit 1");
            command
        }
    }

    #[tokio::test]
    async fn nonzero_exit_with_no_verified_file_yields_error() {
        let dir = tempfile::tempdir().unwrap();
        let executor = TaskExecutor::new(
            dir.path().to_path_buf(),
            Arc::new(FailsWithoutWritingCommand),
            Arc::new(pmr_stream::OutputStream::new(64)),
        );
        let result = executor
            .execute(&task("summarize the project"), SessionId::new(), &minimal_config())
            .await
            .unwrap();
        assert_eq!(result.status, ExecutorStatus::Error);
    }

    struct FailsAfterWritingCommand;
    impl ExecutorCommand for FailsAfterWritingCommand {
        fn build(&self, project_root: &Path, _prompt: &str, _model: Option<&str>) -> Command {
            let mut command = Command::new("sh");
            command.current_dir(project_root);
            command
                .arg("-c")
                .arg("printf '# Project\\n' > README.md && echo 'Created README.md.' && exit 1");
            command
        }
    }

    #[tokio::test]
    async fn nonzero_exit_with_a_verified_file_still_yields_complete() {
        let dir = tempfile::tempdir().unwrap();
        let executor = TaskExecutor::new(
            dir.path().to_path_buf(),
            Arc::new(FailsAfterWritingCommand),
            Arc::new(pmr_stream::OutputStream::new(64)),
        );
        let result = executor
            .execute(
                &task("Create README.md with '# Project' as the first line"),
                SessionId::new(),
                &minimal_config(),
            )
            .await
            .unwrap();
        assert_eq!(result.status, ExecutorStatus::Complete);
    }

    fn minimal_config() -> OrchestratorConfig {
        OrchestratorConfig::default()
    }
}
