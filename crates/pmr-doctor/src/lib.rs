//! Environment diagnostics (spec.md §6 external interfaces). Runs a fixed
//! set of preflight checks and reports PASS/WARN/FAIL per check plus an
//! overall verdict.
//!
//! Builds a `Vec<DoctorCheck>`, sorts by name for stable output, then
//! derives `ok` from whether any check failed (and, in strict mode,
//! whether any warned). Narrowed to this runner's single external
//! dependency: the Claude Code CLI plus this project's own config/evidence
//! surface.

pub mod types;

pub use types::{CheckStatus, DoctorCheck, DoctorOutput};

use chrono::Utc;
use pmr_config::{orchestrator_config_path, validate_project_path, OrchestratorConfig};
use std::path::Path;

pub struct DoctorCommand {
    project_path: std::path::PathBuf,
}

impl DoctorCommand {
    #[must_use]
    pub fn new(project_path: std::path::PathBuf) -> Self {
        Self { project_path }
    }

    /// Runs every check. In strict mode, a WARN is treated as a failure for
    /// the purposes of `ok` (but not downgraded in the individual check).
    #[must_use]
    pub fn run_with_options_strict(&self, strict: bool) -> DoctorOutput {
        let mut checks = vec![
            self.check_executor_cli(),
            self.check_project_path(),
            self.check_orchestrator_config(),
            self.check_evidence_root_writable(),
            self.check_recovery_stub_safety(),
        ];
        checks.sort_by(|a, b| a.name.cmp(&b.name));

        let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
        let has_warn = checks.iter().any(|c| c.status == CheckStatus::Warn);
        let ok = !has_fail && (!strict || !has_warn);

        DoctorOutput {
            schema_version: "1".to_string(),
            emitted_at: Utc::now(),
            ok,
            checks,
        }
    }

    fn check_executor_cli(&self) -> DoctorCheck {
        match which::which("claude") {
            Ok(path) => DoctorCheck {
                name: "executor_cli_path".to_string(),
                status: CheckStatus::Pass,
                details: format!("found claude at {}", path.display()),
            },
            Err(_) => DoctorCheck {
                name: "executor_cli_path".to_string(),
                status: CheckStatus::Fail,
                details: "claude CLI not found in PATH".to_string(),
            },
        }
    }

    fn check_project_path(&self) -> DoctorCheck {
        match validate_project_path(&self.project_path) {
            Ok(()) => DoctorCheck {
                name: "project_path".to_string(),
                status: CheckStatus::Pass,
                details: format!("{} recognized as a target project", self.project_path.display()),
            },
            Err(err) => DoctorCheck {
                name: "project_path".to_string(),
                status: CheckStatus::Fail,
                details: err.to_string(),
            },
        }
    }

    fn check_orchestrator_config(&self) -> DoctorCheck {
        let config_path = orchestrator_config_path(&self.project_path);
        match OrchestratorConfig::load(&config_path) {
            Ok(_) => DoctorCheck {
                name: "orchestrator_config".to_string(),
                status: CheckStatus::Pass,
                details: format!("{} parsed and validated", config_path.display()),
            },
            Err(err) => DoctorCheck {
                name: "orchestrator_config".to_string(),
                status: CheckStatus::Fail,
                details: err.to_string(),
            },
        }
    }

    fn check_evidence_root_writable(&self) -> DoctorCheck {
        let evidence_root = self.project_path.join(".pm-runner").join("evidence");
        match probe_writable(&evidence_root) {
            Ok(()) => DoctorCheck {
                name: "evidence_root_writable".to_string(),
                status: CheckStatus::Pass,
                details: format!("{} is writable", evidence_root.display()),
            },
            Err(reason) => DoctorCheck {
                name: "evidence_root_writable".to_string(),
                status: CheckStatus::Fail,
                details: reason,
            },
        }
    }

    fn check_recovery_stub_safety(&self) -> DoctorCheck {
        let stub_active = pmr_config::env::executor_mode_is_recovery_stub();
        let production = pmr_config::env::is_production();
        match (stub_active, production) {
            (true, true) => DoctorCheck {
                name: "recovery_stub_safety".to_string(),
                status: CheckStatus::Fail,
                details: "PM_EXECUTOR_MODE=recovery-stub is set in a production environment".to_string(),
            },
            (true, false) => DoctorCheck {
                name: "recovery_stub_safety".to_string(),
                status: CheckStatus::Warn,
                details: "recovery-stub executor is active; no real executor will run".to_string(),
            },
            (false, _) => DoctorCheck {
                name: "recovery_stub_safety".to_string(),
                status: CheckStatus::Pass,
                details: "real executor selected".to_string(),
            },
        }
    }
}

fn probe_writable(dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("cannot create {}: {e}", dir.display()))?;
    let probe = dir.join(".doctor-write-probe");
    std::fs::write(&probe, b"ok").map_err(|e| format!("cannot write to {}: {e}", dir.display()))?;
    std::fs::remove_file(&probe).map_err(|e| format!("cannot remove probe file: {e}"))?;
    Ok(())
}
