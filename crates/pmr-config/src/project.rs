//! Project recognition: a valid target project has `.claude/CLAUDE.md`,
//! `.claude/settings.json`, and `pm-orchestrator.yaml`.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const REQUIRED_MARKERS: [&str; 3] = [
    ".claude/CLAUDE.md",
    ".claude/settings.json",
    "pm-orchestrator.yaml",
];

/// Validate that `project_path` looks like a recognized target project.
/// Missing any required marker file is fatal.
pub fn validate_project_path(project_path: &Path) -> Result<(), ConfigError> {
    if !project_path.is_dir() {
        return Err(ConfigError::ProjectPathInvalid {
            path: project_path.display().to_string(),
            reason: "not a directory",
        });
    }

    for marker in REQUIRED_MARKERS {
        if !project_path.join(marker).is_file() {
            return Err(ConfigError::ProjectPathInvalid {
                path: project_path.display().to_string(),
                reason: "missing required project marker",
            });
        }
    }

    Ok(())
}

#[must_use]
pub fn orchestrator_config_path(project_path: &Path) -> PathBuf {
    project_path.join("pm-orchestrator.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn rejects_missing_markers() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_project_path(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ProjectPathInvalid { .. }));
    }

    #[test]
    fn accepts_fully_marked_project() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".claude")).unwrap();
        fs::write(dir.path().join(".claude/CLAUDE.md"), "# project").unwrap();
        fs::write(dir.path().join(".claude/settings.json"), "{}").unwrap();
        fs::write(dir.path().join("pm-orchestrator.yaml"), "limits: {}").unwrap();

        validate_project_path(dir.path()).unwrap();
    }

    #[test]
    fn rejects_missing_one_of_three_markers() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".claude")).unwrap();
        fs::write(dir.path().join(".claude/CLAUDE.md"), "# project").unwrap();
        fs::write(dir.path().join(".claude/settings.json"), "{}").unwrap();
        // pm-orchestrator.yaml intentionally missing

        let err = validate_project_path(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ProjectPathInvalid { .. }));
    }
}
