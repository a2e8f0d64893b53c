//! `pm-orchestrator.yaml`: recognized keys and their bounds.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

fn default_max_files() -> u32 {
    5
}
fn default_max_tests() -> u32 {
    10
}
fn default_max_seconds() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default = "default_max_files")]
    pub max_files: u32,
    #[serde(default = "default_max_tests")]
    pub max_tests: u32,
    #[serde(default = "default_max_seconds")]
    pub max_seconds: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_tests: default_max_tests(),
            max_seconds: default_max_seconds(),
        }
    }
}

impl Limits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_bound("max_files", i64::from(self.max_files), 1, 20)?;
        check_bound("max_tests", i64::from(self.max_tests), 1, 50)?;
        check_bound("max_seconds", self.max_seconds as i64, 30, 900)?;
        Ok(())
    }
}

fn check_bound(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::LimitOutOfBounds {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub natural_language_task: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub expected_outcome: Option<String>,
    #[serde(default)]
    pub side_effect_verification: Option<String>,
    #[serde(default)]
    pub will_fail: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl OrchestratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.limits.validate()?;
        config.validate_dependencies()?;
        Ok(config)
    }

    /// Detects unresolvable task references and dependency cycles via a
    /// synchronous, bounded DFS (CPU work stays off the async boundary per
    /// the concurrency model).
    fn validate_dependencies(&self) -> Result<(), ConfigError> {
        use std::collections::{HashMap, HashSet};

        let known: HashSet<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        for task in &self.tasks {
            for dep in &task.dependencies {
                if !known.contains(dep.as_str()) {
                    return Err(ConfigError::UnknownTaskReference(dep.clone()));
                }
            }
        }

        let edges: HashMap<&str, &[String]> = self
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.dependencies.as_slice()))
            .collect();

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut stack = Vec::new();

        fn visit<'a>(
            node: &'a str,
            edges: &HashMap<&'a str, &'a [String]>,
            marks: &mut HashMap<&'a str, Mark>,
            stack: &mut Vec<&'a str>,
        ) -> Result<(), ConfigError> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let cycle_start = stack.iter().position(|n| *n == node).unwrap_or(0);
                    return Err(ConfigError::DependencyCycle(
                        stack[cycle_start..].iter().map(|s| s.to_string()).collect(),
                    ));
                }
                None => {}
            }
            marks.insert(node, Mark::Visiting);
            stack.push(node);
            if let Some(deps) = edges.get(node) {
                for dep in deps.iter() {
                    visit(dep.as_str(), edges, marks, stack)?;
                }
            }
            stack.pop();
            marks.insert(node, Mark::Done);
            Ok(())
        }

        for task in &self.tasks {
            visit(task.id.as_str(), &edges, &mut marks, &mut stack)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_out_of_bounds_rejected() {
        let limits = Limits {
            max_files: 0,
            ..Limits::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn limits_defaults_are_valid() {
        Limits::default().validate().unwrap();
    }

    #[test]
    fn detects_unknown_task_reference() {
        let config = OrchestratorConfig {
            limits: Limits::default(),
            tasks: vec![TaskSpec {
                id: "a".into(),
                description: "A".into(),
                natural_language_task: None,
                dependencies: vec!["missing".into()],
                task_type: None,
                expected_outcome: None,
                side_effect_verification: None,
                will_fail: false,
            }],
        };
        assert!(matches!(
            config.validate_dependencies(),
            Err(ConfigError::UnknownTaskReference(_))
        ));
    }

    #[test]
    fn detects_dependency_cycle() {
        let config = OrchestratorConfig {
            limits: Limits::default(),
            tasks: vec![
                TaskSpec {
                    id: "a".into(),
                    description: "A".into(),
                    natural_language_task: None,
                    dependencies: vec!["b".into()],
                    task_type: None,
                    expected_outcome: None,
                    side_effect_verification: None,
                    will_fail: false,
                },
                TaskSpec {
                    id: "b".into(),
                    description: "B".into(),
                    natural_language_task: None,
                    dependencies: vec!["a".into()],
                    task_type: None,
                    expected_outcome: None,
                    side_effect_verification: None,
                    will_fail: false,
                },
            ],
        };
        assert!(matches!(
            config.validate_dependencies(),
            Err(ConfigError::DependencyCycle(_))
        ));
    }
}
