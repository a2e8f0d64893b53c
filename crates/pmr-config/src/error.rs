use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("project path invalid: {path} ({reason})")]
    ProjectPathInvalid { path: String, reason: &'static str },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(
        "limits.{field} = {value} is out of bounds [{min}, {max}]"
    )]
    LimitOutOfBounds {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("unknown task reference: {0}")]
    UnknownTaskReference(String),

    #[error("dependency cycle detected among tasks: {0:?}")]
    DependencyCycle(Vec<String>),
}
