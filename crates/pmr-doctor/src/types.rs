use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorCheck {
    pub name: String,
    pub status: CheckStatus,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorOutput {
    pub schema_version: String,
    pub emitted_at: DateTime<Utc>,
    /// True only when every check passed or warned, and strict mode (if
    /// requested) found no warnings either.
    pub ok: bool,
    pub checks: Vec<DoctorCheck>,
}
