use serde::{Deserialize, Serialize};

/// A configured dbt job as returned by `GET api/jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Backend row identifier
    pub job_id: i64,
    /// Identifier of the job in dbt Cloud
    pub dbt_id: i64,
    /// Name of the dbt project the job belongs to
    pub project_name: String,
    /// Name of the dbt environment the job runs in.
    ///
    /// The backend spells this key `enviornment_name`; the correct spelling is
    /// accepted too so a fixed backend keeps working.
    #[serde(rename = "enviornment_name", alias = "environment_name")]
    pub environment_name: String,
    /// Job name, used as the join key against runs
    pub name: String,
}

/// A job execution as returned by `GET api/runs`.
///
/// Timestamps and the duration are kept as the raw strings the backend sent;
/// they are only interpreted when rendered so a malformed value never fails a
/// fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Identifier of the run in dbt Cloud
    pub dbt_id: i64,
    pub environment_name: String,
    pub project_name: String,
    /// Name of the job this run executed
    pub job_name: String,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub git_hash: Option<String>,
    /// ISO-8601 start timestamp
    pub started_at: String,
    /// ISO-8601 finish timestamp, absent while running
    #[serde(default)]
    pub finished_at: Option<String>,
    pub is_error: bool,
    /// Time span such as `0:05:30` or `1 day, 2:03:04`
    pub duration: String,
}

/// Body returned by the backend refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshStatus {
    pub status: String,
}
