//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from api-rpc crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Request to start processing a video
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    pub video_file_name: String,
    pub target_color: String,
    pub threshold: String,
}

/// Response from submit operation
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatusRequest {
    pub job_id: String,
}

/// Polling view of one job
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    /// Public path of the result CSV, once done
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Entry of the job listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub job_id: String,
    pub status: JobStatus,
    pub output_file_name: String,
    #[serde(default)]
    pub video_file_name: Option<String>,
    #[serde(default)]
    pub target_color: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub finished_at: Option<i64>,
}

/// Request to tail job logs
#[derive(Debug, Clone, Serialize)]
pub struct TailLogsRequest {
    pub job_id: String,
    pub lines: usize,
}

/// Response from tail logs operation
#[derive(Debug, Clone, Deserialize)]
pub struct TailLogsResponse {
    pub job_id: String,
    pub log_path: Option<String>,
    pub lines: Vec<String>,
}
