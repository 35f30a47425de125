// Job Record Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Job ID (UUID v4)
pub type JobId = String;

/// File name of the result artifact inside a job directory
pub const RESULT_FILE_NAME: &str = "result.csv";

/// File name of the worker log inside a job directory
pub const WORKER_LOG_FILE_NAME: &str = "worker.log";

/// Job Status
///
/// `Processing` is the only non-terminal state. A record leaves it exactly once.
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

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Validated submission parameters
#[derive(Debug, Clone, PartialEq)]
pub struct JobParams {
    pub video_file_name: String,
    pub target_color: String,
    /// Threshold exactly as submitted (handed to the worker verbatim)
    pub threshold_text: String,
    pub threshold: f64,
}

/// Job Record (one per submitted job)
///
/// Persisted with camelCase keys. Request parameters and timestamps are
/// optional on read so records written by older versions still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    #[serde(rename = "jobId", default)]
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub output_file_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>, // epoch ms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
}

impl JobRecord {
    /// Create a new record in `Processing` state
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `output_file_name` - Result artifact path relative to the results root
    /// * `params` - Validated request parameters
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        output_file_name: impl Into<String>,
        params: &JobParams,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Processing,
            output_file_name: output_file_name.into(),
            video_file_name: Some(params.video_file_name.clone()),
            target_color: Some(params.target_color.clone()),
            threshold: Some(params.threshold),
            error: None,
            created_at: Some(created_at),
            finished_at: None,
        }
    }

    /// Transition to Done with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        self.ensure_processing(JobStatus::Done)?;
        self.status = JobStatus::Done;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Error with explicit timestamp
    pub fn fail(&mut self, message: impl Into<String>, now_millis: i64) -> Result<()> {
        self.ensure_processing(JobStatus::Error)?;
        self.status = JobStatus::Error;
        self.error = Some(message.into());
        self.finished_at = Some(now_millis);
        Ok(())
    }

    fn ensure_processing(&self, to: JobStatus) -> Result<()> {
        if self.status != JobStatus::Processing {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}
