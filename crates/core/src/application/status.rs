// Status Query Service - read-only projections over the job ledger

use crate::application::constants::UNKNOWN_ERROR_MESSAGE;
use crate::application::identity::JobLayout;
use crate::application::ledger::JobLedger;
use crate::domain::{JobRecord, JobStatus, RESULT_FILE_NAME};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Polling view of one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Listing entry; `jobId`, `status` and `outputFileName` are always present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub job_id: String,
    pub status: JobStatus,
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
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
}

impl From<JobRecord> for JobSummary {
    fn from(record: JobRecord) -> Self {
        let output_file_name = if record.output_file_name.is_empty() {
            format!("{}/{}", record.id, RESULT_FILE_NAME)
        } else {
            record.output_file_name
        };

        Self {
            job_id: record.id,
            status: record.status,
            output_file_name,
            video_file_name: record.video_file_name,
            target_color: record.target_color,
            threshold: record.threshold,
            error: record.error,
            created_at: record.created_at,
            finished_at: record.finished_at,
        }
    }
}

/// Status Query Service
pub struct StatusQueryService {
    ledger: Arc<JobLedger>,
    layout: JobLayout,
    results_url_prefix: String,
}

impl StatusQueryService {
    /// # Arguments
    /// * `ledger` - Serialized job store
    /// * `layout` - Filesystem roots (for worker log lookup)
    /// * `results_url_prefix` - Public prefix result paths are reported under
    pub fn new(
        ledger: Arc<JobLedger>,
        layout: JobLayout,
        results_url_prefix: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            layout,
            results_url_prefix: results_url_prefix.into(),
        }
    }

    /// Current status of one job
    pub async fn get_status(&self, job_id: &str) -> Result<StatusView> {
        let record = self.find(job_id).await?;
        let summary = JobSummary::from(record);

        let view = match summary.status {
            JobStatus::Processing => StatusView {
                status: JobStatus::Processing,
                result: None,
                error: None,
            },
            JobStatus::Done => StatusView {
                status: JobStatus::Done,
                result: Some(self.public_result_path(&summary.output_file_name)),
                error: None,
            },
            JobStatus::Error => StatusView {
                status: JobStatus::Error,
                result: None,
                error: Some(
                    summary
                        .error
                        .filter(|e| !e.is_empty())
                        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
                ),
            },
        };

        Ok(view)
    }

    /// Every known job, oldest first
    pub async fn list_all(&self) -> Result<Vec<JobSummary>> {
        let jobs = self.ledger.snapshot().await?;

        let mut summaries: Vec<JobSummary> = jobs.into_values().map(JobSummary::from).collect();
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });

        Ok(summaries)
    }

    /// Worker log location of an existing job
    pub async fn worker_log_path(&self, job_id: &str) -> Result<PathBuf> {
        self.find(job_id).await?;
        Ok(self.layout.worker_log_path(job_id))
    }

    async fn find(&self, job_id: &str) -> Result<JobRecord> {
        self.ledger
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))
    }

    fn public_result_path(&self, output_file_name: &str) -> String {
        format!(
            "{}/{}",
            self.results_url_prefix.trim_end_matches('/'),
            output_file_name.trim_start_matches('/')
        )
    }
}
