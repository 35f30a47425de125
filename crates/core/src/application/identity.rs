// Job identity: id allocation and per-job paths

use crate::domain::{JobId, RESULT_FILE_NAME, WORKER_LOG_FILE_NAME};
use crate::port::IdProvider;
use std::path::PathBuf;
use std::sync::Arc;

/// Filesystem roots shared by all jobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLayout {
    pub video_root: PathBuf,
    pub results_root: PathBuf,
}

impl JobLayout {
    pub fn new(video_root: impl Into<PathBuf>, results_root: impl Into<PathBuf>) -> Self {
        Self {
            video_root: video_root.into(),
            results_root: results_root.into(),
        }
    }

    /// Directory holding every artifact of one job
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.results_root.join(job_id)
    }

    pub fn worker_log_path(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id).join(WORKER_LOG_FILE_NAME)
    }

    pub fn video_path(&self, video_file_name: &str) -> PathBuf {
        self.video_root.join(video_file_name)
    }
}

/// Paths derived for a freshly allocated job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub job_id: JobId,
    /// `{job_id}/result.csv`, relative to the results root
    pub output_file_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
}

/// Allocates job ids and derives where each job's files live
pub struct JobIdentity {
    id_provider: Arc<dyn IdProvider>,
    layout: JobLayout,
}

impl JobIdentity {
    pub fn new(id_provider: Arc<dyn IdProvider>, layout: JobLayout) -> Self {
        Self {
            id_provider,
            layout,
        }
    }

    /// Allocate a new id and compute the job's paths
    pub fn allocate(&self, video_file_name: &str) -> JobPaths {
        let job_id = self.id_provider.generate_id();

        JobPaths {
            output_file_name: format!("{}/{}", job_id, RESULT_FILE_NAME),
            input_path: self.layout.video_path(video_file_name),
            output_path: self.layout.job_dir(&job_id).join(RESULT_FILE_NAME),
            log_path: self.layout.worker_log_path(&job_id),
            job_id,
        }
    }
}
