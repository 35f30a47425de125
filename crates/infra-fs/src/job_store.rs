// JSON document job store
// The whole collection lives in `{results_root}/jobs.json`

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use centroid_core::error::{AppError, Result};
use centroid_core::port::{JobMap, JobRecordStore};

/// File name of the job collection inside the results root
pub const JOBS_FILE_NAME: &str = "jobs.json";

/// Job store backed by one JSON file
///
/// Writes go to a sibling temp file which is renamed over `jobs.json`, so a
/// reader never observes a half-written collection. The file and its
/// directory are created on first save.
pub struct JsonFileJobStore {
    path: PathBuf,
}

impl JsonFileJobStore {
    /// Store at `{results_root}/jobs.json`
    pub fn new(results_root: impl AsRef<Path>) -> Self {
        Self {
            path: results_root.as_ref().join(JOBS_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl JobRecordStore for JsonFileJobStore {
    async fn load(&self) -> Result<JobMap> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(JobMap::new()),
            Err(e) => {
                return Err(AppError::Store(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut jobs: JobMap = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Store(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;

        // Records written without an id are identified by their key
        for (key, record) in jobs.iter_mut() {
            if record.id.is_empty() {
                record.id = key.clone();
            }
        }

        Ok(jobs)
    }

    async fn save(&self, jobs: &JobMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Store(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_vec_pretty(jobs)?;
        let tmp_path = self.tmp_path();

        // Durable before it replaces jobs.json
        let write_tmp = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(&json).await?;
            file.sync_all().await
        };
        write_tmp.await.map_err(|e: std::io::Error| {
            AppError::Store(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;

        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            AppError::Store(format!(
                "Failed to rename {} to {}: {}",
                tmp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        debug!(path = %self.path.display(), jobs = jobs.len(), "Job store saved");
        Ok(())
    }
}
