// Job Ledger - serialized access to the job record store

use crate::application::constants::{STORE_RETRY_DELAY, STORE_WRITE_ATTEMPTS};
use crate::domain::JobRecord;
use crate::error::Result;
use crate::port::{JobMap, JobRecordStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, warn};

/// Sole owner of the job record store
///
/// Every read and every load -> mutate -> save cycle runs under one async
/// mutex, so two mutations never interleave their load/save pairs and no
/// update is lost to a concurrent writer.
pub struct JobLedger {
    store: Arc<dyn JobRecordStore>,
    lock: Mutex<()>,
    retry_delay: Duration,
}

impl JobLedger {
    pub fn new(store: Arc<dyn JobRecordStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            retry_delay: STORE_RETRY_DELAY,
        }
    }

    /// Override the pause between write attempts
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Full copy of the current collection
    pub async fn snapshot(&self) -> Result<JobMap> {
        let _guard = self.lock.lock().await;
        self.store.load().await
    }

    /// Single record by id
    pub async fn get(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let mut jobs = self.snapshot().await?;
        Ok(jobs.remove(job_id))
    }

    /// Load the collection, apply `f`, and persist the result
    ///
    /// Nothing is written when `f` returns an error.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut JobMap) -> Result<T> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;

        let mut jobs = self.store.load().await?;
        let output = f(&mut jobs)?;
        self.save_with_retry(&jobs).await?;

        Ok(output)
    }

    async fn save_with_retry(&self, jobs: &JobMap) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.store.save(jobs).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < STORE_WRITE_ATTEMPTS => {
                    warn!(
                        attempt = %attempt,
                        max_attempts = %STORE_WRITE_ATTEMPTS,
                        error = %e,
                        "Job store write failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        attempts = %attempt,
                        error = %e,
                        "Job store write failed, mutation lost"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobParams, JobRecord};
    use crate::error::AppError;
    use crate::port::job_store::mocks::InMemoryJobStore;

    fn record(id: &str) -> JobRecord {
        let params = JobParams {
            video_file_name: "clip.mp4".to_string(),
            target_color: "2D0508".to_string(),
            threshold_text: "180".to_string(),
            threshold: 180.0,
        };
        JobRecord::new(id, format!("{}/result.csv", id), &params, 1000)
    }

    #[tokio::test]
    async fn test_concurrent_mutations_are_not_lost() {
        let store = Arc::new(InMemoryJobStore::new());
        let ledger = Arc::new(JobLedger::new(store.clone()));

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..50 {
            let ledger = ledger.clone();
            tasks.spawn(async move {
                let id = format!("job-{}", i);
                ledger
                    .mutate(|jobs| {
                        jobs.insert(id.clone(), record(&id));
                        Ok(())
                    })
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.contents().len(), 50);
    }

    #[tokio::test]
    async fn test_failed_closure_writes_nothing() {
        let store = Arc::new(InMemoryJobStore::new());
        let ledger = JobLedger::new(store.clone());

        let result: Result<()> = ledger
            .mutate(|jobs| {
                jobs.insert("job-1".to_string(), record("job-1"));
                Err(AppError::Validation("rejected".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.save_count(), 0);
        assert!(store.contents().is_empty());
    }

    #[tokio::test]
    async fn test_transient_save_failure_is_retried() {
        let store = Arc::new(InMemoryJobStore::new());
        store.fail_next_saves(STORE_WRITE_ATTEMPTS as usize - 1);
        let ledger = JobLedger::new(store.clone()).with_retry_delay(Duration::from_millis(1));

        ledger
            .mutate(|jobs| {
                jobs.insert("job-1".to_string(), record("job-1"));
                Ok(())
            })
            .await
            .unwrap();

        assert!(store.contents().contains_key("job-1"));
    }

    #[tokio::test]
    async fn test_persistent_save_failure_is_surfaced() {
        let store = Arc::new(InMemoryJobStore::new());
        store.fail_next_saves(STORE_WRITE_ATTEMPTS as usize);
        let ledger = JobLedger::new(store.clone()).with_retry_delay(Duration::from_millis(1));

        let result = ledger
            .mutate(|jobs| {
                jobs.insert("job-1".to_string(), record("job-1"));
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AppError::Store(_))));
        assert!(ledger.get("job-1").await.unwrap().is_none());
    }
}
