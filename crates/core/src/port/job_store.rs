// Job Record Store Port (Interface)

use crate::domain::{JobId, JobRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Whole job collection, keyed by job id
pub type JobMap = BTreeMap<JobId, JobRecord>;

/// Durable key-value collection of job records
///
/// The collection is read and written as a whole. Implementations do NOT
/// serialize callers; all access must go through `JobLedger`.
#[async_trait]
pub trait JobRecordStore: Send + Sync {
    /// Load the full collection (empty if nothing was persisted yet)
    async fn load(&self) -> Result<JobMap>;

    /// Atomically replace the persisted collection
    async fn save(&self, jobs: &JobMap) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store
    ///
    /// Yields to the scheduler between reading and writing so unserialized
    /// load/save pairs interleave the way a real file store would.
    #[derive(Default)]
    pub struct InMemoryJobStore {
        jobs: Mutex<JobMap>,
        saves: AtomicUsize,
        failing_saves: AtomicUsize,
    }

    impl InMemoryJobStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_jobs(jobs: JobMap) -> Self {
            Self {
                jobs: Mutex::new(jobs),
                ..Self::default()
            }
        }

        /// Make the next `n` saves fail with a store error
        pub fn fail_next_saves(&self, n: usize) {
            self.failing_saves.store(n, Ordering::SeqCst);
        }

        pub fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        pub fn contents(&self) -> JobMap {
            self.jobs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobRecordStore for InMemoryJobStore {
        async fn load(&self) -> Result<JobMap> {
            let jobs = self.jobs.lock().unwrap().clone();
            tokio::task::yield_now().await;
            Ok(jobs)
        }

        async fn save(&self, jobs: &JobMap) -> Result<()> {
            tokio::task::yield_now().await;

            let should_fail = self
                .failing_saves
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if should_fail {
                return Err(AppError::Store("injected save failure".to_string()));
            }

            *self.jobs.lock().unwrap() = jobs.clone();
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
