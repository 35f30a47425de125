// Job Orchestrator - submission and fire-and-forget completion

pub mod completion;
pub mod submit;

pub use completion::CompletionOutcome;
pub use submit::SubmitRequest;

use crate::application::identity::JobIdentity;
use crate::application::ledger::JobLedger;
use crate::domain::JobId;
use crate::error::{AppError, Result};
use crate::port::{TimeProvider, WorkerCompletion, WorkerLauncher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::error;

/// Job Orchestrator
///
/// Validates requests, records jobs, starts workers and applies each worker's
/// exit back to the ledger from a detached task.
pub struct JobOrchestrator {
    ledger: Arc<JobLedger>,
    identity: Arc<JobIdentity>,
    launcher: Arc<dyn WorkerLauncher>,
    time_provider: Arc<dyn TimeProvider>,
    in_flight: Arc<AtomicUsize>,
}

impl JobOrchestrator {
    pub fn new(
        ledger: Arc<JobLedger>,
        identity: Arc<JobIdentity>,
        launcher: Arc<dyn WorkerLauncher>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            ledger,
            identity,
            launcher,
            time_provider,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Submit a job and return its id without waiting for the worker
    ///
    /// Runs on its own task: once the record is inserted, the launch and the
    /// completion hookup finish even if the caller stops waiting.
    pub async fn submit(&self, req: SubmitRequest) -> Result<JobId> {
        let ledger = Arc::clone(&self.ledger);
        let identity = Arc::clone(&self.identity);
        let launcher = Arc::clone(&self.launcher);
        let time_provider = Arc::clone(&self.time_provider);
        let in_flight = Arc::clone(&self.in_flight);

        let task = tokio::spawn(async move {
            let (job_id, completion) = submit::execute(
                ledger.as_ref(),
                identity.as_ref(),
                launcher.as_ref(),
                time_provider.as_ref(),
                req,
            )
            .await?;

            spawn_completion(ledger, time_provider, in_flight, job_id.clone(), completion);
            Ok(job_id)
        });

        task.await
            .map_err(|e| AppError::Internal(format!("Submit task failed: {}", e)))?
    }

    /// Number of workers whose exit has not been applied yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

fn spawn_completion(
    ledger: Arc<JobLedger>,
    time_provider: Arc<dyn TimeProvider>,
    in_flight: Arc<AtomicUsize>,
    job_id: JobId,
    completion: WorkerCompletion,
) {
    in_flight.fetch_add(1, Ordering::SeqCst);
    tokio::spawn(async move {
        let exit = completion.wait().await;

        if let Err(e) =
            completion::apply_outcome(&ledger, time_provider.as_ref(), &job_id, &exit).await
        {
            error!(
                job_id = %job_id,
                exit = ?exit,
                error = %e,
                "Failed to record worker exit"
            );
        }

        in_flight.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::identity::JobLayout;
    use crate::domain::JobStatus;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::job_store::mocks::InMemoryJobStore;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use crate::port::worker_launcher::mocks::MockWorkerLauncher;
    use crate::port::WorkerExit;
    use std::time::Duration;

    struct Fixture {
        store: Arc<InMemoryJobStore>,
        ledger: Arc<JobLedger>,
        launcher: Arc<MockWorkerLauncher>,
        orchestrator: JobOrchestrator,
    }

    fn fixture(launcher: MockWorkerLauncher) -> Fixture {
        let store = Arc::new(InMemoryJobStore::new());
        let ledger = Arc::new(JobLedger::new(store.clone()));
        let launcher = Arc::new(launcher);
        let identity = Arc::new(JobIdentity::new(
            Arc::new(SequentialIdProvider::new("job")),
            JobLayout::new("/videos", "/results"),
        ));
        let orchestrator = JobOrchestrator::new(
            ledger.clone(),
            identity,
            launcher.clone(),
            Arc::new(FixedTimeProvider::new(1000)),
        );
        Fixture {
            store,
            ledger,
            launcher,
            orchestrator,
        }
    }

    fn request(video: &str) -> SubmitRequest {
        SubmitRequest {
            video_file_name: video.to_string(),
            target_color: Some("2D0508".to_string()),
            threshold: Some("180".to_string()),
        }
    }

    async fn wait_until_idle(orchestrator: &JobOrchestrator) {
        for _ in 0..200 {
            if orchestrator.in_flight() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("completion tasks did not finish");
    }

    #[tokio::test]
    async fn test_submit_records_processing_job() {
        let f = fixture(MockWorkerLauncher::new_manual());

        let job_id = f.orchestrator.submit(request("clip.mp4")).await.unwrap();

        let record = f.ledger.get(&job_id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Processing);
        assert_eq!(record.output_file_name, format!("{}/result.csv", job_id));
        assert_eq!(record.video_file_name.as_deref(), Some("clip.mp4"));
        assert_eq!(f.orchestrator.in_flight(), 1);

        let invocations = f.launcher.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].job_id, job_id);
        assert_eq!(invocations[0].threshold, "180");
    }

    #[tokio::test]
    async fn test_validation_error_creates_nothing() {
        let f = fixture(MockWorkerLauncher::new_success());
        let mut req = request("clip.mp4");
        req.threshold = None;

        let result = f.orchestrator.submit(req).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(f.store.contents().is_empty());
        assert!(f.launcher.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_launch_failure_leaves_no_processing_record() {
        let f = fixture(MockWorkerLauncher::new_unlaunchable("java: not found"));

        let result = f.orchestrator.submit(request("clip.mp4")).await;

        assert!(matches!(result, Err(AppError::Launch(_))));
        let jobs = f.store.contents();
        assert_eq!(jobs.len(), 1);
        let record = jobs.values().next().unwrap();
        assert_eq!(record.status, JobStatus::Error);
        assert!(record.error.as_deref().unwrap().contains("java: not found"));
        assert_eq!(f.orchestrator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_worker_exit_is_applied_asynchronously() {
        let f = fixture(MockWorkerLauncher::new_manual());

        let ok_id = f.orchestrator.submit(request("a.mp4")).await.unwrap();
        let bad_id = f.orchestrator.submit(request("b.mp4")).await.unwrap();

        assert!(f.launcher.finish(&ok_id, WorkerExit::Exited(0)));
        assert!(f.launcher.finish(&bad_id, WorkerExit::Exited(137)));
        wait_until_idle(&f.orchestrator).await;

        let jobs = f.store.contents();
        assert_eq!(jobs[&ok_id].status, JobStatus::Done);
        assert_eq!(jobs[&bad_id].status, JobStatus::Error);
        assert_eq!(
            jobs[&bad_id].error.as_deref(),
            Some("process exited with code 137")
        );
    }

    #[tokio::test]
    async fn test_interleaved_submissions_and_completions_lose_nothing() {
        let f = Arc::new(fixture(MockWorkerLauncher::new_manual()));

        // First wave is running while the second wave is being submitted
        let mut first_wave = Vec::new();
        for i in 0..10 {
            first_wave.push(f.orchestrator.submit(request(&format!("{}.mp4", i))).await.unwrap());
        }

        let mut submissions = tokio::task::JoinSet::new();
        for i in 10..20 {
            let f = f.clone();
            submissions.spawn(async move {
                f.orchestrator
                    .submit(request(&format!("{}.mp4", i)))
                    .await
                    .unwrap()
            });
        }
        for (i, job_id) in first_wave.iter().enumerate() {
            let code = if i % 2 == 0 { 0 } else { 1 };
            f.launcher.finish(job_id, WorkerExit::Exited(code));
        }
        let mut second_wave = Vec::new();
        while let Some(job_id) = submissions.join_next().await {
            second_wave.push(job_id.unwrap());
        }
        for job_id in &second_wave {
            f.launcher.finish(job_id, WorkerExit::Exited(0));
        }
        wait_until_idle(&f.orchestrator).await;

        let jobs = f.store.contents();
        assert_eq!(jobs.len(), 20);
        assert!(jobs.values().all(|job| job.status.is_terminal()));
        let errors = jobs
            .values()
            .filter(|job| job.status == JobStatus::Error)
            .count();
        assert_eq!(errors, 5);
    }

    /// Starts a worker only after a delay, so a submit can be abandoned mid-launch
    struct SlowLauncher {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl WorkerLauncher for SlowLauncher {
        async fn launch(
            &self,
            _invocation: crate::port::WorkerInvocation,
        ) -> std::result::Result<WorkerCompletion, crate::port::LaunchError> {
            tokio::time::sleep(self.delay).await;
            let (tx, completion) = WorkerCompletion::channel();
            let _ = tx.send(WorkerExit::Exited(0));
            Ok(completion)
        }
    }

    #[tokio::test]
    async fn test_abandoned_submit_still_finishes_the_job() {
        let store = Arc::new(InMemoryJobStore::new());
        let ledger = Arc::new(JobLedger::new(store.clone()));
        let orchestrator = JobOrchestrator::new(
            ledger.clone(),
            Arc::new(JobIdentity::new(
                Arc::new(SequentialIdProvider::new("job")),
                JobLayout::new("/videos", "/results"),
            )),
            Arc::new(SlowLauncher {
                delay: Duration::from_millis(200),
            }),
            Arc::new(FixedTimeProvider::new(1000)),
        );

        // Caller gives up while the launch is still pending
        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), orchestrator.submit(request("clip.mp4")))
                .await;
        assert!(abandoned.is_err());

        let mut status = None;
        for _ in 0..200 {
            status = store.contents().values().next().map(|job| job.status);
            if status == Some(JobStatus::Done) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(status, Some(JobStatus::Done));
        assert_eq!(store.contents().len(), 1);
        wait_until_idle(&orchestrator).await;
    }
}
