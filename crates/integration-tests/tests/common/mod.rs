//! Shared wiring for integration tests
//!
//! Builds the engine from real adapters. The worker is `sh -c <script>`, so
//! the script sees `$1` input, `$2` output, `$3` color and `$4` threshold.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use centroid_core::application::{
    JobIdentity, JobLayout, JobLedger, JobOrchestrator, StatusQueryService, StatusView,
};
use centroid_core::domain::JobStatus;
use centroid_core::port::id_provider::UuidProvider;
use centroid_core::port::time_provider::SystemTimeProvider;
use centroid_core::port::TimeProvider;
use centroid_infra_fs::{DirectoryVideoCatalog, JsonFileJobStore};
use centroid_infra_system::ProcessWorkerLauncher;
use tempfile::TempDir;

/// Worker that succeeds unless the video name says otherwise:
/// `crash*` dies by SIGKILL, `broken*` exits 2, anything else writes a CSV.
pub const WORKER_SCRIPT: &str = r#"
echo "processing $1 color=$3 threshold=$4"
case "$(basename "$1")" in
  crash*) kill -9 $$ ;;
  broken*) echo "cannot decode" >&2; exit 2 ;;
esac
sleep 0.0$(( $$ % 10 ))
printf 'frame,x,y\n0,10,20\n' > "$2"
"#;

pub struct TestEngine {
    pub dir: TempDir,
    pub layout: JobLayout,
    pub ledger: Arc<JobLedger>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub status: Arc<StatusQueryService>,
    pub videos: Arc<DirectoryVideoCatalog>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_script(WORKER_SCRIPT)
    }

    pub fn with_script(script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::new(dir.path().join("videos"), dir.path().join("results"));
        std::fs::create_dir_all(&layout.video_root).unwrap();
        Self::open(dir, layout, script)
    }

    /// A second engine over the same directories, as after a restart
    pub fn reopen(self) -> Self {
        let TestEngine { dir, layout, .. } = self;
        Self::open(dir, layout, WORKER_SCRIPT)
    }

    fn open(dir: TempDir, layout: JobLayout, script: &str) -> Self {
        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let store = Arc::new(JsonFileJobStore::new(&layout.results_root));
        let ledger = Arc::new(JobLedger::new(store));
        let identity = Arc::new(JobIdentity::new(Arc::new(UuidProvider), layout.clone()));
        let launcher = ProcessWorkerLauncher::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "worker".to_string()],
            time_provider.clone(),
        );
        let orchestrator = Arc::new(JobOrchestrator::new(
            ledger.clone(),
            identity,
            Arc::new(launcher),
            time_provider,
        ));
        let status = Arc::new(StatusQueryService::new(
            ledger.clone(),
            layout.clone(),
            "/results",
        ));
        let videos = Arc::new(DirectoryVideoCatalog::new(&layout.video_root));

        Self {
            dir,
            layout,
            ledger,
            orchestrator,
            status,
            videos,
        }
    }

    pub fn add_video(&self, name: &str) -> PathBuf {
        let path = self.layout.video_root.join(name);
        std::fs::write(&path, b"not really a video").unwrap();
        path
    }

    pub fn jobs_file(&self) -> PathBuf {
        self.layout.results_root.join("jobs.json")
    }

    /// Poll until the job leaves `processing`
    pub async fn wait_terminal(&self, job_id: &str) -> StatusView {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
        loop {
            let view = self.status.get_status(job_id).await.unwrap();
            if view.status != JobStatus::Processing {
                return view;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {} never finished",
                job_id
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Poll until every completion has been applied
    pub async fn wait_idle(&self) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
        while self.orchestrator.in_flight() > 0 {
            assert!(
                tokio::time::Instant::now() < deadline,
                "{} workers still in flight",
                self.orchestrator.in_flight()
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// Read jobs.json straight from disk
pub fn read_jobs_file(path: &Path) -> serde_json::Map<String, serde_json::Value> {
    let text = std::fs::read_to_string(path).unwrap();
    match serde_json::from_str(&text).unwrap() {
        serde_json::Value::Object(map) => map,
        other => panic!("jobs.json is not an object: {}", other),
    }
}
