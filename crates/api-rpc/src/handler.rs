//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::to_rpc_error;
use crate::types::{
    StatusRequest, SubmitRequest, SubmitResponse, TailLogsRequest, TailLogsResponse,
};
use centroid_core::application::orchestrator;
use centroid_core::application::{JobOrchestrator, JobSummary, StatusQueryService, StatusView};
use centroid_core::domain::JobStatus;
use centroid_core::port::VideoCatalog;
use jsonrpsee::types::ErrorObjectOwned;
use std::io::ErrorKind;
use std::sync::Arc;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    orchestrator: Arc<JobOrchestrator>,
    status: Arc<StatusQueryService>,
    videos: Arc<dyn VideoCatalog>,
}

impl RpcHandler {
    pub fn new(
        orchestrator: Arc<JobOrchestrator>,
        status: Arc<StatusQueryService>,
        videos: Arc<dyn VideoCatalog>,
    ) -> Self {
        Self {
            orchestrator,
            status,
            videos,
        }
    }

    /// process.submit.v1
    pub async fn submit(&self, params: SubmitRequest) -> Result<SubmitResponse, ErrorObjectOwned> {
        let req = orchestrator::SubmitRequest {
            video_file_name: params.video_file_name,
            target_color: params.target_color,
            threshold: params.threshold.map(|t| t.into_text()),
        };

        let job_id = self.orchestrator.submit(req).await.map_err(to_rpc_error)?;

        Ok(SubmitResponse {
            job_id,
            status: JobStatus::Processing.to_string(),
        })
    }

    /// process.status.v1
    pub async fn status(&self, params: StatusRequest) -> Result<StatusView, ErrorObjectOwned> {
        self.status
            .get_status(&params.job_id)
            .await
            .map_err(to_rpc_error)
    }

    /// jobs.list.v1
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, ErrorObjectOwned> {
        self.status.list_all().await.map_err(to_rpc_error)
    }

    /// videos.list.v1
    pub async fn list_videos(&self) -> Result<Vec<String>, ErrorObjectOwned> {
        self.videos.list_videos().await.map_err(to_rpc_error)
    }

    /// logs.tail.v1
    pub async fn tail_logs(
        &self,
        params: TailLogsRequest,
    ) -> Result<TailLogsResponse, ErrorObjectOwned> {
        let log_path = self
            .status
            .worker_log_path(&params.job_id)
            .await
            .map_err(to_rpc_error)?;

        // Read log file if exists
        let (log_path, lines) = match tokio::fs::read_to_string(&log_path).await {
            Ok(content) => {
                let all_lines: Vec<&str> = content.lines().collect();
                let start = all_lines.len().saturating_sub(params.lines);
                let lines = all_lines[start..].iter().map(|s| s.to_string()).collect();
                (Some(log_path.display().to_string()), lines)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => (None, vec![]),
            Err(e) => return Err(to_rpc_error(e.into())),
        };

        Ok(TailLogsResponse {
            job_id: params.job_id,
            log_path,
            lines,
        })
    }
}
