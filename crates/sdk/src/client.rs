//! Centroid Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    JobSummary, StatusRequest, StatusResponse, SubmitRequest, SubmitResponse, TailLogsRequest,
    TailLogsResponse,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_TAIL_LINES: usize = 50;

/// Send a request struct as named params (`{"job_id": ...}`), which is the
/// form the daemon's methods parse
fn named_params<T: Serialize>(request: &T) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    match serde_json::to_value(request)? {
        serde_json::Value::Object(fields) => {
            for (name, value) in fields {
                params.insert(&name, value)?;
            }
            Ok(params)
        }
        other => Err(SdkError::Other(format!(
            "request must serialize to an object, got {}",
            other
        ))),
    }
}

/// Centroid job engine client
///
/// Provides a high-level interface to interact with the Centroid daemon.
///
/// # Example
///
/// ```no_run
/// use centroid_sdk::CentroidClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CentroidClient::connect("http://127.0.0.1:3000").await?;
/// # Ok(())
/// # }
/// ```
pub struct CentroidClient {
    client: HttpClient,
}

impl CentroidClient {
    /// Connect to the Centroid daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:3000`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Start processing a video
    ///
    /// Returns as soon as the worker has been started; the job is
    /// `processing` until its worker exits.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use centroid_sdk::{CentroidClient, SubmitRequest};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = CentroidClient::connect("http://127.0.0.1:3000").await?;
    /// let response = client.submit(SubmitRequest {
    ///     video_file_name: "clip.mp4".to_string(),
    ///     target_color: "2D0508".to_string(),
    ///     threshold: "180".to_string(),
    /// }).await?;
    ///
    /// println!("Job ID: {}", response.job_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse> {
        let params = named_params(&request)?;
        let response: SubmitResponse = self.client.request("process.submit.v1", params).await?;

        Ok(response)
    }

    /// Get the status of a job
    pub async fn status(&self, job_id: impl Into<String>) -> Result<StatusResponse> {
        let request = StatusRequest {
            job_id: job_id.into(),
        };
        let params = named_params(&request)?;
        let response: StatusResponse = self.client.request("process.status.v1", params).await?;

        Ok(response)
    }

    /// List every known job, oldest first
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>> {
        let response: Vec<JobSummary> = self.client.request("jobs.list.v1", rpc_params![]).await?;

        Ok(response)
    }

    /// List videos available for processing
    pub async fn list_videos(&self) -> Result<Vec<String>> {
        let response: Vec<String> = self.client.request("videos.list.v1", rpc_params![]).await?;

        Ok(response)
    }

    /// Tail job logs
    ///
    /// # Arguments
    ///
    /// * `job_id` - ID of the job
    /// * `lines` - Number of lines to retrieve (default: 50)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use centroid_sdk::CentroidClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = CentroidClient::connect("http://127.0.0.1:3000").await?;
    /// let response = client.tail_logs("job-123", Some(100)).await?;
    /// for line in response.lines {
    ///     println!("{}", line);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn tail_logs(
        &self,
        job_id: impl Into<String>,
        lines: Option<usize>,
    ) -> Result<TailLogsResponse> {
        let request = TailLogsRequest {
            job_id: job_id.into(),
            lines: lines.unwrap_or(DEFAULT_TAIL_LINES),
        };
        let params = named_params(&request)?;
        let response: TailLogsResponse = self.client.request("logs.tail.v1", params).await?;

        Ok(response)
    }

    /// Poll a job until it is `done` or `error`
    ///
    /// Gives up with [`SdkError::WaitTimeout`] after `max_attempts` polls.
    pub async fn wait_for_completion(
        &self,
        job_id: &str,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Result<StatusResponse> {
        for attempt in 1..=max_attempts {
            let status = self.status(job_id).await?;
            if status.status.is_terminal() {
                return Ok(status);
            }
            if attempt < max_attempts {
                tokio::time::sleep(poll_interval).await;
            }
        }

        Err(SdkError::WaitTimeout {
            job_id: job_id.to_string(),
            attempts: max_attempts,
        })
    }
}
