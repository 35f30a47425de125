//! Centroid SDK - Rust Client Library
//!
//! Provides a convenient client for the Centroid job engine daemon.
//!
//! # Example
//!
//! ```no_run
//! use centroid_sdk::{CentroidClient, SubmitRequest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CentroidClient::connect("http://127.0.0.1:3000").await?;
//!
//!     let response = client.submit(SubmitRequest {
//!         video_file_name: "clip.mp4".to_string(),
//!         target_color: "2D0508".to_string(),
//!         threshold: "180".to_string(),
//!     }).await?;
//!
//!     let status = client
//!         .wait_for_completion(&response.job_id, Duration::from_secs(1), 600)
//!         .await?;
//!     println!("Job {} finished: {}", response.job_id, status.status);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::CentroidClient;
pub use error::{Result, SdkError};
pub use types::{
    JobStatus, JobSummary, StatusResponse, SubmitRequest, SubmitResponse, TailLogsRequest,
    TailLogsResponse,
};
