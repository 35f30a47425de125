//! Simple SDK Example
//!
//! Submits one video and waits for the result.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package centroid-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple
//!    ```

use centroid_sdk::{CentroidClient, JobStatus, SubmitRequest};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Centroid SDK - Simple Example");
    println!("=============================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = CentroidClient::connect("http://127.0.0.1:3000").await?;
    println!("   ✓ Connected\n");

    // 2. Pick a video
    println!("2. Listing videos...");
    let videos = client.list_videos().await?;
    let Some(video) = videos.into_iter().next() else {
        println!("   ⚠ No .mp4 files in the video directory");
        return Ok(());
    };
    println!("   ✓ Using {}\n", video);

    // 3. Submit a job
    println!("3. Submitting job...");
    let submitted = client
        .submit(SubmitRequest {
            video_file_name: video,
            target_color: "2D0508".to_string(),
            threshold: "180".to_string(),
        })
        .await?;
    println!("   ✓ Job {} is {}\n", submitted.job_id, submitted.status);

    // 4. Wait for the worker
    println!("4. Waiting for completion...");
    let status = client
        .wait_for_completion(&submitted.job_id, Duration::from_secs(1), 600)
        .await?;

    match status.status {
        JobStatus::Done => println!("   ✓ Result: {}", status.result.unwrap_or_default()),
        _ => println!("   ✗ Failed: {}", status.error.unwrap_or_default()),
    }
    println!();

    // 5. Tail logs
    println!("5. Fetching worker log...");
    let logs = client.tail_logs(&submitted.job_id, Some(10)).await?;
    if let Some(log_path) = &logs.log_path {
        println!("   - Path: {}", log_path);
    }
    for line in &logs.lines {
        println!("     | {}", line);
    }

    println!("\n✓ Example completed successfully!");

    Ok(())
}
