//! Centroid CLI - Command-line interface for the Centroid job engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:3000";

#[derive(Parser)]
#[command(name = "centroid")]
#[command(about = "Centroid job engine CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "CENTROID_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start processing a video
    Submit {
        /// Video file name inside the daemon's video directory
        video: String,

        /// Target color as hex (e.g. 2D0508)
        #[arg(short, long)]
        color: String,

        /// Color distance threshold
        #[arg(short, long)]
        threshold: String,

        /// Poll until the job finishes
        #[arg(short, long)]
        wait: bool,
    },

    /// Show the status of a job
    Status {
        /// Job ID
        job_id: String,
    },

    /// Poll a job until it finishes
    Wait {
        /// Job ID
        job_id: String,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,

        /// Give up after this many seconds
        #[arg(long, default_value = "3600")]
        timeout_secs: u64,
    },

    /// List all jobs
    Jobs,

    /// List videos available for processing
    Videos,

    /// Get job worker logs
    Logs {
        /// Job ID
        job_id: String,

        /// Number of lines to tail
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct SubmitResult {
    job_id: String,
    status: String,
}

#[derive(Deserialize)]
struct StatusResult {
    status: String,
    result: Option<String>,
    error: Option<String>,
}

impl StatusResult {
    fn is_terminal(&self) -> bool {
        self.status != "processing"
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobEntry {
    job_id: String,
    status: String,
    output_file_name: String,
    video_file_name: Option<String>,
    target_color: Option<String>,
    threshold: Option<f64>,
    error: Option<String>,
}

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "JOB ID")]
    job_id: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "VIDEO")]
    video: String,
    #[tabled(rename = "COLOR")]
    color: String,
    #[tabled(rename = "THRESHOLD")]
    threshold: String,
    #[tabled(rename = "OUTPUT / ERROR")]
    detail: String,
}

impl From<JobEntry> for JobRow {
    fn from(job: JobEntry) -> Self {
        let detail = match job.error {
            Some(error) => error,
            None => job.output_file_name,
        };
        Self {
            job_id: job.job_id,
            status: job.status,
            video: job.video_file_name.unwrap_or_else(|| "-".to_string()),
            color: job.target_color.unwrap_or_else(|| "-".to_string()),
            threshold: job
                .threshold
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            detail,
        }
    }
}

#[derive(Deserialize)]
struct TailLogsResult {
    log_path: Option<String>,
    lines: Vec<String>,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn fetch_status(url: &str, job_id: &str) -> Result<StatusResult> {
    let result = call_rpc(url, "process.status.v1", json!({ "job_id": job_id })).await?;
    Ok(serde_json::from_value(result)?)
}

fn print_status(job_id: &str, status: &StatusResult) {
    let label = match status.status.as_str() {
        "done" => status.status.green().bold(),
        "error" => status.status.red().bold(),
        _ => status.status.yellow().bold(),
    };
    println!("  {} {}", "Job:".bold(), job_id);
    println!("  {} {}", "Status:".bold(), label);
    if let Some(result) = &status.result {
        println!("  {} {}", "Result:".bold(), result);
    }
    if let Some(error) = &status.error {
        println!("  {} {}", "Error:".bold(), error);
    }
}

async fn wait_for_job(
    url: &str,
    job_id: &str,
    interval: Duration,
    limit: Duration,
) -> Result<StatusResult> {
    let started = Instant::now();
    loop {
        let status = fetch_status(url, job_id).await?;
        if status.is_terminal() {
            return Ok(status);
        }
        if started.elapsed() >= limit {
            anyhow::bail!(
                "Job {} still processing after {}s",
                job_id,
                limit.as_secs()
            );
        }
        tokio::time::sleep(interval).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            video,
            color,
            threshold,
            wait,
        } => {
            let params = json!({
                "video_file_name": video,
                "target_color": color,
                "threshold": threshold,
            });

            let result = call_rpc(&cli.rpc_url, "process.submit.v1", params).await?;
            let submitted: SubmitResult = serde_json::from_value(result)?;

            println!("{}", "✓ Job submitted".green().bold());
            println!("  {} {}", "Job:".bold(), submitted.job_id);
            println!("  {} {}", "Status:".bold(), submitted.status);

            if wait {
                println!();
                println!("{}", "Waiting for job to finish...".cyan());
                let status = wait_for_job(
                    &cli.rpc_url,
                    &submitted.job_id,
                    Duration::from_secs(1),
                    Duration::from_secs(3600),
                )
                .await?;
                print_status(&submitted.job_id, &status);
            }
        }

        Commands::Status { job_id } => {
            let status = fetch_status(&cli.rpc_url, &job_id).await?;
            print_status(&job_id, &status);
        }

        Commands::Wait {
            job_id,
            interval_ms,
            timeout_secs,
        } => {
            let status = wait_for_job(
                &cli.rpc_url,
                &job_id,
                Duration::from_millis(interval_ms),
                Duration::from_secs(timeout_secs),
            )
            .await?;
            print_status(&job_id, &status);
        }

        Commands::Jobs => {
            let result = call_rpc(&cli.rpc_url, "jobs.list.v1", json!({})).await?;
            let jobs: Vec<JobEntry> = serde_json::from_value(result)?;

            if jobs.is_empty() {
                println!("{}", "No jobs yet".yellow());
            } else {
                let rows: Vec<JobRow> = jobs.into_iter().map(JobRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Videos => {
            let result = call_rpc(&cli.rpc_url, "videos.list.v1", json!({})).await?;
            let videos: Vec<String> = serde_json::from_value(result)?;

            if videos.is_empty() {
                println!("{}", "No videos found".yellow());
            }
            for video in videos {
                println!("  {} {}", "•".bold(), video);
            }
        }

        Commands::Logs { job_id, lines } => {
            let params = json!({
                "job_id": job_id,
                "lines": lines,
            });

            let result = call_rpc(&cli.rpc_url, "logs.tail.v1", params).await?;
            let logs: TailLogsResult = serde_json::from_value(result)?;

            match logs.log_path {
                Some(path) if !logs.lines.is_empty() => {
                    println!("{}", format!("Logs for job {} ({}):", job_id, path).cyan().bold());
                    for line in logs.lines {
                        println!("{}", line);
                    }
                }
                _ => println!("{}", "No logs available".yellow()),
            }
        }
    }

    Ok(())
}
