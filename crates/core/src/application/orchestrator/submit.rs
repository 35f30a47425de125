// Submit Use Case

use crate::application::identity::JobIdentity;
use crate::application::ledger::JobLedger;
use crate::domain::{JobId, JobParams, JobRecord};
use crate::error::{AppError, Result};
use crate::port::{TimeProvider, WorkerCompletion, WorkerInvocation, WorkerLauncher};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Submission request as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub video_file_name: String,
    pub target_color: Option<String>,
    pub threshold: Option<String>,
}

/// Validate a submission before any job is created
pub fn validate_request(req: &SubmitRequest) -> Result<JobParams> {
    let target_color = req.target_color.as_deref().map(str::trim).unwrap_or("");
    let threshold_text = req.threshold.as_deref().map(str::trim).unwrap_or("");

    if target_color.is_empty() || threshold_text.is_empty() {
        return Err(AppError::Validation(
            "Missing targetColor or threshold parameter".to_string(),
        ));
    }

    let threshold: f64 = threshold_text
        .parse()
        .ok()
        .filter(|t: &f64| t.is_finite())
        .ok_or_else(|| {
            AppError::Validation(format!(
                "threshold must be a number, got '{}'",
                threshold_text
            ))
        })?;

    let video_file_name = req.video_file_name.trim();
    if video_file_name.is_empty() {
        return Err(AppError::Validation(
            "video file name cannot be empty".to_string(),
        ));
    }
    if video_file_name.contains(['/', '\\']) || video_file_name == ".." || video_file_name == "."
    {
        return Err(AppError::Validation(format!(
            "video file name must be a single path segment, got '{}'",
            video_file_name
        )));
    }

    Ok(JobParams {
        video_file_name: video_file_name.to_string(),
        target_color: target_color.to_string(),
        threshold_text: threshold_text.to_string(),
        threshold,
    })
}

/// Execute submit use case
///
/// Persists a Processing record, then starts the worker. Returns the job id
/// together with the worker's completion handle; the caller decides how the
/// completion is awaited.
///
/// # Arguments
///
/// * `ledger` - Serialized job store
/// * `identity` - Id allocator and path layout
/// * `launcher` - Worker launcher
/// * `time_provider` - Time provider (injected for determinism)
/// * `req` - Submission request
pub async fn execute(
    ledger: &JobLedger,
    identity: &JobIdentity,
    launcher: &dyn WorkerLauncher,
    time_provider: &dyn TimeProvider,
    req: SubmitRequest,
) -> Result<(JobId, WorkerCompletion)> {
    let params = validate_request(&req)?;
    let paths = identity.allocate(&params.video_file_name);
    let job_id = paths.job_id.clone();

    let record = JobRecord::new(
        job_id.clone(),
        paths.output_file_name.clone(),
        &params,
        time_provider.now_millis(),
    );

    ledger
        .mutate(|jobs| {
            if jobs.contains_key(&record.id) {
                return Err(AppError::Internal(format!(
                    "Job id collision: {}",
                    record.id
                )));
            }
            jobs.insert(record.id.clone(), record);
            Ok(())
        })
        .await?;

    info!(
        job_id = %job_id,
        video = %params.video_file_name,
        target_color = %params.target_color,
        threshold = %params.threshold_text,
        "Job created"
    );

    let invocation = WorkerInvocation {
        job_id: job_id.clone(),
        input_path: paths.input_path,
        output_path: paths.output_path,
        log_path: paths.log_path,
        target_color: params.target_color,
        threshold: params.threshold_text,
    };

    match launcher.launch(invocation).await {
        Ok(completion) => Ok((job_id, completion)),
        Err(launch_err) => {
            error!(job_id = %job_id, error = %launch_err, "Failed to start worker");

            // No job may stay Processing without a worker behind it
            let message = format!("failed to start worker: {}", launch_err);
            let now = time_provider.now_millis();
            let marked = ledger
                .mutate(|jobs| {
                    if let Some(record) = jobs.get_mut(&job_id) {
                        record.fail(message, now)?;
                    }
                    Ok(())
                })
                .await;

            // The launch failure is what the caller needs to see
            if let Err(store_err) = marked {
                error!(
                    job_id = %job_id,
                    error = %store_err,
                    "Failed to mark unlaunched job as error; record stays processing"
                );
            }

            Err(AppError::Launch(launch_err))
        }
    }
}
