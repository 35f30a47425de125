// Worker completion handling

use crate::application::ledger::JobLedger;
use crate::domain::JobStatus;
use crate::error::Result;
use crate::port::{TimeProvider, WorkerExit};
use tracing::{debug, info, warn};

/// What applying a worker's exit did to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Record moved to this terminal status
    Applied(JobStatus),
    /// Record was already terminal and was left untouched
    AlreadyTerminal(JobStatus),
    /// Record no longer exists
    Missing,
}

/// Apply a worker's exit to its job record
///
/// Re-reads the store under the ledger lock, so updates written by other jobs
/// since submission are preserved.
pub async fn apply_outcome(
    ledger: &JobLedger,
    time_provider: &dyn TimeProvider,
    job_id: &str,
    exit: &WorkerExit,
) -> Result<CompletionOutcome> {
    let now = time_provider.now_millis();

    let outcome = ledger
        .mutate(|jobs| {
            let Some(record) = jobs.get_mut(job_id) else {
                return Ok(CompletionOutcome::Missing);
            };
            if record.status.is_terminal() {
                return Ok(CompletionOutcome::AlreadyTerminal(record.status));
            }

            match exit.failure_message() {
                None => record.complete(now)?,
                Some(message) => record.fail(message, now)?,
            }
            Ok(CompletionOutcome::Applied(record.status))
        })
        .await?;

    match outcome {
        CompletionOutcome::Applied(status) => {
            info!(job_id = %job_id, status = %status, exit = ?exit, "Job finished");
        }
        CompletionOutcome::AlreadyTerminal(status) => {
            warn!(
                job_id = %job_id,
                status = %status,
                exit = ?exit,
                "Worker exit ignored, job already terminal"
            );
        }
        CompletionOutcome::Missing => {
            debug!(job_id = %job_id, "Worker exit ignored, job record vanished");
        }
    }

    Ok(outcome)
}
