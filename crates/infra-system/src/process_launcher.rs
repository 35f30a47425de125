// Process worker launcher
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{info, warn};

use centroid_core::port::worker_launcher::{
    LaunchError, WorkerCompletion, WorkerExit, WorkerInvocation, WorkerLauncher,
};
use centroid_core::port::TimeProvider;

/// Time a timed-out worker gets to exit after SIGTERM before SIGKILL (5s)
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Starts the external processing program as a child process
///
/// The command line is `program prefix_args... input output color threshold`.
/// stdout and stderr go to the job's worker log; they are never inspected.
pub struct ProcessWorkerLauncher {
    program: String,
    prefix_args: Vec<String>,
    timeout: Option<Duration>,
    time_provider: Arc<dyn TimeProvider>,
}

impl ProcessWorkerLauncher {
    /// Create a new process launcher
    ///
    /// # Arguments
    /// * `program` - Executable to run (e.g. `java`)
    /// * `prefix_args` - Arguments placed before the four positional values
    /// * `time_provider` - Time provider for duration tracking
    ///
    /// # Example
    /// ```ignore
    /// let launcher = ProcessWorkerLauncher::new(
    ///     "java",
    ///     vec!["-jar".to_string(), "/opt/videoprocessor.jar".to_string()],
    ///     Arc::new(SystemTimeProvider),
    /// );
    /// ```
    pub fn new(
        program: impl Into<String>,
        prefix_args: Vec<String>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            program: program.into(),
            prefix_args,
            timeout: None,
            time_provider,
        }
    }

    /// Kill workers that run longer than `limit`
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Create the job directory and open the worker log
    async fn prepare(&self, invocation: &WorkerInvocation) -> Result<(Stdio, Stdio), LaunchError> {
        for dir in [invocation.output_path.parent(), invocation.log_path.parent()]
            .into_iter()
            .flatten()
        {
            fs::create_dir_all(dir).await.map_err(|e| {
                LaunchError::IoError(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }

        let log = fs::File::create(&invocation.log_path)
            .await
            .map_err(|e| {
                LaunchError::IoError(format!(
                    "Failed to create {}: {}",
                    invocation.log_path.display(),
                    e
                ))
            })?
            .into_std()
            .await;
        let log_err = log
            .try_clone()
            .map_err(|e| LaunchError::IoError(e.to_string()))?;

        Ok((Stdio::from(log), Stdio::from(log_err)))
    }

    /// Spawn child process without waiting for it
    fn spawn(
        &self,
        invocation: &WorkerInvocation,
        stdout: Stdio,
        stderr: Stdio,
    ) -> Result<Child, LaunchError> {
        Command::new(&self.program)
            .args(&self.prefix_args)
            .args(invocation.positional_args())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| LaunchError::SpawnFailed(format!("{}: {}", self.program, e)))
    }
}

/// Wait for the child, enforcing the optional timeout
async fn monitor(mut child: Child, limit: Option<Duration>) -> WorkerExit {
    let waited = match limit {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(waited) => waited,
            Err(_) => {
                terminate(&mut child).await;
                return WorkerExit::TimedOut {
                    after_ms: limit.as_millis() as u64,
                };
            }
        },
        None => child.wait().await,
    };

    match waited {
        Ok(status) => WorkerExit::Exited(exit_code(status)),
        Err(e) => WorkerExit::Lost(e.to_string()),
    }
}

/// Exit code, with signal deaths reported as 128 + signal (shell convention)
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use nix::sys::signal::Signal;
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            let name = Signal::try_from(signal)
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|_| signal.to_string());
            warn!(signal = %name, "Worker terminated by signal");
            return 128 + signal;
        }
    }

    -1
}

/// Kill a timed-out worker: SIGTERM first, then SIGKILL if needed
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            info!(pid = %pid, "Sending SIGTERM to timed-out worker");
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                warn!(pid = %pid, error = %e, "SIGTERM failed");
            } else if timeout(GRACEFUL_SHUTDOWN_TIMEOUT, child.wait()).await.is_ok() {
                info!(pid = %pid, "Worker exited gracefully after SIGTERM");
                return;
            }
            warn!(pid = %pid, "Worker did not exit after SIGTERM, sending SIGKILL");
        }
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill worker");
    }
}

#[async_trait]
impl WorkerLauncher for ProcessWorkerLauncher {
    async fn launch(
        &self,
        invocation: WorkerInvocation,
    ) -> Result<WorkerCompletion, LaunchError> {
        let (stdout, stderr) = self.prepare(&invocation).await?;
        let child = self.spawn(&invocation, stdout, stderr)?;

        info!(
            job_id = %invocation.job_id,
            pid = ?child.id(),
            program = %self.program,
            input = %invocation.input_path.display(),
            output = %invocation.output_path.display(),
            timeout_ms = ?self.timeout.map(|t| t.as_millis()),
            "Worker started"
        );

        let (tx, completion) = WorkerCompletion::channel();
        let limit = self.timeout;
        let time_provider = Arc::clone(&self.time_provider);
        let job_id = invocation.job_id;
        let start_time = time_provider.now_millis();

        tokio::spawn(async move {
            let exit = monitor(child, limit).await;
            let duration_ms = time_provider.now_millis() - start_time;

            if exit.is_success() {
                info!(job_id = %job_id, duration_ms = %duration_ms, "Worker exited");
            } else {
                warn!(
                    job_id = %job_id,
                    duration_ms = %duration_ms,
                    exit = ?exit,
                    "Worker failed"
                );
            }

            if tx.send(exit).is_err() {
                warn!(job_id = %job_id, "Nobody is waiting for worker exit");
            }
        });

        Ok(completion)
    }
}
