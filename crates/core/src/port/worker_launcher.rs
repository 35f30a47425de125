// Worker Launcher Port
// Abstraction for starting the external processing program and observing its exit

use crate::domain::JobId;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::oneshot;

/// Everything needed to start one worker for one job
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerInvocation {
    pub job_id: JobId,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
    pub target_color: String,
    pub threshold: String,
}

impl WorkerInvocation {
    /// The four positional values of the worker contract:
    /// input path, output path, color, threshold
    pub fn positional_args(&self) -> Vec<OsString> {
        vec![
            self.input_path.clone().into_os_string(),
            self.output_path.clone().into_os_string(),
            OsString::from(&self.target_color),
            OsString::from(&self.threshold),
        ]
    }
}

/// How a worker ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Process exited (signals reported as 128 + signal number)
    Exited(i32),
    /// Process was killed after exceeding the configured timeout
    TimedOut { after_ms: u64 },
    /// Exit could not be observed
    Lost(String),
}

impl WorkerExit {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerExit::Exited(0))
    }

    /// Message recorded on the job when the worker did not succeed
    pub fn failure_message(&self) -> Option<String> {
        match self {
            WorkerExit::Exited(0) => None,
            WorkerExit::Exited(code) => Some(format!("process exited with code {}", code)),
            WorkerExit::TimedOut { after_ms } => {
                Some(format!("process timed out after {}ms", after_ms))
            }
            WorkerExit::Lost(reason) => Some(format!("process monitor failed: {}", reason)),
        }
    }
}

/// One-shot notification of a worker's exit
pub struct WorkerCompletion {
    rx: oneshot::Receiver<WorkerExit>,
}

impl WorkerCompletion {
    /// Create a completion and the sender that resolves it
    pub fn channel() -> (oneshot::Sender<WorkerExit>, WorkerCompletion) {
        let (tx, rx) = oneshot::channel();
        (tx, WorkerCompletion { rx })
    }

    /// Wait for the worker to end
    pub async fn wait(self) -> WorkerExit {
        self.rx
            .await
            .unwrap_or_else(|_| WorkerExit::Lost("monitor dropped before exit".to_string()))
    }
}

/// Launch errors (the worker never ran)
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Worker Launcher trait
///
/// Implementations:
/// - ProcessWorkerLauncher: spawns the external program as a child process
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    /// Start a worker and return without waiting for it
    ///
    /// # Errors
    /// - LaunchError::SpawnFailed if the process cannot be started
    /// - LaunchError::IoError if the job directory or log cannot be prepared
    async fn launch(&self, invocation: WorkerInvocation)
        -> Result<WorkerCompletion, LaunchError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Mock launcher behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Worker exits with this code right after launch
        ExitWith(i32),
        /// Worker cannot be started
        FailToStart(String),
        /// Worker runs until `finish` is called for its job
        Manual,
    }

    /// Scripted worker launcher
    pub struct MockWorkerLauncher {
        behavior: MockBehavior,
        invocations: Arc<Mutex<Vec<WorkerInvocation>>>,
        pending: Arc<Mutex<HashMap<JobId, oneshot::Sender<WorkerExit>>>>,
    }

    impl MockWorkerLauncher {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                invocations: Arc::new(Mutex::new(Vec::new())),
                pending: Arc::new(Mutex::new(HashMap::new())),
            }
        }
        pub fn new_success() -> Self {
            Self::new(MockBehavior::ExitWith(0))
        }
        pub fn new_exit(code: i32) -> Self {
            Self::new(MockBehavior::ExitWith(code))
        }
        pub fn new_manual() -> Self {
            Self::new(MockBehavior::Manual)
        }
        pub fn new_unlaunchable(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::FailToStart(message.into()))
        }
        pub fn invocations(&self) -> Vec<WorkerInvocation> {
            self.invocations.lock().unwrap().clone()
        }
        /// Resolve a manually controlled worker; false if none is pending
        pub fn finish(&self, job_id: &str, exit: WorkerExit) -> bool {
            match self.pending.lock().unwrap().remove(job_id) {
                Some(tx) => tx.send(exit).is_ok(),
                None => false,
            }
        }
    }

    #[async_trait]
    impl WorkerLauncher for MockWorkerLauncher {
        async fn launch(
            &self,
            invocation: WorkerInvocation,
        ) -> Result<WorkerCompletion, LaunchError> {
            let behavior = self.behavior.clone();
            let job_id = invocation.job_id.clone();

            let (tx, completion) = WorkerCompletion::channel();

            match behavior {
                MockBehavior::FailToStart(msg) => return Err(LaunchError::SpawnFailed(msg)),
                MockBehavior::ExitWith(code) => {
                    tokio::spawn(async move {
                        tokio::task::yield_now().await;
                        let _ = tx.send(WorkerExit::Exited(code));
                    });
                }
                MockBehavior::Manual => {
                    self.pending.lock().unwrap().insert(job_id, tx);
                }
            }

            self.invocations.lock().unwrap().push(invocation);
            Ok(completion)
        }
    }
}
