// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod job_store;
pub mod time_provider;
pub mod video_catalog;
pub mod worker_launcher;

// Re-exports
pub use id_provider::IdProvider;
pub use job_store::{JobMap, JobRecordStore};
pub use time_provider::TimeProvider;
pub use video_catalog::VideoCatalog;
pub use worker_launcher::{
    LaunchError, WorkerCompletion, WorkerExit, WorkerInvocation, WorkerLauncher,
};
