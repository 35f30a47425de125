// Domain Layer - Pure business logic and entities

pub mod error;
pub mod job;

// Re-exports
pub use error::DomainError;
pub use job::{JobId, JobParams, JobRecord, JobStatus, RESULT_FILE_NAME, WORKER_LOG_FILE_NAME};
