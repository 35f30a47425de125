// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod identity;
pub mod ledger;
pub mod orchestrator;
pub mod status;

// Re-exports
pub use identity::{JobIdentity, JobLayout, JobPaths};
pub use ledger::JobLedger;
pub use orchestrator::{JobOrchestrator, SubmitRequest};
pub use status::{JobSummary, StatusQueryService, StatusView};
