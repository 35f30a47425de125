// Centroid Infrastructure - Filesystem Adapters
// Implements: JobRecordStore (single JSON document), VideoCatalog

mod job_store;
mod video_catalog;

pub use job_store::{JsonFileJobStore, JOBS_FILE_NAME};
pub use video_catalog::DirectoryVideoCatalog;
