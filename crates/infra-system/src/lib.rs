// Centroid Infrastructure - System Adapters
// Implements: WorkerLauncher

pub mod process_launcher;

pub use process_launcher::ProcessWorkerLauncher;
