// Application constants (no magic values)
use std::time::Duration;

/// Attempts for a single durable write before the mutation is reported failed
pub const STORE_WRITE_ATTEMPTS: u32 = 3;

/// Pause between durable write attempts (50ms)
pub const STORE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Public URL prefix under which job artifacts are served
pub const DEFAULT_RESULTS_URL_PREFIX: &str = "/results";

/// Message recorded when an errored job carries no cause
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error occurred";
