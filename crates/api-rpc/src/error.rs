//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use centroid_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const STORE_ERROR: i32 = 5001;
    pub const SYSTEM_ERROR: i32 = 5002;
    pub const LAUNCH_ERROR: i32 = 5003;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    match err {
        AppError::Validation(msg) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, msg, None::<()>)
        }
        AppError::NotFound(msg) => ErrorObjectOwned::owned(code::NOT_FOUND, msg, None::<()>),
        AppError::Store(msg) => ErrorObjectOwned::owned(code::STORE_ERROR, msg, None::<()>),
        AppError::Launch(e) => ErrorObjectOwned::owned(
            code::LAUNCH_ERROR,
            format!("Error starting job: {}", e),
            None::<()>,
        ),
        AppError::Domain(e) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, e.to_string(), None::<()>)
        }
        AppError::Io(e) => ErrorObjectOwned::owned(code::SYSTEM_ERROR, e.to_string(), None::<()>),
        AppError::Serialization(e) => {
            ErrorObjectOwned::owned(code::STORE_ERROR, e.to_string(), None::<()>)
        }
        AppError::Internal(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use centroid_core::port::LaunchError;

    #[test]
    fn test_client_errors_use_4xxx_codes() {
        let err = to_rpc_error(AppError::Validation("Missing targetColor".to_string()));
        assert_eq!(err.code(), code::VALIDATION_ERROR);
        assert_eq!(err.message(), "Missing targetColor");

        let err = to_rpc_error(AppError::NotFound("Job x not found".to_string()));
        assert_eq!(err.code(), code::NOT_FOUND);
    }

    #[test]
    fn test_launch_error_is_descriptive() {
        let err = to_rpc_error(AppError::Launch(LaunchError::SpawnFailed(
            "java: No such file or directory".to_string(),
        )));
        assert_eq!(err.code(), code::LAUNCH_ERROR);
        assert!(err.message().contains("No such file"));
    }
}
