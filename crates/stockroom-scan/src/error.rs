//! # Scan Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scan Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Camera      │  │    Session      │  │     Catalog             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  CameraUnavail- │  │  AlreadyActive  │  │  Validation             │ │
//! │  │  able { reason }│  │  NotActive      │  │  LookupFailed           │ │
//! │  │                 │  │                 │  │  CreateFailed           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Nothing in the workflow retries on its own; every error goes back     │
//! │  to the operator.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockroom_core::ValidationError;
use thiserror::Error;

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Why a decoder engine could not give us the camera.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The operator (or the OS) refused camera access.
    #[error("permission denied")]
    PermissionDenied,

    /// No capture device is attached.
    #[error("no capture device found")]
    NoDevice,

    /// Another adapter holds the device.
    #[error("device is busy")]
    Busy,

    /// The device went away while a session was running.
    #[error("device disconnected")]
    Disconnected,

    /// The engine failed to initialize.
    #[error("initialization failed: {0}")]
    Init(String),
}

/// Scan workflow errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The decoder could not acquire the camera. The session stays `Idle`.
    #[error("Camera unavailable: {reason}")]
    CameraUnavailable {
        #[source]
        reason: CameraError,
    },

    /// `begin_session` while a session is already running.
    #[error("A scan session is already active")]
    AlreadyActive,

    /// The operation needs a running (or accepted) session.
    #[error("No scan session is active")]
    NotActive,

    /// A draft failed validation. Nothing was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The catalog could not be read.
    #[error("Product lookup failed: {0}")]
    LookupFailed(String),

    /// The catalog rejected or failed a create for a reason other than validation.
    #[error("Product creation failed: {0}")]
    CreateFailed(String),
}

impl From<CameraError> for ScanError {
    fn from(reason: CameraError) -> Self {
        ScanError::CameraUnavailable { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_error_message() {
        let err: ScanError = CameraError::PermissionDenied.into();
        assert_eq!(err.to_string(), "Camera unavailable: permission denied");
    }

    #[test]
    fn test_validation_error_wraps() {
        let err: ScanError = ValidationError::required("name").into();
        assert_eq!(err.to_string(), "Validation error: name is required");
    }
}
