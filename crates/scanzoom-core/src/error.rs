//! Error types for scan sessions.

use thiserror::Error;

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while running a scan session.
///
/// Nothing on the per-frame control path returns these to the caller;
/// frame-level faults degrade to "no command this frame". Only session
/// establishment and configuration problems surface as hard errors.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Failed to start camera session: {0}")]
    SessionStart(String),

    #[error("Failed to resume camera session: {0}")]
    SessionResume(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl ScanError {
    /// Create a recognition failure error.
    pub fn recognition_failed(message: impl Into<String>) -> Self {
        Self::RecognitionFailed(message.into())
    }

    /// Create a session start failure error.
    pub fn session_start(message: impl Into<String>) -> Self {
        Self::SessionStart(message.into())
    }

    /// Create a session resume failure error.
    pub fn session_resume(message: impl Into<String>) -> Self {
        Self::SessionResume(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Errors that belong to session establishment and are returned to the
    /// caller instead of being reported on the event stream.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            ScanError::SessionStart(_)
                | ScanError::InvalidConfig(_)
                | ScanError::ConfigParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::recognition_failed("blurred frame");
        assert_eq!(err.to_string(), "Recognition failed: blurred frame");

        let err = ScanError::session_start("camera busy");
        assert_eq!(err.to_string(), "Failed to start camera session: camera busy");
    }

    #[test]
    fn test_session_error_classification() {
        assert!(ScanError::session_start("x").is_session_error());
        assert!(ScanError::invalid_config("x").is_session_error());
        assert!(!ScanError::recognition_failed("x").is_session_error());
        assert!(!ScanError::session_resume("x").is_session_error());
    }
}
