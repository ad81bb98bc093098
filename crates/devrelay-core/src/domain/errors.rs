//! Domain error types
//!
//! Errors surfaced to the host application. The list is short: almost
//! everything inside the telemetry pipeline degrades silently instead of
//! failing, so only configuration and lifecycle misuse are reportable.

use thiserror::Error;

/// Errors returned from the public DevRelay surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The application identifier is missing or not a hyphenated UUID.
    #[error("Invalid application ID: {0}")]
    InvalidAppId(String),

    /// The backend base URL is empty.
    #[error("Backend URL cannot be empty")]
    EmptyBackendUrl,

    /// An operation requiring an active controller was called before
    /// initialization.
    #[error("DevRelay not initialized")]
    NotInitialized,

    /// `initialize` was called on an already-active controller.
    #[error("DevRelay already initialized")]
    AlreadyInitialized,

    /// The controller has been shut down; shutdown is terminal.
    #[error("DevRelay has been shut down")]
    ShutDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelayError::InvalidAppId("not-a-uuid".to_string());
        assert_eq!(err.to_string(), "Invalid application ID: not-a-uuid");

        assert_eq!(
            RelayError::NotInitialized.to_string(),
            "DevRelay not initialized"
        );
        assert_eq!(
            RelayError::ShutDown.to_string(),
            "DevRelay has been shut down"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(RelayError::EmptyBackendUrl, RelayError::EmptyBackendUrl);
        assert_ne!(
            RelayError::NotInitialized,
            RelayError::AlreadyInitialized
        );
    }
}
