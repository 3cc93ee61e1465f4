//! Application error types with rich context

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Simulator Tooling Errors
    // ─────────────────────────────────────────────────────────────
    #[error("xcrun not found. Install Xcode and its command line tools.")]
    XcrunNotFound,

    #[error("Developer tools cannot simulate push notifications: {message}")]
    Capability { message: String },

    #[error("simctl error: {message}")]
    Simctl { message: String },

    #[error("simctl output could not be parsed: {message}")]
    Protocol { message: String },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    // ─────────────────────────────────────────────────────────────
    // Payload / Selection Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid push payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("No device selected")]
    NoDeviceSelected,

    #[error("No application available to receive the push")]
    NoApplication,

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability {
            message: message.into(),
        }
    }

    pub fn simctl(message: impl Into<String>) -> Self {
        Self::Simctl {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn timeout(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }

    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::XcrunNotFound | Error::Capability { .. })
    }
}

/// Failure of an external tool call, carried through the event stream.
///
/// Unlike [`Error`], this is `Clone + PartialEq` so it can live inside state
/// and event values. Each variant wraps the collaborator's error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("capability check failed: {0}")]
    Capability(String),

    #[error("device list fetch failed: {0}")]
    ListFetch(String),

    #[error("application list fetch failed: {0}")]
    AppListFetch(String),

    #[error("push dispatch failed: {0}")]
    PushDispatch(String),

    #[error("device operation failed: {0}")]
    DeviceOperation(String),
}

impl ToolError {
    /// The wrapped collaborator message
    pub fn message(&self) -> &str {
        match self {
            ToolError::Capability(m)
            | ToolError::ListFetch(m)
            | ToolError::AppListFetch(m)
            | ToolError::PushDispatch(m)
            | ToolError::DeviceOperation(m) => m,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::simctl("Unable to boot device");
        assert_eq!(err.to_string(), "simctl error: Unable to boot device");

        let err = Error::XcrunNotFound;
        assert!(err.to_string().contains("xcrun not found"));
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::timeout("simctl list devices", Duration::from_secs(30));
        assert_eq!(err.to_string(), "simctl list devices timed out after 30s");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::XcrunNotFound.is_fatal());
        assert!(Error::capability("Xcode 10.0").is_fatal());
        assert!(!Error::simctl("test").is_fatal());
    }

    #[test]
    fn test_tool_error_message() {
        let err = ToolError::AppListFetch("device not booted".to_string());
        assert_eq!(err.message(), "device not booted");
        assert_eq!(
            err.to_string(),
            "application list fetch failed: device not booted"
        );
    }

    #[test]
    fn test_result_ext_preserves_error() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "boom",
        ));
        let err = res.context("reading payload").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
