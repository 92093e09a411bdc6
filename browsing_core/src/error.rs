// Typed errors with thiserror. Surface meaningful messages to JS.

use thiserror::Error;

/// Errors raised by the page-side tracker and its host bindings.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Host access failed for {property}: {message}")]
    HostAccess { property: String, message: String },

    #[error("Tracker already started")]
    AlreadyStarted,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}

/// Errors raised by storage and browser-API collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TrackerError::InvalidConfig("missing field".to_string());
        assert!(err.to_string().contains("missing field"));

        let err = TrackerError::HostAccess {
            property: "location.href".to_string(),
            message: "undefined".to_string(),
        };
        assert_eq!(err.to_string(), "Host access failed for location.href: undefined");
    }

    #[test]
    fn backend_error_is_bare_message() {
        let err = StoreError::Backend("Database error".to_string());
        assert_eq!(err.to_string(), "Database error");
    }
}
