//! Error types for runtime bootstrap operations

use thiserror::Error;

/// Errors raised by the individual bootstrap steps
///
/// These never cross the [`Bootstrapper`](crate::Bootstrapper) boundary; the
/// orchestration collapses them into a [`BootstrapFailure`] reason code.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Child process could not be spawned
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Child process exited unsuccessfully
    #[error("'{command}' exited with {status}")]
    CommandFailed { command: String, status: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Reason code for a failed bootstrap
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapFailure {
    /// Server binary missing and the install script did not provide it
    #[error("runtime binary could not be installed")]
    Install,

    /// Health endpoint never answered 200 within the attempt budget
    #[error("runtime server did not become reachable")]
    ServerUnreachable,

    /// Model list could not be queried or parsed
    #[error("model list query failed")]
    ModelQuery,

    /// Model run command could not be started
    #[error("model could not be started")]
    ModelStart,

    /// Warm-up inference never answered 200 within the wait budget
    #[error("model did not answer a warm-up request in time")]
    ModelWarmupTimeout,
}

impl From<url::ParseError> for BootstrapError {
    fn from(err: url::ParseError) -> Self {
        BootstrapError::Config(format!("invalid URL: {err}"))
    }
}

impl From<research_utils::EnvError> for BootstrapError {
    fn from(err: research_utils::EnvError) -> Self {
        BootstrapError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BootstrapError::UnexpectedStatus {
            url: "http://localhost:11434/api/tags".to_string(),
            status: 500,
        };
        assert_eq!(
            err.to_string(),
            "Unexpected status 500 from http://localhost:11434/api/tags"
        );

        let err = BootstrapError::CommandFailed {
            command: "sh -c install".to_string(),
            status: "exit status: 1".to_string(),
        };
        assert!(err.to_string().contains("exited with exit status: 1"));
    }

    #[test]
    fn test_url_error_conversion() {
        let err: BootstrapError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, BootstrapError::Config(msg) if msg.contains("invalid URL")));
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(
            BootstrapFailure::ModelWarmupTimeout.to_string(),
            "model did not answer a warm-up request in time"
        );
        assert_eq!(
            BootstrapFailure::ServerUnreachable.to_string(),
            "runtime server did not become reachable"
        );
    }
}
