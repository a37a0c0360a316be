//! Client error handling
//!
//! Request failures use the shared [`RequestError`] taxonomy; this module
//! adds the client-only errors and the mapping from transport failures.

use thiserror::Error;
use workout_music_shared::RequestError;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<ConfigError> for RequestError {
    fn from(err: ConfigError) -> Self {
        RequestError::Config(err.to_string())
    }
}

/// Errors from interacting with a running session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session has ended")]
    Ended,
}

/// Classify a reqwest failure
///
/// Timeouts and connection problems are retryable transport errors; a
/// request that could not even be built points at bad configuration.
pub fn classify_reqwest_error(err: reqwest::Error) -> RequestError {
    if err.is_builder() {
        return RequestError::Config(err.to_string());
    }
    RequestError::Transport {
        timed_out: err.is_timeout(),
        message: err.to_string(),
    }
}

/// Result type alias for scoring-service calls
pub type RequestResult<T> = Result<T, RequestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_maps_to_fatal_request_error() {
        let err: RequestError = ConfigError::InvalidUrl {
            url: "not a url".to_string(),
            reason: "relative URL without a base".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "config");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_session_error_message() {
        assert_eq!(SessionError::Ended.to_string(), "Session has ended");
    }
}
