//! Error types for the recommendation protocol

use crate::validation::ValidationError;
use thiserror::Error;

/// Errors surfaced by a scoring-service request
///
/// The variants form the retry taxonomy callers act on: configuration and
/// validation failures are fatal for the call, transport failures are
/// retryable, protocol failures are not.
#[derive(Error, Debug, Clone)]
pub enum RequestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        status: Option<u16>,
        /// Response body as received, kept for diagnostics
        raw_payload: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl RequestError {
    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RequestError::Transport { .. })
    }

    /// Short machine-readable kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::Config(_) => "config",
            RequestError::Transport { .. } => "transport",
            RequestError::Protocol { .. } => "protocol",
            RequestError::Validation(_) => "validation",
        }
    }

    /// Raw response payload for protocol errors
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            RequestError::Protocol { raw_payload, .. } => Some(raw_payload),
            _ => None,
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            RequestError::Transport { timed_out: true, .. } => {
                "The recommendation service took too long to respond. Try again shortly.".to_string()
            }
            RequestError::Transport { .. } => {
                "Could not reach the recommendation service. Check your connection.".to_string()
            }
            RequestError::Protocol { .. } => {
                "The recommendation service returned an unexpected response.".to_string()
            }
            RequestError::Config(_) => "The recommendation service is not configured correctly.".to_string(),
            RequestError::Validation(err) => err.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_retryable() {
        let transport = RequestError::Transport {
            message: "connection refused".to_string(),
            timed_out: false,
        };
        let protocol = RequestError::Protocol {
            message: "missing field".to_string(),
            status: Some(200),
            raw_payload: "{}".to_string(),
        };
        assert!(transport.is_retryable());
        assert!(!protocol.is_retryable());
        assert!(!RequestError::Config("bad url".to_string()).is_retryable());
        assert!(!RequestError::Validation(ValidationError::new("hrv", "must be finite")).is_retryable());
    }

    #[test]
    fn test_protocol_error_keeps_payload() {
        let err = RequestError::Protocol {
            message: "expected array".to_string(),
            status: Some(200),
            raw_payload: "{\"recommendations\": 3}".to_string(),
        };
        assert_eq!(err.raw_payload(), Some("{\"recommendations\": 3}"));
        assert_eq!(err.kind(), "protocol");
    }

    #[test]
    fn test_timeout_message_differs() {
        let timeout = RequestError::Transport {
            message: "deadline elapsed".to_string(),
            timed_out: true,
        };
        assert!(timeout.user_message().contains("too long"));
    }
}
