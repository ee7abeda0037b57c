//! Chat Request Errors
//!
//! The three ways a round trip can fail are kept apart so the surface can
//! decide how to present them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by a chat backend
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    /// The request never produced a response (connect, DNS, timeout, reset)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status
    #[error("Backend returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The response body was not a `{"response": string}` object
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// The request was cancelled before it completed
    #[error("Request cancelled")]
    Cancelled,
}

impl ChatError {
    /// Classify the error for presentation
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::Cancelled => FailureKind::Transport,
            Self::Status { .. } => FailureKind::Status,
            Self::Decode(_) => FailureKind::Decode,
        }
    }
}

/// Failure classification carried into the transcript and reply outcomes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Network or transport failure
    Transport,
    /// Non-success response status
    Status,
    /// Malformed or undecodable response body
    Decode,
}

impl FailureKind {
    /// Short label for status lines
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transport => "network error",
            Self::Status => "server error",
            Self::Decode => "bad response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ChatError::Transport("refused".into()).kind(),
            FailureKind::Transport
        );
        assert_eq!(
            ChatError::Status {
                status: 500,
                body: String::new()
            }
            .kind(),
            FailureKind::Status
        );
        assert_eq!(ChatError::Decode("eof".into()).kind(), FailureKind::Decode);
        assert_eq!(ChatError::Cancelled.kind(), FailureKind::Transport);
    }

    #[test]
    fn test_error_display() {
        let err = ChatError::Status {
            status: 503,
            body: "overloaded".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("overloaded"));
    }

    #[test]
    fn test_failure_kind_label() {
        assert_eq!(FailureKind::Status.label(), "server error");
        assert_eq!(FailureKind::Decode.label(), "bad response");
    }
}
