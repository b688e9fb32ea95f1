//! Remote store errors.

use logsync_config_and_utils::FailureKind;
use thiserror::Error;

/// Errors from the remote log store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network or transport-level failure (connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered 404 for this file.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store answered 200 with an empty body.
    #[error("Empty response for {0}")]
    Empty(String),

    /// HTTP 401.
    #[error("Authentication rejected by remote store")]
    Unauthorized,

    /// HTTP 429.
    #[error("Rate limited by remote store")]
    RateLimited,

    /// Any other non-success status.
    #[error("Unexpected status {status} for {name}")]
    Status { status: u16, name: String },

    /// The index listing does not match the expected format.
    #[error("Invalid index: {0}")]
    Validation(String),

    /// Client construction failed (bad proxy, unreadable CA bundle, bad URL).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RemoteError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RemoteError::Http(_) | RemoteError::Status { .. } | RemoteError::Config(_) => {
                FailureKind::Transport
            }
            RemoteError::NotFound(_) => FailureKind::NotFound404,
            RemoteError::Empty(_) => FailureKind::NotFoundTransient,
            RemoteError::Unauthorized => FailureKind::Auth,
            RemoteError::RateLimited => FailureKind::RateLimit,
            RemoteError::Validation(_) => FailureKind::Validation,
        }
    }

    /// True for failures that must terminate the agent.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auth_and_rate_limit_are_fatal() {
        assert!(RemoteError::Unauthorized.is_fatal());
        assert!(RemoteError::RateLimited.is_fatal());
        assert!(!RemoteError::NotFound("1_1.log".into()).is_fatal());
        assert!(!RemoteError::Status {
            status: 503,
            name: "1_1.log".into()
        }
        .is_fatal());
    }

    #[test]
    fn kinds_follow_status_mapping() {
        assert_eq!(
            RemoteError::NotFound("1_1.log".into()).kind(),
            FailureKind::NotFound404
        );
        assert_eq!(
            RemoteError::Empty("1_1.log".into()).kind(),
            FailureKind::NotFoundTransient
        );
        assert_eq!(
            RemoteError::Status {
                status: 500,
                name: "logs.index".into()
            }
            .kind(),
            FailureKind::Transport
        );
    }

    #[test]
    fn status_error_display() {
        let err = RemoteError::Status {
            status: 502,
            name: "20230101_5.log".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status 502 for 20230101_5.log");
    }
}
