//! Failure taxonomy shared by every component.

use std::fmt;

/// Classification of a failure, used by the fetch loop to pick a policy
/// without inspecting error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network or connection failure, or an unexpected HTTP status.
    Transport,
    /// Empty or ambiguous response.
    NotFoundTransient,
    /// Explicit HTTP 404.
    NotFound404,
    /// HTTP 401.
    Auth,
    /// HTTP 429.
    RateLimit,
    /// Malformed envelope, header, file name or cursor.
    Format,
    /// No private key for the envelope's key id.
    KeyNotFound,
    /// Checksum mismatch after decryption.
    Integrity,
    /// Index listing rejected.
    Validation,
}

impl FailureKind {
    /// Whether this failure must stop the agent.
    pub fn is_fatal(self) -> bool {
        matches!(self, FailureKind::Auth | FailureKind::RateLimit)
    }

    /// Whether another attempt at the same file may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureKind::Transport | FailureKind::NotFoundTransient | FailureKind::NotFound404
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::NotFoundTransient => "not_found_transient",
            FailureKind::NotFound404 => "not_found_404",
            FailureKind::Auth => "auth",
            FailureKind::RateLimit => "rate_limit",
            FailureKind::Format => "format",
            FailureKind::KeyNotFound => "key_not_found",
            FailureKind::Integrity => "integrity",
            FailureKind::Validation => "validation",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
