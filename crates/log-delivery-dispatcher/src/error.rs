//! Delivery errors.

use logsync_config_and_utils::FailureKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syslog error: {0}")]
    Syslog(String),

    #[error("SFTP error: {0}")]
    Sftp(String),

    /// SFTP is configured but this build has no SFTP support.
    #[error("SFTP support is not compiled in (enable the `sftp` feature)")]
    SftpUnsupported,

    /// One or more mandatory steps failed; each entry is `step: reason`.
    #[error("Delivery failed: {}", .0.join("; "))]
    Failed(Vec<String>),
}

impl DeliveryError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::Transport
    }
}

pub type DeliveryResult<T> = Result<T, DeliveryError>;
