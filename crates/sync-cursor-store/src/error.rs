//! Cursor store errors.

use logsync_config_and_utils::FailureKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CursorError {
    /// A name that is not `<digits>_<digits>.log`.
    #[error("Invalid log file name: {0:?}")]
    InvalidName(String),

    /// The sequence number cannot be incremented any further.
    #[error("Sequence overflow after {0}")]
    SequenceOverflow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CursorError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CursorError::InvalidName(_) | CursorError::SequenceOverflow(_) => FailureKind::Format,
            CursorError::Io(_) => FailureKind::Transport,
        }
    }
}

pub type CursorResult<T> = Result<T, CursorError>;
