//! Engine errors. Everything that reaches the caller of
//! [`SyncEngine::run`](crate::SyncEngine::run) stops the agent.

use logsync_config_and_utils::FailureKind;
use remote_log_store::RemoteError;
use sync_cursor_store::CursorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The remote store refused service (401 or 429).
    #[error("Fatal remote error: {0}")]
    Fatal(RemoteError),

    /// The cursor could not be read or persisted.
    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),
}

impl EngineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            EngineError::Fatal(e) => e.kind(),
            EngineError::Cursor(e) => e.kind(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
