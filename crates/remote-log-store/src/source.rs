use crate::RemoteResult;
use async_trait::async_trait;
use sync_cursor_store::FileId;

/// Where log files and the bootstrap index come from.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Download one log file.
    ///
    /// A 404 is [`RemoteError::NotFound`](crate::RemoteError::NotFound) and an
    /// empty body is [`RemoteError::Empty`](crate::RemoteError::Empty).
    async fn fetch_file(&self, id: &FileId) -> RemoteResult<Vec<u8>>;

    /// Download the raw index listing.
    async fn fetch_index(&self) -> RemoteResult<String>;
}
