//! Recovery after the store answers 404 for the file we want.
//!
//! A fresh index snapshot decides what the 404 means. Bounds are compared on
//! sequence numbers only:
//!
//! - below the oldest listed file: it rolled off retention, jump to the oldest
//! - above the newest listed file: not generated yet, back off; after too many
//!   consecutive misses assume drift and jump to the oldest
//! - inside the bounds and listed: record it as the cursor and keep retrying
//!   it, since the listing says it exists
//!
//! Resync only moves the cursor. Index content is never decrypted.

use crate::outcome::RetryState;
use crate::{EngineError, EngineResult, FileOutcome, SyncEngine};
use sync_cursor_store::FileId;
use tracing::{info, warn};

impl SyncEngine {
    /// Returns `Some(Resynced)` when the cursor was moved, `None` when the
    /// caller should keep retrying `id`.
    pub(crate) async fn resync(
        &mut self,
        id: &FileId,
        retry: &mut RetryState,
    ) -> EngineResult<Option<FileOutcome>> {
        let snapshot = match self.index.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_fatal() => return Err(EngineError::Fatal(e)),
            Err(e) => {
                warn!(file = %id, error = %e, "Resync index fetch failed");
                return Ok(None);
            }
        };
        let (Some(&oldest), Some(&newest)) = (snapshot.oldest(), snapshot.newest()) else {
            return Ok(None);
        };
        info!(file = %id, oldest = %oldest, newest = %newest, "Resyncing against index");

        if id.sequence < oldest.sequence {
            info!(file = %id, cursor = %oldest, "File rolled off retention, jumping to oldest");
            self.force_cursor(&oldest)?;
            return Ok(Some(FileOutcome::Resynced));
        }

        if id.sequence > newest.sequence {
            retry.misses += 1;
            if retry.misses > self.timing.max_consecutive_misses {
                warn!(
                    file = %id,
                    misses = retry.misses,
                    cursor = %oldest,
                    "Too many 404s past the newest file, restarting from oldest"
                );
                retry.misses = 0;
                self.force_cursor(&oldest)?;
                return Ok(Some(FileOutcome::Resynced));
            }

            info!(
                file = %id,
                misses = retry.misses,
                backoff_secs = self.timing.miss_backoff.as_secs(),
                "File not generated yet"
            );
            self.pause(self.timing.miss_backoff).await;
            return Ok(None);
        }

        if snapshot.contains(id) {
            warn!(file = %id, "File is listed but missing, retrying it");
            self.commit(id)?;
        }

        Ok(None)
    }
}
