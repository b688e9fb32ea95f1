//! Main fetch loop orchestration.

use crate::outcome::RetryState;
use crate::{EngineError, EngineResult, FileOutcome, SyncStats};
use log_delivery_dispatcher::{Dispatcher, Quarantine};
use log_envelope_crypto::DecryptPipeline;
use logsync_config_and_utils::SyncTiming;
use remote_log_store::{IndexService, LogSource, RemoteError};
use std::sync::Arc;
use std::time::Duration;
use sync_cursor_store::{CursorStore, FileId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Which macro-state the next iteration runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// No cursor yet: walk the whole remote index.
    Bootstrap,
    /// Fetch the file after the cursor.
    Steady(FileId),
}

/// The sync engine.
///
/// Strictly sequential: at most one file is downloaded, decrypted or
/// delivered at any time, and the engine is the only writer of the cursor.
pub struct SyncEngine {
    source: Arc<dyn LogSource>,
    pub(crate) index: IndexService,
    cursor_store: CursorStore,
    pub(crate) cursor: Option<FileId>,
    pipeline: DecryptPipeline,
    dispatcher: Dispatcher,
    quarantine: Quarantine,
    pub(crate) timing: SyncTiming,
    cancel: CancellationToken,
    pub(crate) stats: SyncStats,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn LogSource>,
        cursor_store: CursorStore,
        pipeline: DecryptPipeline,
        dispatcher: Dispatcher,
        quarantine: Quarantine,
        timing: SyncTiming,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            index: IndexService::new(source.clone()),
            source,
            cursor_store,
            cursor: None,
            pipeline,
            dispatcher,
            quarantine,
            timing,
            cancel,
            stats: SyncStats::default(),
        }
    }

    /// Last committed cursor as seen by the engine.
    pub fn cursor(&self) -> Option<FileId> {
        self.cursor
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn mode(&self) -> SyncMode {
        match self.cursor {
            Some(cursor) => SyncMode::Steady(cursor),
            None => SyncMode::Bootstrap,
        }
    }

    /// Load the persisted cursor. An unreadable cursor is fatal.
    pub fn load_cursor(&mut self) -> EngineResult<Option<FileId>> {
        self.cursor = self.cursor_store.get()?;
        Ok(self.cursor)
    }

    /// Run until cancelled or until a fatal error.
    ///
    /// This loop:
    /// 1. Loads the cursor once
    /// 2. Bootstraps from the index while there is no cursor
    /// 3. Otherwise fetches the file after the cursor
    /// 4. Sleeps `loop_interval` and repeats
    #[instrument(name = "sync_loop", skip_all)]
    pub async fn run(&mut self) -> EngineResult<()> {
        let cursor = self.load_cursor()?;
        info!(
            cursor = ?cursor.map(|id| id.to_string()),
            "Starting sync engine"
        );

        while !self.cancel.is_cancelled() {
            if let Err(e) = self.run_once().await {
                error!(error = %e, kind = %e.kind(), "Sync engine stopping on fatal error");
                return Err(e);
            }
            if !self.pause(self.timing.loop_interval).await {
                break;
            }
        }

        info!(
            delivered = self.stats.delivered,
            failed = self.stats.failed,
            quarantined = self.stats.quarantined,
            resyncs = self.stats.resyncs,
            "Sync engine stopped"
        );
        Ok(())
    }

    /// One full iteration in the current mode.
    pub async fn run_once(&mut self) -> EngineResult<()> {
        match self.mode() {
            SyncMode::Bootstrap => self.bootstrap().await,
            SyncMode::Steady(cursor) => self.steady(cursor).await,
        }
    }

    async fn bootstrap(&mut self) -> EngineResult<()> {
        let snapshot = match self.index.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_fatal() => return Err(EngineError::Fatal(e)),
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "Bootstrap index fetch failed, will retry");
                return Ok(());
            }
        };
        info!(entries = snapshot.len(), "Bootstrapping from index");

        for id in snapshot.entries() {
            if self.cancel.is_cancelled() {
                break;
            }
            if !IndexService::is_valid_name(&id.file_name()) {
                warn!(file = %id, "Skipping invalid index entry");
                continue;
            }

            match self.handle_file(id).await? {
                FileOutcome::Delivered => self.commit(id)?,
                FileOutcome::Failed => {
                    warn!(file = %id, "Bootstrap entry failed, skipping");
                }
                FileOutcome::Resynced => {
                    info!(file = %id, cursor = ?self.cursor.map(|c| c.to_string()), "Cursor resynced during bootstrap");
                }
            }
        }
        Ok(())
    }

    async fn steady(&mut self, cursor: FileId) -> EngineResult<()> {
        let next = cursor.next()?;

        match self.handle_file(&next).await? {
            FileOutcome::Delivered => self.commit(&next)?,
            FileOutcome::Failed => {
                debug!(file = %next, "File not ready, will retry on next iteration");
            }
            FileOutcome::Resynced => {
                info!(file = %next, cursor = ?self.cursor.map(|c| c.to_string()), "Cursor resynced");
            }
        }
        Ok(())
    }

    /// Download and process one file, with up to `max_attempts` downloads.
    #[instrument(name = "handle_file", skip_all, fields(file = %id))]
    pub async fn handle_file(&mut self, id: &FileId) -> EngineResult<FileOutcome> {
        let mut retry = RetryState::default();

        while retry.attempts < self.timing.max_attempts {
            if self.cancel.is_cancelled() {
                return Ok(FileOutcome::Failed);
            }

            match self.source.fetch_file(id).await {
                Ok(raw) => return Ok(self.process(id, &raw).await),
                Err(e) if e.is_fatal() => return Err(EngineError::Fatal(e)),
                Err(RemoteError::NotFound(_)) => {
                    retry.attempts += 1;
                    info!(file = %id, attempt = retry.attempts, "Got 404");
                    if let Some(outcome) = self.resync(id, &mut retry).await? {
                        return Ok(outcome);
                    }
                }
                Err(e) => {
                    retry.attempts += 1;
                    warn!(
                        file = %id,
                        attempt = retry.attempts,
                        kind = %e.kind(),
                        error = %e,
                        "Download failed"
                    );
                }
            }

            // No wait before the final attempt.
            if retry.attempts + 1 < self.timing.max_attempts {
                debug!(
                    file = %id,
                    attempt = retry.attempts,
                    wait_ms = self.timing.retry_wait.as_millis() as u64,
                    "Waiting before next attempt"
                );
                if !self.pause(self.timing.retry_wait).await {
                    return Ok(FileOutcome::Failed);
                }
            }
        }

        self.stats.failed += 1;
        debug!(file = %id, attempts = retry.attempts, "Attempts exhausted");
        Ok(FileOutcome::Failed)
    }

    /// Decrypt and deliver a downloaded file; quarantine it on any failure.
    async fn process(&mut self, id: &FileId, raw: &[u8]) -> FileOutcome {
        let failure = match self.pipeline.decrypt(id, raw) {
            Ok(content) => match self.dispatcher.dispatch(id, &content).await {
                Ok(report) => {
                    info!(
                        file = %id,
                        bytes = content.len(),
                        encrypted = content.was_encrypted(),
                        syslog = ?report.syslog,
                        local = ?report.local,
                        sftp = ?report.sftp,
                        "File download and processing completed"
                    );
                    self.stats.delivered += 1;
                    return FileOutcome::Delivered;
                }
                Err(e) => (e.kind(), e.to_string()),
            },
            Err(e) => (e.kind(), e.to_string()),
        };

        let (kind, reason) = failure;
        error!(file = %id, kind = %kind, error = %reason, "Processing failed, quarantining");
        self.stats.failed += 1;
        match self.quarantine.store(id, raw) {
            Ok(_) => self.stats.quarantined += 1,
            Err(e) => error!(file = %id, error = %e, "Could not quarantine file"),
        }
        FileOutcome::Failed
    }

    /// Persist `id` as the last processed file.
    pub(crate) fn commit(&mut self, id: &FileId) -> EngineResult<()> {
        self.cursor_store.advance(id)?;
        self.cursor = Some(*id);
        Ok(())
    }

    /// Move the cursor outside the normal success path.
    pub(crate) fn force_cursor(&mut self, id: &FileId) -> EngineResult<()> {
        self.commit(id)?;
        self.stats.resyncs += 1;
        Ok(())
    }

    /// Sleep unless cancelled first. Returns false when cancelled.
    pub(crate) async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
