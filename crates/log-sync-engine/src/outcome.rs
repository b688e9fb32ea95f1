/// How one `handle_file` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Downloaded, decrypted and delivered.
    Delivered,
    /// Not delivered: attempts exhausted, quarantined, or stopped.
    Failed,
    /// The 404 resync moved the cursor; the caller must re-read it.
    Resynced,
}

/// Per-file retry counters. Never persisted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryState {
    pub attempts: u32,
    /// Consecutive 404s for a file beyond the newest listed one.
    pub misses: u32,
}

/// Running totals since the engine started.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub delivered: u64,
    pub failed: u64,
    pub quarantined: u64,
    pub resyncs: u64,
}
