//! Bootstrap index listing.
//!
//! The listing is newline-delimited `<digits>_<digits>.log` entries, each
//! terminated by `\n`. Anything else anywhere in the content rejects the
//! whole listing.

use crate::{LogSource, RemoteError, RemoteResult};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use sync_cursor_store::FileId;
use tracing::debug;

const LISTING_PATTERN: &str = r"\A([0-9]+_[0-9]+\.log\n)+\z";

fn listing_regex() -> RemoteResult<&'static Regex> {
    static LISTING: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    LISTING
        .get_or_init(|| Regex::new(LISTING_PATTERN))
        .as_ref()
        .map_err(|e| RemoteError::Validation(format!("listing pattern: {e}")))
}

/// Whether the whole listing is made of well-formed entries.
pub fn is_valid_listing(content: &str) -> bool {
    listing_regex()
        .map(|regex| regex.is_match(content))
        .unwrap_or(false)
}

/// File ids listed by the remote store at fetch time, in listed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSnapshot {
    entries: Vec<FileId>,
}

impl IndexSnapshot {
    /// Validate and parse a raw listing.
    pub fn parse(content: &str) -> RemoteResult<Self> {
        if content.is_empty() {
            return Err(RemoteError::Empty(crate::INDEX_FILE_NAME.to_string()));
        }
        if !listing_regex()?.is_match(content) {
            return Err(RemoteError::Validation(
                "listing contains a malformed entry".to_string(),
            ));
        }

        let entries = content
            .lines()
            .map(|line| {
                FileId::parse(line).map_err(|e| RemoteError::Validation(e.to_string()))
            })
            .collect::<RemoteResult<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FileId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First listed entry.
    pub fn oldest(&self) -> Option<&FileId> {
        self.entries.first()
    }

    /// Last listed entry.
    pub fn newest(&self) -> Option<&FileId> {
        self.entries.last()
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.entries.contains(id)
    }
}

/// Fetches and validates the bootstrap listing.
#[derive(Clone)]
pub struct IndexService {
    source: Arc<dyn LogSource>,
}

impl IndexService {
    pub fn new(source: Arc<dyn LogSource>) -> Self {
        Self { source }
    }

    /// Fetch a fresh snapshot.
    ///
    /// Fails with [`RemoteError::Empty`] for an empty listing and
    /// [`RemoteError::Validation`] for a malformed one.
    pub async fn fetch(&self) -> RemoteResult<IndexSnapshot> {
        let content = self.source.fetch_index().await?;
        let snapshot = IndexSnapshot::parse(&content)?;
        debug!(
            entries = snapshot.len(),
            oldest = ?snapshot.oldest().map(|id| id.to_string()),
            newest = ?snapshot.newest().map(|id| id.to_string()),
            "Fetched index"
        );
        Ok(snapshot)
    }

    /// Whether a single name is a well-formed log file name.
    pub fn is_valid_name(name: &str) -> bool {
        FileId::is_valid_name(name)
    }
}
