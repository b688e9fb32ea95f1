use crate::DeliveryResult;
use std::path::{Path, PathBuf};
use sync_cursor_store::FileId;
use tracing::error;

/// Keeps raw bytes of files that could not be processed, as
/// `<dir>/<file name>`.
#[derive(Debug, Clone)]
pub struct Quarantine {
    dir: PathBuf,
}

impl Quarantine {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &FileId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    /// Write `raw` unmodified, replacing any earlier copy.
    pub fn store(&self, id: &FileId, raw: &[u8]) -> DeliveryResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(id);
        std::fs::write(&path, raw)?;
        error!(file = %id, path = %path.display(), bytes = raw.len(), "File quarantined");
        Ok(path)
    }
}
