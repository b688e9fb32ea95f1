//! Durable cursor persistence.
//!
//! The cursor file holds the literal name of the last fully processed log
//! file. It is replaced as a whole through a temp file and a rename, so a
//! crash leaves either the old or the new cursor on disk.

use crate::{CursorResult, FileId};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and overwrites the persisted cursor.
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last committed cursor, or `None` before the first file completes.
    ///
    /// An empty file counts as no cursor. Content that is not a valid file
    /// name is an error.
    pub fn get(&self) -> CursorResult<Option<FileId>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let name = content.trim();
        if name.is_empty() {
            return Ok(None);
        }
        FileId::parse(name).map(Some)
    }

    /// Overwrite the cursor with `id`.
    pub fn advance(&self, id: &FileId) -> CursorResult<()> {
        atomic_write(&self.path, id.file_name().as_bytes())?;
        debug!(file = %id, path = %self.path.display(), "Cursor advanced");
        Ok(())
    }
}

fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "cursor path has no file name"))?;
    let tmp_path = dir.join(format!(".{file_name}.tmp.{}", std::process::id()));

    let write_result = (|| -> io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        if let Ok(parent_dir) = fs::File::open(dir) {
            let _ = parent_dir.sync_all();
        }
        Ok(())
    })();

    if write_result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    write_result
}
