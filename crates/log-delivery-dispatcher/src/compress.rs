//! Local persistence and compression of delivered files.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append `content` to `path`, creating the file and its directory if needed.
pub fn append_local(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content)?;
    file.flush()
}

/// Gzip `path` into `<path>.gz` and remove the original.
///
/// The original is only removed once the compressed copy is complete.
pub fn gzip_file(path: &Path) -> io::Result<PathBuf> {
    let mut gz_name = path.as_os_str().to_os_string();
    gz_name.push(".gz");
    let gz_path = PathBuf::from(gz_name);

    let mut input = File::open(path)?;
    let mut encoder = GzEncoder::new(File::create(&gz_path)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()?;

    fs::remove_file(path)?;
    Ok(gz_path)
}
