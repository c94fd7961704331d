//! File-system helpers for generated output.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Write `contents` to `path` through a temp file in the same directory and
/// an atomic rename, creating parent directories as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// How [`write_if_changed`] treated a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// File did not exist
    Created,
    /// Contents differed and were replaced
    Updated,
    /// Contents were identical, file untouched
    Unchanged,
}

/// Atomically write `contents` unless the file already holds exactly them.
pub fn write_if_changed(path: &Path, contents: &str) -> std::io::Result<WriteOutcome> {
    let outcome = match fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => return Ok(WriteOutcome::Unchanged),
        Ok(_) => WriteOutcome::Updated,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => WriteOutcome::Created,
        Err(e) => return Err(e),
    };
    write_atomic(path, contents.as_bytes())?;
    Ok(outcome)
}

/// Remove a file, treating an already-missing file as success.
/// Returns whether a file was removed.
pub fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
