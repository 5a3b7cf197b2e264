//! Filesystem utilities.
//!
//! Helper functions for file operations.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Result, SmithError};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Write a file, creating parent directories as needed.
pub fn write_file(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    std::fs::write(path, contents)
        .map_err(|err| SmithError::Config(format!("write {}: {err}", path.display())))
}

/// Recursively copy a directory tree. Returns the number of files copied.
pub fn copy_dir_all(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<usize> {
    let from = from.as_ref();
    let to = to.as_ref();
    if !from.is_dir() {
        return Err(SmithError::NotFound(format!(
            "directory {}",
            from.display()
        )));
    }

    ensure_dir(to)?;
    let mut copied = 0usize;
    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry.map_err(|err| {
            SmithError::Config(format!("walk {}: {err}", from.display()))
        })?;
        let rel = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Convert a relative path into a `/`-separated string.
#[must_use]
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
