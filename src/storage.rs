//! JSON file storage for submissions and activities.
//!
//! Files are always replaced atomically: the new content is written to a
//! temporary file next to the target and renamed over it, so a reader sees
//! either the previous file or the complete new one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StorageError;

fn io_error(path: &Path, source: io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `value` as indented UTF-8 JSON, replacing `path` atomically.
///
/// Missing parent directories are created. Non-ASCII text is written as-is,
/// not escaped.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    bytes.push(b'\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| io_error(&dir, e))?;
    tmp.write_all(&bytes).map_err(|e| io_error(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| io_error(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote JSON file");
    Ok(())
}

/// Read a JSON document.
///
/// # Errors
///
/// [`StorageError::InputNotFound`] when the file does not exist, so callers
/// can report a missing upstream step rather than a generic I/O failure.
pub fn read_json(path: &Path) -> Result<Value, StorageError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StorageError::InputNotFound(path.to_path_buf()),
        _ => io_error(path, e),
    })?;

    serde_json::from_str(&text).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}
