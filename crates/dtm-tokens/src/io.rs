// io.rs — Reading and atomically writing token files.
//
// Every persisted document in the governance core (token files, the backup
// index, the manifest registry) goes through `atomic_write`: the bytes are
// written to a temporary file in the destination directory, flushed, and
// then renamed over the destination. A crash mid-write leaves either the old
// file or the new one, never a half-written file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::TokenError;

/// Write `data` to `path` via write-to-temporary-then-rename.
///
/// Creates missing parent directories.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), TokenError> {
    let dir = path.parent().ok_or_else(|| TokenError::IoError {
        path: path.to_path_buf(),
        source: std::io::Error::new(ErrorKind::InvalidInput, "path has no parent directory"),
    })?;
    fs::create_dir_all(dir).map_err(|source| TokenError::IoError {
        path: dir.to_path_buf(),
        source,
    })?;

    let io_err = |source: std::io::Error| TokenError::IoError {
        path: path.to_path_buf(),
        source,
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
    temp.write_all(data).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Read a file's bytes, or `None` if it does not exist.
pub fn read_bytes_if_exists(path: &Path) -> Result<Option<Vec<u8>>, TokenError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(TokenError::IoError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Remove a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool, TokenError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(TokenError::IoError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parse a token document from raw bytes.
pub fn parse_document(path: &Path, bytes: &[u8]) -> Result<Value, TokenError> {
    serde_json::from_slice(bytes).map_err(|source| TokenError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a token document, or `None` if the file does not exist.
pub fn read_document(path: &Path) -> Result<Option<Value>, TokenError> {
    read_bytes_if_exists(path)?
        .map(|bytes| parse_document(path, &bytes))
        .transpose()
}

/// Render a token document the way it is stored on disk:
/// pretty-printed JSON with a trailing newline.
pub fn render_document(doc: &Value) -> Result<Vec<u8>, TokenError> {
    let mut bytes = serde_json::to_vec_pretty(doc)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Render and atomically write a token document.
pub fn write_document(path: &Path, doc: &Value) -> Result<(), TokenError> {
    atomic_write(path, &render_document(doc)?)
}

/// List the `*.json` files directly inside a tier directory, sorted by name.
///
/// A missing directory yields an empty list. Subdirectories are not entered:
/// a client directory's `projects/` belongs to the project tier.
pub fn list_tier_files(dir: &Path) -> Result<Vec<PathBuf>, TokenError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(TokenError::IoError {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| TokenError::IoError {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
