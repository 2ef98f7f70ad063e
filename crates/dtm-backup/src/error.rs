// error.rs — Error types for the backup store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while recording or reading backups.
#[derive(Debug, Error)]
pub enum BackupError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading or atomically writing a file through the token I/O layer failed.
    #[error(transparent)]
    Token(#[from] dtm_tokens::TokenError),

    /// Failed to serialize the backup index.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The persisted index could not be parsed.
    #[error("backup index at {path} is corrupt: {source}")]
    CorruptIndex {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// An index entry points at a snapshot file that is gone.
    #[error("snapshot for backup {id} is missing at {path}")]
    SnapshotMissing { id: String, path: PathBuf },

    /// A snapshot's bytes no longer match the hash recorded at backup time.
    #[error("snapshot for backup {id} failed integrity check: expected {expected}, got {actual}")]
    IntegrityViolation {
        id: String,
        expected: String,
        actual: String,
    },

    /// The in-memory index lock was poisoned by a panicking writer.
    #[error("backup index lock poisoned")]
    LockPoisoned,
}
