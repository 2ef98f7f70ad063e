// error.rs — Error types for the guard and restore engine.

use thiserror::Error;

use crate::policy::DenyCode;

/// Errors that can occur while guarding or restoring token files.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The policy refused the mutation. Nothing was written.
    #[error("{reason}")]
    Denied { code: DenyCode, reason: String },

    /// A protected-path pattern could not be parsed as a glob.
    #[error("invalid protected path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// No backup exists with the given id.
    #[error("backup not found: {id}")]
    BackupNotFound { id: String },

    /// No backup exists for the requested target.
    #[error("no backups found for {}", .target.as_deref().unwrap_or("the protected tier"))]
    NoBackupFor { target: Option<String> },

    /// Reading, editing, or writing the token file failed.
    #[error(transparent)]
    Token(#[from] dtm_tokens::TokenError),

    /// Recording or reading a backup failed.
    #[error(transparent)]
    Backup(#[from] dtm_backup::BackupError),

    /// A per-path lock was poisoned by a panicking writer.
    #[error("lock poisoned for {path}")]
    LockPoisoned { path: String },
}
