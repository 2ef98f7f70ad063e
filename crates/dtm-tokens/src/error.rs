// error.rs — Error types for token tree and token file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, editing, or writing token data.
#[derive(Debug, Error)]
pub enum TokenError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A token file on disk is not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize a token document.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A boundary file path was rejected (absolute, traversal, wrong extension...).
    #[error("invalid tier path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A dotted token path was rejected.
    #[error("invalid token path '{path}': {reason}")]
    InvalidTokenPath { path: String, reason: String },

    /// The dotted token path does not exist in the document.
    #[error("token not found: '{path}'")]
    TokenNotFound { path: String },

    /// A write needed to descend through something that is not a group.
    #[error("cannot write '{path}': '{blocked_by}' is not a token group")]
    NotAGroup { path: String, blocked_by: String },

    /// A scalar write targeted a group rather than a token.
    #[error("cannot set a value on '{path}': it is a token group")]
    NotAToken { path: String },
}
