// error.rs — Error types for workspace provisioning.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// A project with this key is already registered.
    #[error("project already exists: {key}")]
    ProjectExists { key: String },

    /// A template file is already on disk for an unregistered project.
    #[error("token file already exists: {path}")]
    FileExists { path: dtm_tokens::TierPath },

    /// A client, brand, or project id is not a valid slug.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidId {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown template '{name}' (expected one of: {expected})")]
    UnknownTemplate { name: String, expected: String },

    /// The manifest document on disk could not be parsed.
    #[error("corrupt manifest at {path}: {source}")]
    CorruptManifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Token(#[from] dtm_tokens::TokenError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("manifest lock poisoned")]
    LockPoisoned,
}
