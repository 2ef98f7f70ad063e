// error.rs — Error types for the daemon and the HTTP boundary.
//
// ApiError is the only error the request handlers return. Library errors
// convert into it with a fixed status/code table:
//
//   INVALID_REQUEST          400   malformed body/query, bad paths or ids
//   UNKNOWN_TEMPLATE         400
//   GLOBAL_DELETE_PROTECTED  403   guard denial, nothing written
//   BACKUP_NOT_FOUND         404
//   TOKEN_NOT_FOUND          404
//   NOT_FOUND                404   unknown route
//   PROJECT_EXISTS           409
//   INTEGRITY                500   snapshot/index/manifest damaged
//   INTERNAL                 500   I/O and everything else

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use dtm_backup::BackupError;
use dtm_guard::GuardError;
use dtm_tokens::TokenError;
use dtm_workspace::WorkspaceError;

use crate::config::ConfigError;

/// Errors that can occur while starting the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("backup store error: {0}")]
    Backup(#[from] BackupError),

    #[error("guard error: {0}")]
    Guard(#[from] GuardError),

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    UnknownTemplate(String),

    /// A guard denial; `code` is the guard's stable deny code.
    #[error("{message}")]
    Forbidden { code: &'static str, message: String },

    #[error("{0}")]
    BackupNotFound(String),

    #[error("{0}")]
    TokenNotFound(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ProjectExists(String),

    #[error("{0}")]
    Integrity(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::UnknownTemplate(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::BackupNotFound(_) | Self::TokenNotFound(_) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::ProjectExists(_) => StatusCode::CONFLICT,
            Self::Integrity(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::UnknownTemplate(_) => "UNKNOWN_TEMPLATE",
            Self::Forbidden { code, .. } => *code,
            Self::BackupNotFound(_) => "BACKUP_NOT_FOUND",
            Self::TokenNotFound(_) => "TOKEN_NOT_FOUND",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ProjectExists(_) => "PROJECT_EXISTS",
            Self::Integrity(_) => "INTEGRITY",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            code: self.code(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidPath { .. }
            | TokenError::InvalidTokenPath { .. }
            | TokenError::NotAGroup { .. }
            | TokenError::NotAToken { .. } => Self::InvalidRequest(e.to_string()),
            TokenError::TokenNotFound { .. } => Self::TokenNotFound(e.to_string()),
            TokenError::InvalidJson { .. }
            | TokenError::IoError { .. }
            | TokenError::SerializationError(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<BackupError> for ApiError {
    fn from(e: BackupError) -> Self {
        match e {
            BackupError::Token(inner) => inner.into(),
            BackupError::CorruptIndex { .. }
            | BackupError::SnapshotMissing { .. }
            | BackupError::IntegrityViolation { .. } => Self::Integrity(e.to_string()),
            _ => Self::Internal(e.to_string()),
        }
    }
}

impl From<GuardError> for ApiError {
    fn from(e: GuardError) -> Self {
        match e {
            GuardError::Denied { code, reason } => Self::Forbidden {
                code: code.as_str(),
                message: reason,
            },
            GuardError::BackupNotFound { .. } | GuardError::NoBackupFor { .. } => {
                Self::BackupNotFound(e.to_string())
            }
            GuardError::Token(inner) => inner.into(),
            GuardError::Backup(inner) => inner.into(),
            GuardError::InvalidPattern { .. } | GuardError::LockPoisoned { .. } => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<WorkspaceError> for ApiError {
    fn from(e: WorkspaceError) -> Self {
        match e {
            WorkspaceError::ProjectExists { .. } | WorkspaceError::FileExists { .. } => {
                Self::ProjectExists(e.to_string())
            }
            WorkspaceError::InvalidId { .. } => Self::InvalidRequest(e.to_string()),
            WorkspaceError::UnknownTemplate { .. } => Self::UnknownTemplate(e.to_string()),
            WorkspaceError::CorruptManifest { .. } => Self::Integrity(e.to_string()),
            WorkspaceError::Token(inner) => inner.into(),
            WorkspaceError::SerializationError(_) | WorkspaceError::LockPoisoned => {
                Self::Internal(e.to_string())
            }
        }
    }
}
