// api.rs — Typed requests, responses, and synchronous handlers.
//
// Each handle_* function is the whole behaviour of one endpoint over an
// explicit GovernanceStore. Nothing here knows about axum; routes.rs adapts
// these to HTTP.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dtm_backup::BackupEntry;
use dtm_guard::{MutationRequest, TokenMutation};
use dtm_tokens::{TierPath, ValidationReport, ValidationScope};
use dtm_workspace::{CreateProjectRequest, ManifestProject};

use crate::error::ApiError;
use crate::state::GovernanceStore;

// ── save-token ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveAction {
    Create,
    Update,
    Delete,
}

impl SaveAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTokenRequest {
    pub target_path: TierPath,
    pub token_path: String,
    pub action: SaveAction,
    /// Required for create/update. An object replaces the token node; any
    /// other value becomes its `$value`.
    #[serde(default)]
    pub value_obj: Option<Value>,
    /// Acknowledges a delete from a protected file.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTokenResponse {
    pub success: bool,
    /// Null when the target is not protected.
    pub backup_id: Option<String>,
    pub target_path: TierPath,
    pub token_path: String,
}

pub fn handle_save_token(
    store: &GovernanceStore,
    request: SaveTokenRequest,
) -> Result<SaveTokenResponse, ApiError> {
    let mutation = match (request.action, request.value_obj) {
        (SaveAction::Delete, _) => TokenMutation::Delete,
        (SaveAction::Create, Some(value)) => TokenMutation::Create { value },
        (SaveAction::Update, Some(value)) => TokenMutation::Update { value },
        (action, None) => {
            return Err(ApiError::InvalidRequest(format!(
                "valueObj is required for action '{}'",
                action.as_str()
            )))
        }
    };

    let outcome = store.guard.apply(&MutationRequest {
        target: request.target_path,
        token_path: request.token_path,
        mutation,
        confirm: request.confirm,
    })?;

    Ok(SaveTokenResponse {
        success: true,
        backup_id: outcome.backup_id().map(str::to_string),
        target_path: outcome.target,
        token_path: outcome.token_path,
    })
}

// ── history ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub target_path: Option<TierPath>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    /// Newest first.
    pub history: Vec<BackupEntry>,
}

pub fn handle_history(
    store: &GovernanceStore,
    query: HistoryQuery,
) -> Result<HistoryResponse, ApiError> {
    let limit = match query.limit {
        None => store.config.history_default_limit,
        Some(0) => {
            return Err(ApiError::InvalidRequest(
                "limit must be a positive integer".to_string(),
            ))
        }
        Some(n) => n.min(store.config.history_max_limit),
    };
    let history = store.backups.list(limit, query.target_path.as_ref())?;
    Ok(HistoryResponse {
        success: true,
        history,
    })
}

// ── restore ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub backup_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreLatestRequest {
    #[serde(default)]
    pub target_path: Option<TierPath>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub success: bool,
    pub restored_path: TierPath,
    pub backup_id: String,
}

pub fn handle_restore(
    store: &GovernanceStore,
    request: RestoreRequest,
) -> Result<RestoreResponse, ApiError> {
    if request.backup_id.trim().is_empty() {
        return Err(ApiError::InvalidRequest("backupId is required".to_string()));
    }
    let outcome = store.restore.restore_by_id(&request.backup_id)?;
    Ok(RestoreResponse {
        success: true,
        restored_path: outcome.restored_path,
        backup_id: outcome.backup_id,
    })
}

pub fn handle_restore_latest(
    store: &GovernanceStore,
    request: RestoreLatestRequest,
) -> Result<RestoreResponse, ApiError> {
    let outcome = store.restore.restore_latest(request.target_path.as_ref())?;
    Ok(RestoreResponse {
        success: true,
        restored_path: outcome.restored_path,
        backup_id: outcome.backup_id,
    })
}

// ── validate ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateQuery {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ValidateQuery {
    pub fn scope(self) -> Result<ValidationScope, ApiError> {
        match (self.client_id, self.project_id) {
            (None, None) => Ok(ValidationScope::Global),
            (Some(client_id), None) => Ok(ValidationScope::Client { client_id }),
            (Some(client_id), Some(project_id)) => Ok(ValidationScope::Project {
                client_id,
                project_id,
            }),
            (None, Some(_)) => Err(ApiError::InvalidRequest(
                "projectId requires clientId".to_string(),
            )),
        }
    }
}

/// Integrity findings are part of a successful response; only failures to
/// read the tree are errors.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ValidationReport,
}

pub fn handle_validate(
    store: &GovernanceStore,
    query: ValidateQuery,
) -> Result<ValidateResponse, ApiError> {
    let scope = query.scope()?;
    let report = store.validator.validate_scope(&scope)?;
    Ok(ValidateResponse {
        success: true,
        report,
    })
}

// ── workspace ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponse {
    pub success: bool,
    pub project_key: String,
    pub files: Vec<TierPath>,
}

pub fn handle_create_project(
    store: &GovernanceStore,
    request: CreateProjectRequest,
) -> Result<CreateProjectResponse, ApiError> {
    let created = store.provisioner.create_project(&request)?;
    Ok(CreateProjectResponse {
        success: true,
        project_key: created.project_key,
        files: created.files,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectsResponse {
    pub success: bool,
    pub projects: Vec<ManifestProject>,
}

pub fn handle_list_projects(store: &GovernanceStore) -> Result<ProjectsResponse, ApiError> {
    Ok(ProjectsResponse {
        success: true,
        projects: store.provisioner.list_projects()?,
    })
}
