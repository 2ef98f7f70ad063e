// provisioner.rs — WorkspaceProvisioner: create client/project scaffolds.
//
// create_project() holds the registry lock for the whole operation:
//
//   validate ids → lock → key already registered? → any template file
//   already on disk? → write template files → insert into registry
//   (persisted) → unlock
//
// Unregistered token files already sitting in the project directory are
// never overwritten; the call fails with FileExists instead.
//
// The registry is written last. If that write fails, the files this call
// created are removed again (best effort) and the call fails, so a
// successful return always means "files exist and the registry says so".

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use dtm_tokens::{io, TierPath};

use crate::error::WorkspaceError;
use crate::manifest::{ManifestProject, ManifestRegistry, ProjectMetadata};
use crate::template::Template;

const MAX_ID_LEN: usize = 64;

/// Parameters for a new workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub client_id: String,
    pub brand_id: String,
    pub project_id: String,
    pub template: String,
}

/// A successfully provisioned workspace.
#[derive(Debug, Clone)]
pub struct CreatedProject {
    pub project_key: String,
    pub files: Vec<TierPath>,
}

pub struct WorkspaceProvisioner {
    tokens_root: PathBuf,
    registry: Mutex<ManifestRegistry>,
}

impl WorkspaceProvisioner {
    /// Open the provisioner over `tokens_root`, loading the manifest at
    /// `manifest_path` (created on first insert).
    pub fn open(
        tokens_root: impl AsRef<Path>,
        manifest_path: impl AsRef<Path>,
    ) -> Result<Self, WorkspaceError> {
        Ok(Self {
            tokens_root: tokens_root.as_ref().to_path_buf(),
            registry: Mutex::new(ManifestRegistry::load(manifest_path)?),
        })
    }

    /// Provision a new workspace.
    pub fn create_project(
        &self,
        request: &CreateProjectRequest,
    ) -> Result<CreatedProject, WorkspaceError> {
        validate_slug("clientId", &request.client_id)?;
        validate_slug("brandId", &request.brand_id)?;
        validate_slug("projectId", &request.project_id)?;
        let template: Template = request.template.parse()?;

        let key = project_key(&request.client_id, &request.project_id);
        let mut registry = self.lock()?;
        if registry.contains(&key) {
            tracing::warn!(project_key = %key, "project already exists");
            return Err(WorkspaceError::ProjectExists { key });
        }

        let files = template.files();
        let mut targets: Vec<TierPath> = Vec::with_capacity(files.len());
        for (file_name, _) in &files {
            let path = TierPath::project(&request.client_id, &request.project_id, file_name)?;
            if path.resolve(&self.tokens_root).exists() {
                tracing::warn!(project_key = %key, file = %path, "unregistered token file in the way");
                return Err(WorkspaceError::FileExists { path });
            }
            targets.push(path);
        }

        let mut written: Vec<TierPath> = Vec::new();
        let mut created: Vec<PathBuf> = Vec::new();
        let result = (|| -> Result<(), WorkspaceError> {
            for (path, (_, doc)) in targets.iter().zip(&files) {
                let file = path.resolve(&self.tokens_root);
                io::write_document(&file, doc)?;
                created.push(file);
                written.push(path.clone());
            }

            registry.insert(ManifestProject {
                key: key.clone(),
                metadata: ProjectMetadata {
                    brand: request.brand_id.clone(),
                    template: template.as_str().to_string(),
                    created_at: Utc::now(),
                },
                generated_files: written.iter().map(|p| p.to_string()).collect::<BTreeSet<_>>(),
            })
        })();

        if let Err(e) = result {
            for file in &created {
                if let Err(cleanup) = io::remove_file_if_exists(file) {
                    tracing::warn!(
                        file = %file.display(),
                        error = %cleanup,
                        "failed to remove file after aborted provisioning"
                    );
                }
            }
            return Err(e);
        }

        tracing::info!(
            project_key = %key,
            brand = %request.brand_id,
            template = template.as_str(),
            files = written.len(),
            "project created"
        );

        Ok(CreatedProject {
            project_key: key,
            files: written,
        })
    }

    /// All registered projects, ordered by key.
    pub fn list_projects(&self) -> Result<Vec<ManifestProject>, WorkspaceError> {
        Ok(self.lock()?.projects().cloned().collect())
    }

    pub fn get_project(&self, key: &str) -> Result<Option<ManifestProject>, WorkspaceError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ManifestRegistry>, WorkspaceError> {
        self.registry
            .lock()
            .map_err(|_| WorkspaceError::LockPoisoned)
    }
}

/// `<clientId>/<projectId>`
pub fn project_key(client_id: &str, project_id: &str) -> String {
    format!("{}/{}", client_id, project_id)
}

/// Ids become directory names: 1–64 chars of `[a-z0-9_-]`, starting with a
/// letter or digit.
pub fn validate_slug(field: &'static str, value: &str) -> Result<(), WorkspaceError> {
    let invalid = |reason: &str| WorkspaceError::InvalidId {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() || value.len() > MAX_ID_LEN {
        return Err(invalid("must be 1-64 characters"));
    }
    if !value.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(invalid("must start with a lowercase letter or digit"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(invalid("may only contain a-z, 0-9, '-' and '_'"));
    }
    Ok(())
}
