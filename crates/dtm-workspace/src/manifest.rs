// manifest.rs — ManifestRegistry: the record of provisioned workspaces.
//
// On disk:
//
//   {
//     "version": 1,
//     "projects": {
//       "acme/site": {
//         "key": "acme/site",
//         "metadata": { "brand": "acme", "template": "product-ui", "createdAt": "..." },
//         "generatedFiles": ["clients/acme/projects/site/color.json", ...]
//       }
//     }
//   }
//
// The registry is not synchronized on its own; the provisioner owns it
// behind a mutex.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dtm_tokens::io;

use crate::error::WorkspaceError;

/// Current manifest document version.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub brand: String,
    pub template: String,
    pub created_at: DateTime<Utc>,
}

/// One provisioned workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestProject {
    /// `<clientId>/<projectId>`, unique across the registry.
    pub key: String,
    pub metadata: ProjectMetadata,
    /// Tier paths of the token files written at provisioning time.
    #[serde(default)]
    pub generated_files: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestDocument {
    pub version: u32,
    #[serde(default)]
    pub projects: BTreeMap<String, ManifestProject>,
}

impl Default for ManifestDocument {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            projects: BTreeMap::new(),
        }
    }
}

pub struct ManifestRegistry {
    path: PathBuf,
    document: ManifestDocument,
}

impl ManifestRegistry {
    /// Load the registry at `path`, or start an empty one if the file does
    /// not exist yet. Nothing is written until the first insert.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let path = path.as_ref().to_path_buf();
        let document = match io::read_bytes_if_exists(&path)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                WorkspaceError::CorruptManifest {
                    path: path.clone(),
                    source,
                }
            })?,
            None => ManifestDocument::default(),
        };
        tracing::debug!(
            path = %path.display(),
            projects = document.projects.len(),
            "loaded manifest"
        );
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.document.projects.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ManifestProject> {
        self.document.projects.get(key)
    }

    /// All projects, ordered by key.
    pub fn projects(&self) -> impl Iterator<Item = &ManifestProject> {
        self.document.projects.values()
    }

    /// Add a project and persist the registry.
    ///
    /// If persisting fails the in-memory registry is left as it was.
    pub fn insert(&mut self, project: ManifestProject) -> Result<(), WorkspaceError> {
        if self.contains(&project.key) {
            return Err(WorkspaceError::ProjectExists { key: project.key });
        }
        let key = project.key.clone();
        self.document.projects.insert(key.clone(), project);
        if let Err(e) = self.persist() {
            self.document.projects.remove(&key);
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), WorkspaceError> {
        let mut json = serde_json::to_vec_pretty(&self.document)?;
        json.push(b'\n');
        io::atomic_write(&self.path, &json)?;
        Ok(())
    }
}
