// path.rs — Boundary file paths for the tiered token tree.
//
// Every path that crosses the request boundary (the file being saved, the
// `sourcePath` of a backup, a history filter) is a TierPath: a relative,
// forward-slash path under the tokens root. Keeping paths in this one
// normalized form means a history filter and a backup entry compare equal
// exactly when they name the same file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Directory holding the global tier, relative to the tokens root.
pub const GLOBAL_DIR: &str = "global";
/// Directory holding one subdirectory per client.
pub const CLIENTS_DIR: &str = "clients";
/// Directory inside a client holding one subdirectory per project.
pub const PROJECTS_DIR: &str = "projects";

/// Which tier a token file belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tier {
    /// `global/...` — the base set every client and project inherits.
    Global,
    /// `clients/<client>/<file>.json`
    Client { client_id: String },
    /// `clients/<client>/projects/<project>/<file>.json`
    Project {
        client_id: String,
        project_id: String,
    },
    /// Anything else under the tokens root.
    Other,
}

/// A validated, normalized path to a token file relative to the tokens root.
///
/// Serializes as a plain string (e.g. `"global/color.json"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TierPath(String);

impl TierPath {
    /// Parse and validate a boundary path.
    ///
    /// Rejects empty and absolute paths, backslashes, drive prefixes, empty
    /// segments, `.`/`..` segments, and anything not ending in `.json`.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let invalid = |reason: &str| TokenError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("path is empty"));
        }
        if raw.starts_with('/') {
            return Err(invalid("path must be relative to the tokens root"));
        }
        if raw.contains('\\') || raw.contains(':') {
            return Err(invalid("path must use forward slashes and no drive prefix"));
        }
        for segment in raw.split('/') {
            match segment {
                "" => return Err(invalid("path contains an empty segment")),
                "." | ".." => return Err(invalid("path traversal is not allowed")),
                _ => {}
            }
        }
        if !raw.ends_with(".json") || raw.ends_with("/.json") || raw == ".json" {
            return Err(invalid("token files must be named <name>.json"));
        }

        Ok(Self(raw.to_string()))
    }

    /// Build the path of a file inside a project tier.
    pub fn project(client_id: &str, project_id: &str, file_name: &str) -> Result<Self, TokenError> {
        Self::parse(&format!(
            "{}/{}/{}/{}/{}",
            CLIENTS_DIR, client_id, PROJECTS_DIR, project_id, file_name
        ))
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve to an absolute filesystem path under `tokens_root`.
    pub fn resolve(&self, tokens_root: &Path) -> PathBuf {
        let mut full = tokens_root.to_path_buf();
        for segment in self.0.split('/') {
            full.push(segment);
        }
        full
    }

    /// Classify the path into its tier.
    pub fn tier(&self) -> Tier {
        let segments: Vec<&str> = self.0.split('/').collect();
        match segments.as_slice() {
            [GLOBAL_DIR, ..] => Tier::Global,
            [CLIENTS_DIR, client, _file] => Tier::Client {
                client_id: (*client).to_string(),
            },
            [CLIENTS_DIR, client, PROJECTS_DIR, project, _file] => Tier::Project {
                client_id: (*client).to_string(),
                project_id: (*project).to_string(),
            },
            _ => Tier::Other,
        }
    }
}

impl fmt::Display for TierPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TierPath {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TierPath> for String {
    fn from(path: TierPath) -> Self {
        path.0
    }
}

/// True if `segment` is safe to use as a single directory name
/// (client or project id) under the tokens root.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', ':'])
}
