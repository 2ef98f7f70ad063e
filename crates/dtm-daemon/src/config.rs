// config.rs — Daemon configuration.
//
// DaemonConfig determines where governance state lives: the token tree,
// the backup directory, and the manifest registry. `for_project()` gives
// the standard layout under a project root:
//
//   <root>/tokens/              tiered token files
//   <root>/.dtm/backups/        snapshots + index.json
//   <root>/.dtm/manifest.json   workspace registry
//   <root>/.dtm/daemon.toml     optional overrides
//
// Every field in daemon.toml is optional. Relative paths in it resolve
// against the project root.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory under the project root holding daemon state.
pub const STATE_DIR: &str = ".dtm";
/// Config file name inside the state directory.
pub const CONFIG_FILE: &str = "daemon.toml";

pub const DEFAULT_BIND: &str = "127.0.0.1:4310";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const MAX_HISTORY_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid bind address '{value}': {source}")]
    Bind {
        value: String,
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Root directory of the project.
    pub project_root: PathBuf,

    /// Root of the tiered token tree.
    pub tokens_dir: PathBuf,

    /// Snapshot files and the backup index.
    pub backup_dir: PathBuf,

    /// The workspace registry document.
    pub manifest_path: PathBuf,

    pub bind: SocketAddr,

    /// Glob patterns (over tier paths) whose files are guarded.
    pub protected: Vec<String>,

    pub history_default_limit: usize,
    pub history_max_limit: usize,

    /// Answer cross-origin requests (for browser-based editors on another port).
    pub allow_cors: bool,
}

/// The on-disk shape of `daemon.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    tokens_dir: Option<PathBuf>,
    backup_dir: Option<PathBuf>,
    manifest_path: Option<PathBuf>,
    bind: Option<String>,
    protected: Option<Vec<String>>,
    history_default_limit: Option<usize>,
    history_max_limit: Option<usize>,
    allow_cors: Option<bool>,
}

impl DaemonConfig {
    /// Create a config with the standard `.dtm/` layout for a project.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let state_dir = root.join(STATE_DIR);
        Self {
            tokens_dir: root.join("tokens"),
            backup_dir: state_dir.join("backups"),
            manifest_path: state_dir.join("manifest.json"),
            bind: SocketAddr::from(([127, 0, 0, 1], 4310)),
            protected: vec!["global/**".to_string()],
            history_default_limit: DEFAULT_HISTORY_LIMIT,
            history_max_limit: MAX_HISTORY_LIMIT,
            allow_cors: false,
            project_root: root,
        }
    }

    /// Defaults for `project_root`, overlaid with a config file.
    ///
    /// With `explicit = None`, `<root>/.dtm/daemon.toml` is used if present.
    /// An explicit path must exist.
    pub fn load(
        project_root: impl AsRef<Path>,
        explicit: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::for_project(project_root);

        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                path.to_path_buf()
            }
            None => {
                let default = config.project_root.join(STATE_DIR).join(CONFIG_FILE);
                if !default.is_file() {
                    return Ok(config);
                }
                default
            }
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.apply(file)?;

        tracing::debug!(path = %path.display(), "loaded daemon config");
        Ok(config)
    }

    fn apply(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        let root = self.project_root.clone();
        let under_root = |p: PathBuf| if p.is_absolute() { p } else { root.join(p) };

        if let Some(dir) = file.tokens_dir {
            self.tokens_dir = under_root(dir);
        }
        if let Some(dir) = file.backup_dir {
            self.backup_dir = under_root(dir);
        }
        if let Some(path) = file.manifest_path {
            self.manifest_path = under_root(path);
        }
        if let Some(bind) = file.bind {
            self.set_bind(&bind)?;
        }
        if let Some(protected) = file.protected {
            self.protected = protected;
        }
        if let Some(limit) = file.history_default_limit {
            self.history_default_limit = limit;
        }
        if let Some(limit) = file.history_max_limit {
            self.history_max_limit = limit;
        }
        if let Some(allow) = file.allow_cors {
            self.allow_cors = allow;
        }
        Ok(())
    }

    /// Override the listen address (e.g. from `--bind`).
    pub fn set_bind(&mut self, value: &str) -> Result<(), ConfigError> {
        self.bind = value.parse().map_err(|source| ConfigError::Bind {
            value: value.to_string(),
            source,
        })?;
        Ok(())
    }
}
