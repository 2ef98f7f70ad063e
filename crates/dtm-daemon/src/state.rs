// state.rs — GovernanceStore: the explicit owner of all governance state.
//
// One instance per daemon, shared by request handlers through an Arc. The
// guard and the restore engine share the backup store and the per-path lock
// table, so a restore and a save of the same file never interleave.

use std::sync::Arc;

use dtm_backup::BackupStore;
use dtm_guard::{GlobalGuard, GuardPolicy, PathLocks, RestoreEngine};
use dtm_tokens::ReferenceValidator;
use dtm_workspace::WorkspaceProvisioner;

use crate::config::DaemonConfig;
use crate::error::DaemonError;

/// Router state.
pub type AppState = Arc<GovernanceStore>;

pub struct GovernanceStore {
    pub config: DaemonConfig,
    pub backups: Arc<BackupStore>,
    pub guard: GlobalGuard,
    pub restore: RestoreEngine,
    pub validator: ReferenceValidator,
    pub provisioner: WorkspaceProvisioner,
}

impl GovernanceStore {
    /// Open every store named by `config`, creating directories as needed.
    pub fn open(config: DaemonConfig) -> Result<Self, DaemonError> {
        let policy = GuardPolicy::new(&config.protected)?;
        let backups = Arc::new(BackupStore::open(&config.backup_dir, &config.tokens_dir)?);
        let locks = Arc::new(PathLocks::new());

        let guard = GlobalGuard::new(policy.clone(), Arc::clone(&backups), Arc::clone(&locks));
        let restore = RestoreEngine::new(Arc::clone(&backups), locks, policy);
        let validator = ReferenceValidator::new(&config.tokens_dir);
        let provisioner = WorkspaceProvisioner::open(&config.tokens_dir, &config.manifest_path)?;

        tracing::info!(
            tokens = %config.tokens_dir.display(),
            backups = %config.backup_dir.display(),
            protected = ?config.protected,
            "governance store ready"
        );

        Ok(Self {
            config,
            backups,
            guard,
            restore,
            validator,
            provisioner,
        })
    }

    pub fn into_state(self) -> AppState {
        Arc::new(self)
    }
}
