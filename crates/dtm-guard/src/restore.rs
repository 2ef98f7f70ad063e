// restore.rs — RestoreEngine: put a token file back to a recorded state.
//
// A restore writes the snapshot bytes back over the source file atomically,
// or removes the source if the snapshot recorded that it did not exist.
// Restoring the same entry twice yields the same file both times. Restores
// take the same per-path lock as mutations and do not add history entries.

use std::path::PathBuf;
use std::sync::Arc;

use dtm_backup::{BackupEntry, BackupStore};
use dtm_tokens::{io, TierPath};

use crate::error::GuardError;
use crate::locks::PathLocks;
use crate::policy::GuardPolicy;

/// What a restore did.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub backup_id: String,
    pub restored_path: TierPath,
    /// True when the snapshot recorded "did not exist" and the file was
    /// removed rather than rewritten.
    pub removed: bool,
}

pub struct RestoreEngine {
    backups: Arc<BackupStore>,
    locks: Arc<PathLocks>,
    policy: GuardPolicy,
    tokens_root: PathBuf,
}

impl RestoreEngine {
    /// `policy` decides which paths an untargeted `restore_latest` considers.
    pub fn new(backups: Arc<BackupStore>, locks: Arc<PathLocks>, policy: GuardPolicy) -> Self {
        let tokens_root = backups.tokens_root().to_path_buf();
        Self {
            backups,
            locks,
            policy,
            tokens_root,
        }
    }

    /// Restore the entry with the given id.
    pub fn restore_by_id(&self, id: &str) -> Result<RestoreOutcome, GuardError> {
        let entry = self
            .backups
            .find_by_id(id)?
            .ok_or_else(|| GuardError::BackupNotFound { id: id.to_string() })?;
        self.restore_entry(&entry)
    }

    /// Restore the newest entry for `target`, or, with no target, the newest
    /// entry for any protected path.
    pub fn restore_latest(&self, target: Option<&TierPath>) -> Result<RestoreOutcome, GuardError> {
        let entry = match target {
            Some(path) => self.backups.find_latest_for(path)?,
            None => self
                .backups
                .find_latest_matching(|e| self.policy.is_protected(&e.source_path))?,
        };
        let entry = entry.ok_or_else(|| GuardError::NoBackupFor {
            target: target.map(|t| t.to_string()),
        })?;
        self.restore_entry(&entry)
    }

    fn restore_entry(&self, entry: &BackupEntry) -> Result<RestoreOutcome, GuardError> {
        let file = entry.source_path.resolve(&self.tokens_root);

        self.locks.with_lock(&entry.source_path, || {
            // Verifies the content hash before anything is written.
            let snapshot = self.backups.read_snapshot(entry)?;
            let removed = match snapshot {
                Some(bytes) => {
                    io::atomic_write(&file, &bytes)?;
                    false
                }
                None => {
                    io::remove_file_if_exists(&file)?;
                    true
                }
            };

            tracing::info!(
                backup_id = %entry.id,
                restored_path = %entry.source_path,
                removed,
                "token file restored"
            );

            Ok(RestoreOutcome {
                backup_id: entry.id.clone(),
                restored_path: entry.source_path.clone(),
                removed,
            })
        })
    }
}
