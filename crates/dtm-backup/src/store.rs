// store.rs — BackupStore: snapshot files plus one append-only index.
//
// Layout inside the backup directory:
//
//   index.json              — JSON array of BackupEntry, oldest first
//   <id>.snapshot           — exact bytes of the source at backup time
//
// `record` writes the snapshot first and the index second, both atomically.
// If the index write fails the snapshot is removed again, so an index entry
// never references a missing file. The index is held in memory behind a
// mutex; every append is serialized through it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use dtm_tokens::{io, TierPath};

use crate::entry::{new_backup_id, BackupAction, BackupEntry};
use crate::error::BackupError;
use crate::hasher;

/// File name of the index document inside the backup directory.
pub const INDEX_FILE: &str = "index.json";
/// Extension of snapshot files.
pub const SNAPSHOT_EXT: &str = "snapshot";

/// Append-only store of pre-mutation snapshots.
pub struct BackupStore {
    backup_dir: PathBuf,
    tokens_root: PathBuf,
    index: Mutex<Vec<BackupEntry>>,
}

impl BackupStore {
    /// Open (or create) a store in `backup_dir` for files under `tokens_root`.
    ///
    /// Loads the existing index, if any.
    pub fn open(
        backup_dir: impl AsRef<Path>,
        tokens_root: impl AsRef<Path>,
    ) -> Result<Self, BackupError> {
        let backup_dir = backup_dir.as_ref().to_path_buf();
        fs::create_dir_all(&backup_dir).map_err(|source| BackupError::IoError {
            path: backup_dir.clone(),
            source,
        })?;

        let index_path = backup_dir.join(INDEX_FILE);
        let entries: Vec<BackupEntry> = match io::read_bytes_if_exists(&index_path)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                BackupError::CorruptIndex {
                    path: index_path.clone(),
                    source,
                }
            })?,
            None => Vec::new(),
        };

        tracing::debug!(dir = %backup_dir.display(), entries = entries.len(), "opened backup store");

        Ok(Self {
            backup_dir,
            tokens_root: tokens_root.as_ref().to_path_buf(),
            index: Mutex::new(entries),
        })
    }

    /// The directory holding snapshots and the index.
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// The tokens root that `sourcePath`s are resolved against.
    pub fn tokens_root(&self) -> &Path {
        &self.tokens_root
    }

    /// Snapshot the current bytes of `source` and append an entry.
    ///
    /// A source that does not exist is recorded with `existed = false` and an
    /// empty snapshot file, so restoring it recreates "did not exist".
    pub fn record(
        &self,
        source: &TierPath,
        action: BackupAction,
        token_path: Option<&str>,
    ) -> Result<BackupEntry, BackupError> {
        let current = io::read_bytes_if_exists(&source.resolve(&self.tokens_root))?;
        let existed = current.is_some();
        let bytes = current.unwrap_or_default();

        let mut index = self.lock()?;

        let created_at = Utc::now();
        let mut id = new_backup_id(created_at);
        while index.iter().any(|e| e.id == id) {
            id = new_backup_id(created_at);
        }

        let backup_path = format!("{}.{}", id, SNAPSHOT_EXT);
        let snapshot_file = self.backup_dir.join(&backup_path);
        io::atomic_write(&snapshot_file, &bytes)?;

        let entry = BackupEntry {
            id,
            created_at,
            source_path: source.clone(),
            backup_path,
            action,
            token_path: token_path.map(str::to_string),
            existed,
            content_hash: hasher::hash_bytes(&bytes),
            size: bytes.len() as u64,
        };

        index.push(entry.clone());
        if let Err(e) = self.persist_index(&index) {
            index.pop();
            if let Err(cleanup) = io::remove_file_if_exists(&snapshot_file) {
                tracing::warn!(
                    file = %snapshot_file.display(),
                    error = %cleanup,
                    "failed to remove orphaned snapshot"
                );
            }
            return Err(e);
        }

        tracing::info!(
            backup_id = %entry.id,
            source = %entry.source_path,
            action = entry.action.as_str(),
            existed = entry.existed,
            "recorded backup"
        );
        Ok(entry)
    }

    /// Look up an entry by id.
    pub fn find_by_id(&self, id: &str) -> Result<Option<BackupEntry>, BackupError> {
        Ok(self.lock()?.iter().find(|e| e.id == id).cloned())
    }

    /// The most recently appended entry for exactly this source path.
    pub fn find_latest_for(&self, source: &TierPath) -> Result<Option<BackupEntry>, BackupError> {
        self.find_latest_matching(|e| &e.source_path == source)
    }

    /// The most recently appended entry satisfying `predicate`.
    pub fn find_latest_matching(
        &self,
        predicate: impl Fn(&BackupEntry) -> bool,
    ) -> Result<Option<BackupEntry>, BackupError> {
        Ok(self.lock()?.iter().rev().find(|e| predicate(*e)).cloned())
    }

    /// Up to `limit` entries, newest first, optionally for one source path.
    pub fn list(
        &self,
        limit: usize,
        target: Option<&TierPath>,
    ) -> Result<Vec<BackupEntry>, BackupError> {
        Ok(self
            .lock()?
            .iter()
            .rev()
            .filter(|e| target.map_or(true, |t| &e.source_path == t))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Number of entries in the index.
    pub fn len(&self) -> Result<usize, BackupError> {
        Ok(self.lock()?.len())
    }

    /// True if no backup has been recorded yet.
    pub fn is_empty(&self) -> Result<bool, BackupError> {
        Ok(self.lock()?.is_empty())
    }

    /// Absolute path of an entry's snapshot file.
    pub fn snapshot_path(&self, entry: &BackupEntry) -> PathBuf {
        self.backup_dir.join(&entry.backup_path)
    }

    /// Read an entry's snapshot, verifying it against the recorded hash.
    ///
    /// Returns `None` for an entry whose source did not exist.
    pub fn read_snapshot(&self, entry: &BackupEntry) -> Result<Option<Vec<u8>>, BackupError> {
        let path = self.snapshot_path(entry);
        let bytes = io::read_bytes_if_exists(&path)?.ok_or_else(|| BackupError::SnapshotMissing {
            id: entry.id.clone(),
            path: path.clone(),
        })?;

        let actual = hasher::hash_bytes(&bytes);
        if actual != entry.content_hash {
            return Err(BackupError::IntegrityViolation {
                id: entry.id.clone(),
                expected: entry.content_hash.clone(),
                actual,
            });
        }

        Ok(entry.existed.then_some(bytes))
    }

    fn persist_index(&self, entries: &[BackupEntry]) -> Result<(), BackupError> {
        let json = serde_json::to_vec_pretty(entries)?;
        io::atomic_write(&self.backup_dir.join(INDEX_FILE), &json)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<BackupEntry>>, BackupError> {
        self.index.lock().map_err(|_| BackupError::LockPoisoned)
    }
}
