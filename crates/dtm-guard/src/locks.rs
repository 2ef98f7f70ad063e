// locks.rs — Per-file mutual exclusion.
//
// Mutations and restores of the same token file are serialized; different
// files proceed in parallel. Lock handles are created on first use and kept
// for the lifetime of the table (one per distinct file ever touched).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dtm_tokens::TierPath;

use crate::error::GuardError;

/// Table of per-path locks shared by the guard and the restore engine.
#[derive(Debug, Default)]
pub struct PathLocks {
    table: Mutex<HashMap<TierPath, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock handle for `path`. Callers hold `handle.lock()` for the
    /// duration of their read-modify-write.
    pub fn handle(&self, path: &TierPath) -> Result<Arc<Mutex<()>>, GuardError> {
        let mut table = self.table.lock().map_err(|_| GuardError::LockPoisoned {
            path: "<lock table>".to_string(),
        })?;
        Ok(table.entry(path.clone()).or_default().clone())
    }

    /// Run `f` while holding the lock for `path`.
    pub fn with_lock<T>(
        &self,
        path: &TierPath,
        f: impl FnOnce() -> Result<T, GuardError>,
    ) -> Result<T, GuardError> {
        let handle = self.handle(path)?;
        let _held = handle.lock().map_err(|_| GuardError::LockPoisoned {
            path: path.to_string(),
        })?;
        f()
    }
}
