// guard.rs — GlobalGuard: the single write path for token files.
//
// apply() runs, in order:
//   authorize → per-path lock → read current document → compute new
//   document in memory → record backup (protected only) → atomic write.
//
// Any failure before the atomic write leaves the token file untouched. A
// failure after the backup leaves an extra history entry whose snapshot is
// still the current content, which is harmless to restore.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};

use dtm_backup::{BackupEntry, BackupStore};
use dtm_tokens::{io, tree, TierPath};

use crate::error::GuardError;
use crate::locks::PathLocks;
use crate::policy::{GuardDecision, GuardPolicy, MutationRequest, TokenMutation};

/// What a successful mutation did.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub target: TierPath,
    pub token_path: String,
    /// The backup taken before writing, for protected targets.
    pub backup: Option<BackupEntry>,
}

impl SaveOutcome {
    pub fn backup_id(&self) -> Option<&str> {
        self.backup.as_ref().map(|b| b.id.as_str())
    }
}

/// Guards every mutation of a token file.
pub struct GlobalGuard {
    policy: GuardPolicy,
    backups: Arc<BackupStore>,
    locks: Arc<PathLocks>,
    tokens_root: PathBuf,
}

impl GlobalGuard {
    pub fn new(policy: GuardPolicy, backups: Arc<BackupStore>, locks: Arc<PathLocks>) -> Self {
        let tokens_root = backups.tokens_root().to_path_buf();
        Self {
            policy,
            backups,
            locks,
            tokens_root,
        }
    }

    /// Authorize and apply a mutation.
    pub fn apply(&self, request: &MutationRequest) -> Result<SaveOutcome, GuardError> {
        let trace = self.policy.authorize_with_trace(request);
        let backup_required = match trace.decision {
            GuardDecision::Allow { backup_required } => backup_required,
            GuardDecision::Deny { code, reason } => {
                tracing::warn!(
                    target_path = %request.target,
                    token_path = %request.token_path,
                    code = code.as_str(),
                    "mutation denied"
                );
                return Err(GuardError::Denied { code, reason });
            }
        };
        tracing::debug!(
            target_path = %request.target,
            matched = ?trace.matched_pattern,
            steps = trace.steps.len(),
            "mutation authorized"
        );

        let file = request.target.resolve(&self.tokens_root);
        self.locks.with_lock(&request.target, || {
            let mut doc = io::read_document(&file)?.unwrap_or_else(|| Value::Object(Map::new()));

            match &request.mutation {
                TokenMutation::Create { value } | TokenMutation::Update { value } => {
                    tree::set(&mut doc, &request.token_path, value.clone())?;
                }
                TokenMutation::Delete => {
                    tree::remove(&mut doc, &request.token_path)?;
                }
            }
            let rendered = io::render_document(&doc)?;

            let backup = if backup_required {
                Some(self.backups.record(
                    &request.target,
                    request.mutation.action(),
                    Some(&request.token_path),
                )?)
            } else {
                None
            };

            io::atomic_write(&file, &rendered)?;

            tracing::info!(
                target_path = %request.target,
                tier = ?request.target.tier(),
                token_path = %request.token_path,
                action = request.mutation.action().as_str(),
                backup_id = backup.as_ref().map(|b| b.id.as_str()),
                "token file updated"
            );

            Ok(SaveOutcome {
                target: request.target.clone(),
                token_path: request.token_path.clone(),
                backup,
            })
        })
    }
}
