//! # dtm-guard
//!
//! The mutation chokepoint for governed token files.
//!
//! Every save or delete of a token file flows through [`GlobalGuard::apply`]:
//!
//! 1. [`GuardPolicy`] decides: protected deletes without confirmation are
//!    denied with `GLOBAL_DELETE_PROTECTED`; everything else is allowed.
//! 2. The per-path lock is taken, the new document is computed in memory.
//! 3. For protected paths, the [`BackupStore`](dtm_backup::BackupStore)
//!    records the pre-mutation bytes.
//! 4. The new document is written atomically.
//!
//! [`RestoreEngine`] reverses mutations from the same backup history.
//!
//! ## Key invariants
//!
//! - **Denied means untouched**: a denied request writes nothing, not even a
//!   backup.
//! - **Backup before write**: no reader can observe new content of a
//!   protected file without its backup already being durable.
//! - **History is monotonic**: restores never remove entries and do not add
//!   new ones.

pub mod error;
pub mod guard;
pub mod locks;
pub mod policy;
pub mod restore;

pub use error::GuardError;
pub use guard::{GlobalGuard, SaveOutcome};
pub use locks::PathLocks;
pub use policy::{
    DenyCode, GuardDecision, GuardPolicy, GuardStep, GuardTrace, MutationRequest, TokenMutation,
};
pub use restore::{RestoreEngine, RestoreOutcome};
