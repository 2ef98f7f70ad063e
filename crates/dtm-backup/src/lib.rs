//! # dtm-backup
//!
//! Append-only snapshot store for governed token files.
//!
//! Before any mutation of a protected file, the guard asks the
//! [`BackupStore`] to `record` the file's current bytes. Each call writes one
//! snapshot file and appends one [`BackupEntry`] to a single JSON index.
//! Entries are never rewritten or reordered, so index order is recency order.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use dtm_backup::{BackupAction, BackupStore};
//! use dtm_tokens::TierPath;
//!
//! let store = BackupStore::open(".dtm/backups", "tokens").unwrap();
//! let path = TierPath::parse("global/color.json").unwrap();
//! let entry = store
//!     .record(&path, BackupAction::Update, Some("color.brand"))
//!     .unwrap();
//! assert_eq!(store.find_latest_for(&path).unwrap().unwrap().id, entry.id);
//! ```

pub mod entry;
pub mod error;
pub mod hasher;
pub mod store;

pub use entry::{BackupAction, BackupEntry};
pub use error::BackupError;
pub use store::BackupStore;
