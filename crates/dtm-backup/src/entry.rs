// entry.rs — Backup entry data model.
//
// A BackupEntry describes the pre-mutation state of one token file. It is
// written once, when the snapshot is taken, and never modified afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dtm_tokens::TierPath;

/// The mutation that triggered a backup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackupAction {
    Create,
    Update,
    Delete,
}

impl BackupAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One snapshot in the backup index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    /// Unique, time-ordered identifier (e.g. `20261015T093012123Z-1a2b3c4d`).
    pub id: String,

    /// When the snapshot was taken (UTC).
    pub created_at: DateTime<Utc>,

    /// The token file that was snapshotted, relative to the tokens root.
    pub source_path: TierPath,

    /// Snapshot file name, relative to the backup directory.
    pub backup_path: String,

    /// The mutation that was about to be applied.
    pub action: BackupAction,

    /// Dotted path of the token being edited, if the mutation targeted one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_path: Option<String>,

    /// False when the source file did not exist at snapshot time. Restoring
    /// such an entry removes the file again.
    pub existed: bool,

    /// SHA-256 of the snapshot bytes (lowercase hex).
    pub content_hash: String,

    /// Snapshot size in bytes.
    pub size: u64,
}

/// Generate a backup id: a millisecond UTC timestamp plus a random suffix.
///
/// Ids sort lexically in creation order (to the millisecond).
pub fn new_backup_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.format("%Y%m%dT%H%M%S%3fZ"), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_with_camel_case_keys() {
        let entry = BackupEntry {
            id: "20261015T000000000Z-deadbeef".to_string(),
            created_at: Utc::now(),
            source_path: TierPath::parse("global/color.json").unwrap(),
            backup_path: "20261015T000000000Z-deadbeef.snapshot".to_string(),
            action: BackupAction::Update,
            token_path: Some("color.brand".to_string()),
            existed: true,
            content_hash: "00".to_string(),
            size: 2,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["sourcePath"], "global/color.json");
        assert_eq!(json["action"], "update");
        assert_eq!(json["tokenPath"], "color.brand");
        assert!(json.get("createdAt").is_some());

        let back: BackupEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn ids_are_unique_and_time_prefixed() {
        let now = Utc::now();
        let a = new_backup_id(now);
        let b = new_backup_id(now);
        assert_ne!(a, b);
        assert!(a.starts_with(&now.format("%Y%m%dT").to_string()));
        assert_eq!(a.len(), "20261015T093012123Z-1a2b3c4d".len());
    }
}
