// restore_flow.rs — Guarded edits followed by restores, end to end on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use dtm_backup::BackupStore;
use dtm_guard::{
    GlobalGuard, GuardError, GuardPolicy, MutationRequest, PathLocks, RestoreEngine, TokenMutation,
};
use dtm_tokens::TierPath;

struct Harness {
    dir: TempDir,
    guard: GlobalGuard,
    restore: RestoreEngine,
    store: Arc<BackupStore>,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let store =
        Arc::new(BackupStore::open(dir.path().join("backups"), dir.path().join("tokens")).unwrap());
    let locks = Arc::new(PathLocks::new());
    let guard = GlobalGuard::new(GuardPolicy::default(), Arc::clone(&store), Arc::clone(&locks));
    let restore = RestoreEngine::new(Arc::clone(&store), locks, GuardPolicy::default());
    Harness {
        dir,
        guard,
        restore,
        store,
    }
}

fn seed(root: &Path, relative: &str, body: &str) {
    let path = root.join("tokens").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn brand(root: &Path) -> Value {
    let doc: Value =
        serde_json::from_slice(&fs::read(root.join("tokens/global/color.json")).unwrap()).unwrap();
    doc["color"]["brand"]["$value"].clone()
}

fn set_brand(h: &Harness, value: &str) -> String {
    h.guard
        .apply(&MutationRequest {
            target: TierPath::parse("global/color.json").unwrap(),
            token_path: "color.brand".to_string(),
            mutation: TokenMutation::Update { value: json!(value) },
            confirm: false,
        })
        .unwrap()
        .backup_id()
        .unwrap()
        .to_string()
}

const SEED: &str = r##"{"color":{"$type":"color","brand":{"$value":"#111111"}}}"##;

#[test]
fn restore_by_id_returns_exact_original_bytes() {
    let h = harness();
    seed(h.dir.path(), "global/color.json", SEED);

    let backup_id = set_brand(&h, "#333333");
    assert_eq!(brand(h.dir.path()), "#333333");

    let outcome = h.restore.restore_by_id(&backup_id).unwrap();
    assert_eq!(outcome.restored_path.as_str(), "global/color.json");
    assert_eq!(
        fs::read_to_string(h.dir.path().join("tokens/global/color.json")).unwrap(),
        SEED
    );
}

#[test]
fn restore_latest_returns_value_before_last_update() {
    let h = harness();
    seed(h.dir.path(), "global/color.json", SEED);

    set_brand(&h, "#666666");
    set_brand(&h, "#777777");
    assert_eq!(brand(h.dir.path()), "#777777");

    let target = TierPath::parse("global/color.json").unwrap();
    h.restore.restore_latest(Some(&target)).unwrap();
    assert_eq!(brand(h.dir.path()), "#666666");
}

#[test]
fn restore_latest_for_path_ignores_newer_unrelated_backups() {
    let h = harness();
    seed(h.dir.path(), "global/color.json", SEED);
    seed(
        h.dir.path(),
        "global/spacing.json",
        r#"{"spacing":{"sm":{"$value":"4px"}}}"#,
    );

    set_brand(&h, "#222222");
    h.guard
        .apply(&MutationRequest {
            target: TierPath::parse("global/spacing.json").unwrap(),
            token_path: "spacing.sm".to_string(),
            mutation: TokenMutation::Update { value: json!("8px") },
            confirm: false,
        })
        .unwrap();

    let target = TierPath::parse("global/color.json").unwrap();
    let outcome = h.restore.restore_latest(Some(&target)).unwrap();
    assert_eq!(outcome.restored_path, target);
    assert_eq!(brand(h.dir.path()), "#111111");

    // spacing is untouched by the color restore
    let spacing = fs::read_to_string(h.dir.path().join("tokens/global/spacing.json")).unwrap();
    assert!(spacing.contains("8px"));
}

#[test]
fn restores_never_shrink_history() {
    let h = harness();
    seed(h.dir.path(), "global/color.json", SEED);

    let first = set_brand(&h, "#222222");
    set_brand(&h, "#333333");
    assert_eq!(h.store.len().unwrap(), 2);

    h.restore.restore_by_id(&first).unwrap();
    h.restore.restore_latest(None).unwrap();
    assert_eq!(h.store.len().unwrap(), 2);
}

#[test]
fn create_then_restore_removes_the_new_file() {
    let h = harness();
    let outcome = h
        .guard
        .apply(&MutationRequest {
            target: TierPath::parse("global/shadow.json").unwrap(),
            token_path: "shadow.sm".to_string(),
            mutation: TokenMutation::Create {
                value: json!("0 1px 2px #000000"),
            },
            confirm: false,
        })
        .unwrap();
    let file = h.dir.path().join("tokens/global/shadow.json");
    assert!(file.exists());

    let restored = h.restore.restore_by_id(outcome.backup_id().unwrap()).unwrap();
    assert!(restored.removed);
    assert!(!file.exists());
}

#[test]
fn tampered_snapshot_is_refused() {
    let h = harness();
    seed(h.dir.path(), "global/color.json", SEED);
    let backup_id = set_brand(&h, "#222222");

    let entry = h.store.find_by_id(&backup_id).unwrap().unwrap();
    fs::write(h.store.snapshot_path(&entry), b"tampered").unwrap();

    assert!(matches!(
        h.restore.restore_by_id(&backup_id),
        Err(GuardError::Backup(_))
    ));
    assert_eq!(brand(h.dir.path()), "#222222");
}
