// api_flow.rs — The governance API driven through the axum router.

use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use dtm_daemon::{router, DaemonConfig, GovernanceStore};

const COLOR_FILE: &str = "global/color.json";

fn app(root: &Path) -> Router {
    let store = GovernanceStore::open(DaemonConfig::for_project(root)).unwrap();
    router(store.into_state())
}

fn seed_color(root: &Path) {
    let dir = root.join("tokens/global");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("color.json"),
        r##"{
  "color": {
    "$type": "color",
    "brand": { "$value": "#111111" }
  }
}
"##,
    )
    .unwrap();
}

fn brand(root: &Path) -> String {
    let doc: Value =
        serde_json::from_slice(&fs::read(root.join("tokens").join(COLOR_FILE)).unwrap()).unwrap();
    doc["color"]["brand"]["$value"].as_str().unwrap().to_string()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn update_brand(app: &Router, value: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/save-token",
        Some(json!({
            "targetPath": COLOR_FILE,
            "tokenPath": "color.brand",
            "action": "update",
            "valueObj": value,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    body["backupId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn end_to_end_governance_scenario() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_color(root);
    let app = app(root);
    let seeded = fs::read(root.join("tokens").join(COLOR_FILE)).unwrap();

    // Unconfirmed delete of a global token is refused and changes nothing.
    let (status, body) = send(
        &app,
        "POST",
        "/api/save-token",
        Some(json!({
            "targetPath": COLOR_FILE,
            "tokenPath": "color.brand",
            "action": "delete",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "GLOBAL_DELETE_PROTECTED");
    assert_eq!(body["success"], false);
    assert_eq!(fs::read(root.join("tokens").join(COLOR_FILE)).unwrap(), seeded);

    // Update returns a backup id that shows up in history.
    let backup_id = update_brand(&app, "#333333").await;
    assert_eq!(brand(root), "#333333");

    let (status, body) = send(
        &app,
        "GET",
        "/api/global-guard/history?limit=10&targetPath=global/color.json",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = body["history"].as_array().unwrap();
    assert!(!history.is_empty());
    assert!(history.iter().all(|e| e["sourcePath"] == COLOR_FILE));
    assert_eq!(history[0]["id"], backup_id.as_str());

    // Restore by id brings back the exact seeded bytes.
    let (status, body) = send(
        &app,
        "POST",
        "/api/global-guard/restore",
        Some(json!({ "backupId": backup_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["restoredPath"], COLOR_FILE);
    assert_eq!(fs::read(root.join("tokens").join(COLOR_FILE)).unwrap(), seeded);

    // Two updates, then restore-latest lands on the value in between.
    update_brand(&app, "#666666").await;
    update_brand(&app, "#777777").await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/global-guard/restore-latest",
        Some(json!({ "targetPath": COLOR_FILE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(brand(root), "#666666");

    // Provisioning.
    let (status, body) = send(
        &app,
        "POST",
        "/api/workspace/create-project",
        Some(json!({
            "clientId": "dtm-workspace-test",
            "brandId": "marketing",
            "projectId": "campaign-kit",
            "template": "product-ui",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projectKey"], "dtm-workspace-test/campaign-kit");

    let project_dir = root.join("tokens/clients/dtm-workspace-test/projects/campaign-kit");
    for file in ["color.json", "typography.json", "spacing.json"] {
        assert!(project_dir.join(file).is_file(), "missing {file}");
    }
    let manifest: Value =
        serde_json::from_slice(&fs::read(root.join(".dtm/manifest.json")).unwrap()).unwrap();
    assert_eq!(
        manifest["projects"]["dtm-workspace-test/campaign-kit"]["metadata"]["brand"],
        "marketing"
    );

    // Same key again: 409, nothing changes.
    let manifest_before = fs::read(root.join(".dtm/manifest.json")).unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/api/workspace/create-project",
        Some(json!({
            "clientId": "dtm-workspace-test",
            "brandId": "marketing",
            "projectId": "campaign-kit",
            "template": "minimal",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "PROJECT_EXISTS");
    assert_eq!(fs::read(root.join(".dtm/manifest.json")).unwrap(), manifest_before);
}

#[tokio::test]
async fn validation_reports_dangling_alias_with_200() {
    let dir = TempDir::new().unwrap();
    let global = dir.path().join("tokens/global");
    fs::create_dir_all(&global).unwrap();
    fs::write(
        global.join("color.json"),
        r##"{"color":{"$type":"color",
             "brand":{"$value":"#111111"},
             "text":{"$value":"{color.brand}"},
             "link":{"$value":"{missing.reference.token}"}}}"##,
    )
    .unwrap();
    let app = app(dir.path());

    let (status, body) = send(&app, "GET", "/api/validate-figma-export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["valid"], false);
    assert_eq!(body["summary"]["aliasCount"], 2);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["code"], "FIGMA_REFERENCE_NOT_FOUND");
    assert_eq!(errors[0]["path"], "color.link");
    assert_eq!(errors[0]["ref"], "{missing.reference.token}");
    assert_eq!(body["tokens"]["color"]["brand"]["$value"], "#111111");
}

#[tokio::test]
async fn clean_tree_validates() {
    let dir = TempDir::new().unwrap();
    seed_color(dir.path());
    let app = app(dir.path());
    let (status, body) = send(&app, "GET", "/api/validate-figma-export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert!(body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_requests_are_400_with_standard_body() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    // missing tokenPath
    let (status, body) = send(
        &app,
        "POST",
        "/api/save-token",
        Some(json!({ "targetPath": COLOR_FILE, "action": "update", "valueObj": "#1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert_eq!(body["success"], false);

    // traversal in targetPath
    let (status, _) = send(
        &app,
        "POST",
        "/api/save-token",
        Some(json!({
            "targetPath": "global/../../etc/passwd.json",
            "tokenPath": "a",
            "action": "update",
            "valueObj": "x",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // unknown action
    let (status, _) = send(
        &app,
        "POST",
        "/api/save-token",
        Some(json!({
            "targetPath": COLOR_FILE,
            "tokenPath": "color.brand",
            "action": "rename",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // bad limits
    for uri in [
        "/api/global-guard/history?limit=0",
        "/api/global-guard/history?limit=lots",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    // missing provisioning fields
    let (status, _) = send(
        &app,
        "POST",
        "/api/workspace/create-project",
        Some(json!({ "clientId": "acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // unknown template
    let (status, body) = send(
        &app,
        "POST",
        "/api/workspace/create-project",
        Some(json!({
            "clientId": "acme",
            "brandId": "acme",
            "projectId": "site",
            "template": "brochure",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNKNOWN_TEMPLATE");
}

#[tokio::test]
async fn not_found_cases() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        "POST",
        "/api/global-guard/restore",
        Some(json!({ "backupId": "20260101T000000000Z-deadbeef" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "BACKUP_NOT_FOUND");

    let (status, body) = send(&app, "POST", "/api/global-guard/restore-latest", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "BACKUP_NOT_FOUND");

    seed_color(dir.path());
    let (status, body) = send(
        &app,
        "POST",
        "/api/save-token",
        Some(json!({
            "targetPath": COLOR_FILE,
            "tokenPath": "color.accent",
            "action": "delete",
            "confirm": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TOKEN_NOT_FOUND");

    let (status, body) = send(&app, "GET", "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn confirmed_delete_is_backed_up_and_restorable() {
    let dir = TempDir::new().unwrap();
    seed_color(dir.path());
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        "POST",
        "/api/save-token",
        Some(json!({
            "targetPath": COLOR_FILE,
            "tokenPath": "color.brand",
            "action": "delete",
            "confirm": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let backup_id = body["backupId"].as_str().unwrap().to_string();

    let doc: Value =
        serde_json::from_slice(&fs::read(dir.path().join("tokens").join(COLOR_FILE)).unwrap())
            .unwrap();
    assert!(doc["color"].get("brand").is_none());

    let (status, _) = send(
        &app,
        "POST",
        "/api/global-guard/restore",
        Some(json!({ "backupId": backup_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(brand(dir.path()), "#111111");
}

#[tokio::test]
async fn concurrent_duplicate_create_project_has_one_winner() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());
    let request = json!({
        "clientId": "acme",
        "brandId": "acme",
        "projectId": "site",
        "template": "minimal",
    });

    let calls: Vec<_> = (0..6)
        .map(|_| {
            let app = app.clone();
            let request = request.clone();
            tokio::spawn(async move {
                send(&app, "POST", "/api/workspace/create-project", Some(request)).await
            })
        })
        .collect();

    let mut ok = 0;
    let mut conflict = 0;
    for call in calls {
        let (status, body) = call.await.unwrap();
        match status {
            StatusCode::OK => ok += 1,
            StatusCode::CONFLICT => {
                assert_eq!(body["code"], "PROJECT_EXISTS");
                conflict += 1;
            }
            other => panic!("unexpected status {other}: {body}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(conflict, 5);

    let (status, body) = send(&app, "GET", "/api/workspace/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projects"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unprotected_save_has_null_backup_id() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());
    let (status, body) = send(
        &app,
        "POST",
        "/api/save-token",
        Some(json!({
            "targetPath": "clients/acme/color.json",
            "tokenPath": "color.brand",
            "action": "create",
            "valueObj": { "$value": "#ff0000", "$type": "color" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["backupId"].is_null());

    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
