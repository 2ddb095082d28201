use std::sync::Arc;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use kudos_core::store::MemoryStore;
use kudos_core::HonorLedger;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn memory_router() -> (axum::Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let router = kudos_server::build_router(HonorLedger::new(store.clone()));
    (router, store)
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            axum::body::Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => axum::body::Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    request(app, "GET", uri, None).await
}

async fn init_roster(app: axum::Router, workspace: &str, members: &[&str]) {
    let (status, _) = request(
        app,
        "PUT",
        &format!("/api/workspaces/{workspace}/roster"),
        Some(serde_json::json!({ "member_ids": members })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn grant(app: axum::Router, workspace: &str, giver: &str, recipient: &str) -> String {
    let (status, json) = request(
        app,
        "POST",
        &format!("/api/workspaces/{workspace}/honors"),
        Some(serde_json::json!({ "giver_id": giver, "recipient_id": recipient })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["outcome"].as_str().unwrap_or_default().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_responds_ok() {
    let (app, _) = memory_router();
    let (status, json) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn fresh_member_has_sentinel_and_full_allowance() {
    let (app, _) = memory_router();
    init_roster(app.clone(), "ws", &["u1", "u2"]).await;

    let (status, json) = get(app, "/api/workspaces/ws/members/u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["honorsRemaining"], 3);
    // The never-honored sentinel is the literal `false`, not an empty map.
    assert_eq!(json["honoredBy"], serde_json::json!(false));
    assert_eq!(json["honorsReceived"], 0);
}

#[tokio::test]
async fn grant_moves_one_honor_between_members() {
    let (app, _) = memory_router();
    init_roster(app.clone(), "ws", &["u1", "u2"]).await;

    let outcome = grant(app.clone(), "ws", "u1", "u2").await;
    assert_eq!(outcome, "granted");

    let (_, giver) = get(app.clone(), "/api/workspaces/ws/members/u1").await;
    assert_eq!(giver["honorsRemaining"], 2);
    assert_eq!(giver["honoredBy"], serde_json::json!(false));

    let (_, recipient) = get(app, "/api/workspaces/ws/members/u2").await;
    assert_eq!(recipient["honorsRemaining"], 3);
    assert_eq!(recipient["honoredBy"], serde_json::json!({ "u1": true }));
}

#[tokio::test]
async fn double_grant_is_idempotent() {
    let (app, _) = memory_router();
    init_roster(app.clone(), "ws", &["u1", "u2"]).await;

    assert_eq!(grant(app.clone(), "ws", "u1", "u2").await, "granted");
    assert_eq!(grant(app.clone(), "ws", "u1", "u2").await, "already_honored");

    let (_, giver) = get(app.clone(), "/api/workspaces/ws/members/u1").await;
    assert_eq!(giver["honorsRemaining"], 2);
    let (_, recipient) = get(app, "/api/workspaces/ws/members/u2").await;
    assert_eq!(recipient["honoredBy"], serde_json::json!({ "u1": true }));
}

#[tokio::test]
async fn fourth_distinct_grant_is_a_noop_but_still_200() {
    let (app, _) = memory_router();
    init_roster(app.clone(), "ws", &["u1", "u2", "u3", "u4", "u5"]).await;

    for recipient in ["u2", "u3", "u4"] {
        assert_eq!(grant(app.clone(), "ws", "u1", recipient).await, "granted");
    }
    assert_eq!(grant(app.clone(), "ws", "u1", "u5").await, "honors_exhausted");

    let (_, giver) = get(app.clone(), "/api/workspaces/ws/members/u1").await;
    assert_eq!(giver["honorsRemaining"], 0);
    let (_, u5) = get(app, "/api/workspaces/ws/members/u5").await;
    assert_eq!(u5["honoredBy"], serde_json::json!(false));
}

#[tokio::test]
async fn counts_and_leaderboard_views() {
    let (app, _) = memory_router();
    init_roster(app.clone(), "ws", &["u1", "u2", "u3"]).await;
    grant(app.clone(), "ws", "u1", "u3").await;
    grant(app.clone(), "ws", "u2", "u3").await;

    let (status, json) = get(app.clone(), "/api/workspaces/ws/honors?members=u1,u3,ghost").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["counts"]["u1"], 0);
    assert_eq!(json["counts"]["u3"], 2);
    // Roster drift reports 0, not an error.
    assert_eq!(json["counts"]["ghost"], 0);

    let (status, json) = get(app, "/api/workspaces/ws/honors").await;
    assert_eq!(status, StatusCode::OK);
    let board = json["leaderboard"].as_array().unwrap();
    assert_eq!(board[0]["member"], "u3");
    assert_eq!(board[0]["honors_received"], 2);
}

#[tokio::test]
async fn reroster_is_additive_only() {
    let (app, _) = memory_router();
    init_roster(app.clone(), "ws", &["u1", "u2"]).await;
    grant(app.clone(), "ws", "u1", "u2").await;

    init_roster(app.clone(), "ws", &["u1", "u2", "u3"]).await;

    let (_, giver) = get(app.clone(), "/api/workspaces/ws/members/u1").await;
    assert_eq!(giver["honorsRemaining"], 2);
    let (_, added) = get(app, "/api/workspaces/ws/members/u3").await;
    assert_eq!(added["honorsRemaining"], 3);
}

#[tokio::test]
async fn reset_deletes_the_workspace_subtree() {
    let (app, _) = memory_router();
    init_roster(app.clone(), "ws", &["u1"]).await;

    let (status, _) = request(app.clone(), "DELETE", "/api/workspaces/ws", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(app.clone(), "/api/workspaces/ws/members/u1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Resetting an already-empty workspace is still a 200.
    let (status, _) = request(app, "DELETE", "/api/workspaces/ws", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn self_grant_is_rejected() {
    let (app, _) = memory_router();
    init_roster(app.clone(), "ws", &["u1"]).await;
    let (status, json) = request(
        app,
        "POST",
        "/api/workspaces/ws/honors",
        Some(serde_json::json!({ "giver_id": "u1", "recipient_id": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("themselves"));
}

#[tokio::test]
async fn empty_roster_is_rejected() {
    let (app, _) = memory_router();
    let (status, _) = request(
        app,
        "PUT",
        "/api/workspaces/ws/roster",
        Some(serde_json::json!({ "member_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn offline_store_surfaces_503() {
    let (app, store) = memory_router();
    init_roster(app.clone(), "ws", &["u1", "u2"]).await;

    store.set_offline(true);
    let (status, json) = request(
        app.clone(),
        "POST",
        "/api/workspaces/ws/honors",
        Some(serde_json::json!({ "giver_id": "u1", "recipient_id": "u2" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().unwrap().contains("unavailable"));

    // Retrying after recovery succeeds; nothing was half-applied.
    store.set_offline(false);
    assert_eq!(grant(app.clone(), "ws", "u1", "u2").await, "granted");
    let (_, giver) = get(app, "/api/workspaces/ws/members/u1").await;
    assert_eq!(giver["honorsRemaining"], 2);
}

#[tokio::test]
async fn audit_reports_clean_workspace() {
    let (app, _) = memory_router();
    init_roster(app.clone(), "ws", &["u1", "u2"]).await;
    grant(app.clone(), "ws", "u1", "u2").await;

    let (status, json) = get(app, "/api/workspaces/ws/audit").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["findings"].as_array().unwrap().is_empty());
}
