pub mod honors;
pub mod workspaces;

use axum::Json;

/// GET /api/health — liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
