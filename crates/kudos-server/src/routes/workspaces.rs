use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct RosterBody {
    pub member_ids: Vec<String>,
}

/// PUT /api/workspaces/:ws/roster — ensure ledger entries for every roster
/// member. Additive only; re-sending a roster never resets progress.
pub async fn put_roster(
    State(app): State<AppState>,
    Path(workspace): Path<String>,
    Json(body): Json<RosterBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.member_ids.is_empty() {
        return Err(AppError::bad_request("member_ids must not be empty"));
    }

    let ledger = app.ledger.clone();
    tokio::task::spawn_blocking(move || ledger.initialize_workspace(&workspace, &body.member_ids))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// GET /api/workspaces/:ws/members/:id — single ledger entry detail.
pub async fn get_member(
    State(app): State<AppState>,
    Path((workspace, member)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = app.ledger.clone();
    let (member, entry) = tokio::task::spawn_blocking(move || {
        let entry = ledger.entry(&workspace, &member)?;
        Ok::<_, kudos_core::KudosError>((member, entry))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(serde_json::json!({
        "memberId": member,
        "honorsRemaining": entry.honors_remaining,
        "honorsReceived": entry.honored_by.count(),
        "honoredBy": entry.honored_by,
    })))
}

/// GET /api/workspaces/:ws/audit — givers whose spent honors don't match the
/// credits found in the workspace (partial-grant footprints).
pub async fn audit(
    State(app): State<AppState>,
    Path(workspace): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = app.ledger.clone();
    let findings = tokio::task::spawn_blocking(move || ledger.audit_workspace(&workspace))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(serde_json::json!({ "findings": findings })))
}

/// DELETE /api/workspaces/:ws — drop the workspace's entire ledger subtree.
/// Admin/test utility; deleting a workspace that was never initialized is
/// still a 200.
pub async fn reset(
    State(app): State<AppState>,
    Path(workspace): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = app.ledger.clone();
    tokio::task::spawn_blocking(move || ledger.reset_workspace(&workspace))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}
