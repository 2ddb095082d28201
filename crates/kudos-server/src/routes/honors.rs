use axum::extract::{Path, Query, State};
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct GrantBody {
    pub giver_id: String,
    pub recipient_id: String,
}

/// POST /api/workspaces/:ws/honors — grant one honor.
///
/// Always 200 on a reachable store: exhausted allowances and re-grants are
/// no-op outcomes, not failures, and the UI shows them exactly like an
/// effective grant.
pub async fn grant(
    State(app): State<AppState>,
    Path(workspace): Path<String>,
    Json(body): Json<GrantBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.giver_id == body.recipient_id {
        return Err(AppError::bad_request("members cannot honor themselves"));
    }

    let ledger = app.ledger.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        ledger.grant_honor(&body.giver_id, &body.recipient_id, &workspace)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(serde_json::json!({ "outcome": outcome })))
}

#[derive(serde::Deserialize)]
pub struct CountsQuery {
    /// Comma-separated member ids; omit for the full leaderboard.
    pub members: Option<String>,
}

/// GET /api/workspaces/:ws/honors — distinct-giver counts.
///
/// With `?members=a,b` returns a map for just those members (0 for members
/// with no entry). Without it, the full workspace leaderboard, ranked.
pub async fn counts(
    State(app): State<AppState>,
    Path(workspace): Path<String>,
    Query(query): Query<CountsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = app.ledger.clone();

    match query.members {
        Some(members) => {
            let ids: Vec<String> = members
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if ids.is_empty() {
                return Err(AppError::bad_request("members query must not be empty"));
            }
            let counts =
                tokio::task::spawn_blocking(move || ledger.honor_counts(&workspace, &ids))
                    .await
                    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
            Ok(Json(serde_json::json!({ "counts": counts })))
        }
        None => {
            let board = tokio::task::spawn_blocking(move || ledger.leaderboard(&workspace))
                .await
                .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
            Ok(Json(serde_json::json!({ "leaderboard": board })))
        }
    }
}
