pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{delete, get, post, put};
use axum::Router;
use kudos_core::HonorLedger;
use tower_http::cors::{Any, CorsLayer};

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(ledger: HonorLedger) -> Router {
    let app_state = state::AppState::new(ledger);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health))
        // Roster / workspace admin
        .route(
            "/api/workspaces/{ws}/roster",
            put(routes::workspaces::put_roster),
        )
        .route(
            "/api/workspaces/{ws}/members/{id}",
            get(routes::workspaces::get_member),
        )
        .route("/api/workspaces/{ws}/audit", get(routes::workspaces::audit))
        .route("/api/workspaces/{ws}", delete(routes::workspaces::reset))
        // Honors
        .route("/api/workspaces/{ws}/honors", post(routes::honors::grant))
        .route("/api/workspaces/{ws}/honors", get(routes::honors::counts))
        .layer(cors)
        .with_state(app_state)
}

/// Start the kudos API server on a pre-bound listener.
///
/// Accepting a `TcpListener` lets the caller bind port 0 and read the actual
/// port before starting.
pub async fn serve_on(ledger: HonorLedger, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let app = build_router(ledger);

    tracing::info!("kudos API listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Start the kudos API server on `0.0.0.0:port`.
pub async fn serve(ledger: HonorLedger, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    serve_on(ledger, listener).await
}
