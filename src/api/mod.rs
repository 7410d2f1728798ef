//! HTTP API for the ledger.
//!
//! Thin axum layer over `Ledger`. CORS is open for local tools.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use routes::AppState;

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/parlays",
            get(routes::list_parlays).post(routes::create_parlay),
        )
        .route(
            "/api/parlays/:id",
            get(routes::get_parlay).delete(routes::delete_parlay),
        )
        .route(
            "/api/parlays/:id/results",
            axum::routing::put(routes::update_results),
        )
        .route("/api/stats", get(routes::get_stats))
        .route("/api/payouts", get(routes::get_payouts))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API listener on {addr}"))?;
    let local = listener.local_addr().context("Listener has no local address")?;
    info!(addr = %local, store = state.store_name(), "API server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    info!("API server stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
