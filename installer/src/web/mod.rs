//! Web front-end for the install wizard.
//!
//! Each browser session is identified by a cookie; all step state lives in the session
//! store behind the engine.

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod cookie;
pub mod error;
pub mod patterns;
pub mod render;
pub mod routes;
pub mod state;

pub use state::WebState;

/// Build the router with all routes
pub fn build_router(state: WebState) -> Router {
    Router::new()
        .route("/", get(routes::index).fallback(routes::not_found))
        .route(
            "/page/submit",
            post(routes::submit).fallback(routes::not_found),
        )
        .route("/page/:page", get(routes::show_page).fallback(routes::not_found))
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server and run until the process is stopped
pub async fn serve(state: WebState, bind: &str) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!("Install wizard listening on http://{}", bind);
    log::info!("[PHASE: web] [STEP: serve] Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")?;

    log::info!("[PHASE: web] [STEP: serve] Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
