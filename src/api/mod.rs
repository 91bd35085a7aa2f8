//! API module
//!
//! HTTP API endpoints and middleware.

pub mod keys;
pub mod middleware;
mod reports;
pub mod routes;

use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::export::Exporter;

pub use routes::create_router;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub exporter: Exporter,
}

impl AppState {
    pub fn new(pool: PgPool, exporter: Exporter) -> Self {
        Self { pool, exporter }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Exporter {
    fn from_ref(state: &AppState) -> Self {
        state.exporter
    }
}

/// Build the full application: `/health` plus the gated `/api/v1` routes.
///
/// Layers run outside-in: auth resolves the principal, logging records it,
/// then each route group's role gate decides.
pub fn build_router(state: AppState) -> Router {
    let api_routes = create_router()
        .layer(from_fn(middleware::logging_middleware))
        .layer(from_fn_with_state(
            state.pool.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
