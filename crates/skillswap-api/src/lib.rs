//! # skillswap-api: Axum API for SkillSwap
//!
//! Identity guard plus the swap request negotiation lifecycle between a
//! requester and a provider.
//!
//! ## API Surface
//!
//! | Prefix               | Module                       | Auth     |
//! |----------------------|------------------------------|----------|
//! | `/v1/swap-requests*` | [`routes::swap_requests`]    | guard    |
//! | `/v1/auth/*`         | [`routes::auth`]             | guard    |
//! | `/health/*`          | this module                  | none     |
//! | `/openapi.json`      | [`openapi`]                  | none     |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → identity_guard → Handler
//! ```
//!
//! ## Layering
//!
//! Handlers talk to [`service::SwapService`], which applies the pure rules
//! from `skillswap-state` and persists through a
//! [`repository::SwapRequestRepository`]. Principals come from a
//! [`directory::PrincipalDirectory`]. Both ports have PostgreSQL adapters in
//! [`db`] and in-memory adapters for tests and local runs.

pub mod auth;
pub mod db;
pub mod directory;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and the OpenAPI document are mounted outside the identity
/// guard so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::swap_requests::router())
        .merge(routes::auth::router())
        .layer(from_fn_with_state(state.clone(), auth::identity_guard));

    let public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router());

    Router::new()
        .merge(public)
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the database (if any) answers a query.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, (StatusCode, &'static str)> {
    if let Some(pool) = &state.db_pool {
        if let Err(err) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::error!(error = %err, "readiness check failed: database unreachable");
            return Err((StatusCode::SERVICE_UNAVAILABLE, "database unavailable"));
        }
    }
    Ok("ready")
}
