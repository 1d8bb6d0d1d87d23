//! API route definitions

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use crate::auth::require_auth;
use crate::handlers;
use crate::middleware::rate_limit;
use crate::state::AppState;

/// Create the full API router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health endpoints (unauthenticated)
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::liveness))
        .route("/health/ready", get(handlers::readiness))
        .with_state(state.clone())
        // API v1 routes with state
        .nest("/api/v1/templates", template_routes(state))
}

/// Template routes; every endpoint requires a valid bearer credential
fn template_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::templates::create_template).get(handlers::templates::list_templates),
        )
        .route("/id/{id}", get(handlers::templates::get_template_by_id))
        .route(
            "/{namespace}/{name}",
            get(handlers::templates::get_template).delete(handlers::templates::remove_template),
        )
        .route(
            "/{namespace}/{name}/trusted",
            put(handlers::templates::update_trusted),
        )
        .route(
            "/{namespace}/{name}/versions",
            get(handlers::versions::list_versions),
        )
        .route(
            "/{namespace}/{name}/versions/{version}",
            delete(handlers::versions::remove_version),
        )
        .route(
            "/{namespace}/{name}/metrics",
            get(handlers::versions::list_versions_with_metrics),
        )
        .route("/{namespace}/{name}/tags", get(handlers::tags::list_tags))
        .route(
            "/{namespace}/{name}/tags/{tag}",
            put(handlers::tags::put_tag).delete(handlers::tags::remove_tag),
        )
        .layer(from_fn_with_state(state.clone(), require_auth))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .with_state(state)
}
