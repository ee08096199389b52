use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::get};
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
///
/// Trailing slashes are trimmed before routing, so the router is wrapped
/// rather than layered.
pub fn build_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/status", get(handlers::get_status))
        .route("/stats", get(handlers::get_stats))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    NormalizePath::trim_trailing_slash(router)
}
