//! Route definitions for the ShareHub HTTP server.
//!
//! The first path segment is always a share token. Methods other than
//! GET, HEAD and POST are answered with 405 by the method router.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_upload = usize::try_from(state.config.upload.max_upload_size_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/{token}",
            get(handlers::share::download_root).post(handlers::share::upload_root),
        )
        .route(
            "/{token}/",
            get(handlers::share::download_root).post(handlers::share::upload_root),
        )
        .route(
            "/{token}/{*rest}",
            get(handlers::share::download_path).post(handlers::share::upload_path),
        )
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}
