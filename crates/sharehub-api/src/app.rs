//! Application builder and server loop.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use sharehub_core::error::AppError;
use sharehub_core::result::AppResult;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Serve `app` on `listener` until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish; archive exports observe the
/// same token and abort on their own.
pub async fn serve(listener: TcpListener, app: Router, shutdown: CancellationToken) -> AppResult<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::internal(format!("Failed to read listener address: {e}")))?;
    info!(%addr, "ShareHub listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))
}
