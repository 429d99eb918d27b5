//! # sharehub-api
//!
//! HTTP layer for ShareHub built on Axum.
//!
//! Every request names a share token as its first path segment. The
//! remainder addresses a path inside the shared target.

pub mod app;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod render;
pub mod router;
pub mod state;

pub use app::{build_app, serve};
pub use error::ApiError;
pub use state::AppState;
