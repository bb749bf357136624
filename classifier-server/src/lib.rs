//! Cluster Classifier Inference API
//!
//! Accepts a multipart batch of images, preprocesses them on a shared worker
//! pool, runs one forward pass on a Triton backend and answers with the
//! predicted cluster of every image plus a latency breakdown.
//!
//! ## Module Structure
//!
//! - `config` - Server and backend configuration
//! - `error` - Error type and its HTTP mapping
//! - `handlers` - HTTP endpoint handlers
//! - `pipeline` - decode, stack, infer, decode-output
//! - `state` - Shared per-process state

pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
mod shutdown;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use shutdown::shutdown_signal;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Build the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = match state.config.max_upload_bytes {
        Some(bytes) => DefaultBodyLimit::max(bytes),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/predict_batch/", post(handlers::predict_batch))
        .route("/predict_batch", post(handlers::predict_batch))
        .route("/health", get(handlers::health))
        .layer(body_limit)
        .with_state(state)
}

/// Bind the configured address and serve until a shutdown signal arrives.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr = state.config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
