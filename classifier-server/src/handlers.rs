//! HTTP request handlers
//!
//! Endpoints:
//! - POST /predict_batch/: classify a multipart batch of images
//! - GET  /health:        liveness plus backend model readiness

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use classifier_core::{BatchResponse, ImageFile};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Result, ServerError};
use crate::pipeline;
use crate::state::AppState;

/// Multipart field name carrying the images.
pub const FILES_FIELD: &str = "files";

/// Classify every image in the upload.
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchResponse>> {
    let mut multipart = multipart?;
    let files = read_files(&mut multipart, state.config.max_files).await?;
    info!("Received {} files", files.len());

    let response = pipeline::predict(&state, files).await?;
    Ok(Json(response))
}

/// Collect the `files` parts in arrival order.
///
/// Past `limit` parts the rest of the body is still consumed, but nothing
/// more is buffered, and the request is rejected.
async fn read_files(multipart: &mut Multipart, limit: usize) -> Result<Vec<ImageFile>> {
    let mut files = Vec::new();
    let mut count = 0usize;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        count += 1;
        if count > limit {
            if !files.is_empty() {
                files = Vec::new();
            }
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        files.push(ImageFile::new(filename, bytes.to_vec()));
    }

    if count > limit {
        return Err(ServerError::TooManyFiles { limit });
    }

    Ok(files)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend_ready: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let backend_ready = match state.backend.ready().await {
        Ok(ready) => ready,
        Err(e) => {
            debug!("Backend readiness check failed: {}", e);
            false
        }
    };

    Json(HealthResponse {
        status: "ok",
        backend_ready,
    })
}
