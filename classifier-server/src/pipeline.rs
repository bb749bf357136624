//! The per-request batch pipeline: decode, stack, infer, decode output.

use classifier_core::{batch, scores, BatchResponse, ImageFile, Timing};
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Classify one uploaded batch.
///
/// Images that fail to decode are dropped; everything else that goes wrong
/// fails the whole request.
pub async fn predict(state: &AppState, files: Vec<ImageFile>) -> Result<BatchResponse> {
    let submitted = files.len();
    let _permit = state.admit().await?;

    let started = Instant::now();

    let preprocessor = state.preprocessor.clone();
    let outcome = tokio::task::spawn_blocking(move || preprocessor.run(files))
        .await
        .map_err(|e| ServerError::Internal(format!("preprocessing task failed: {}", e)))?;

    let preprocessing = started.elapsed();

    if !outcome.skipped.is_empty() {
        warn!(
            "Dropped {} of {} images that failed to decode",
            outcome.skipped.len(),
            submitted
        );
    }
    if outcome.images.is_empty() {
        return Err(ServerError::NoValidImages);
    }

    let input = batch::stack(&outcome.images)?;

    let inference_started = Instant::now();
    let output = state.backend.infer(input).await.map_err(|e| {
        if e.is_unavailable() {
            warn!("Backend at {} is unreachable", state.config.backend.endpoint);
        }
        e
    })?;
    let inference = inference_started.elapsed();
    let total = started.elapsed();

    let results = scores::assign(&outcome.images, output.view())?;
    let timing = Timing::new(results.len(), preprocessing, inference, total);

    info!(
        images = timing.total_images,
        preprocessing_sec = timing.preprocessing_sec,
        inference_sec = timing.inference_sec,
        total_sec = timing.total_sec,
        "Batch classified"
    );

    Ok(BatchResponse { results, timing })
}
