//! Response model for `POST /predict_batch/`.
//!
//! The server serializes these and the submitter deserializes them, so both
//! sides agree on the wire shape.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Predicted cluster for one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub filename: String,
    pub predicted_cluster: usize,
}

/// Per-request latency breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub total_images: usize,
    pub preprocessing_sec: f64,
    pub inference_sec: f64,
    pub total_sec: f64,
    pub average_latency_per_image_ms: f64,
}

impl Timing {
    /// Build a timing record for `total_images` surviving images.
    ///
    /// Seconds are rounded to 4 decimals, the per-image average to 2.
    pub fn new(
        total_images: usize,
        preprocessing: Duration,
        inference: Duration,
        total: Duration,
    ) -> Self {
        let average_ms = if total_images == 0 {
            0.0
        } else {
            total.as_secs_f64() / total_images as f64 * 1000.0
        };

        Self {
            total_images,
            preprocessing_sec: round_to(preprocessing.as_secs_f64(), 4),
            inference_sec: round_to(inference.as_secs_f64(), 4),
            total_sec: round_to(total.as_secs_f64(), 4),
            average_latency_per_image_ms: round_to(average_ms, 2),
        }
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<Prediction>,
    pub timing: Timing,
}

/// Error response body, used for both 4xx and 5xx.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
