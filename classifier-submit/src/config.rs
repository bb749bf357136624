//! Submitter configuration.

use classifier_core::batch::DEFAULT_BATCH_SIZE;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://localhost:8020/predict_batch/";

#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Full URL of the predict endpoint
    pub url: String,
    /// Directory scanned for images (not recursive)
    pub image_dir: PathBuf,
    pub batch_size: usize,
    /// Whole-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            image_dir: PathBuf::from("."),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: None,
        }
    }
}
