//! Submitter error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Core(#[from] classifier_core::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SubmitError>;
