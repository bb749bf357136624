//! Common error types for the classifier pipeline.

use thiserror::Error;

/// Error type for preprocessing and batch assembly.
#[derive(Error, Debug)]
pub enum Error {
    /// Image bytes could not be decoded
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Tensor shapes did not line up
    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Preprocessing pool could not be built
    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// Caller passed something unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias using the core Error.
pub type Result<T> = std::result::Result<T, Error>;
