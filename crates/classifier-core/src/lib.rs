//! # Cluster Classifier Core
//!
//! Shared pieces of the batch classification pipeline:
//! - **preprocess**: decode, resize and normalize images into CHW tensors
//! - **batch**: fixed-size partitioning and tensor stacking
//! - **scores**: arg-max decoding of backend output into cluster indices
//! - **types**: the JSON response model shared by server and submitter
//! - **error**: common error type
//! - **tracing**: logging setup

pub mod batch;
pub mod error;
pub mod preprocess;
pub mod scores;
pub mod tracing;
pub mod types;

pub use error::{Error, Result};
pub use preprocess::{ImageFile, PreprocessOutcome, Preprocessed, Preprocessor, Transform};
pub use types::{BatchResponse, ErrorBody, Prediction, Timing};
