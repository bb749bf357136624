//! Batch submitter for the cluster classifier API.
//!
//! Scans a directory for images, splits them into fixed-size batches and
//! posts each batch as one multipart request, waiting for the answer before
//! sending the next.

pub mod config;
mod error;
pub mod scan;
pub mod submit;

pub use config::SubmitConfig;
pub use error::{Result, SubmitError};
pub use submit::{run, BatchOutcome, RunSummary, Submitter};
