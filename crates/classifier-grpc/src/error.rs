//! Backend error types.

use thiserror::Error;
use tonic::Code;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("invalid backend endpoint: {0}")]
    Endpoint(String),

    /// Backend could not be reached or did not answer in time
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend returned {code:?}: {message}")]
    Status { code: Code, message: String },

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl From<tonic::Status> for BackendError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            Code::Unavailable | Code::DeadlineExceeded => {
                BackendError::Unavailable(status.message().to_string())
            }
            code => BackendError::Status {
                code,
                message: status.message().to_string(),
            },
        }
    }
}

impl BackendError {
    /// Whether the failure was the backend being unreachable rather than
    /// rejecting the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BackendError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
