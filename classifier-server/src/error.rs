//! Error types for the server

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use classifier_core::ErrorBody;
use classifier_grpc::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Upload limit is {limit} images.")]
    TooManyFiles { limit: usize },

    #[error("No valid images found.")]
    NoValidImages,

    #[error("{0}")]
    BadRequest(String),

    #[error("Request body exceeds the upload size limit.")]
    PayloadTooLarge,

    #[error(transparent)]
    Core(#[from] classifier_core::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::TooManyFiles { .. }
            | ServerError::NoValidImages
            | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for ServerError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge
        } else {
            ServerError::BadRequest(e.body_text())
        }
    }
}

impl From<MultipartRejection> for ServerError {
    fn from(rejection: MultipartRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(detail = %self, "Batch prediction failed");
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
