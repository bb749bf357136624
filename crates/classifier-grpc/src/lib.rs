//! Inference backend client for the cluster classifier.
//!
//! Talks to a Triton (KServe v2) server over gRPC. The handler side only sees
//! the [`InferenceBackend`] trait, so tests can plug in a synthetic model.

mod backend;
mod error;

pub mod proto {
    //! Compiled protobuf definitions for `package inference`.
    tonic::include_proto!("inference");
}

pub use backend::{
    build_request, decode_response, BackendConfig, InferenceBackend, TritonBackend,
    DEFAULT_ENDPOINT, DEFAULT_INPUT_NAME, DEFAULT_MODEL_NAME, DEFAULT_OUTPUT_NAME,
};
pub use error::{BackendError, Result};
