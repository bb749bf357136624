//! Triton gRPC backend.

use ndarray::{Array2, Array4};
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use crate::error::{BackendError, Result};
use crate::proto::grpc_inference_service_client::GrpcInferenceServiceClient;
use crate::proto::model_infer_request::{InferInputTensor, InferRequestedOutputTensor};
use crate::proto::{ModelInferRequest, ModelInferResponse, ModelReadyRequest};

/// Triton's default gRPC address.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8001";
pub const DEFAULT_MODEL_NAME: &str = "classifier";
pub const DEFAULT_INPUT_NAME: &str = "input__0";
pub const DEFAULT_OUTPUT_NAME: &str = "output__0";

const FP32: &str = "FP32";
const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Where the model lives and how to address its tensors.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// gRPC endpoint, e.g. `http://localhost:8001`
    pub endpoint: String,
    pub model_name: String,
    /// Empty selects the latest version
    pub model_version: String,
    pub input_name: String,
    pub output_name: String,
    /// Per-call deadline; `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// Largest response the client will decode
    pub max_message_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_version: String::new(),
            input_name: DEFAULT_INPUT_NAME.to_string(),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            timeout: None,
            connect_timeout: None,
            max_message_size: 64 * 1024 * 1024,
        }
    }
}

/// A model that maps a `[N, C, H, W]` batch to `[N, classes]` scores.
#[tonic::async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Run one forward pass over the whole batch.
    async fn infer(&self, batch: Array4<f32>) -> Result<Array2<f32>>;

    /// Whether the model is loaded and accepting requests.
    async fn ready(&self) -> Result<bool>;
}

/// [`InferenceBackend`] backed by a Triton server.
pub struct TritonBackend {
    client: GrpcInferenceServiceClient<Channel>,
    config: BackendConfig,
}

impl TritonBackend {
    /// Build a client without dialing; the connection is made on first use.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect_lazy(config: BackendConfig) -> Result<Self> {
        let mut endpoint = Endpoint::from_shared(config.endpoint.clone())
            .map_err(|e| BackendError::Endpoint(format!("{}: {}", config.endpoint, e)))?;

        if let Some(timeout) = config.timeout {
            endpoint = endpoint.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            endpoint = endpoint.connect_timeout(timeout);
        }

        let client = GrpcInferenceServiceClient::new(endpoint.connect_lazy())
            .max_decoding_message_size(config.max_message_size)
            .max_encoding_message_size(usize::MAX);

        Ok(Self { client, config })
    }
}

#[tonic::async_trait]
impl InferenceBackend for TritonBackend {
    async fn infer(&self, batch: Array4<f32>) -> Result<Array2<f32>> {
        let rows = batch.shape()[0];
        let request = build_request(&self.config, &batch);
        drop(batch);

        debug!(
            "Sending {} images to model {} at {}",
            rows, self.config.model_name, self.config.endpoint
        );

        let response = self.client.clone().model_infer(request).await?.into_inner();
        let scores = decode_response(response, &self.config.output_name)?;

        if scores.nrows() != rows {
            return Err(BackendError::MalformedResponse(format!(
                "expected {} output rows, got {}",
                rows,
                scores.nrows()
            )));
        }

        Ok(scores)
    }

    async fn ready(&self) -> Result<bool> {
        let request = ModelReadyRequest {
            name: self.config.model_name.clone(),
            version: self.config.model_version.clone(),
        };
        let response = self.client.clone().model_ready(request).await?;
        Ok(response.into_inner().ready)
    }
}

/// Encode a batch as a single FP32 input with raw little-endian contents.
pub fn build_request(config: &BackendConfig, batch: &Array4<f32>) -> ModelInferRequest {
    let shape: Vec<i64> = batch.shape().iter().map(|&d| d as i64).collect();

    let mut raw = Vec::with_capacity(batch.len() * F32_BYTES);
    for value in batch.iter() {
        raw.extend_from_slice(&value.to_le_bytes());
    }

    ModelInferRequest {
        model_name: config.model_name.clone(),
        model_version: config.model_version.clone(),
        inputs: vec![InferInputTensor {
            name: config.input_name.clone(),
            datatype: FP32.to_string(),
            shape,
            ..Default::default()
        }],
        outputs: vec![InferRequestedOutputTensor {
            name: config.output_name.clone(),
            ..Default::default()
        }],
        raw_input_contents: vec![raw],
        ..Default::default()
    }
}

/// Pull the named 2-D FP32 output out of a response.
pub fn decode_response(response: ModelInferResponse, output_name: &str) -> Result<Array2<f32>> {
    let position = response
        .outputs
        .iter()
        .position(|o| o.name == output_name)
        .ok_or_else(|| {
            BackendError::MalformedResponse(format!("output '{}' missing", output_name))
        })?;
    let output = &response.outputs[position];

    if output.datatype != FP32 {
        return Err(BackendError::MalformedResponse(format!(
            "output '{}' has datatype {}, expected {}",
            output_name, output.datatype, FP32
        )));
    }

    let shape = output
        .shape
        .iter()
        .map(|&d| usize::try_from(d))
        .collect::<std::result::Result<Vec<usize>, _>>()
        .map_err(|_| {
            BackendError::MalformedResponse(format!("negative dimension in {:?}", output.shape))
        })?;

    let (rows, classes) = match shape.as_slice() {
        [rows, classes] => (*rows, *classes),
        other => {
            return Err(BackendError::MalformedResponse(format!(
                "expected 2-D output, got shape {:?}",
                other
            )))
        }
    };

    let values: Vec<f32> = if let Some(raw) = response.raw_output_contents.get(position) {
        if raw.len() % F32_BYTES != 0 {
            return Err(BackendError::MalformedResponse(format!(
                "raw output length {} is not a multiple of {}",
                raw.len(),
                F32_BYTES
            )));
        }
        raw.chunks_exact(F32_BYTES)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    } else if let Some(contents) = &output.contents {
        contents.fp32_contents.clone()
    } else {
        return Err(BackendError::MalformedResponse(format!(
            "output '{}' carries no data",
            output_name
        )));
    };

    Ok(Array2::from_shape_vec((rows, classes), values)?)
}
