//! Shared application state.

use classifier_core::{Preprocessor, Transform};
use classifier_grpc::InferenceBackend;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Built once at startup and handed to every request.
pub struct AppState {
    pub config: ServerConfig,
    pub preprocessor: Arc<Preprocessor>,
    pub backend: Arc<dyn InferenceBackend>,
    admission: Semaphore,
}

impl AppState {
    pub fn new(config: ServerConfig, backend: Arc<dyn InferenceBackend>) -> Result<Self> {
        config.validate()?;

        let preprocessor = Preprocessor::new(Transform::default(), config.preprocess_workers)?;
        let admission = Semaphore::new(config.max_concurrent_requests);

        Ok(Self {
            config,
            preprocessor: Arc::new(preprocessor),
            backend,
            admission,
        })
    }

    /// Wait for a pipeline slot. The slot is released when the permit drops.
    pub async fn admit(&self) -> Result<SemaphorePermit<'_>> {
        self.admission
            .acquire()
            .await
            .map_err(|_| ServerError::Internal("request admission closed".to_string()))
    }
}
