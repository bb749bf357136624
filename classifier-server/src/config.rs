//! Server configuration.

use classifier_grpc::BackendConfig;

use crate::error::{Result, ServerError};

/// Largest number of images accepted in one request.
pub const DEFAULT_MAX_FILES: usize = 100_000;

/// Upper bound on preprocessing threads.
pub const MAX_DEFAULT_WORKERS: usize = 16;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests with more `files` parts than this are rejected unprocessed
    pub max_files: usize,
    /// Threads in the shared preprocessing pool
    pub preprocess_workers: usize,
    /// Requests allowed in the preprocess+infer pipeline at once
    pub max_concurrent_requests: usize,
    /// Request body limit in bytes; `None` accepts bodies of any size
    pub max_upload_bytes: Option<usize>,
    pub backend: BackendConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8020,
            max_files: DEFAULT_MAX_FILES,
            preprocess_workers: default_workers(),
            max_concurrent_requests: 4,
            max_upload_bytes: None,
            backend: BackendConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.max_files == 0 {
            return Err(ServerError::Config("max_files must be at least 1".to_string()));
        }
        if self.preprocess_workers == 0 {
            return Err(ServerError::Config(
                "preprocess_workers must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ServerError::Config(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One thread per core, capped at [`MAX_DEFAULT_WORKERS`].
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.max_files, 100_000);
        assert_eq!(config.bind_address(), "0.0.0.0:8020");
        assert!(config.preprocess_workers >= 1);
        assert!(config.preprocess_workers <= MAX_DEFAULT_WORKERS);
        assert_eq!(config.max_upload_bytes, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = ServerConfig {
            preprocess_workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            max_concurrent_requests: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
