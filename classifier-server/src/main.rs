//! Cluster Classifier Inference API - Main Entry Point
//!
//! Usage:
//!     classifier-server --port 8020 --backend-url http://localhost:8001
//!     classifier-server --model classifier --workers 16

use clap::Parser;
use classifier_grpc::{BackendConfig, InferenceBackend, TritonBackend};
use classifier_server::config::{default_workers, DEFAULT_MAX_FILES};
use classifier_server::{AppState, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long startup waits on the backend readiness probe.
const READY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "classifier-server")]
#[command(about = "Batch image classification API backed by Triton")]
#[command(version)]
struct Args {
    /// HTTP bind host
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP port
    #[arg(short, long, default_value = "8020")]
    port: u16,

    /// Triton gRPC endpoint
    #[arg(long, default_value = classifier_grpc::DEFAULT_ENDPOINT)]
    backend_url: String,

    /// Model name on the backend
    #[arg(long, default_value = classifier_grpc::DEFAULT_MODEL_NAME)]
    model: String,

    /// Model version (empty = latest)
    #[arg(long, default_value = "")]
    model_version: String,

    /// Input tensor name
    #[arg(long, default_value = classifier_grpc::DEFAULT_INPUT_NAME)]
    input_name: String,

    /// Output tensor name
    #[arg(long, default_value = classifier_grpc::DEFAULT_OUTPUT_NAME)]
    output_name: String,

    /// Deadline for each backend call in seconds (unset = wait indefinitely)
    #[arg(long)]
    backend_timeout_secs: Option<u64>,

    /// Maximum images per request
    #[arg(long, default_value_t = DEFAULT_MAX_FILES)]
    max_files: usize,

    /// Preprocessing threads (default: cores, at most 16)
    #[arg(long)]
    workers: Option<usize>,

    /// Requests allowed in the pipeline at once
    #[arg(long, default_value = "4")]
    max_concurrent_requests: usize,

    /// Request body limit in MiB (unset = no limit)
    #[arg(long)]
    max_upload_mb: Option<usize>,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            max_files: self.max_files,
            preprocess_workers: self.workers.unwrap_or_else(default_workers),
            max_concurrent_requests: self.max_concurrent_requests,
            max_upload_bytes: self.max_upload_mb.map(|mb| mb.saturating_mul(1024 * 1024)),
            backend: BackendConfig {
                endpoint: self.backend_url,
                model_name: self.model,
                model_version: self.model_version,
                input_name: self.input_name,
                output_name: self.output_name,
                timeout: self.backend_timeout_secs.map(Duration::from_secs),
                ..Default::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: classifier-server panicked");
        eprintln!(
            "  Location: {}",
            panic_info
                .location()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        eprintln!(
            "  Message: {}",
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .unwrap_or(&"<no message>")
        );
    }));

    let args = Args::parse();
    classifier_core::tracing::init_with_filter(&args.log_level);

    info!("Initializing Cluster Classifier Inference API");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));

    let config = args.into_config();
    info!("  Backend: {} (model {})", config.backend.endpoint, config.backend.model_name);
    let backend = TritonBackend::connect_lazy(config.backend.clone())?;

    match tokio::time::timeout(READY_PROBE_TIMEOUT, backend.ready()).await {
        Ok(Ok(true)) => info!("Backend model is ready"),
        Ok(Ok(false)) => warn!("Backend reachable but model is not ready"),
        Ok(Err(e)) => warn!("Backend not reachable yet: {}", e),
        Err(_) => warn!("Backend readiness probe timed out"),
    }

    let state = Arc::new(AppState::new(config, Arc::new(backend))?);
    info!(
        "  Preprocessing: {} workers, input {:?}",
        state.preprocessor.workers(),
        state.preprocessor.transform().output_shape()
    );
    classifier_server::serve(state).await?;

    info!("Server shutdown complete");
    Ok(())
}
