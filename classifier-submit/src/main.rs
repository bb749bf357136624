//! Cluster Classifier Batch Submitter - Main Entry Point
//!
//! Usage:
//!     classifier-submit --dir ./images
//!     classifier-submit --dir ./images --url http://gpu-box:8020/predict_batch/ --batch-size 500

use clap::Parser;
use classifier_core::batch::DEFAULT_BATCH_SIZE;
use classifier_submit::config::DEFAULT_URL;
use classifier_submit::SubmitConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "classifier-submit")]
#[command(about = "Send a directory of images to the cluster classifier in batches")]
#[command(version)]
struct Args {
    /// Directory containing .png/.jpg/.jpeg images
    #[arg(short, long)]
    dir: PathBuf,

    /// Predict endpoint URL
    #[arg(short, long, default_value = DEFAULT_URL)]
    url: String,

    /// Images per request
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Per-request timeout in seconds (unset = wait indefinitely)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: classifier-submit panicked");
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

    let config = SubmitConfig {
        url: args.url,
        image_dir: args.dir,
        batch_size: args.batch_size,
        timeout: args.timeout_secs.map(Duration::from_secs),
    };

    info!("Submitting {} to {}", config.image_dir.display(), config.url);

    match classifier_submit::run(&config, &mut std::io::stdout()).await {
        Ok(summary) => {
            info!(
                "Done: {} of {} images classified across {} batches",
                summary.images_classified, summary.images_found, summary.batches_sent
            );
            Ok(())
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            Err(e.into())
        }
    }
}
