//! Sending batches and reporting results.

use classifier_core::batch;
use classifier_core::BatchResponse;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::SubmitConfig;
use crate::error::{Result, SubmitError};
use crate::scan::{collect_images, mime_for};

/// Multipart field every file is attached under.
pub const FILES_FIELD: &str = "files";

/// What the service said about one batch.
#[derive(Debug)]
pub enum BatchOutcome {
    Classified(BatchResponse),
    Rejected { status: StatusCode, body: String },
}

/// Totals for a whole run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub images_found: usize,
    pub batches_sent: usize,
    pub batches_rejected: usize,
    pub images_classified: usize,
}

/// HTTP client for the predict endpoint.
pub struct Submitter {
    client: reqwest::Client,
    url: String,
}

impl Submitter {
    pub fn new(config: &SubmitConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: config.url.clone(),
        })
    }

    /// Post one batch and wait for the answer.
    ///
    /// Non-200 answers come back as [`BatchOutcome::Rejected`]; only transport
    /// and local read failures are errors.
    pub async fn send_batch(&self, paths: &[PathBuf]) -> Result<BatchOutcome> {
        let mut form = Form::new();
        for path in paths {
            let bytes = tokio::fs::read(path).await.map_err(|source| SubmitError::Read {
                path: path.clone(),
                source,
            })?;
            let part = Part::bytes(bytes)
                .file_name(file_name(path))
                .mime_str(mime_for(path))?;
            form = form.part(FILES_FIELD, part);
        }

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let status = response.status();

        if status == StatusCode::OK {
            Ok(BatchOutcome::Classified(response.json().await?))
        } else {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Could not read error body for status {}: {}", status, e);
                    String::new()
                }
            };
            Ok(BatchOutcome::Rejected { status, body })
        }
    }
}

/// Send every image under `config.image_dir`, one batch at a time.
///
/// Progress and predictions are written to `out`. A rejected batch is
/// reported and skipped; a transport failure ends the run.
pub async fn run<W: Write>(config: &SubmitConfig, out: &mut W) -> Result<RunSummary> {
    let images = collect_images(&config.image_dir)?;
    let batches = batch::partition(&images, config.batch_size)?;

    debug!(
        "{} batches planned",
        batch::batch_count(images.len(), config.batch_size)
    );

    let mut summary = RunSummary {
        images_found: images.len(),
        ..Default::default()
    };

    writeln!(
        out,
        "Found {} images. Sending in batches of {}...",
        images.len(),
        config.batch_size
    )?;

    let submitter = Submitter::new(config)?;

    for (i, chunk) in batches.enumerate() {
        writeln!(out, "Sending batch {} with {} images...", i + 1, chunk.len())?;
        debug!("POST {} ({} files)", config.url, chunk.len());

        let outcome = submitter.send_batch(chunk).await?;
        summary.batches_sent += 1;

        match &outcome {
            BatchOutcome::Classified(response) => {
                summary.images_classified += response.results.len();
            }
            BatchOutcome::Rejected { status, .. } => {
                warn!("Batch {} rejected with status {}", i + 1, status);
                summary.batches_rejected += 1;
            }
        }

        write_outcome(out, &outcome)?;
    }

    info!(
        images = summary.images_found,
        batches = summary.batches_sent,
        rejected = summary.batches_rejected,
        classified = summary.images_classified,
        "Run complete"
    );

    Ok(summary)
}

/// Print predictions and timing for one batch.
pub fn write_outcome<W: Write>(out: &mut W, outcome: &BatchOutcome) -> std::io::Result<()> {
    match outcome {
        BatchOutcome::Classified(response) => {
            for prediction in &response.results {
                writeln!(
                    out,
                    "{} → Cluster {}",
                    prediction.filename, prediction.predicted_cluster
                )?;
            }
            let timing = &response.timing;
            writeln!(
                out,
                "Timing: {} images processed in {} seconds.",
                timing.total_images, timing.total_sec
            )?;
            writeln!(
                out,
                "Average latency per image: {} ms",
                timing.average_latency_per_image_ms
            )?;
            writeln!(out, "Batch processed successfully!")
        }
        BatchOutcome::Rejected { status, body } => {
            writeln!(out, "Error: {} {}", status.as_u16(), body)
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use classifier_core::{Prediction, Timing};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_write_classified() {
        let outcome = BatchOutcome::Classified(BatchResponse {
            results: vec![
                Prediction {
                    filename: "a.png".to_string(),
                    predicted_cluster: 3,
                },
                Prediction {
                    filename: "b.jpg".to_string(),
                    predicted_cluster: 0,
                },
            ],
            timing: Timing::new(
                2,
                Duration::from_millis(100),
                Duration::from_millis(300),
                Duration::from_millis(500),
            ),
        });

        let mut out = Vec::new();
        write_outcome(&mut out, &outcome).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "a.png → Cluster 3\n\
             b.jpg → Cluster 0\n\
             Timing: 2 images processed in 0.5 seconds.\n\
             Average latency per image: 250 ms\n\
             Batch processed successfully!\n"
        );
    }

    #[test]
    fn test_write_rejected() {
        let outcome = BatchOutcome::Rejected {
            status: StatusCode::BAD_REQUEST,
            body: "{\"error\":\"No valid images found.\"}".to_string(),
        };

        let mut out = Vec::new();
        write_outcome(&mut out, &outcome).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Error: 400 {\"error\":\"No valid images found.\"}\n"
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/tmp/x/y.png")), "y.png");
    }
}
