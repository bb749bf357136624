//! Integration test: the submitter against an in-process stub of the API

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use classifier_core::{BatchResponse, ErrorBody, Prediction, Timing};
use classifier_submit::{run, SubmitConfig, SubmitError};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Records the filenames of every request; optionally rejects the first one.
#[derive(Clone, Default)]
struct Stub {
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    reject_first: bool,
}

async fn predict(State(stub): State<Stub>, mut multipart: Multipart) -> Response {
    let mut names = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        assert_eq!(field.name(), Some("files"));
        names.push(field.file_name().unwrap_or_default().to_string());
        field.bytes().await.unwrap();
    }

    let count = {
        let mut batches = stub.batches.lock();
        batches.push(names.clone());
        batches.len()
    };

    if stub.reject_first && count == 1 {
        let body = ErrorBody {
            error: "No valid images found.".to_string(),
        };
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    let results: Vec<Prediction> = names
        .iter()
        .enumerate()
        .map(|(i, name)| Prediction {
            filename: name.clone(),
            predicted_cluster: i % 4,
        })
        .collect();
    let timing = Timing::new(
        results.len(),
        Duration::from_millis(2),
        Duration::from_millis(3),
        Duration::from_millis(5),
    );

    Json(BatchResponse { results, timing }).into_response()
}

async fn spawn_stub(stub: Stub) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/predict_batch/", post(predict))
        .with_state(stub);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/predict_batch/", addr)
}

fn write_images(dir: &Path, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let name = format!("img_{:03}.jpg", i);
            std::fs::write(dir.join(&name), [0xFF, 0xD8, i as u8]).unwrap();
            name
        })
        .collect()
}

fn config(url: String, dir: &Path, batch_size: usize) -> SubmitConfig {
    SubmitConfig {
        url,
        image_dir: dir.to_path_buf(),
        batch_size,
        timeout: Some(Duration::from_secs(10)),
    }
}

#[tokio::test]
async fn test_single_batch_when_under_limit() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_images(dir.path(), 5);
    std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

    let stub = Stub::default();
    let url = spawn_stub(stub.clone()).await;

    let mut out = Vec::new();
    let summary = run(&config(url, dir.path(), 1000), &mut out).await.unwrap();

    assert_eq!(summary.images_found, 5);
    assert_eq!(summary.batches_sent, 1);
    assert_eq!(summary.images_classified, 5);

    let batches = stub.batches.lock();
    assert_eq!(batches.len(), 1);
    let sent: HashSet<&String> = batches[0].iter().collect();
    let expected: HashSet<&String> = written.iter().collect();
    assert_eq!(sent, expected);
    assert_eq!(batches[0].len(), 5);

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Found 5 images."));
    for name in &written {
        assert_eq!(out.matches(&format!("{} → Cluster", name)).count(), 1);
    }
}

#[tokio::test]
async fn test_splits_into_ceil_batches() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_images(dir.path(), 7);

    let stub = Stub::default();
    let url = spawn_stub(stub.clone()).await;

    let mut out = Vec::new();
    let summary = run(&config(url, dir.path(), 3), &mut out).await.unwrap();

    assert_eq!(summary.batches_sent, 3);
    assert_eq!(summary.images_classified, 7);

    let batches = stub.batches.lock();
    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![3, 3, 1]);

    let mut all: Vec<String> = batches.iter().flatten().cloned().collect();
    all.sort();
    assert_eq!(all, written);
}

#[tokio::test]
async fn test_rejected_batch_does_not_stop_run() {
    let dir = tempfile::tempdir().unwrap();
    write_images(dir.path(), 4);

    let stub = Stub {
        reject_first: true,
        ..Default::default()
    };
    let url = spawn_stub(stub.clone()).await;

    let mut out = Vec::new();
    let summary = run(&config(url, dir.path(), 2), &mut out).await.unwrap();

    assert_eq!(summary.batches_sent, 2);
    assert_eq!(summary.batches_rejected, 1);
    assert_eq!(summary.images_classified, 2);

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Error: 400 "));
    assert!(out.contains("Batch processed successfully!"));
}

#[tokio::test]
async fn test_empty_directory_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let stub = Stub::default();
    let url = spawn_stub(stub.clone()).await;

    let mut out = Vec::new();
    let summary = run(&config(url, dir.path(), 10), &mut out).await.unwrap();

    assert_eq!(summary.batches_sent, 0);
    assert!(stub.batches.lock().is_empty());
}

#[tokio::test]
async fn test_transport_failure_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    write_images(dir.path(), 2);

    // Free port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut out = Vec::new();
    let result = run(
        &config(format!("http://{}/predict_batch/", addr), dir.path(), 10),
        &mut out,
    )
    .await;

    assert!(matches!(result, Err(SubmitError::Http(_))));
}

#[tokio::test]
async fn test_zero_batch_size_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut out = Vec::new();
    let result = run(
        &config("http://127.0.0.1:1/".to_string(), dir.path(), 0),
        &mut out,
    )
    .await;

    assert!(matches!(result, Err(SubmitError::Core(_))));
}
