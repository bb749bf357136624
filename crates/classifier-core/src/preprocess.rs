//! Image preprocessing: raw bytes to normalized channel-first tensors.
//!
//! Every image goes through the same fixed transform (RGB, 224x224 bilinear
//! resize, ImageNet mean/std), so all tensors that come out of a
//! [`Preprocessor`] share one shape and can be stacked into a batch.

use image::imageops::{self, FilterType};
use ndarray::Array3;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Square edge length the model expects.
pub const INPUT_SIZE: u32 = 224;

/// Number of colour channels fed to the model.
pub const CHANNELS: usize = 3;

/// Per-channel mean of the training distribution (ImageNet).
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation of the training distribution (ImageNet).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// An uploaded image as received, before decoding.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// A decoded image, tagged with its position in the upload.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Index of the file in the original upload order
    pub index: usize,
    pub filename: String,
    /// CHW tensor, shape `[3, size, size]`
    pub tensor: Array3<f32>,
}

/// Result of preprocessing one upload.
#[derive(Debug, Default)]
pub struct PreprocessOutcome {
    /// Successfully decoded images in upload order
    pub images: Vec<Preprocessed>,
    /// Filenames that failed to decode, in upload order
    pub skipped: Vec<String>,
}

/// Decode/resize/normalize parameters.
#[derive(Debug, Clone)]
pub struct Transform {
    pub size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            size: INPUT_SIZE,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }
}

impl Transform {
    /// Shape of every tensor this transform produces.
    pub fn output_shape(&self) -> [usize; 3] {
        let edge = self.size as usize;
        [CHANNELS, edge, edge]
    }

    /// Decode `bytes` and turn them into a normalized CHW tensor.
    pub fn apply(&self, bytes: &[u8]) -> Result<Array3<f32>> {
        if self.size == 0 {
            return Err(Error::Config("transform size must be positive".to_string()));
        }

        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let resized = imageops::resize(&rgb, self.size, self.size, FilterType::Triangle);

        let edge = self.size as usize;
        let tensor = Array3::from_shape_fn((CHANNELS, edge, edge), |(c, y, x)| {
            let value = resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
            (value - self.mean[c]) / self.std[c]
        });

        Ok(tensor)
    }
}

/// Runs the transform over an upload on a bounded worker pool.
///
/// One pool is built at startup and shared by every request, so concurrent
/// requests queue on the same threads instead of each spawning their own.
pub struct Preprocessor {
    transform: Transform,
    pool: ThreadPool,
}

impl Preprocessor {
    /// Create a preprocessor with `workers` threads.
    pub fn new(transform: Transform, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::Config(
                "preprocessing needs at least one worker".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("preprocess-{}", i))
            .build()?;

        Ok(Self { transform, pool })
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Preprocess every file, dropping the ones that fail to decode.
    ///
    /// Blocks the calling thread until the pool has finished. Output order
    /// follows input order regardless of which worker finished first.
    pub fn run(&self, files: Vec<ImageFile>) -> PreprocessOutcome {
        debug!(
            "Preprocessing {} files on {} workers",
            files.len(),
            self.workers()
        );

        let transform = &self.transform;
        let results: Vec<(usize, String, Result<Array3<f32>>)> = self.pool.install(|| {
            files
                .into_par_iter()
                .enumerate()
                .map(|(index, file)| {
                    let tensor = transform.apply(&file.bytes);
                    (index, file.filename, tensor)
                })
                .collect()
        });

        let mut outcome = PreprocessOutcome::default();
        for (index, filename, tensor) in results {
            match tensor {
                Ok(tensor) => outcome.images.push(Preprocessed {
                    index,
                    filename,
                    tensor,
                }),
                Err(e) => {
                    warn!("Error processing {}: {}", filename, e);
                    outcome.skipped.push(filename);
                }
            }
        }

        outcome
    }
}
