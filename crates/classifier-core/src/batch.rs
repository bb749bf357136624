//! Fixed-size batching and tensor stacking.

use ndarray::{Array4, ArrayView3, Axis};

use crate::error::{Error, Result};
use crate::preprocess::Preprocessed;

/// Default number of images per request on the submitter side.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Split `items` into consecutive chunks of at most `batch_size`, keeping order.
///
/// No chunk is empty; an empty input yields no chunks.
pub fn partition<T>(items: &[T], batch_size: usize) -> Result<std::slice::Chunks<'_, T>> {
    if batch_size == 0 {
        return Err(Error::InvalidInput("batch size must be at least 1".to_string()));
    }
    Ok(items.chunks(batch_size))
}

/// Number of requests needed to send `total` items.
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    total.div_ceil(batch_size)
}

/// Stack preprocessed images into one `[N, C, H, W]` batch.
pub fn stack(images: &[Preprocessed]) -> Result<Array4<f32>> {
    if images.is_empty() {
        return Err(Error::InvalidInput("cannot stack an empty batch".to_string()));
    }

    let views: Vec<ArrayView3<'_, f32>> = images.iter().map(|p| p.tensor.view()).collect();
    Ok(ndarray::stack(Axis(0), &views)?)
}
