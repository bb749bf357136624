//! Turning backend class scores into cluster predictions.

use ndarray::ArrayView2;

use crate::error::{Error, Result};
use crate::preprocess::Preprocessed;
use crate::types::Prediction;

/// Index of the highest score in each row.
///
/// Ties resolve to the lowest index. NaN scores never win.
pub fn argmax_rows(scores: ArrayView2<'_, f32>) -> Vec<usize> {
    scores
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            let mut best_score = f32::NEG_INFINITY;
            for (i, &score) in row.iter().enumerate() {
                if score > best_score {
                    best = i;
                    best_score = score;
                }
            }
            best
        })
        .collect()
}

/// Pair every image with the arg-max of its score row.
///
/// Row `i` of `scores` belongs to `images[i]`; a row count that differs from
/// the image count is an error rather than a silent truncation.
pub fn assign(images: &[Preprocessed], scores: ArrayView2<'_, f32>) -> Result<Vec<Prediction>> {
    if scores.nrows() != images.len() {
        return Err(Error::InvalidInput(format!(
            "backend returned {} score rows for {} images",
            scores.nrows(),
            images.len()
        )));
    }
    if scores.ncols() == 0 {
        return Err(Error::InvalidInput(
            "backend returned zero classes".to_string(),
        ));
    }

    Ok(images
        .iter()
        .zip(argmax_rows(scores))
        .map(|(image, cluster)| Prediction {
            filename: image.filename.clone(),
            predicted_cluster: cluster,
        })
        .collect())
}
