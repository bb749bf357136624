//! Image discovery.

use std::path::{Path, PathBuf};

use crate::error::{Result, SubmitError};

/// Extensions accepted by the scanner, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// List image files directly inside `dir`, in directory listing order.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_err = |source| SubmitError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && is_image(&path) {
            images.push(path);
        }
    }

    Ok(images)
}

/// MIME type sent with a file part.
pub fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    }
}
