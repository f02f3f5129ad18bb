//! Uploaded image validation and downscaling.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::ImageFormat;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

/// Largest width or height passed on to the prediction service.
pub const MAX_DIMENSION: u32 = 1024;

/// Accepted upload extensions, lowercase.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Extension of a path, taken as the text after the last dot of the file name.
///
/// A file name without a dot yields the whole name, which never matches the
/// allow-list.
fn extension_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.rsplit('.').next().map(str::to_lowercase))
        .unwrap_or_default()
}

/// Reject files whose extension is not in [`ALLOWED_EXTENSIONS`].
///
/// Only looks at the name; the file is never opened.
pub fn check_extension(path: &Path) -> MediaResult<()> {
    let extension = extension_of(path);
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(MediaError::invalid_format(path, extension))
    }
}

/// Size an image must be scaled to so neither side exceeds `max`.
///
/// Returns `None` when both sides already fit. Otherwise the larger side
/// becomes exactly `max` and the other keeps the aspect ratio, truncated to a
/// whole pixel and never below 1.
pub fn target_size(width: u32, height: u32, max: u32) -> Option<(u32, u32)> {
    if width <= max && height <= max {
        return None;
    }

    let scaled = |side: u32, long_side: u32| -> u32 {
        // Integer floor, so exact ratios never land a pixel short
        let value = side as u64 * max as u64 / long_side as u64;
        (value as u32).max(1)
    };

    if width > height {
        Some((max, scaled(height, width)))
    } else {
        Some((scaled(width, height), max))
    }
}

/// Validates uploads and downscales oversized ones.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    max_dimension: u32,
    output_dir: PathBuf,
}

impl ImagePreprocessor {
    /// Create a preprocessor writing resized images into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            output_dir: output_dir.into(),
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    /// Validate `path` and return the image to submit.
    ///
    /// The original path comes back unchanged when the image already fits.
    /// Oversized images are resampled with Lanczos3 and written as a new JPEG
    /// in the output directory; that file is left for the caller to manage.
    pub fn process(&self, path: impl AsRef<Path>) -> MediaResult<PathBuf> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        check_extension(path)?;

        let (width, height) = image::image_dimensions(path)?;

        let Some((new_width, new_height)) = target_size(width, height, self.max_dimension) else {
            debug!(path = %path.display(), width, height, "Image size is within the limit, no resizing needed");
            return Ok(path.to_path_buf());
        };

        let resized = image::open(path)?
            .resize_exact(new_width, new_height, FilterType::Lanczos3)
            .to_rgb8();

        std::fs::create_dir_all(&self.output_dir)?;
        let output_path = self.output_dir.join(format!("resized-{}.jpg", Uuid::new_v4()));
        resized.save_with_format(&output_path, ImageFormat::Jpeg)?;

        info!(
            source = %path.display(),
            output = %output_path.display(),
            from = %format!("{}x{}", width, height),
            to = %format!("{}x{}", new_width, new_height),
            "Resized image"
        );

        Ok(output_path)
    }

    /// [`process`](Self::process) on the blocking thread pool.
    pub async fn process_async(&self, path: PathBuf) -> MediaResult<PathBuf> {
        let preprocessor = self.clone();
        tokio::task::spawn_blocking(move || preprocessor.process(&path))
            .await
            .map_err(|e| MediaError::internal(format!("preprocessing task failed: {}", e)))?
    }
}
