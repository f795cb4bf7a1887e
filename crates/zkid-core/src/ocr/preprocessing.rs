//! Image decoding and sizing before recognition.

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::error::OcrError;

/// Decodes uploaded bytes and bounds the image size for the OCR engine.
///
/// No format whitelist is applied: anything the `image` crate can decode is
/// accepted.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Maximum image dimension (longer side).
    max_size: u32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self { max_size: 2048 }
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size;
        self
    }

    /// Decode image bytes and downscale if the longer side exceeds the limit.
    pub fn prepare(&self, bytes: &[u8]) -> Result<DynamicImage, OcrError> {
        if bytes.is_empty() {
            return Err(OcrError::InvalidImage("empty input".to_string()));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        Ok(self.fit(image))
    }

    /// Downscale an image so that its longer side is at most `max_size`.
    pub fn fit(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) = self.calculate_resize_dimensions(width, height);

        if (new_width, new_height) == (width, height) {
            return image;
        }

        debug!(
            "Downscaling image from {}x{} to {}x{}",
            width, height, new_width, new_height
        );
        image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max_dim = width.max(height);

        if self.max_size == 0 || max_dim <= self.max_size {
            return (width, height);
        }

        let scale = self.max_size as f32 / max_dim as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;

        (new_width.max(1), new_height.max(1))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}
