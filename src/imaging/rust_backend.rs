//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, WebP) | `image` crate (pure Rust decoders) |
//! | Thumbnail crop | `image::DynamicImage::resize_to_fill` with `Lanczos3` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//!
//! The `image` crate only ships a lossless WebP encoder, so `quality` does not
//! change WebP output. Grid thumbnails are small enough that lossless files
//! stay well inside the cache budget.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ThumbnailParams;
use crate::formats::OutputFormat;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
///
/// The format is sniffed from the file header, so a PNG saved as `.jpg`
/// still decodes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode `img` to `path` in the requested format.
fn save_image(img: &DynamicImage, path: &Path, format: OutputFormat) -> Result<(), BackendError> {
    let file = File::create(path).map_err(BackendError::Io)?;
    let writer = BufWriter::new(file);

    match format {
        OutputFormat::WebP => {
            // The WebP encoder only accepts 8-bit RGB(A).
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(writer);
            rgba.write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e)))
        }
        OutputFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new(writer);
            img.write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))
        }
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;

        // Fill-resize then center-crop to exact dimensions
        let filled =
            img.resize_to_fill(params.crop_width, params.crop_height, FilterType::Lanczos3);

        save_image(&filled, &params.output, params.format)
    }
}
