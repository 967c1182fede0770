//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the thumbnail service (which decides what to create and
//! where) and the [`backend`](super::backend) (which does the pixel work).
//! This separation allows swapping backends (e.g. for testing with a mock)
//! without changing the service.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 80). Clamped on construction.
//!   Ignored by the pure Rust backend, whose encoders are lossless.
//! - [`ThumbnailParams`]: everything one thumbnail needs (source, output, crop box, quality, format).

use crate::formats::OutputFormat;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for a thumbnail operation (resize + center crop).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    /// Written as-is; the format comes from `format`, not the extension, so
    /// temp names like `abc.webp.tmp-12-3` work.
    pub output: PathBuf,
    /// Final crop dimensions.
    pub crop_width: u32,
    pub crop_height: u32,
    /// For backends with a lossy encoder. [`RustBackend`](super::RustBackend)
    /// writes lossless WebP and PNG, so this has no effect there.
    pub quality: Quality,
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_80() {
        assert_eq!(Quality::default().value(), 80);
    }
}
