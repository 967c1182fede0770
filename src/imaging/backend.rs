//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the thumbnail
//! pipeline needs: identify and thumbnail.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust with no
//! system libraries. Tests swap in the recording `MockBackend` below.

use super::params::ThumbnailParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: one backend is shared by every thread
/// that asks the thumbnail service for an image.
pub trait ImageBackend: Sync + Send {
    /// Get image dimensions without decoding pixels where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Execute a thumbnail operation (fill-resize + center crop + encode).
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
