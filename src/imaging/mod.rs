//! Image processing, pure Rust and statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` (header only) |
//! | **Thumbnail** | `resize_to_fill` with Lanczos3 |
//! | **Encode → WebP** | `image::codecs::webp::WebPEncoder` (lossless) |
//! | **Encode → PNG** | `image::codecs::png::PngEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_cover_box;
pub use params::{Quality, ThumbnailParams};
pub use rust_backend::RustBackend;
