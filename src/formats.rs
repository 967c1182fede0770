//! Supported image formats.
//!
//! The browser only ever shows files whose extension is in
//! [`SUPPORTED_EXTENSIONS`]. Classification is by extension alone: the
//! scanner never opens a file to decide what it is, which keeps a directory
//! listing to one `readdir` plus one `stat` per entry.
//!
//! Thumbnails are written in one of two [`OutputFormat`]s: WebP for the
//! managed resize pipeline, PNG for whatever the OS-native thumbnailer hands
//! back.

use std::path::Path;

/// Lowercase extensions the scanner treats as images.
///
/// Every entry has a decoder compiled into the `image` crate (see the
/// feature list in `Cargo.toml`), so anything the scanner lists can also be
/// thumbnailed.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Whether `path` has a supported image extension (case-insensitive).
///
/// Does not touch the filesystem; callers combine this with a file-type
/// check when they need to rule out directories named `foo.jpg`.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Encoded format of a cached thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    WebP,
    Png,
}

impl OutputFormat {
    /// Lookup order on the cache fast path: managed output first.
    pub const ALL: [OutputFormat; 2] = [OutputFormat::WebP, OutputFormat::Png];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Png => "png",
        }
    }
}
