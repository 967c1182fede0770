//! Shared test utilities for the album-browser test suite.
//!
//! Fixtures are built on the fly in a `TempDir` rather than copied from disk,
//! since most tests care about directory shape and mtimes, not pixels.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! touch_all(tmp.path(), &["Trip/a.jpg", "Trip/b.jpg", "Travel/Japan/c.jpg"]);
//!
//! let response = scan_level(tmp.path(), &ScanLimits::default());
//! assert_eq!(node_names(&response), vec!["Travel", "Trip"]);
//! assert_eq!(find_node(&response, "Trip").image_count(), 2);
//! ```

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::types::{NavigationNode, NavigationResponse};

// =========================================================================
// Fixture setup
// =========================================================================

/// Create each relative path under `root` as a small placeholder file,
/// creating parent directories as needed.
pub fn touch_all(root: &Path, relative: &[&str]) {
    for rel in relative {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "fake image").unwrap();
    }
}

/// Set a file's or directory's mtime to `secs` seconds in the past.
pub fn set_mtime_ago(path: &Path, secs: u64) {
    let when = SystemTime::now() - Duration::from_secs(secs);
    filetime::set_file_mtime(path, filetime::FileTime::from_system_time(when)).unwrap();
}

/// Write a real JPEG with a horizontal gradient.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

// =========================================================================
// Response lookups (panic with the available names on a miss)
// =========================================================================

/// Find a node by name. Panics if not found.
pub fn find_node<'a>(response: &'a NavigationResponse, name: &str) -> &'a NavigationNode {
    response
        .nodes
        .iter()
        .find(|n| n.name() == name)
        .unwrap_or_else(|| {
            panic!(
                "node '{name}' not found. Available: {:?}",
                node_names(response)
            )
        })
}

/// Node names in response order.
pub fn node_names(response: &NavigationResponse) -> Vec<&str> {
    response.nodes.iter().map(NavigationNode::name).collect()
}
