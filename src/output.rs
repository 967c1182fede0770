//! CLI output formatting.
//!
//! Every command has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes it to stdout. Format functions do no I/O, so
//! tests can check exact lines.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! /photos/Travel
//! photos > Travel
//! 001 Japan/ (~40 images, 3 folders)
//! 002 Italy (12 images, 48.2 MB)
//! 003 scans (empty)
//!
//! 3 nodes: 1 folder, 1 album, 52 images in 14 ms
//! ```
//!
//! ## Tree
//!
//! ```text
//! Travel/
//!     Japan/ *
//!     Italy/ *
//! ```
//!
//! A `*` marks directories that hold images themselves.

use crate::cache::{SweepReport, human_bytes};
use crate::paths::{self, Breadcrumb};
use crate::thumbnail::Thumbnail;
use crate::types::{AlbumImage, ClearOutcome, NavigationNode, NavigationResponse, TreeEntry};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 image`, `2 images`.
fn plural(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn breadcrumb_line(crumbs: &[Breadcrumb]) -> String {
    crumbs
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(" > ")
}

/// One navigation node on a single line.
///
/// Folders get a trailing `/` and a `~` on their estimate; albums show an
/// exact count and their size on disk.
fn node_line(index: usize, node: &NavigationNode) -> String {
    let header = format_index(index);
    match node {
        NavigationNode::Folder(folder) => format!(
            "{header} {}/ (~{}, {})",
            folder.summary.name,
            plural(folder.estimated_images, "image"),
            plural(folder.summary.child_folders, "folder")
        ),
        NavigationNode::Album(album) => format!(
            "{header} {} ({}, {})",
            album.summary.name,
            plural(album.summary.image_count, "image"),
            human_bytes(album.total_size)
        ),
        NavigationNode::Empty(summary) => format!("{header} {} (empty)", summary.name),
    }
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_navigation(response: &NavigationResponse) -> Vec<String> {
    let current = response.current_path.display().to_string();

    if !response.success {
        let message = response
            .error
            .as_ref()
            .map(|e| e.message.as_str())
            .unwrap_or("unknown error");
        return vec![format!("Cannot scan {current}: {message}")];
    }

    let mut lines = vec![current];
    if !response.breadcrumbs.is_empty() {
        lines.push(breadcrumb_line(&response.breadcrumbs));
    }
    for (i, node) in response.nodes.iter().enumerate() {
        lines.push(node_line(i + 1, node));
    }

    if let Some(meta) = &response.metadata {
        lines.push(String::new());
        lines.push(format!(
            "{}: {}, {}, {} in {} ms",
            plural(meta.total_nodes as u64, "node"),
            plural(meta.folder_count as u64, "folder"),
            plural(meta.album_count as u64, "album"),
            plural(meta.total_images, "image"),
            meta.scan_time_ms
        ));
    }
    lines
}

pub fn print_navigation(response: &NavigationResponse) {
    for line in format_navigation(response) {
        println!("{}", line);
    }
}

// ============================================================================
// Tree
// ============================================================================

pub fn format_tree(root: &Path, entries: &[TreeEntry]) -> Vec<String> {
    let mut lines = vec![format!("{}/", paths::display_name(root))];
    walk_tree(entries, 1, &mut lines);
    lines
}

fn walk_tree(entries: &[TreeEntry], depth: usize, lines: &mut Vec<String>) {
    for entry in entries {
        let marker = if entry.has_images { " *" } else { "" };
        lines.push(format!("{}{}/{}", indent(depth), entry.name, marker));
        walk_tree(&entry.children, depth + 1, lines);
    }
}

pub fn print_tree(root: &Path, entries: &[TreeEntry]) {
    for line in format_tree(root, entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Album images
// ============================================================================

/// Images of one album in name order, with sizes and modification times.
pub fn format_album_images(album: &Path, images: &[AlbumImage]) -> Vec<String> {
    let album_str = album.to_string_lossy();
    let total: u64 = images.iter().map(|i| i.size).sum();

    let mut lines = vec![format!(
        "{} ({}, {})",
        paths::display_name(album),
        plural(images.len() as u64, "image"),
        human_bytes(total)
    )];
    for (i, image) in images.iter().enumerate() {
        let relative = paths::relative_path(&album_str, &image.path.to_string_lossy());
        lines.push(format!(
            "{}{} {}",
            indent(1),
            format_index(i + 1),
            relative
        ));
        lines.push(format!(
            "{}{}, modified {}",
            indent(2),
            human_bytes(image.size),
            image.last_modified.format("%Y-%m-%d %H:%M")
        ));
    }
    lines
}

pub fn print_album_images(album: &Path, images: &[AlbumImage]) {
    for line in format_album_images(album, images) {
        println!("{}", line);
    }
}

// ============================================================================
// Thumbnails
// ============================================================================

pub fn format_thumbnail(source: &Path, thumbnail: Option<&Thumbnail>) -> Vec<String> {
    let name = paths::display_name(source);
    match thumbnail {
        Some(thumbnail) => vec![
            format!("{name} → {}", thumbnail.url()),
            format!("{}Format: {}", indent(1), thumbnail.format.extension()),
        ],
        None => vec![format!("{name} → no thumbnail")],
    }
}

pub fn print_thumbnail(source: &Path, thumbnail: Option<&Thumbnail>) {
    for line in format_thumbnail(source, thumbnail) {
        println!("{}", line);
    }
}

/// Batch results in path order, followed by a success tally.
pub fn format_batch(results: &BTreeMap<String, Option<String>>) -> Vec<String> {
    let mut lines: Vec<String> = results
        .iter()
        .map(|(source, url)| match url {
            Some(url) => format!("{source} → {url}"),
            None => format!("{source} → no thumbnail"),
        })
        .collect();

    let ok = results.values().filter(|url| url.is_some()).count();
    lines.push(format!("{ok} of {} thumbnails ready", results.len()));
    lines
}

pub fn print_batch(results: &BTreeMap<String, Option<String>>) {
    for line in format_batch(results) {
        println!("{}", line);
    }
}

// ============================================================================
// Cache management
// ============================================================================

pub fn format_clear(cache_dir: &Path, outcome: &ClearOutcome) -> Vec<String> {
    let dir = cache_dir.display();
    match (outcome.success, outcome.deleted_count, &outcome.error) {
        (true, Some(count), _) => vec![format!(
            "Cleared {} from {dir}",
            plural(count as u64, "thumbnail")
        )],
        (_, _, Some(error)) => vec![format!("Cannot clear {dir}: {error}")],
        _ => vec![format!("Cleared {dir}")],
    }
}

pub fn print_clear(cache_dir: &Path, outcome: &ClearOutcome) {
    for line in format_clear(cache_dir, outcome) {
        println!("{}", line);
    }
}

pub fn format_sweep(cache_dir: &Path, report: &SweepReport) -> Vec<String> {
    vec![format!("Sweep {}: {report}", cache_dir.display())]
}

pub fn print_sweep(cache_dir: &Path, report: &SweepReport) {
    for line in format_sweep(cache_dir, report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::OutputFormat;
    use crate::types::{AlbumNode, FolderNode, NodeSummary, QuickStats};
    use chrono::{DateTime, TimeZone, Utc};
    use std::path::PathBuf;

    fn summary(name: &str, image_count: u64, child_folders: u64) -> NodeSummary {
        NodeSummary {
            path: PathBuf::from(format!("/photos/{name}")),
            name: name.to_string(),
            has_images: image_count > 0,
            image_count,
            child_folders,
            samples: Vec::new(),
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn folder(name: &str, estimate: u64, child_folders: u64) -> NavigationNode {
        NavigationNode::Folder(FolderNode {
            summary: summary(name, estimate, child_folders),
            estimated_images: estimate,
            preview_samples: Vec::new(),
            has_sub_albums: true,
            quick_stats: QuickStats {
                has_more: false,
                sample_size: child_folders,
            },
        })
    }

    fn album(name: &str, count: u64, total_size: u64) -> NavigationNode {
        NavigationNode::Album(AlbumNode {
            summary: summary(name, count, 0),
            preview_images: Vec::new(),
            first_image_date: None,
            last_image_date: None,
            total_size,
        })
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_is_four_spaces_per_level() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_singular_and_many() {
        assert_eq!(plural(1, "image"), "1 image");
        assert_eq!(plural(0, "image"), "0 images");
        assert_eq!(plural(5, "folder"), "5 folders");
    }

    #[test]
    fn node_line_per_kind() {
        assert_eq!(node_line(1, &folder("Japan", 40, 3)), "001 Japan/ (~40 images, 3 folders)");
        assert_eq!(node_line(2, &album("Italy", 1, 2048)), "002 Italy (1 image, 2.0 KB)");
        assert_eq!(
            node_line(3, &NavigationNode::Empty(summary("scans", 0, 0))),
            "003 scans (empty)"
        );
    }

    // =========================================================================
    // Scan output
    // =========================================================================

    #[test]
    fn navigation_lists_nodes_and_totals() {
        let response = NavigationResponse::success(
            vec![folder("Japan", 40, 3), album("Italy", 12, 0)],
            "/photos/Travel".into(),
            "/photos".into(),
            paths::breadcrumbs(Path::new("/photos/Travel")),
            14,
        );
        let lines = format_navigation(&response);
        assert_eq!(lines[0], "/photos/Travel");
        assert!(lines[1].ends_with("photos > Travel"));
        assert_eq!(lines[2], "001 Japan/ (~40 images, 3 folders)");
        assert_eq!(lines[3], "002 Italy (12 images, 0 B)");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "2 nodes: 1 folder, 1 album, 52 images in 14 ms");
    }

    #[test]
    fn navigation_failure_is_one_line() {
        let response = NavigationResponse::failure("No such file", "/gone".into());
        assert_eq!(
            format_navigation(&response),
            vec!["Cannot scan /gone: No such file"]
        );
    }

    // =========================================================================
    // Tree output
    // =========================================================================

    #[test]
    fn tree_nests_and_marks_image_dirs() {
        let entries = vec![TreeEntry {
            name: "Travel".into(),
            path: "/photos/Travel".into(),
            has_images: false,
            children: vec![TreeEntry {
                name: "Japan".into(),
                path: "/photos/Travel/Japan".into(),
                has_images: true,
                children: Vec::new(),
            }],
        }];
        let lines = format_tree(Path::new("/photos"), &entries);
        assert_eq!(lines, vec!["photos/", "    Travel/", "        Japan/ *"]);
    }

    // =========================================================================
    // Album and thumbnail output
    // =========================================================================

    #[test]
    fn album_images_show_relative_names() {
        let images = vec![AlbumImage {
            path: "/photos/Trip/day1/a.jpg".into(),
            name: "a.jpg".into(),
            size: 1536,
            last_modified: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        }];
        let lines = format_album_images(Path::new("/photos/Trip"), &images);
        assert_eq!(lines[0], "Trip (1 image, 1.5 KB)");
        assert_eq!(lines[1], "    001 day1/a.jpg");
        assert_eq!(lines[2], "        1.5 KB, modified 2024-05-01 09:30");
    }

    #[test]
    fn thumbnail_missing_and_present() {
        let source = Path::new("/photos/a.jpg");
        assert_eq!(format_thumbnail(source, None), vec!["a.jpg → no thumbnail"]);

        let thumb = Thumbnail {
            path: "/cache/abc.webp".into(),
            format: OutputFormat::WebP,
        };
        let lines = format_thumbnail(source, Some(&thumb));
        assert_eq!(lines[0], "a.jpg → file:///cache/abc.webp");
        assert_eq!(lines[1], "    Format: webp");
    }

    #[test]
    fn batch_tallies_successes() {
        let mut results = BTreeMap::new();
        results.insert("/a.jpg".to_string(), Some("file:///c/1.webp".to_string()));
        results.insert("/b.jpg".to_string(), None);
        let lines = format_batch(&results);
        assert_eq!(lines[0], "/a.jpg → file:///c/1.webp");
        assert_eq!(lines[1], "/b.jpg → no thumbnail");
        assert_eq!(lines[2], "1 of 2 thumbnails ready");
    }

    #[test]
    fn clear_success_and_failure() {
        let dir = Path::new("/cache");
        assert_eq!(
            format_clear(dir, &ClearOutcome::cleared(3)),
            vec!["Cleared 3 thumbnails from /cache"]
        );
        assert_eq!(
            format_clear(dir, &ClearOutcome::failed("denied")),
            vec!["Cannot clear /cache: denied"]
        );
    }

    #[test]
    fn sweep_uses_report_display() {
        let report = SweepReport::default();
        assert_eq!(
            format_sweep(Path::new("/cache"), &report),
            vec!["Sweep /cache: nothing to remove (0 B kept)"]
        );
    }
}
