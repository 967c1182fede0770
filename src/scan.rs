//! Navigation scanning.
//!
//! Turns one directory level into a list of [`NavigationNode`]s without ever
//! walking the whole tree below it. Each immediate subdirectory is classified
//! by peeking at a bounded number of its entries:
//!
//! ```text
//! /lib/                      scan_level("/lib")
//! ├── Travel/                → folder  (has a subdirectory; image count estimated)
//! │   ├── Japan/  (40 jpgs)
//! │   └── Italy/  (12 jpgs)
//! ├── Trip/                  → album   (images only; counted exactly)
//! │   ├── day1.jpg
//! │   └── day2.jpg
//! ├── notes/                 → empty   (dropped from the result)
//! │   └── todo.txt
//! └── cover.jpg              → self-album "lib" (the level's own loose images)
//! ```
//!
//! ## Cost
//!
//! - Albums cost one `readdir` plus one `stat` per image.
//! - Folders sample at most `max_child_scan` children and peek at most
//!   `quick_scan_limit` entries in each, extrapolating when a sample was
//!   truncated. The estimate is a known approximation: a folder whose first
//!   few children are image-heavy and the rest empty is overcounted.
//!
//! Subdirectories are classified in parallel on the rayon pool. Nothing a
//! child does can fail the level: unreadable children are skipped, and only an
//! unreadable target produces an error-shaped [`NavigationResponse`].

use crate::config::{MAX_PREVIEW_SAMPLES, ScanConfig};
use crate::formats::is_supported_image;
use crate::naming::compare_names;
use crate::paths;
use crate::types::{
    AlbumImage, AlbumNode, FolderNode, NavigationNode, NavigationResponse, NodeKind, NodeSummary,
    QuickStats, TreeEntry,
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

/// Default depth of [`scan_tree`].
pub const DEFAULT_TREE_DEPTH: usize = 3;

/// Sampling limits for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    /// Entries peeked to classify a subdirectory.
    pub sample_limit: usize,
    /// Preview paths per node.
    pub max_preview_samples: usize,
    /// Children sampled when estimating a folder.
    pub max_child_scan: usize,
    /// Entries peeked per sampled child.
    pub quick_scan_limit: usize,
    /// Sample paths kept per sampled child.
    pub quick_scan_samples: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ScanLimits {
    fn from(config: &ScanConfig) -> Self {
        Self {
            sample_limit: config.sample_limit.max(1),
            max_preview_samples: config.max_preview_samples.clamp(1, MAX_PREVIEW_SAMPLES),
            max_child_scan: config.max_child_scan.max(1),
            quick_scan_limit: config.quick_scan_limit.max(1),
            quick_scan_samples: config.quick_scan_samples.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    Image,
    Other,
}

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    name: String,
    kind: EntryKind,
}

/// List a directory's immediate entries in natural name order.
///
/// Entries whose type cannot be determined (broken symlinks, races with
/// deletion) are skipped, as are names that are not valid UTF-8: the host
/// could not hand such a path back.
fn read_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            let Ok(name) = entry.file_name().into_string() else {
                warn!("Skipping {}: name is not valid UTF-8", path.display());
                return None;
            };
            let kind = entry_kind(&entry, &path)?;
            Some(Entry { path, name, kind })
        })
        .collect();
    entries.sort_by(|a, b| compare_names(&a.name, &b.name));
    Ok(entries)
}

/// Classify from the directory entry's file type; symlinks are followed.
fn entry_kind(entry: &fs::DirEntry, path: &Path) -> Option<EntryKind> {
    let file_type = entry.file_type().ok()?;
    let (is_dir, is_file) = if file_type.is_symlink() {
        let meta = fs::metadata(path).ok()?;
        (meta.is_dir(), meta.is_file())
    } else {
        (file_type.is_dir(), file_type.is_file())
    };

    Some(if is_dir {
        EntryKind::Dir
    } else if is_file && is_supported_image(path) {
        EntryKind::Image
    } else {
        EntryKind::Other
    })
}

fn modified_utc(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

/// Scan one navigation level.
///
/// Returns folder and album nodes for `target`'s subdirectories, plus a
/// self-album when `target` directly holds images. Folders come first, then
/// albums, each group in natural name order.
pub fn scan_level(target: &Path, limits: &ScanLimits) -> NavigationResponse {
    let started = Instant::now();

    let entries = match read_entries(target) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot scan {}: {e}", target.display());
            return NavigationResponse::failure(
                format!("Cannot read {}: {e}", target.display()),
                target.to_path_buf(),
            );
        }
    };

    let subdirs: Vec<&Entry> = entries.iter().filter(|e| e.kind == EntryKind::Dir).collect();
    let images: Vec<PathBuf> = entries
        .iter()
        .filter(|e| e.kind == EntryKind::Image)
        .map(|e| e.path.clone())
        .collect();

    let mut nodes: Vec<NavigationNode> = subdirs
        .par_iter()
        .filter_map(|entry| build_node(&entry.path, &entry.name, limits))
        .collect();

    if !images.is_empty() {
        let name = paths::display_name(target);
        match album_from_images(target, name, &images, limits) {
            Some(album) => nodes.push(NavigationNode::Album(album)),
            None => warn!("No readable images left in {}", target.display()),
        }
    }

    sort_nodes(&mut nodes);

    let elapsed = started.elapsed().as_millis() as u64;
    info!(
        "Scanned {} in {elapsed}ms: {} nodes",
        target.display(),
        nodes.len()
    );

    NavigationResponse::success(
        nodes,
        target.to_path_buf(),
        parent_path(target),
        paths::breadcrumbs(target),
        elapsed,
    )
}

/// Parent of `target`, or `target` itself at a filesystem root.
fn parent_path(target: &Path) -> PathBuf {
    let full = target.to_string_lossy();
    match paths::dirname(&full) {
        "" => target.to_path_buf(),
        parent => PathBuf::from(parent),
    }
}

/// Folders before albums, then natural name order.
fn sort_nodes(nodes: &mut [NavigationNode]) {
    nodes.sort_by(|a, b| {
        a.kind()
            .cmp(&b.kind())
            .then_with(|| compare_names(a.name(), b.name()))
    });
}

fn build_node(dir: &Path, name: &str, limits: &ScanLimits) -> Option<NavigationNode> {
    match determine_node_type(dir, limits.sample_limit) {
        NodeKind::Folder => Some(NavigationNode::Folder(folder_node(dir, name, limits))),
        NodeKind::Album => album_node(dir, name, limits).map(NavigationNode::Album),
        NodeKind::Empty => {
            debug!("Skipping empty directory {}", dir.display());
            None
        }
    }
}

/// Classify a directory from at most `sample_limit` of its entries.
///
/// Any subdirectory makes it a folder, even when it also holds images.
/// Otherwise any supported image makes it an album. An unreadable directory
/// is empty.
pub fn determine_node_type(dir: &Path, sample_limit: usize) -> NodeKind {
    let entries = match read_entries(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot classify {}: {e}", dir.display());
            return NodeKind::Empty;
        }
    };

    let mut has_images = false;
    for entry in entries.iter().take(sample_limit) {
        match entry.kind {
            EntryKind::Dir => return NodeKind::Folder,
            EntryKind::Image => has_images = true,
            EntryKind::Other => {}
        }
    }

    if has_images {
        NodeKind::Album
    } else {
        NodeKind::Empty
    }
}

fn album_node(dir: &Path, name: &str, limits: &ScanLimits) -> Option<AlbumNode> {
    let entries = match read_entries(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read album {}: {e}", dir.display());
            return None;
        }
    };
    let images: Vec<PathBuf> = entries
        .into_iter()
        .filter(|e| e.kind == EntryKind::Image)
        .map(|e| e.path)
        .collect();
    album_from_images(dir, name.to_string(), &images, limits)
}

/// Exact album statistics over `images`.
///
/// Images that vanish or cannot be stat'ed are left out of every figure.
/// Returns `None` when none are left.
fn album_from_images(
    dir: &Path,
    name: String,
    images: &[PathBuf],
    limits: &ScanLimits,
) -> Option<AlbumNode> {
    let mut stats: Vec<(PathBuf, u64, DateTime<Utc>)> = images
        .iter()
        .filter_map(|path| {
            let meta = fs::metadata(path).ok()?;
            let modified = DateTime::<Utc>::from(meta.modified().ok()?);
            Some((path.clone(), meta.len(), modified))
        })
        .collect();

    // Newest first; equal mtimes fall back to name order so previews are stable.
    stats.sort_by(|a, b| {
        b.2.cmp(&a.2)
            .then_with(|| compare_names(&a.0.to_string_lossy(), &b.0.to_string_lossy()))
    });

    let newest = stats.first()?.2;
    let oldest = stats.last()?.2;
    let previews: Vec<PathBuf> = stats
        .iter()
        .take(limits.max_preview_samples)
        .map(|(path, _, _)| path.clone())
        .collect();

    Some(AlbumNode {
        summary: NodeSummary {
            path: dir.to_path_buf(),
            name,
            has_images: true,
            image_count: stats.len() as u64,
            child_folders: 0,
            samples: previews.clone(),
            last_modified: newest,
        },
        preview_images: previews,
        first_image_date: Some(oldest),
        last_image_date: Some(newest),
        total_size: stats.iter().map(|(_, size, _)| size).sum(),
    })
}

/// Result of peeking into one child of a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickScan {
    /// Images seen in the peek, extrapolated when the peek was truncated.
    pub image_count: u64,
    pub samples: Vec<PathBuf>,
}

impl QuickScan {
    pub fn has_images(&self) -> bool {
        self.image_count > 0
    }
}

/// Peek at most `quick_scan_limit` entries of `dir`.
///
/// Every image in the peek is counted and up to `quick_scan_samples` paths
/// are kept. When the peek was full and the directory holds more entries the
/// count is scaled by `total / peek`. An unreadable directory has no images.
pub fn quick_scan_for_images(dir: &Path, limits: &ScanLimits) -> QuickScan {
    let Ok(entries) = read_entries(dir) else {
        return QuickScan::default();
    };

    let peek = &entries[..entries.len().min(limits.quick_scan_limit)];
    let images: Vec<&Entry> = peek.iter().filter(|e| e.kind == EntryKind::Image).collect();
    let mut image_count = images.len() as u64;

    if image_count > 0 && peek.len() == limits.quick_scan_limit && entries.len() > peek.len() {
        image_count = scale(image_count, entries.len(), peek.len());
    }

    QuickScan {
        image_count,
        samples: images
            .iter()
            .take(limits.quick_scan_samples)
            .map(|e| e.path.clone())
            .collect(),
    }
}

/// `round(count * total / sampled)`.
fn scale(count: u64, total: usize, sampled: usize) -> u64 {
    (count as f64 * total as f64 / sampled as f64).round() as u64
}

struct ChildProbe {
    scan: QuickScan,
    modified: Option<DateTime<Utc>>,
}

fn folder_node(dir: &Path, name: &str, limits: &ScanLimits) -> FolderNode {
    let entries = match read_entries(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot estimate folder {}: {e}", dir.display());
            Vec::new()
        }
    };

    let total = entries.len();
    let sample = &entries[..total.min(limits.max_child_scan)];
    let sample_size = sample.len();
    let child_folders = entries.iter().filter(|e| e.kind == EntryKind::Dir).count() as u64;

    let probes: Vec<ChildProbe> = sample
        .par_iter()
        .filter(|e| e.kind == EntryKind::Dir)
        .map(|e| ChildProbe {
            scan: quick_scan_for_images(&e.path, limits),
            modified: modified_utc(&e.path),
        })
        .collect();

    let mut estimated_images: u64 = probes.iter().map(|p| p.scan.image_count).sum();
    if !probes.is_empty() && sample_size < total {
        estimated_images = scale(estimated_images, total, sample_size);
    }

    let preview_samples: Vec<PathBuf> = probes
        .iter()
        .flat_map(|p| p.scan.samples.iter().cloned())
        .take(limits.max_preview_samples)
        .collect();

    let last_modified = probes
        .iter()
        .filter_map(|p| p.modified)
        .max()
        .or_else(|| modified_utc(dir))
        .unwrap_or_else(Utc::now);

    FolderNode {
        summary: NodeSummary {
            path: dir.to_path_buf(),
            name: name.to_string(),
            has_images: false,
            image_count: estimated_images,
            child_folders,
            samples: preview_samples.clone(),
            last_modified,
        },
        estimated_images,
        preview_samples,
        has_sub_albums: probes.iter().any(|p| p.scan.has_images()),
        quick_stats: QuickStats {
            has_more: total > sample_size,
            sample_size: sample_size as u64,
        },
    }
}

/// Every supported image directly inside `album`, in natural name order.
///
/// An unreadable directory yields an empty list.
pub fn list_album_images(album: &Path) -> Vec<AlbumImage> {
    let entries = match read_entries(album) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list images in {}: {e}", album.display());
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter(|e| e.kind == EntryKind::Image)
        .filter_map(|e| {
            let meta = fs::metadata(&e.path).ok()?;
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some(AlbumImage {
                size: meta.len(),
                last_modified: DateTime::<Utc>::from(modified),
                name: e.name,
                path: e.path,
            })
        })
        .collect()
}

/// Directory tree under `root` for a navigation panel.
///
/// Only directories that directly hold images or subdirectories are kept.
/// Children are listed down to `max_depth` levels below `root`'s children.
/// Unreadable directories are skipped.
pub fn scan_tree(root: &Path, max_depth: usize) -> Vec<TreeEntry> {
    scan_tree_at(root, 0, max_depth)
}

fn scan_tree_at(dir: &Path, depth: usize, max_depth: usize) -> Vec<TreeEntry> {
    let entries = match read_entries(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read tree at {}: {e}", dir.display());
            return Vec::new();
        }
    };

    entries
        .par_iter()
        .filter(|e| e.kind == EntryKind::Dir)
        .filter_map(|e| {
            let inner = read_entries(&e.path).ok()?;
            let has_images = inner.iter().any(|i| i.kind == EntryKind::Image);
            let has_subdirs = inner.iter().any(|i| i.kind == EntryKind::Dir);
            if !has_images && !has_subdirs {
                return None;
            }
            let children = if depth < max_depth && has_subdirs {
                scan_tree_at(&e.path, depth + 1, max_depth)
            } else {
                Vec::new()
            };
            Some(TreeEntry {
                name: e.name.clone(),
                path: e.path.clone(),
                has_images,
                children,
            })
        })
        .collect()
}
