//! Types returned across the host boundary.
//!
//! These are serialized to JSON for the UI, so field names are camelCase and
//! node variants carry a `type` discriminant (`folder` / `album` / `empty`).
//! Nodes are built fresh by every scan and never mutated afterwards; a rescan
//! produces a new set.

use crate::paths::{Breadcrumb, serialize_lossy, serialize_lossy_all};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What a directory looks like one level down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Has at least one subdirectory (whether or not it also has images).
    Folder,
    /// Has supported images and no subdirectories.
    Album,
    /// Neither.
    Empty,
}

/// Fields every node carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    #[serde(serialize_with = "serialize_lossy")]
    pub path: PathBuf,
    pub name: String,
    pub has_images: bool,
    pub image_count: u64,
    pub child_folders: u64,
    /// Up to four representative image paths.
    #[serde(serialize_with = "serialize_lossy_all")]
    pub samples: Vec<PathBuf>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumNode {
    #[serde(flatten)]
    pub summary: NodeSummary,
    /// Most recently modified first.
    #[serde(serialize_with = "serialize_lossy_all")]
    pub preview_images: Vec<PathBuf>,
    pub first_image_date: Option<DateTime<Utc>>,
    pub last_image_date: Option<DateTime<Utc>>,
    pub total_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    #[serde(flatten)]
    pub summary: NodeSummary,
    /// Sampled estimate; extrapolated when the sample was truncated.
    pub estimated_images: u64,
    #[serde(serialize_with = "serialize_lossy_all")]
    pub preview_samples: Vec<PathBuf>,
    pub has_sub_albums: bool,
    pub quick_stats: QuickStats,
}

/// How much of a folder the estimate actually looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    pub has_more: bool,
    pub sample_size: u64,
}

/// One entry of a navigation level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NavigationNode {
    Folder(FolderNode),
    Album(AlbumNode),
    Empty(NodeSummary),
}

impl NavigationNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            NavigationNode::Folder(_) => NodeKind::Folder,
            NavigationNode::Album(_) => NodeKind::Album,
            NavigationNode::Empty(_) => NodeKind::Empty,
        }
    }

    pub fn summary(&self) -> &NodeSummary {
        match self {
            NavigationNode::Folder(folder) => &folder.summary,
            NavigationNode::Album(album) => &album.summary,
            NavigationNode::Empty(summary) => summary,
        }
    }

    pub fn name(&self) -> &str {
        &self.summary().name
    }

    pub fn path(&self) -> &Path {
        &self.summary().path
    }

    pub fn image_count(&self) -> u64 {
        self.summary().image_count
    }
}

/// Why a scan produced no nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFailure {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanMetadata {
    pub total_nodes: usize,
    pub folder_count: usize,
    pub album_count: usize,
    /// Sum of `imageCount` over the returned nodes, not a deep count.
    pub total_images: u64,
    pub scan_time_ms: u64,
}

/// Result of scanning one navigation level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    pub success: bool,
    pub nodes: Vec<NavigationNode>,
    #[serde(serialize_with = "serialize_lossy")]
    pub current_path: PathBuf,
    #[serde(serialize_with = "serialize_lossy")]
    pub parent_path: PathBuf,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub error: Option<ScanFailure>,
    pub metadata: Option<ScanMetadata>,
}

impl NavigationResponse {
    /// Successful response; metadata is derived from `nodes`.
    pub fn success(
        nodes: Vec<NavigationNode>,
        current_path: PathBuf,
        parent_path: PathBuf,
        breadcrumbs: Vec<Breadcrumb>,
        scan_time_ms: u64,
    ) -> Self {
        let count = |kind| nodes.iter().filter(|n| n.kind() == kind).count();
        let metadata = ScanMetadata {
            total_nodes: nodes.len(),
            folder_count: count(NodeKind::Folder),
            album_count: count(NodeKind::Album),
            total_images: nodes.iter().map(NavigationNode::image_count).sum(),
            scan_time_ms,
        };
        Self {
            success: true,
            nodes,
            current_path,
            parent_path,
            breadcrumbs,
            error: None,
            metadata: Some(metadata),
        }
    }

    /// Failed response: no nodes, no breadcrumbs, no metadata.
    pub fn failure(message: impl Into<String>, current_path: PathBuf) -> Self {
        Self {
            success: false,
            nodes: Vec::new(),
            current_path,
            parent_path: PathBuf::new(),
            breadcrumbs: Vec::new(),
            error: Some(ScanFailure {
                message: message.into(),
                timestamp: Utc::now(),
            }),
            metadata: None,
        }
    }
}

/// An image inside an album, as listed for the album view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumImage {
    #[serde(serialize_with = "serialize_lossy")]
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// A directory in the navigation-panel tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEntry {
    pub name: String,
    #[serde(serialize_with = "serialize_lossy")]
    pub path: PathBuf,
    pub has_images: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeEntry>,
}

/// Result of wiping the thumbnail cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClearOutcome {
    pub fn cleared(deleted_count: usize) -> Self {
        Self {
            success: true,
            deleted_count: Some(deleted_count),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            deleted_count: None,
            error: Some(error.into()),
        }
    }
}
