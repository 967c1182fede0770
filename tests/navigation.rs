//! End-to-end navigation scans over real directory trees.

use album_browser::scan::{ScanLimits, list_album_images, scan_level, scan_tree};
use album_browser::types::{NavigationNode, NodeKind};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"fake image").unwrap();
}

fn names(nodes: &[NavigationNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.name()).collect()
}

#[test]
fn album_with_empty_raw_subdir_scans_as_single_self_album() {
    let tmp = TempDir::new().unwrap();
    let trip = tmp.path().join("lib/Trip");
    for i in 1..=5 {
        touch(&trip, &format!("IMG_{i}.jpg"));
    }
    fs::create_dir_all(trip.join("RAW")).unwrap();

    let response = scan_level(&trip, &ScanLimits::default());

    assert!(response.success);
    assert_eq!(response.nodes.len(), 1);
    let NavigationNode::Album(album) = &response.nodes[0] else {
        panic!("expected an album, got {:?}", response.nodes[0].kind());
    };
    assert_eq!(album.summary.name, "Trip");
    assert_eq!(album.summary.path, trip);
    assert_eq!(album.summary.image_count, 5);
    assert_eq!(album.preview_images.len(), 4);

    let meta = response.metadata.unwrap();
    assert_eq!(meta.total_nodes, 1);
    assert_eq!(meta.album_count, 1);
    assert_eq!(meta.total_images, 5);
    assert_eq!(response.current_path, trip);
    assert_eq!(response.parent_path, tmp.path().join("lib"));
    assert_eq!(response.breadcrumbs.last().unwrap().name, "Trip");
}

#[test]
fn library_level_orders_folders_then_albums_naturally() {
    let tmp = TempDir::new().unwrap();
    let lib = tmp.path();
    touch(lib, "Travel/Japan/a.jpg");
    touch(lib, "Travel/Italy/b.jpg");
    touch(lib, "Album 10/x.png");
    touch(lib, "Album 2/y.png");
    touch(lib, "album 3/z.webp");
    touch(lib, "Docs/readme.txt");
    fs::create_dir(lib.join("Empty")).unwrap();

    let response = scan_level(lib, &ScanLimits::default());

    assert_eq!(
        names(&response.nodes),
        vec!["Travel", "Album 2", "album 3", "Album 10"]
    );
    assert_eq!(response.nodes[0].kind(), NodeKind::Folder);
    let NavigationNode::Folder(travel) = &response.nodes[0] else {
        unreachable!();
    };
    assert_eq!(travel.summary.child_folders, 2);
    assert_eq!(travel.estimated_images, 2);
    assert!(travel.has_sub_albums);
    assert!(!travel.quick_stats.has_more);
}

#[test]
fn missing_directory_is_an_error_response() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope");

    let response = scan_level(&missing, &ScanLimits::default());
    assert!(!response.success);
    assert!(response.nodes.is_empty());
    assert!(response.error.is_some());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"]["message"].as_str().unwrap().contains("nope"));
}

#[test]
fn album_listing_and_tree_agree_with_scan() {
    let tmp = TempDir::new().unwrap();
    let lib = tmp.path();
    touch(lib, "Travel/Japan/a.jpg");
    touch(lib, "Travel/Japan/b.jpg");
    touch(lib, "Travel/notes.txt");

    let images = list_album_images(&lib.join("Travel/Japan"));
    assert_eq!(images.len(), 2);

    let tree = scan_tree(lib, 3);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "Travel");
    assert!(!tree[0].has_images);
    assert_eq!(tree[0].children[0].name, "Japan");
    assert!(tree[0].children[0].has_images);
}
