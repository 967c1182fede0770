//! Path helpers that work across separator conventions.
//!
//! Paths arrive from the host as strings and may use either `/` or `\`
//! regardless of the platform the core runs on (a library on a network share
//! browsed from Windows, a path pasted from another machine). The string
//! helpers here treat both characters as separators so basenames and parents
//! come out right either way.
//!
//! [`breadcrumbs`] works on real [`Path`] components instead, since it has to
//! produce paths the host can hand straight back to the scanner.

use serde::{Serialize, Serializer};
use std::path::{Component, Path, PathBuf};

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Last path segment, ignoring trailing separators.
///
/// - `"/photos/2024/"` → `"2024"`
/// - `"C:\\Users\\me\\Pictures"` → `"Pictures"`
/// - `"cover.jpg"` → `"cover.jpg"`
/// - `"/"` → `""`
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    match trimmed.rfind(is_separator) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// Everything before the last segment, ignoring trailing separators.
///
/// Returns `"/"` for a child of the root and `""` when there is no separator
/// at all (including the root itself).
pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    match trimmed.rfind(is_separator) {
        Some(0) => &trimmed[..1],
        Some(pos) => &trimmed[..pos],
        None => "",
    }
}

/// `/`-separated path from `from` to `to`, segment-wise.
///
/// Uses `..` to climb out of `from` where the two diverge. Identical paths
/// give an empty string.
pub fn relative_path(from: &str, to: &str) -> String {
    let from_parts: Vec<&str> = from.split(is_separator).filter(|s| !s.is_empty()).collect();
    let to_parts: Vec<&str> = to.split(is_separator).filter(|s| !s.is_empty()).collect();

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_parts.len() - common];
    parts.extend(&to_parts[common..]);
    parts.join("/")
}

/// Display label for a directory or file: its basename, or the whole path
/// when there is none (a filesystem root).
pub fn display_name(path: &Path) -> String {
    let full = path.to_string_lossy();
    let name = basename(&full);
    if name.is_empty() {
        full.into_owned()
    } else {
        name.to_string()
    }
}

/// One step in the trail from the filesystem root to the current directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    #[serde(serialize_with = "serialize_lossy")]
    pub path: PathBuf,
}

/// Serialize a path as a string, replacing bytes that are not valid UTF-8.
///
/// serde's own `Path` impl fails on such paths, which would fail the whole
/// response over one oddly named file.
pub fn serialize_lossy<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// [`serialize_lossy`] for a list of paths.
pub fn serialize_lossy_all<S: Serializer>(
    paths: &[PathBuf],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(paths.iter().map(|p| p.to_string_lossy()))
}

/// Cumulative breadcrumbs for `path`, root first.
///
/// The root directory itself gets no crumb; a Windows drive prefix does
/// (`C:` → `C:\`). `..` components are resolved lexically.
pub fn breadcrumbs(path: &Path) -> Vec<Breadcrumb> {
    let mut crumbs = Vec::new();
    let mut current = PathBuf::new();
    let mut prefix: Option<String> = None;

    for component in path.components() {
        match component {
            Component::Prefix(p) => {
                current.push(p.as_os_str());
                prefix = Some(p.as_os_str().to_string_lossy().into_owned());
            }
            Component::RootDir => current.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                current.pop();
                crumbs.pop();
            }
            Component::Normal(name) => {
                if let Some(drive) = prefix.take() {
                    crumbs.push(Breadcrumb {
                        name: drive,
                        path: current.clone(),
                    });
                }
                current.push(name);
                crumbs.push(Breadcrumb {
                    name: name.to_string_lossy().into_owned(),
                    path: current.clone(),
                });
            }
        }
    }

    if let Some(drive) = prefix {
        crumbs.push(Breadcrumb {
            name: drive,
            path: current,
        });
    }
    crumbs
}

/// `file://` URL for an absolute path, percent-encoding everything outside
/// the RFC 3986 unreserved set (plus `/` and the drive colon).
pub fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut url = String::from("file://");
    if !raw.starts_with('/') {
        url.push('/');
    }
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' | b':' => {
                url.push(byte as char)
            }
            other => url.push_str(&format!("%{other:02X}")),
        }
    }
    url
}
