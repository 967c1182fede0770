//! On-disk thumbnail cache.
//!
//! Decoding and resizing a full-size photo is the expensive part of showing a
//! grid, so every thumbnail is written once to a shared cache directory and
//! served from there afterwards.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The cache is **content-addressed by request**: the filename is the
//! SHA-256 of `(source path, width, height)`, with the output format as the
//! extension:
//!
//! ```text
//! thumbnail-cache/
//! ├── 3f9a…c1.webp     # managed resize
//! └── 77b0…e4.png      # OS-native thumbnailer output
//! ```
//!
//! There is no manifest. Presence on disk IS the index, so a lookup is one
//! `stat` per format and needs no lock. Editing a source image in place does
//! not invalidate its thumbnail; the TTL sweep eventually does.
//!
//! ## Writes
//!
//! Generators write to a unique temp file in the same directory and
//! [`commit`](ThumbnailCache::commit) renames it into place, so readers never
//! see a half-written thumbnail.
//!
//! ## Eviction
//!
//! - [`sweep_expired`](ThumbnailCache::sweep_expired): delete files whose
//!   mtime is older than the TTL.
//! - [`sweep_oversize`](ThumbnailCache::sweep_oversize): when the directory
//!   exceeds the size cap, delete oldest-first until it fits.
//! - [`clear`](ThumbnailCache::clear): delete everything.
//!
//! Temp entries (`*.tmp-*` files, and the scratch directories the OS
//! thumbnailer writes into) younger than [`TEMP_GRACE`] may belong to a
//! generation that is still running, so no sweep touches them. Older ones are
//! leftovers from a crash and go on the next sweep or clear.

use crate::formats::OutputFormat;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Age below which a temp entry is assumed to be in use.
pub const TEMP_GRACE: Duration = Duration::from_secs(60);

const TEMP_MARKER: &str = ".tmp-";

/// SHA-256 cache key for a thumbnail request, returned as a hex string.
///
/// Inputs: source path, width and height. Any change gives a different
/// file.
pub fn cache_key(source: &Path, width: u32, height: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"thumbnail\0");
    hasher.update(source.as_os_str().as_encoded_bytes());
    hasher.update(b"\0");
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// A thumbnail directory. Cheap to clone; holds only the path.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
}

impl ThumbnailCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory. An existing directory is success.
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    pub fn path_for(&self, key: &str, format: OutputFormat) -> PathBuf {
        self.dir.join(format!("{key}.{}", format.extension()))
    }

    /// Cached thumbnail for `key`, WebP preferred over PNG.
    ///
    /// Empty files (a crashed writer that bypassed the temp file) do not
    /// count.
    pub fn lookup(&self, key: &str) -> Option<(PathBuf, OutputFormat)> {
        OutputFormat::ALL.into_iter().find_map(|format| {
            let path = self.path_for(key, format);
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() && meta.len() > 0 => Some((path, format)),
                _ => None,
            }
        })
    }

    /// Unique scratch path next to the final file.
    ///
    /// Unique per process and per call, so concurrent generations (even from
    /// two app instances sharing a cache) never write the same file.
    pub fn temp_path(&self, key: &str, format: OutputFormat) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "{key}.{}.tmp-{}-{n}",
            format.extension(),
            std::process::id()
        ))
    }

    /// Move a finished temp file into its final place.
    ///
    /// The temp file is removed if the rename fails.
    pub fn commit(&self, temp: &Path, key: &str, format: OutputFormat) -> io::Result<PathBuf> {
        let target = self.path_for(key, format);
        if let Err(e) = fs::rename(temp, &target) {
            let _ = fs::remove_file(temp);
            return Err(e);
        }
        Ok(target)
    }

    fn listing(&self, now: SystemTime) -> io::Result<Listing> {
        let mut listing = Listing::default();
        for entry in fs::read_dir(&self.dir)?.filter_map(|entry| entry.ok()) {
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            let path = entry.path();
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let temp = is_temp(&path);
            if temp && !is_stale(modified, now) {
                continue;
            }
            if meta.is_file() {
                listing.files.push(CacheFile {
                    path,
                    size: meta.len(),
                    modified,
                    temp,
                });
            } else if meta.is_dir() && temp {
                listing.scratch_dirs.push(path);
            }
        }
        Ok(listing)
    }

    /// Total bytes of all files in the cache directory.
    pub fn total_size(&self) -> io::Result<u64> {
        let listing = self.listing(SystemTime::now())?;
        Ok(listing.files.iter().map(|f| f.size).sum())
    }

    /// Delete files last modified more than `ttl` before `now`, plus stale
    /// temp entries whatever the TTL.
    ///
    /// Files with an mtime in the future are kept.
    pub fn sweep_expired(&self, ttl: Duration, now: SystemTime) -> io::Result<SweepReport> {
        let listing = self.listing(now)?;
        let mut report = SweepReport::default();
        for file in listing.files {
            let expired = file.temp
                || now
                    .duration_since(file.modified)
                    .is_ok_and(|age| age > ttl);
            if expired && fs::remove_file(&file.path).is_ok() {
                report.deleted += 1;
                report.freed_bytes += file.size;
            } else {
                report.remaining_bytes += file.size;
            }
        }
        report.deleted += remove_dirs(&listing.scratch_dirs);
        Ok(report)
    }

    /// If the cache holds more than `max_bytes`, delete oldest-mtime files
    /// until it fits.
    pub fn sweep_oversize(&self, max_bytes: u64) -> io::Result<SweepReport> {
        let mut files = self.listing(SystemTime::now())?.files;
        let mut total: u64 = files.iter().map(|f| f.size).sum();
        let mut report = SweepReport::default();

        if total > max_bytes {
            files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
            for file in &files {
                if total <= max_bytes {
                    break;
                }
                if fs::remove_file(&file.path).is_ok() {
                    total -= file.size;
                    report.deleted += 1;
                    report.freed_bytes += file.size;
                }
            }
        }

        report.remaining_bytes = total;
        Ok(report)
    }

    /// Delete every file in the cache directory, and stale scratch
    /// directories. Returns how many entries were deleted; entries that
    /// cannot be removed are skipped, as are temp entries still in use.
    pub fn clear(&self) -> io::Result<usize> {
        let listing = self.listing(SystemTime::now())?;
        let mut deleted = 0;
        for file in &listing.files {
            if fs::remove_file(&file.path).is_ok() {
                deleted += 1;
            }
        }
        Ok(deleted + remove_dirs(&listing.scratch_dirs))
    }
}

fn is_temp(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().contains(TEMP_MARKER))
}

/// Old enough that no running generation can own it. Future mtimes are not.
fn is_stale(modified: SystemTime, now: SystemTime) -> bool {
    now.duration_since(modified)
        .is_ok_and(|age| age >= TEMP_GRACE)
}

fn remove_dirs(dirs: &[PathBuf]) -> usize {
    dirs.iter()
        .filter(|dir| fs::remove_dir_all(dir).is_ok())
        .count()
}

#[derive(Default)]
struct Listing {
    files: Vec<CacheFile>,
    scratch_dirs: Vec<PathBuf>,
}

struct CacheFile {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
    temp: bool,
}

/// What a sweep removed and what it left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub deleted: usize,
    pub freed_bytes: u64,
    pub remaining_bytes: u64,
}

impl SweepReport {
    /// Combine two sweeps run back to back; the later one knows what is left.
    pub fn then(self, later: SweepReport) -> SweepReport {
        SweepReport {
            deleted: self.deleted + later.deleted,
            freed_bytes: self.freed_bytes + later.freed_bytes,
            remaining_bytes: later.remaining_bytes,
        }
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deleted > 0 {
            write!(
                f,
                "{} removed ({} freed, {} kept)",
                self.deleted,
                human_bytes(self.freed_bytes),
                human_bytes(self.remaining_bytes)
            )
        } else {
            write!(f, "nothing to remove ({} kept)", human_bytes(self.remaining_bytes))
        }
    }
}

/// `1536` → `"1.5 KB"`.
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
