//! Browser configuration.
//!
//! Handles loading, validating, and merging the `config.toml` that tunes the
//! scanner and the thumbnail cache. Stock defaults are the base layer; a user
//! file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [scan]
//! sample_limit = 20         # Entries peeked to classify a subdirectory
//! max_preview_samples = 4   # Preview paths per node (at most 4)
//! max_child_scan = 10       # Children sampled when estimating a folder
//! quick_scan_limit = 10     # Entries peeked per sampled child
//! quick_scan_samples = 2    # Sample paths kept per sampled child
//!
//! [thumbnails]
//! resolution = 600          # Batch thumbnail width; height is 1.5x
//! quality = 80              # Encoder quality (1-100)
//! native = true             # Try the OS thumbnailer before resizing
//! concurrency = 3           # Concurrent resizes (1-8)
//!
//! [cache]
//! dir = "/path/to/cache"    # Default: <user cache dir>/album-browser/thumbnail-cache
//! ttl_days = 7              # Delete thumbnails older than this
//! max_size_mb = 500         # Trim oldest thumbnails above this size
//! sweep_interval_hours = 24 # How often the maintenance thread runs
//!
//! [processing]
//! max_threads = 4           # Scan threads (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Name of the directory created under the user cache dir.
pub const CACHE_DIR_NAME: &str = "album-browser";

/// Lower and upper bound for concurrent managed resizes.
pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Preview paths never exceed this, whatever the config says.
pub const MAX_PREVIEW_SAMPLES: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Navigation scanner sampling limits.
    pub scan: ScanConfig,
    /// Thumbnail generation settings.
    pub thumbnails: ThumbnailsConfig,
    /// Thumbnail cache location and retention.
    pub cache: CacheConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scan = &self.scan;
        for (name, value) in [
            ("scan.sample_limit", scan.sample_limit),
            ("scan.max_preview_samples", scan.max_preview_samples),
            ("scan.max_child_scan", scan.max_child_scan),
            ("scan.quick_scan_limit", scan.quick_scan_limit),
            ("scan.quick_scan_samples", scan.quick_scan_samples),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{name} must be at least 1")));
            }
        }
        if scan.max_preview_samples > MAX_PREVIEW_SAMPLES {
            return Err(ConfigError::Validation(format!(
                "scan.max_preview_samples must be at most {MAX_PREVIEW_SAMPLES}"
            )));
        }
        if self.thumbnails.quality == 0 || self.thumbnails.quality > 100 {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.thumbnails.resolution == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.resolution must be non-zero".into(),
            ));
        }
        if self.cache.ttl_days == 0 {
            return Err(ConfigError::Validation(
                "cache.ttl_days must be at least 1".into(),
            ));
        }
        if self.cache.max_size_mb == 0 {
            return Err(ConfigError::Validation(
                "cache.max_size_mb must be at least 1".into(),
            ));
        }
        if self.cache.sweep_interval_hours == 0 {
            return Err(ConfigError::Validation(
                "cache.sweep_interval_hours must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// How much of the filesystem the scanner reads per node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub sample_limit: usize,
    pub max_preview_samples: usize,
    pub max_child_scan: usize,
    pub quick_scan_limit: usize,
    pub quick_scan_samples: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sample_limit: 20,
            max_preview_samples: 4,
            max_child_scan: 10,
            quick_scan_limit: 10,
            quick_scan_samples: 2,
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Width of batch thumbnails; height is `resolution * 1.5`.
    pub resolution: u32,
    pub quality: u32,
    /// Whether the OS thumbnailer is tried before the managed resize.
    pub native: bool,
    /// Concurrent managed resizes. Absent means the default of 3.
    pub concurrency: Option<usize>,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            resolution: 600,
            quality: 80,
            native: true,
            concurrency: None,
        }
    }
}

impl ThumbnailsConfig {
    /// Box requested by batch prefetch.
    pub fn batch_size(&self) -> (u32, u32) {
        let width = self.resolution;
        let height = (f64::from(width) * 1.5).round() as u32;
        (width, height)
    }
}

/// Clamp a requested worker count into the supported range.
pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
}

/// Resolve the effective resize concurrency from config.
pub fn effective_concurrency(config: &ThumbnailsConfig) -> usize {
    clamp_concurrency(config.concurrency.unwrap_or(DEFAULT_CONCURRENCY))
}

/// Thumbnail cache location and retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache directory. When absent, a directory under the user cache dir.
    pub dir: Option<PathBuf>,
    pub ttl_days: u64,
    pub max_size_mb: u64,
    pub sweep_interval_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_days: 7,
            max_size_mb: 500,
            sweep_interval_hours: 24,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days * 24 * 60 * 60)
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb * 1024 * 1024
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_hours * 60 * 60)
    }
}

/// Resolve where thumbnails live.
///
/// - `dir` set → that directory
/// - otherwise `<user cache dir>/album-browser/thumbnail-cache`
/// - no user cache dir (headless, no `$HOME`) → the system temp dir instead
pub fn resolve_cache_dir(config: &CacheConfig) -> PathBuf {
    if let Some(dir) = &config.dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
        .join("thumbnail-cache")
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of scan threads.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or stock defaults when no path is given.
///
/// An explicitly named file that does not exist is treated like no file;
/// the CLI reports which one it used.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = match path {
        Some(path) => load_raw_config(path)?,
        None => None,
    };
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Album Browser Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Navigation scanner
# ---------------------------------------------------------------------------
[scan]
# Entries read from a subdirectory to decide whether it is a folder,
# an album, or empty.
sample_limit = 20

# Preview image paths attached to each node (at most 4).
max_preview_samples = 4

# Children of a folder that are looked at when estimating its image count.
# Larger folders are extrapolated from this sample.
max_child_scan = 10

# Entries read from each sampled child during a folder estimate.
quick_scan_limit = 10

# Sample image paths kept from each sampled child.
quick_scan_samples = 2

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Width of prefetched grid thumbnails. Height is 1.5x the width.
resolution = 600

# Encoder quality (1-100).
quality = 80

# Ask the operating system's thumbnailer first (macOS Quick Look).
native = true

# Concurrent thumbnail resizes (1-8). Omit for the default of 3.
# concurrency = 3

# ---------------------------------------------------------------------------
# Thumbnail cache
# ---------------------------------------------------------------------------
[cache]
# Where thumbnails are stored.
# Omit to use <user cache dir>/album-browser/thumbnail-cache.
# dir = "/path/to/cache"

# Thumbnails not regenerated for this many days are deleted.
ttl_days = 7

# When the cache grows past this size, the oldest thumbnails are deleted.
max_size_mb = 500

# Hours between background cache sweeps.
sweep_interval_hours = 24

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of threads used for directory scans.
# Omit to auto-detect (uses all CPU cores).
# Values larger than the number of cores are clamped down.
# max_threads = 4
"##
}
