//! Thumbnail service.
//!
//! Resolves `(image, width, height)` to a cached thumbnail file, generating it
//! on demand. A request goes through these steps, stopping at the first that
//! produces a file:
//!
//! 1. **Fast path**: the cache already has `<key>.webp` or `<key>.png`. No
//!    lock is taken.
//! 2. **De-duplication**: another caller is already generating this key, so
//!    wait for its result instead of decoding the image twice.
//! 3. **Strategy chain**: the OS thumbnailer (macOS Quick Look, when
//!    enabled), then the managed resize, which runs under a bounded
//!    [`WorkerGate`] so a screenful of requests cannot decode dozens of
//!    full-size photos at once.
//!
//! No public operation returns an error for a bad image: a missing or corrupt
//! source, or a codec failure, is logged and surfaces as `None`. Only failing
//! to create the cache directory at construction is reported, since nothing
//! works without it.
//!
//! The directory is created once. If it disappears later (a user wiping
//! `~/.cache`), the first generation that fails because of it recreates the
//! directory and retries once.

pub mod gate;
pub mod inflight;
pub mod maintenance;
pub mod native;
pub mod strategy;

pub use gate::{Priority, WorkerGate};
pub use strategy::{Outcome, Request, ResizeStrategy, ThumbnailStrategy};

use crate::cache::{SweepReport, ThumbnailCache, cache_key};
use crate::config::{self, AppConfig};
use crate::formats::OutputFormat;
use crate::imaging::{ImageBackend, Quality, RustBackend};
use crate::paths;
use crate::types::ClearOutcome;
use inflight::{Claim, InFlight};
use log::{debug, error, info, warn};
use maintenance::{MaintenanceHandle, RetentionPolicy};
use native::NativeStrategy;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Cannot create thumbnail cache directory {}: {source}", path.display())]
    CacheDir { path: PathBuf, source: io::Error },
    #[error("Cannot start cache maintenance: {0}")]
    Maintenance(io::Error),
}

/// A thumbnail file in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub path: PathBuf,
    pub format: OutputFormat,
}

impl Thumbnail {
    /// `file://` URL the UI can load directly.
    pub fn url(&self) -> String {
        paths::file_url(&self.path)
    }
}

pub struct ThumbnailService {
    cache: ThumbnailCache,
    /// The cache directory existed last time anything checked.
    cache_ready: AtomicBool,
    strategies: Vec<Box<dyn ThumbnailStrategy>>,
    gate: Arc<WorkerGate>,
    in_flight: InFlight<Thumbnail>,
    batch_size: (u32, u32),
    retention: RetentionPolicy,
    sweep_interval: Duration,
    maintenance: Mutex<Option<MaintenanceHandle>>,
}

impl ThumbnailService {
    /// Service backed by the pure Rust image pipeline.
    pub fn new(config: &AppConfig) -> Result<Self, ThumbnailError> {
        Self::with_backend(config, Arc::new(RustBackend::new()))
    }

    /// Service whose managed resize runs on `backend`.
    pub fn with_backend(
        config: &AppConfig,
        backend: Arc<dyn ImageBackend>,
    ) -> Result<Self, ThumbnailError> {
        let gate = Arc::new(WorkerGate::new(config::effective_concurrency(
            &config.thumbnails,
        )));

        let mut strategies: Vec<Box<dyn ThumbnailStrategy>> = Vec::new();
        if config.thumbnails.native {
            strategies.push(Box::new(NativeStrategy::new()));
        }
        strategies.push(Box::new(ResizeStrategy::new(
            backend,
            gate.clone(),
            Quality::new(config.thumbnails.quality),
        )));

        Self::from_parts(config, gate, strategies)
    }

    /// Service with an explicit strategy chain, tried in order.
    ///
    /// `gate` is the one [`set_concurrency`](Self::set_concurrency) adjusts;
    /// strategies that should be bounded must share it.
    pub fn from_parts(
        config: &AppConfig,
        gate: Arc<WorkerGate>,
        strategies: Vec<Box<dyn ThumbnailStrategy>>,
    ) -> Result<Self, ThumbnailError> {
        let cache = ThumbnailCache::new(config::resolve_cache_dir(&config.cache));
        cache.ensure_dir().map_err(|source| ThumbnailError::CacheDir {
            path: cache.dir().to_path_buf(),
            source,
        })?;

        Ok(Self {
            cache,
            cache_ready: AtomicBool::new(true),
            strategies,
            gate,
            in_flight: InFlight::new(),
            batch_size: config.thumbnails.batch_size(),
            retention: RetentionPolicy {
                ttl: config.cache.ttl(),
                max_bytes: config.cache.max_size_bytes(),
            },
            sweep_interval: config.cache.sweep_interval(),
            maintenance: Mutex::new(None),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache.dir()
    }

    /// Thumbnail for an image the user is looking at.
    pub fn get_thumbnail(&self, source: &Path, width: u32, height: u32) -> Option<Thumbnail> {
        self.get_thumbnail_with_priority(source, width, height, Priority::High)
    }

    pub fn get_thumbnail_with_priority(
        &self,
        source: &Path,
        width: u32,
        height: u32,
        priority: Priority,
    ) -> Option<Thumbnail> {
        if !self.ensure_cache_dir() {
            return None;
        }

        // The key hashes the raw path bytes, so it also tells apart sources
        // whose names only differ in bytes that are not valid UTF-8.
        let key = cache_key(source, width, height);
        if let Some(hit) = self.cached(&key) {
            return Some(hit);
        }

        match self.in_flight.claim(&key) {
            Claim::Follower(slot) => {
                debug!(
                    "Waiting on in-flight thumbnail for {} at {width}x{height}",
                    source.display()
                );
                slot.wait()
            }
            Claim::Leader(leader) => {
                // A generation may have finished between the lookup and the claim.
                if let Some(hit) = self.cached(&key) {
                    leader.finish(Some(hit.clone()));
                    return Some(hit);
                }
                let request = Request {
                    source,
                    width,
                    height,
                    key: &key,
                    priority,
                };
                let result = self.generate_or_recover(&request);
                leader.finish(result.clone());
                result
            }
        }
    }

    /// Create the cache directory unless it is known to exist.
    fn ensure_cache_dir(&self) -> bool {
        if self.cache_ready.load(Ordering::Acquire) {
            return true;
        }
        match self.cache.ensure_dir() {
            Ok(()) => {
                self.cache_ready.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                error!(
                    "Thumbnail cache directory {} unavailable: {e}",
                    self.cache.dir().display()
                );
                false
            }
        }
    }

    /// [`generate`](Self::generate), retried once if it failed because the
    /// cache directory has gone.
    fn generate_or_recover(&self, request: &Request<'_>) -> Option<Thumbnail> {
        let result = self.generate(request);
        if result.is_some() || self.cache.dir().is_dir() {
            return result;
        }

        self.cache_ready.store(false, Ordering::Release);
        warn!(
            "Thumbnail cache directory {} disappeared, recreating",
            self.cache.dir().display()
        );
        if self.ensure_cache_dir() {
            self.generate(request)
        } else {
            None
        }
    }

    fn cached(&self, key: &str) -> Option<Thumbnail> {
        let (path, format) = self.cache.lookup(key)?;
        debug!("Thumbnail cache hit {}", path.display());
        Some(Thumbnail { path, format })
    }

    fn generate(&self, request: &Request<'_>) -> Option<Thumbnail> {
        for strategy in &self.strategies {
            if let Outcome::Handled(thumbnail) = strategy.generate(request, &self.cache) {
                debug!(
                    "{} thumbnail for {} via {}",
                    thumbnail.format.extension(),
                    request.source.display(),
                    strategy.name()
                );
                return Some(thumbnail);
            }
        }
        warn!("No thumbnail produced for {}", request.source.display());
        None
    }

    /// Prefetch grid thumbnails at the configured resolution.
    ///
    /// Runs in parallel at low priority, so interactive requests overtake it.
    /// Every input path is in the result; failures map to `None`.
    pub fn get_batch_thumbnails(&self, sources: &[PathBuf]) -> BTreeMap<String, Option<String>> {
        let (width, height) = self.batch_size;
        sources
            .par_iter()
            .map(|source| {
                let url = self
                    .get_thumbnail_with_priority(source, width, height, Priority::Low)
                    .map(|t| t.url());
                (source.to_string_lossy().into_owned(), url)
            })
            .collect()
    }

    /// Delete every cached thumbnail and forget pending generations.
    pub fn clear_cache(&self) -> ClearOutcome {
        let outcome = match self.cache.clear() {
            Ok(deleted) => {
                info!("Cleared {deleted} cached thumbnails");
                ClearOutcome::cleared(deleted)
            }
            Err(e) => {
                error!(
                    "Cannot clear thumbnail cache {}: {e}",
                    self.cache.dir().display()
                );
                self.cache_ready.store(false, Ordering::Release);
                ClearOutcome::failed(e.to_string())
            }
        };
        self.in_flight.clear();
        outcome
    }

    /// Change how many managed resizes may run at once, clamped to 1..=8.
    /// Takes effect immediately, including for callers already waiting.
    pub fn set_concurrency(&self, requested: usize) {
        let limit = config::clamp_concurrency(requested);
        self.gate.set_limit(limit);
        info!("Thumbnail concurrency set to {limit}");
    }

    pub fn concurrency(&self) -> usize {
        self.gate.limit()
    }

    /// Run the TTL and size sweeps now, on the calling thread.
    pub fn run_maintenance(&self) -> io::Result<SweepReport> {
        let report = maintenance::run_sweeps(&self.cache, &self.retention)?;
        info!("Thumbnail cache sweep: {report}");
        Ok(report)
    }

    /// Start the periodic sweep thread. Does nothing if it is already running.
    pub fn start_maintenance(&self) -> Result<(), ThumbnailError> {
        let mut slot = self
            .maintenance
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            let handle = MaintenanceHandle::spawn(
                self.cache.clone(),
                self.retention,
                self.sweep_interval,
            )
            .map_err(ThumbnailError::Maintenance)?;
            *slot = Some(handle);
        }
        Ok(())
    }

    /// Stop the sweep thread, if running, and wait for it.
    pub fn shutdown(&self) {
        let handle = self
            .maintenance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.stop();
        }
    }
}

impl Drop for ThumbnailService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
