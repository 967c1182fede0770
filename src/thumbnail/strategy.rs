//! Thumbnail strategies.
//!
//! The service tries each [`ThumbnailStrategy`] in order until one reports
//! [`Outcome::Handled`]. A strategy that cannot help (tool missing, decode
//! error, anything) returns [`Outcome::Pass`] and logs why; it never fails the
//! request outright.

use super::Thumbnail;
use super::gate::{Priority, WorkerGate};
use crate::cache::ThumbnailCache;
use crate::formats::OutputFormat;
use crate::imaging::{BackendError, ImageBackend, Quality, ThumbnailParams, calculate_cover_box};
use log::{debug, error, warn};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One thumbnail to produce.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub source: &'a Path,
    pub width: u32,
    pub height: u32,
    /// Cache key for `(source, width, height)`.
    pub key: &'a str,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Handled(Thumbnail),
    Pass,
}

pub trait ThumbnailStrategy: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Produce the thumbnail in `cache`, or pass to the next strategy.
    fn generate(&self, request: &Request<'_>, cache: &ThumbnailCache) -> Outcome;
}

/// Decode, cover-fit and encode WebP through an [`ImageBackend`], bounded by
/// the shared [`WorkerGate`].
pub struct ResizeStrategy {
    backend: Arc<dyn ImageBackend>,
    gate: Arc<WorkerGate>,
    quality: Quality,
}

impl ResizeStrategy {
    pub fn new(backend: Arc<dyn ImageBackend>, gate: Arc<WorkerGate>, quality: Quality) -> Self {
        Self {
            backend,
            gate,
            quality,
        }
    }

    fn resize(
        &self,
        request: &Request<'_>,
        cache: &ThumbnailCache,
    ) -> Result<Thumbnail, BackendError> {
        let dims = self.backend.identify(request.source)?;
        let (crop_width, crop_height) = calculate_cover_box(
            (dims.width, dims.height),
            (request.width, request.height),
        );

        let temp = cache.temp_path(request.key, OutputFormat::WebP);
        let params = ThumbnailParams {
            source: request.source.to_path_buf(),
            output: temp.clone(),
            crop_width,
            crop_height,
            quality: self.quality,
            format: OutputFormat::WebP,
        };
        if let Err(e) = self.backend.thumbnail(&params) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        let path = cache.commit(&temp, request.key, OutputFormat::WebP)?;
        Ok(Thumbnail {
            path,
            format: OutputFormat::WebP,
        })
    }
}

impl ThumbnailStrategy for ResizeStrategy {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn generate(&self, request: &Request<'_>, cache: &ThumbnailCache) -> Outcome {
        let _permit = self.gate.acquire(request.priority);

        if let Err(e) = fs::metadata(request.source) {
            warn!("Source image unavailable {}: {e}", request.source.display());
            return Outcome::Pass;
        }

        match self.resize(request, cache) {
            Ok(thumbnail) => {
                debug!(
                    "Resized {} to {}x{}",
                    request.source.display(),
                    request.width,
                    request.height
                );
                Outcome::Handled(thumbnail)
            }
            Err(e) => {
                error!("Thumbnail failed for {}: {e}", request.source.display());
                Outcome::Pass
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::cache_key;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::touch_all;
    use tempfile::TempDir;

    fn setup(backend: Arc<MockBackend>) -> (TempDir, ThumbnailCache, ResizeStrategy) {
        let tmp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(tmp.path().join("cache"));
        cache.ensure_dir().unwrap();
        let strategy = ResizeStrategy::new(backend, Arc::new(WorkerGate::new(3)), Quality::new(80));
        (tmp, cache, strategy)
    }

    fn request<'a>(source: &'a Path, key: &'a str, width: u32, height: u32) -> Request<'a> {
        Request {
            source,
            width,
            height,
            key,
            priority: Priority::High,
        }
    }

    #[test]
    fn resize_commits_webp_into_cache() {
        let backend = Arc::new(MockBackend::new());
        let (tmp, cache, strategy) = setup(backend.clone());
        touch_all(tmp.path(), &["a.jpg"]);
        let source = tmp.path().join("a.jpg");
        let key = cache_key(&source, 300, 450);

        let outcome = strategy.generate(&request(&source, &key, 300, 450), &cache);
        let Outcome::Handled(thumbnail) = outcome else {
            panic!("expected a thumbnail");
        };
        assert_eq!(thumbnail.format, OutputFormat::WebP);
        assert_eq!(thumbnail.path, cache.path_for(&key, OutputFormat::WebP));
        assert!(thumbnail.path.exists());
        // Only the committed file is left behind
        assert_eq!(fs::read_dir(cache.dir()).unwrap().count(), 1);
    }

    #[test]
    fn resize_never_upscales() {
        let backend = Arc::new(MockBackend::with_dimensions(120, 80));
        let (tmp, cache, strategy) = setup(backend.clone());
        touch_all(tmp.path(), &["small.png"]);
        let source = tmp.path().join("small.png");

        strategy.generate(&request(&source, "k", 300, 450), &cache);
        let ops = backend.get_operations();
        assert!(ops.iter().any(|op| matches!(
            op,
            RecordedOp::Thumbnail {
                crop_width: 120,
                crop_height: 80,
                ..
            }
        )));
    }

    #[test]
    fn missing_source_passes_without_backend_calls() {
        let backend = Arc::new(MockBackend::new());
        let (tmp, cache, strategy) = setup(backend.clone());
        let source = tmp.path().join("missing.jpg");

        assert_eq!(
            strategy.generate(&request(&source, "k", 10, 10), &cache),
            Outcome::Pass
        );
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn backend_failure_passes_and_cleans_temp() {
        let backend = Arc::new(MockBackend::failing());
        let (tmp, cache, strategy) = setup(backend.clone());
        touch_all(tmp.path(), &["a.jpg"]);
        let source = tmp.path().join("a.jpg");

        assert_eq!(
            strategy.generate(&request(&source, "k", 10, 10), &cache),
            Outcome::Pass
        );
        assert_eq!(fs::read_dir(cache.dir()).unwrap().count(), 0);
    }
}
