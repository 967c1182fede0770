//! Background cache maintenance.
//!
//! A single named thread runs both sweeps once at start and then once per
//! interval. It sleeps on a channel rather than `thread::sleep`, so stopping
//! it is immediate: [`MaintenanceHandle::stop`] (or dropping the handle)
//! sends a message and joins.

use crate::cache::{SweepReport, ThumbnailCache};
use log::{info, warn};
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

/// How long thumbnails live and how much space they may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub ttl: Duration,
    pub max_bytes: u64,
}

/// TTL sweep followed by the size sweep.
pub fn run_sweeps(cache: &ThumbnailCache, policy: &RetentionPolicy) -> io::Result<SweepReport> {
    let expired = cache.sweep_expired(policy.ttl, SystemTime::now())?;
    let oversize = cache.sweep_oversize(policy.max_bytes)?;
    Ok(expired.then(oversize))
}

pub struct MaintenanceHandle {
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl MaintenanceHandle {
    /// Start the maintenance thread.
    pub fn spawn(
        cache: ThumbnailCache,
        policy: RetentionPolicy,
        interval: Duration,
    ) -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("thumbnail-maintenance".into())
            .spawn(move || {
                loop {
                    match run_sweeps(&cache, &policy) {
                        Ok(report) => info!("Thumbnail cache sweep: {report}"),
                        Err(e) => warn!("Thumbnail cache sweep failed: {e}"),
                    }
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.stop.send(());
            if thread.join().is_err() {
                warn!("Thumbnail maintenance thread panicked");
            }
        }
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::OutputFormat;
    use crate::test_helpers::set_mtime_ago;
    use std::fs;
    use std::time::Instant;
    use tempfile::TempDir;

    fn policy() -> RetentionPolicy {
        RetentionPolicy {
            ttl: Duration::from_secs(7 * 86_400),
            max_bytes: 1000,
        }
    }

    #[test]
    fn run_sweeps_applies_ttl_then_size() {
        let tmp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(tmp.path());
        let expired = cache.path_for("expired", OutputFormat::WebP);
        let older = cache.path_for("older", OutputFormat::WebP);
        let newer = cache.path_for("newer", OutputFormat::WebP);
        fs::write(&expired, vec![0u8; 100]).unwrap();
        fs::write(&older, vec![0u8; 600]).unwrap();
        fs::write(&newer, vec![0u8; 600]).unwrap();
        set_mtime_ago(&expired, 30 * 86_400);
        set_mtime_ago(&older, 2000);
        set_mtime_ago(&newer, 1000);

        let report = run_sweeps(&cache, &policy()).unwrap();
        assert_eq!(report.deleted, 2);
        assert_eq!(report.freed_bytes, 700);
        assert_eq!(report.remaining_bytes, 600);
        assert!(newer.exists());
    }

    #[test]
    fn thread_sweeps_on_start_and_stops_promptly() {
        let tmp = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(tmp.path());
        let expired = cache.path_for("expired", OutputFormat::Png);
        fs::write(&expired, b"x").unwrap();
        set_mtime_ago(&expired, 30 * 86_400);

        let handle =
            MaintenanceHandle::spawn(cache, policy(), Duration::from_secs(3600)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while expired.exists() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!expired.exists());

        let started = Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
