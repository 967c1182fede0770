//! OS-native thumbnails.
//!
//! On macOS, Quick Look renders thumbnails for every format Finder can
//! preview, usually faster than a full decode. It is driven through the
//! `qlmanage` tool, which writes `<file name>.png` into an output directory.
//! Elsewhere this strategy always passes.

use super::Thumbnail;
use super::strategy::{Outcome, Request, ThumbnailStrategy};
use crate::cache::ThumbnailCache;
use crate::formats::OutputFormat;
use log::{debug, warn};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

const QLMANAGE: &str = "/usr/bin/qlmanage";

/// Check if Quick Look's command-line tool is available on this system.
pub fn native_thumbnailer_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| cfg!(target_os = "macos") && Path::new(QLMANAGE).is_file())
}

#[derive(Debug, Default)]
pub struct NativeStrategy;

impl NativeStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl ThumbnailStrategy for NativeStrategy {
    fn name(&self) -> &'static str {
        "native"
    }

    fn generate(&self, request: &Request<'_>, cache: &ThumbnailCache) -> Outcome {
        if !native_thumbnailer_available() {
            return Outcome::Pass;
        }
        let Some(file_name) = request.source.file_name() else {
            return Outcome::Pass;
        };

        // qlmanage picks its own output name, so give it a private directory.
        let scratch = cache.temp_path(request.key, OutputFormat::Png);
        if let Err(e) = fs::create_dir(&scratch) {
            warn!("Cannot create Quick Look scratch dir: {e}");
            return Outcome::Pass;
        }

        let size = request.width.max(request.height);
        let status = Command::new(QLMANAGE)
            .arg("-t")
            .arg("-s")
            .arg(size.to_string())
            .arg("-o")
            .arg(&scratch)
            .arg(request.source)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        let mut produced = scratch.join(file_name);
        produced.as_mut_os_string().push(".png");

        let outcome = match status {
            Ok(status) if status.success() => {
                let non_empty = fs::metadata(&produced).is_ok_and(|m| m.len() > 0);
                if non_empty {
                    match cache.commit(&produced, request.key, OutputFormat::Png) {
                        Ok(path) => Outcome::Handled(Thumbnail {
                            path,
                            format: OutputFormat::Png,
                        }),
                        Err(e) => {
                            warn!("Cannot store Quick Look thumbnail: {e}");
                            Outcome::Pass
                        }
                    }
                } else {
                    debug!("Quick Look produced nothing for {}", request.source.display());
                    Outcome::Pass
                }
            }
            Ok(status) => {
                debug!("qlmanage exited with {status} for {}", request.source.display());
                Outcome::Pass
            }
            Err(e) => {
                warn!("Cannot run qlmanage: {e}");
                Outcome::Pass
            }
        };

        let _ = fs::remove_dir_all(&scratch);
        outcome
    }
}
