//! # Album Browser
//!
//! The core of a desktop photo browser: it turns a directory the user points
//! at into navigation nodes, and turns images into cached thumbnails. The host
//! application (a UI shell) calls into this crate and renders the JSON it gets
//! back; the bundled CLI does the same from a terminal.
//!
//! # Architecture: Two Services
//!
//! ```text
//! scan_level(dir)            →  NavigationResponse   (one level, sampled)
//! ThumbnailService::get_*    →  file:// thumbnail URL (cached, bounded)
//! ```
//!
//! Both are synchronous. Scans fan out over subdirectories on rayon's pool;
//! thumbnail requests may come from any number of host threads at once and
//! are coordinated inside the service.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Classifies directories as folder / album / empty, lists albums, builds the tree |
//! | [`thumbnail`] | On-demand thumbnails: cache lookup, de-duplication, strategies, worker gate |
//! | [`cache`] | Content-addressed cache files, atomic commits, TTL and size sweeps |
//! | [`imaging`] | Pure-Rust decode, cover-fit resize and encode behind the `ImageBackend` trait |
//! | [`config`] | `config.toml` loading: stock defaults, sparse overlay, validation |
//! | [`types`] | Everything serialized across the host boundary |
//! | [`paths`] | Separator-agnostic path helpers, breadcrumbs, `file://` URLs |
//! | [`naming`] | Natural, case-insensitive name ordering |
//! | [`formats`] | Supported image extensions and thumbnail output formats |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Sample, Don't Walk
//!
//! A photo library can hold hundreds of thousands of files. Navigation only
//! ever reads the target directory plus a bounded prefix of each child, so a
//! level renders in the time of a few hundred `stat` calls however deep the
//! tree goes. Folder image counts are therefore estimates, flagged as such
//! with `quickStats.hasMore`; album counts are exact because an album has no
//! subdirectories to sample.
//!
//! ## Failures Are Values
//!
//! The host wants something to render, not an exception. A scan that cannot
//! read its target returns a response with `success: false`; a thumbnail that
//! cannot be produced is `None`. Errors are logged through the `log` facade
//! and the binary installs `env_logger`.
//!
//! ## One Generation Per Key
//!
//! A grid scrolling past an album asks for the same thumbnail from several
//! places at once. The first request generates it; the rest wait for that
//! result. Distinct images run in parallel, capped by a worker gate whose
//! limit the host can change while requests are in flight.

pub mod cache;
pub mod config;
pub mod formats;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod paths;
pub mod scan;
pub mod thumbnail;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
