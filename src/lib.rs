//! Assembly pipeline for redistributable Cursor desktop bundles.
//!
//! This crate combines the closed-source Cursor editor release with the
//! open-source VSCodium desktop shell and packages the merged tree for
//! ARM Linux targets. The stages, in dependency order:
//!
//! - **Target registry** - static per-architecture parameter table
//! - **Fetcher** - deterministic download sources with an
//!   existence-based cache under `downloads/`
//! - **Extractor** - suffix-dispatched archive unpacking into `build/`
//! - **Merger** - overlay of the editor's branded files onto the shell
//!   tree with explicit override rules
//! - **Finalizer** - launcher assets and binary renames
//! - **Packager** - gzip tarball plus AppImage with a post-build
//!   interpreter patch, written to `dist/`
//!
//! The pipeline is fully sequential and blocking; every stage failure
//! aborts the run. See `cursor-builder` for the CLI entry point.

pub mod artifact;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod filesystem;
pub mod finalize;
pub mod merge;
pub mod pipeline;
pub mod preflight;
pub mod runs;
pub mod source;
pub mod target;

pub use config::{BuildConfig, VersionSpec};
pub use pipeline::{run_build, DistributionArtifact, Layout};
pub use target::{resolve_target, BuildTarget, ADVERTISED_TARGETS};
