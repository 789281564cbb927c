//! Per-target build run manifests.
//!
//! Each target's build directory carries a `run-manifest.json`
//! recording what was built and when. The manifest is written with
//! status `running` before the first stage and finalized to `success`
//! after the artifacts exist, so an aborted run is distinguishable
//! from a completed one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const RUN_MANIFEST_FILENAME: &str = "run-manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunManifest {
    pub target: String,
    pub product_version: String,
    pub status: String,
    pub created_at_utc: String,
    pub finished_at_utc: Option<String>,
}

pub fn manifest_path(build_dir: &Path) -> PathBuf {
    build_dir.join(RUN_MANIFEST_FILENAME)
}

/// Record the start of a run with status `running`.
pub fn record_start(build_dir: &Path, target: &str, product_version: &str) -> Result<()> {
    let manifest = RunManifest {
        target: target.to_string(),
        product_version: product_version.to_string(),
        status: "running".to_string(),
        created_at_utc: now_utc()?,
        finished_at_utc: None,
    };
    write_manifest(build_dir, &manifest)
}

/// Mark the current run successful, stamping the finish time.
pub fn record_success(build_dir: &Path) -> Result<()> {
    let mut manifest = load_manifest(build_dir)?
        .with_context(|| format!("no run manifest under '{}'", build_dir.display()))?;
    manifest.status = "success".to_string();
    manifest.finished_at_utc = Some(now_utc()?);
    write_manifest(build_dir, &manifest)
}

pub fn load_manifest(build_dir: &Path) -> Result<Option<RunManifest>> {
    let path = manifest_path(build_dir);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path)
        .with_context(|| format!("reading run manifest '{}'", path.display()))?;
    let parsed: RunManifest = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing run manifest '{}'", path.display()))?;
    Ok(Some(parsed))
}

fn write_manifest(build_dir: &Path, manifest: &RunManifest) -> Result<()> {
    fs::create_dir_all(build_dir)
        .with_context(|| format!("creating build directory '{}'", build_dir.display()))?;
    let path = manifest_path(build_dir);
    let bytes = serde_json::to_vec_pretty(manifest)?;
    fs::write(&path, bytes)
        .with_context(|| format!("writing run manifest '{}'", path.display()))?;
    Ok(())
}

fn now_utc() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("formatting UTC timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn start_then_success_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let build_dir = tmp.path().join("aarch64-linux");

        record_start(&build_dir, "aarch64-linux", "1.2.3").unwrap();
        let running = load_manifest(&build_dir).unwrap().unwrap();
        assert_eq!(running.status, "running");
        assert_eq!(running.product_version, "1.2.3");
        assert!(running.finished_at_utc.is_none());

        record_success(&build_dir).unwrap();
        let done = load_manifest(&build_dir).unwrap().unwrap();
        assert_eq!(done.status, "success");
        assert!(done.finished_at_utc.is_some());
    }

    #[test]
    fn load_without_manifest_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(load_manifest(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn success_without_start_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(record_success(tmp.path()).is_err());
    }
}
