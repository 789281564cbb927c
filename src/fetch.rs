//! Idempotent archive fetcher.
//!
//! Caching is purely existence-based: a download destination that is
//! already present on disk satisfies its spec without any network
//! access, whatever its content. The cache directory is not locked, so
//! concurrent invocations sharing it can race on a download.
//!
//! Retrieval shells out to whichever download tool PATH provides,
//! preferring `curl` over `wget`. Any transport failure is fatal; there
//! are no retries.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::Command;

use crate::source::DownloadSpec;

/// How a download spec was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Destination already existed; no network access happened.
    CacheHit,
    /// Destination was retrieved from the network.
    Downloaded,
}

/// The download tool selected from PATH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Downloader {
    Curl,
    Wget,
}

/// Satisfy a download spec, retrieving it only when absent.
pub fn fetch(spec: &DownloadSpec) -> Result<FetchOutcome> {
    if spec.dest.exists() {
        return Ok(FetchOutcome::CacheHit);
    }

    if let Some(parent) = spec.dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating download directory '{}'", parent.display()))?;
    }

    let downloader = select_downloader()?;
    download(downloader, &spec.url, &spec.dest)?;

    if !spec.dest.is_file() {
        bail!(
            "download tool reported success but '{}' is missing",
            spec.dest.display()
        );
    }

    // Informational only. The cache check above never consults it.
    write_sha256_sidecar(&spec.dest)?;

    Ok(FetchOutcome::Downloaded)
}

fn select_downloader() -> Result<Downloader> {
    if which::which("curl").is_ok() {
        return Ok(Downloader::Curl);
    }
    if which::which("wget").is_ok() {
        return Ok(Downloader::Wget);
    }
    bail!("no download tool found; install curl or wget");
}

fn download(downloader: Downloader, url: &str, dest: &Path) -> Result<()> {
    let mut cmd = match downloader {
        Downloader::Curl => {
            let mut c = Command::new("curl");
            c.arg("-fsSL").arg("-o").arg(dest).arg(url);
            c
        }
        Downloader::Wget => {
            let mut c = Command::new("wget");
            c.arg("-q").arg("-O").arg(dest).arg(url);
            c
        }
    };

    let output = cmd
        .output()
        .with_context(|| format!("running download tool for '{}'", url))?;

    if !output.status.success() {
        // A partial file would satisfy later existence checks.
        let _ = fs::remove_file(dest);
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "download failed for '{}' (exit code {}): {}",
            url,
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }

    Ok(())
}

fn write_sha256_sidecar(dest: &Path) -> Result<()> {
    let (sha256, _size) = sha256_file(dest)?;
    let sidecar = sidecar_path(dest);
    fs::write(&sidecar, format!("{}\n", sha256))
        .with_context(|| format!("writing checksum sidecar '{}'", sidecar.display()))?;
    Ok(())
}

fn sidecar_path(dest: &Path) -> std::path::PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".sha256");
    dest.with_file_name(name)
}

fn sha256_file(path: &Path) -> Result<(String, u64)> {
    let f = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut size = 0u64;
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((format!("{:x}", hasher.finalize()), size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn existing_destination_is_a_cache_hit() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("cursor-1.2.3.zip");
        fs::write(&dest, b"cached bytes").unwrap();

        // The URL is unreachable on purpose; a cache hit must not touch it.
        let spec = DownloadSpec {
            url: "https://invalid.example/never-fetched.zip".into(),
            dest: dest.clone(),
        };

        assert_eq!(fetch(&spec).unwrap(), FetchOutcome::CacheHit);
        assert_eq!(fetch(&spec).unwrap(), FetchOutcome::CacheHit);
        assert_eq!(fs::read(&dest).unwrap(), b"cached bytes");
    }

    #[test]
    fn cache_hit_does_not_write_sidecar() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("archive.tar.gz");
        fs::write(&dest, b"x").unwrap();

        let spec = DownloadSpec {
            url: "https://invalid.example/a.tar.gz".into(),
            dest: dest.clone(),
        };
        fetch(&spec).unwrap();

        assert!(!sidecar_path(&dest).exists());
    }

    #[test]
    fn sidecar_path_appends_suffix() {
        assert_eq!(
            sidecar_path(Path::new("downloads/cursor-1.2.3.zip")),
            PathBuf::from("downloads/cursor-1.2.3.zip.sha256")
        );
    }

    #[test]
    fn sha256_matches_known_digest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("payload");
        fs::write(&path, b"hello").unwrap();

        let (sha, size) = sha256_file(&path).unwrap();
        assert_eq!(size, 5);
        assert_eq!(
            sha,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
