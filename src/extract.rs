//! Archive extraction.
//!
//! Dispatch is by filename suffix. Gzipped tarballs are unpacked
//! in-process; zip archives go through the `unzip` tool validated by
//! preflight. An unrecognized suffix is a hard error so a malformed
//! download surfaces here instead of as a missing tree later.

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::Path;
use std::process::Command;

/// Unpack `archive` into the directory `dest`.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive, dest)
    } else if name.ends_with(".zip") {
        extract_zip(archive, dest)
    } else {
        bail!(
            "unrecognized archive suffix for '{}'; expected .tar.gz, .tgz or .zip",
            archive.display()
        )
    }
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)
        .with_context(|| format!("creating extraction directory '{}'", dest.display()))?;

    let f = File::open(archive)
        .with_context(|| format!("opening archive '{}'", archive.display()))?;
    let decoder = GzDecoder::new(f);
    let mut tarball = tar::Archive::new(decoder);
    tarball.set_preserve_permissions(true);
    tarball
        .unpack(dest)
        .with_context(|| format!("unpacking '{}'", archive.display()))?;
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)
        .with_context(|| format!("creating extraction directory '{}'", dest.display()))?;

    let output = Command::new("unzip")
        .arg("-q")
        .arg("-o")
        .arg(archive)
        .arg("-d")
        .arg(dest)
        .output()
        .with_context(|| format!("running unzip for '{}'", archive.display()))?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "unzip failed for '{}' into '{}': {}\n{}",
            archive.display(),
            dest.display(),
            stdout.trim(),
            stderr.trim()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
        let f = File::create(path).unwrap();
        let encoder = GzEncoder::new(f, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn extracts_tar_gz() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("bundle.tar.gz");
        write_tar_gz(&archive, &[("dir/file.txt", "contents")]);

        let dest = tmp.path().join("out");
        extract(&archive, &dest).unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("dir/file.txt")).unwrap(),
            "contents"
        );
    }

    #[test]
    fn extracts_tgz_suffix() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("bundle.tgz");
        write_tar_gz(&archive, &[("a.txt", "a")]);

        let dest = tmp.path().join("out");
        extract(&archive, &dest).unwrap();
        assert!(dest.join("a.txt").exists());
    }

    #[test]
    fn unknown_suffix_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("bundle.7z");
        fs::write(&archive, b"not an archive").unwrap();

        let err = extract(&archive, &tmp.path().join("out")).unwrap_err();
        assert!(err.to_string().contains("unrecognized archive suffix"));
    }
}
