//! Gzip tarball builder.
//!
//! Entries are rooted at the source tree itself (no parent directory
//! entry) and appended in sorted order so repeated builds of the same
//! tree produce identical archives.

use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Pack `src_dir` into a gzip tarball at `out_path`.
pub fn create_tar_gz(src_dir: &Path, out_path: &Path) -> Result<()> {
    if !src_dir.is_dir() {
        bail!("source tree not found: {}", src_dir.display());
    }

    let out = File::create(out_path)
        .with_context(|| format!("creating '{}'", out_path.display()))?;
    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut entries: Vec<PathBuf> = Vec::new();
    for ent in WalkDir::new(src_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if ent.path() == src_dir {
            continue;
        }
        entries.push(ent.path().to_path_buf());
    }

    entries.sort_by(|a, b| {
        let ra = a.strip_prefix(src_dir).unwrap_or(a).to_string_lossy();
        let rb = b.strip_prefix(src_dir).unwrap_or(b).to_string_lossy();
        ra.cmp(&rb)
    });

    for path in entries {
        let rel = path
            .strip_prefix(src_dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");

        let md = fs::symlink_metadata(&path)
            .with_context(|| format!("reading metadata for '{}'", path.display()))?;

        if md.is_dir() {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            header.set_mode(md.permissions().mode());
            header.set_cksum();
            builder.append_data(&mut header, rel, std::io::empty())?;
            continue;
        }

        if md.file_type().is_symlink() {
            let target = fs::read_link(&path)?;
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Symlink);
            header.set_size(0);
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            header.set_mode(md.permissions().mode());
            header.set_link_name(target.to_string_lossy().as_ref())?;
            header.set_cksum();
            builder.append_data(&mut header, rel, std::io::empty())?;
            continue;
        }

        if md.is_file() {
            let mut f = File::open(&path)
                .with_context(|| format!("opening '{}'", path.display()))?;
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(md.len());
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            header.set_mode(md.permissions().mode());
            header.set_cksum();
            builder.append_data(&mut header, rel, &mut f)?;
        }
    }

    let encoder = builder
        .into_inner()
        .context("finalizing tar builder")?;
    encoder
        .finish()
        .with_context(|| format!("finishing '{}'", out_path.display()))?;
    Ok(())
}
