//! Shared filesystem primitives for tree assembly.

use anyhow::{bail, Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Recursively copy a directory tree, preserving symlinks.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)
        .with_context(|| format!("creating directory '{}'", dst.display()))?;

    for entry in
        fs::read_dir(src).with_context(|| format!("reading directory '{}'", src.display()))?
    {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_symlink() {
            let target = fs::read_link(&src_path)
                .with_context(|| format!("reading symlink '{}'", src_path.display()))?;
            if dst_path.is_symlink() || dst_path.exists() {
                fs::remove_file(&dst_path)?;
            }
            std::os::unix::fs::symlink(&target, &dst_path)
                .with_context(|| format!("creating symlink '{}'", dst_path.display()))?;
        } else if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).with_context(|| {
                format!(
                    "copying '{}' to '{}'",
                    src_path.display(),
                    dst_path.display()
                )
            })?;
        }
    }

    Ok(())
}

/// Replace `dst` with a copy of the directory `src`.
///
/// The destination is removed first so stale entries never survive.
pub fn replace_dir(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        bail!("directory not found: {}", src.display());
    }
    if dst.exists() {
        fs::remove_dir_all(dst)
            .with_context(|| format!("removing existing directory '{}'", dst.display()))?;
    }
    copy_dir_recursive(src, dst)
}

/// Copy a single file into place, overwriting any existing file.
pub fn copy_file_into(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_file() {
        bail!("file not found: {}", src.display());
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    fs::copy(src, dst)
        .with_context(|| format!("copying '{}' to '{}'", src.display(), dst.display()))?;
    Ok(())
}

/// Mark a file executable (0o755).
pub fn mark_executable(path: &Path) -> Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("marking '{}' executable", path.display()))?;
    Ok(())
}
