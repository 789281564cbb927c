//! AppImage build and interpreter patch.
//!
//! appimagetool is resolved from PATH; when absent it is fetched once
//! into the user cache directory, keyed by the host machine
//! architecture, marked executable and its directory prepended to PATH
//! for the remainder of the run.
//!
//! The produced image embeds the x86-oriented dynamic-linker path of
//! the tool's runtime, so the final step rewrites it with patchelf to
//! the target's interpreter. The rewrite is destructive; a failure
//! leaves the image in an indeterminate state.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::fetch::{fetch, FetchOutcome};
use crate::filesystem::mark_executable;
use crate::source::appimagetool_download;
use crate::target::BuildTarget;

const APPIMAGETOOL: &str = "appimagetool";

/// Make sure appimagetool is resolvable for the rest of the run.
///
/// Returns the path the tool resolves to.
pub fn ensure_appimagetool() -> Result<PathBuf> {
    if let Ok(path) = which::which(APPIMAGETOOL) {
        return Ok(path);
    }

    let tools_dir = tool_cache_dir();
    let spec = appimagetool_download(env::consts::ARCH, &tools_dir);
    match fetch(&spec).with_context(|| "fetching appimagetool")? {
        FetchOutcome::CacheHit => {}
        FetchOutcome::Downloaded => {
            println!("  downloaded appimagetool to {}", spec.dest.display());
        }
    }
    mark_executable(&spec.dest)?;

    prepend_to_path(&tools_dir);

    which::which(APPIMAGETOOL).with_context(|| {
        format!(
            "appimagetool still not resolvable after installing to '{}'",
            tools_dir.display()
        )
    })
}

fn tool_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("cursor-builder")
}

fn prepend_to_path(dir: &Path) {
    let old = env::var_os("PATH").unwrap_or_default();
    let mut parts = vec![dir.to_path_buf()];
    parts.extend(env::split_paths(&old));
    if let Ok(joined) = env::join_paths(parts) {
        env::set_var("PATH", joined);
    }
}

/// Build the executable image for one target.
///
/// The packaging architecture tag is handed to the tool through the
/// ARCH environment variable.
pub fn build_appimage(tree: &Path, target: &BuildTarget, out_path: &Path) -> Result<()> {
    let output = Command::new(APPIMAGETOOL)
        .arg(tree)
        .arg(out_path)
        .env("ARCH", target.packaging_arch_tag)
        .output()
        .with_context(|| format!("running appimagetool for '{}'", out_path.display()))?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "appimagetool failed for '{}' (ARCH={}): {}\n{}",
            out_path.display(),
            target.packaging_arch_tag,
            stdout.trim(),
            stderr.trim()
        );
    }

    if !out_path.is_file() {
        bail!(
            "appimagetool finished but image is missing: {}",
            out_path.display()
        );
    }

    Ok(())
}

/// Rewrite the image's embedded dynamic-linker path for the target.
pub fn patch_interpreter(image: &Path, target: &BuildTarget) -> Result<()> {
    let output = Command::new("patchelf")
        .arg("--set-interpreter")
        .arg(target.interpreter_path)
        .arg(image)
        .output()
        .with_context(|| format!("running patchelf for '{}'", image.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "patchelf failed setting interpreter '{}' on '{}': {}",
            target.interpreter_path,
            image.display(),
            stderr.trim()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_cache_dir_is_host_global() {
        let dir = tool_cache_dir();
        assert!(dir.ends_with("cursor-builder"));
    }

    #[test]
    fn prepend_to_path_puts_dir_first() {
        let dir = PathBuf::from("/nonexistent-tools-dir");
        prepend_to_path(&dir);
        let path = env::var("PATH").unwrap();
        assert!(path.starts_with("/nonexistent-tools-dir"));
    }
}
