//! Overlay merge of the editor release onto the base-shell tree.
//!
//! The merge is a fixed sequence of path-specific rules, never a
//! generic recursive diff-merge. Each rule is idempotent: re-applying
//! it to an already-merged tree yields the same tree. A missing source
//! path inside the editor bundle is fatal; the pipeline does not
//! tolerate a bundle with an unexpected internal layout.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::config::PRODUCT_NAME;
use crate::filesystem::{copy_file_into, replace_dir};

/// Application directory shared by both distributions.
pub const APP_DIR: &str = "resources/app";

const COMPILED_OUTPUT_DIR: &str = "out";
const EXTENSIONS_DIR: &str = "extensions";
const DEPS_ARCHIVE: &str = "node_modules.asar";
const DEPS_UNPACKED_DIR: &str = "node_modules.asar.unpacked";
const APP_RESOURCES_DIR: &str = "resources";

/// Apply all overlay rules from `bundle` onto `tree`, in order.
pub fn merge_branding(bundle: &Path, tree: &Path) -> Result<()> {
    copy_compiled_output(bundle, tree)?;
    copy_app_manifests(bundle, tree)?;
    copy_product_extensions(bundle, tree)?;
    replace_dependency_archive(bundle, tree)?;
    replace_app_resources(bundle, tree)?;
    Ok(())
}

/// Rule 1: replace the compiled application output directory entirely.
fn copy_compiled_output(bundle: &Path, tree: &Path) -> Result<()> {
    let src = bundle.join(APP_DIR).join(COMPILED_OUTPUT_DIR);
    let dst = tree.join(APP_DIR).join(COMPILED_OUTPUT_DIR);
    replace_dir(&src, &dst)
        .with_context(|| format!("overlaying compiled output from '{}'", src.display()))
}

/// Rule 2: copy the top-level JSON manifests of the app directory,
/// overwriting files of the same name.
fn copy_app_manifests(bundle: &Path, tree: &Path) -> Result<()> {
    let src_app = bundle.join(APP_DIR);
    if !src_app.is_dir() {
        bail!("application directory not found: {}", src_app.display());
    }
    let dst_app = tree.join(APP_DIR);

    for entry in fs::read_dir(&src_app)
        .with_context(|| format!("reading application directory '{}'", src_app.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        copy_file_into(&path, &dst_app.join(entry.file_name()))?;
    }

    Ok(())
}

/// Rule 3: copy product-prefixed extension directories, additively.
///
/// Extensions already present in the base tree that do not carry the
/// product prefix are left untouched.
fn copy_product_extensions(bundle: &Path, tree: &Path) -> Result<()> {
    let src_ext = bundle.join(APP_DIR).join(EXTENSIONS_DIR);
    if !src_ext.is_dir() {
        bail!("extensions directory not found: {}", src_ext.display());
    }
    let dst_ext = tree.join(APP_DIR).join(EXTENSIONS_DIR);

    for entry in fs::read_dir(&src_ext)
        .with_context(|| format!("reading extensions directory '{}'", src_ext.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(PRODUCT_NAME) {
            continue;
        }
        replace_dir(&path, &dst_ext.join(name))
            .with_context(|| format!("copying extension '{}'", name))?;
    }

    Ok(())
}

/// Rule 4: replace the packed dependency archive.
///
/// Both the unpacked directory form and the packed archive are deleted
/// before the new archive is copied in, so a stale unpacked tree never
/// survives next to the fresh archive.
fn replace_dependency_archive(bundle: &Path, tree: &Path) -> Result<()> {
    let src = bundle.join(APP_DIR).join(DEPS_ARCHIVE);
    if !src.is_file() {
        bail!("dependency archive not found: {}", src.display());
    }

    let dst_app = tree.join(APP_DIR);
    let unpacked = dst_app.join(DEPS_UNPACKED_DIR);
    if unpacked.exists() {
        fs::remove_dir_all(&unpacked).with_context(|| {
            format!("removing stale unpacked dependencies '{}'", unpacked.display())
        })?;
    }
    let packed = dst_app.join(DEPS_ARCHIVE);
    if packed.exists() {
        fs::remove_file(&packed).with_context(|| {
            format!("removing stale dependency archive '{}'", packed.display())
        })?;
    }

    copy_file_into(&src, &packed)
}

/// Rule 5: full replace of the bundled resource directory.
fn replace_app_resources(bundle: &Path, tree: &Path) -> Result<()> {
    let src = bundle.join(APP_DIR).join(APP_RESOURCES_DIR);
    let dst = tree.join(APP_DIR).join(APP_RESOURCES_DIR);
    replace_dir(&src, &dst)
        .with_context(|| format!("replacing bundled resources from '{}'", src.display()))
}
