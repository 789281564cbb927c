//! The assembly pipeline.
//!
//! A strict linear chain per target: fetch both distributions, extract
//! them, seed the package tree from the base shell, overlay the editor
//! branding, finalize, then package. Each stage's output is the next
//! stage's sole input and any failure aborts the run.
//!
//! Extraction directories under `build/` double as a cache: a directory
//! that already exists is reused as-is, the same existence-only rule
//! the download cache uses. The package tree itself is reassembled
//! fresh on every run.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::{build_appimage, create_tar_gz, ensure_appimagetool, patch_interpreter};
use crate::config::{BuildConfig, VersionSpec, PRODUCT_NAME, SHELL_NAME};
use crate::extract::extract;
use crate::fetch::{fetch, FetchOutcome};
use crate::filesystem::copy_dir_recursive;
use crate::finalize::finalize_tree;
use crate::merge::{merge_branding, APP_DIR};
use crate::runs;
use crate::source::{codium_download, cursor_download, DownloadSpec};
use crate::target::BuildTarget;

/// The two output files of one successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionArtifact {
    pub tar_path: PathBuf,
    pub image_path: PathBuf,
}

/// Working-directory layout for one invocation.
#[derive(Debug, Clone)]
pub struct Layout {
    pub downloads: PathBuf,
    pub build: PathBuf,
    pub dist: PathBuf,
}

impl Layout {
    /// Create paths relative to the base directory.
    pub fn new(base_dir: &Path) -> Self {
        Self {
            downloads: base_dir.join("downloads"),
            build: base_dir.join("build"),
            dist: base_dir.join("dist"),
        }
    }

    fn target_build_dir(&self, target: &BuildTarget) -> PathBuf {
        self.build.join(target.id)
    }
}

/// Run the full assembly for one target.
pub fn run_build(
    config: &BuildConfig,
    target: &BuildTarget,
    base_dir: &Path,
) -> Result<DistributionArtifact> {
    let layout = Layout::new(base_dir);
    let build_dir = layout.target_build_dir(target);

    runs::record_start(&build_dir, target.id, &config.cursor_version.to_string())?;

    println!(
        "[build:{}] assembling {} {} on {} {}",
        target.id, PRODUCT_NAME, config.cursor_version, SHELL_NAME, config.codium_version
    );

    let cursor_spec = cursor_download(&config.cursor_version, &layout.downloads);
    let codium_spec = codium_download(&config.codium_version, target, &layout.downloads);
    fetch_reporting(target, PRODUCT_NAME, &cursor_spec)?;
    fetch_reporting(target, SHELL_NAME, &codium_spec)?;

    let cursor_extract = build_dir.join(PRODUCT_NAME);
    let codium_extract = build_dir.join(SHELL_NAME);
    extract_cached(target, &cursor_spec.dest, &cursor_extract)?;
    extract_cached(target, &codium_spec.dest, &codium_extract)?;

    let cursor_bundle = bundle_root(&cursor_extract)?;
    let codium_bundle = bundle_root(&codium_extract)?;

    let version = resolved_version(&config.cursor_version, &cursor_bundle)?;
    println!("[build:{}] product version {}", target.id, version);

    let tree = build_dir.join("bundle");
    seed_package_tree(&codium_bundle, &tree)?;

    println!("[build:{}] merging branded files", target.id);
    merge_branding(&cursor_bundle, &tree)?;

    println!("[build:{}] finalizing launcher assets", target.id);
    finalize_tree(&tree, &cursor_bundle)?;

    let artifact = package(target, &version, &tree, &layout.dist)?;

    runs::record_success(&build_dir)?;

    Ok(artifact)
}

fn fetch_reporting(target: &BuildTarget, component: &str, spec: &DownloadSpec) -> Result<()> {
    match fetch(spec).with_context(|| format!("fetching {} archive", component))? {
        FetchOutcome::CacheHit => {
            println!(
                "[build:{}] {} archive cached at {}",
                target.id,
                component,
                spec.dest.display()
            );
        }
        FetchOutcome::Downloaded => {
            println!(
                "[build:{}] downloaded {} archive to {}",
                target.id,
                component,
                spec.dest.display()
            );
        }
    }
    Ok(())
}

fn extract_cached(target: &BuildTarget, archive: &Path, dest: &Path) -> Result<()> {
    if dest.is_dir() {
        println!(
            "[build:{}] reusing extracted tree {}",
            target.id,
            dest.display()
        );
        return Ok(());
    }
    println!("[build:{}] extracting {}", target.id, archive.display());
    extract(archive, dest)
}

/// Resolve the bundle root of an extraction directory.
///
/// Archives that wrap their contents in a single top-level directory
/// are entered through it; loose archives use the directory itself.
pub fn bundle_root(extract_dir: &Path) -> Result<PathBuf> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(extract_dir)
        .with_context(|| format!("reading extracted tree '{}'", extract_dir.display()))?
    {
        entries.push(entry?.path());
    }

    match entries.as_slice() {
        [single] if single.is_dir() => Ok(single.clone()),
        [] => bail!("extracted tree is empty: {}", extract_dir.display()),
        _ => Ok(extract_dir.to_path_buf()),
    }
}

/// Concrete product version used in artifact names.
///
/// A pinned spec is used verbatim; the latest sentinel reads the
/// version the editor bundle actually carries.
pub fn resolved_version(spec: &VersionSpec, bundle: &Path) -> Result<String> {
    match spec {
        VersionSpec::Pinned(v) => Ok(v.clone()),
        VersionSpec::Latest => {
            let manifest = bundle.join(APP_DIR).join("package.json");
            let bytes = fs::read(&manifest).with_context(|| {
                format!("reading application manifest '{}'", manifest.display())
            })?;
            let parsed: serde_json::Value = serde_json::from_slice(&bytes).with_context(|| {
                format!("parsing application manifest '{}'", manifest.display())
            })?;
            match parsed["version"].as_str() {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => bail!(
                    "application manifest '{}' has no version field",
                    manifest.display()
                ),
            }
        }
    }
}

fn seed_package_tree(codium_bundle: &Path, tree: &Path) -> Result<()> {
    if tree.exists() {
        fs::remove_dir_all(tree).with_context(|| {
            format!("removing previous package tree '{}'", tree.display())
        })?;
    }
    copy_dir_recursive(codium_bundle, tree)
        .with_context(|| format!("seeding package tree '{}'", tree.display()))
}

/// Basename shared by the two artifacts of one build.
pub fn artifact_basename(version: &str, target: &BuildTarget) -> String {
    format!("{}_{}_{}", PRODUCT_NAME, version, target.arch_label)
}

fn package(
    target: &BuildTarget,
    version: &str,
    tree: &Path,
    dist_dir: &Path,
) -> Result<DistributionArtifact> {
    fs::create_dir_all(dist_dir)
        .with_context(|| format!("creating output directory '{}'", dist_dir.display()))?;

    let basename = artifact_basename(version, target);
    let tar_path = dist_dir.join(format!("{}.tar.gz", basename));
    let image_path = dist_dir.join(format!("{}.AppImage", basename));

    println!("[build:{}] packing {}", target.id, tar_path.display());
    create_tar_gz(tree, &tar_path)?;

    ensure_appimagetool()?;
    println!("[build:{}] building {}", target.id, image_path.display());
    build_appimage(tree, target, &image_path)?;

    println!(
        "[build:{}] patching interpreter to {}",
        target.id, target.interpreter_path
    );
    patch_interpreter(&image_path, target)?;

    Ok(DistributionArtifact {
        tar_path,
        image_path,
    })
}
