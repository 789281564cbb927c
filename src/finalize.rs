//! Final branding of the merged tree.
//!
//! Every step here is optional: a missing source inside the editor
//! bundle means skip, not fail. This is the opposite of the merge
//! rules, which treat a missing source as a malformed bundle.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::PRODUCT_NAME;
use crate::filesystem::{copy_file_into, mark_executable, replace_dir};

const LAUNCHER_SCRIPT: &str = "AppRun";
const RUNTIME_DIR: &str = "usr";
const ICON_DESCRIPTOR: &str = ".DirIcon";

/// Inherited binary names that get renamed to the product name.
/// At most one should exist in a well-formed base distribution, but
/// each candidate is attempted independently.
const RENAME_CANDIDATES: &[(&str, &str)] = &[
    ("codium", "cursor"),
    ("bin/codium", "bin/cursor"),
    ("bin/code-oss", "bin/cursor"),
];

/// Apply launcher assets and binary renames to the merged tree.
pub fn finalize_tree(tree: &Path, bundle: &Path) -> Result<()> {
    copy_launcher_assets(tree, bundle)?;
    copy_product_resource_dirs(tree, bundle)?;
    copy_runtime(tree, bundle)?;
    rename_inherited_binaries(tree)?;
    Ok(())
}

fn copy_launcher_assets(tree: &Path, bundle: &Path) -> Result<()> {
    for name in [
        format!("{}.png", PRODUCT_NAME),
        format!("{}.desktop", PRODUCT_NAME),
        ICON_DESCRIPTOR.to_string(),
    ] {
        let src = bundle.join(&name);
        if src.is_file() {
            copy_file_into(&src, &tree.join(&name))?;
        }
    }
    Ok(())
}

/// Copy product-prefixed top-level directories of the bundle into the
/// tree's resources directory (launcher metadata).
fn copy_product_resource_dirs(tree: &Path, bundle: &Path) -> Result<()> {
    if !bundle.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(bundle)
        .with_context(|| format!("reading bundle root '{}'", bundle.display()))?
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
        replace_dir(&path, &tree.join("resources").join(name))
            .with_context(|| format!("copying launcher metadata '{}'", name))?;
    }
    Ok(())
}

fn copy_runtime(tree: &Path, bundle: &Path) -> Result<()> {
    let runtime = bundle.join(RUNTIME_DIR);
    if runtime.is_dir() {
        replace_dir(&runtime, &tree.join(RUNTIME_DIR))?;
    }

    let launcher = bundle.join(LAUNCHER_SCRIPT);
    if launcher.is_file() {
        let dst = tree.join(LAUNCHER_SCRIPT);
        copy_file_into(&launcher, &dst)?;
        mark_executable(&dst)?;
    }

    Ok(())
}

/// Rename whichever inherited shell binary exists to the product name.
/// None existing is a no-op, not an error.
fn rename_inherited_binaries(tree: &Path) -> Result<()> {
    for (from, to) in RENAME_CANDIDATES {
        let src = tree.join(from);
        if !src.exists() {
            continue;
        }
        let dst = tree.join(to);
        fs::rename(&src, &dst).with_context(|| {
            format!("renaming '{}' to '{}'", src.display(), dst.display())
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn copies_launcher_assets_and_marks_apprun_executable() {
        let tmp = TempDir::new().unwrap();
        let bundle = tmp.path().join("bundle");
        let tree = tmp.path().join("tree");
        fs::create_dir_all(&tree).unwrap();
        write(&bundle.join("cursor.png"), "icon");
        write(&bundle.join("cursor.desktop"), "[Desktop Entry]");
        write(&bundle.join(".DirIcon"), "icon");
        write(&bundle.join("AppRun"), "#!/bin/sh\n");
        write(&bundle.join("usr/share/metainfo/cursor.appdata.xml"), "<x/>");

        finalize_tree(&tree, &bundle).unwrap();

        assert!(tree.join("cursor.png").exists());
        assert!(tree.join("cursor.desktop").exists());
        assert!(tree.join(".DirIcon").exists());
        assert!(tree.join("usr/share/metainfo/cursor.appdata.xml").exists());
        let mode = fs::metadata(tree.join("AppRun")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn missing_assets_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let bundle = tmp.path().join("bundle");
        let tree = tmp.path().join("tree");
        fs::create_dir_all(&bundle).unwrap();
        fs::create_dir_all(&tree).unwrap();

        finalize_tree(&tree, &bundle).unwrap();
        assert!(!tree.join("AppRun").exists());
    }

    #[test]
    fn copies_product_prefixed_resource_dirs() {
        let tmp = TempDir::new().unwrap();
        let bundle = tmp.path().join("bundle");
        let tree = tmp.path().join("tree");
        fs::create_dir_all(&tree).unwrap();
        write(&bundle.join("cursor-launcher/launcher.json"), "{}");
        write(&bundle.join("unrelated/skip.txt"), "no");

        finalize_tree(&tree, &bundle).unwrap();

        assert!(tree.join("resources/cursor-launcher/launcher.json").exists());
        assert!(!tree.join("resources/unrelated").exists());
    }

    #[test]
    fn renames_root_level_binary() {
        let tmp = TempDir::new().unwrap();
        let tree = tmp.path().join("tree");
        write(&tree.join("codium"), "elf");

        rename_inherited_binaries(&tree).unwrap();

        assert!(!tree.join("codium").exists());
        assert!(tree.join("cursor").exists());
    }

    #[test]
    fn renames_bin_level_binaries() {
        for inherited in ["bin/codium", "bin/code-oss"] {
            let tmp = TempDir::new().unwrap();
            let tree = tmp.path().join("tree");
            write(&tree.join(inherited), "launcher");

            rename_inherited_binaries(&tree).unwrap();

            assert!(!tree.join(inherited).exists());
            assert!(tree.join("bin/cursor").exists());
        }
    }

    #[test]
    fn rename_with_no_candidates_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let tree = tmp.path().join("tree");
        fs::create_dir_all(&tree).unwrap();

        rename_inherited_binaries(&tree).unwrap();
        assert!(!tree.join("cursor").exists());
    }
}
