//! Download source resolution.
//!
//! URL and cache-destination construction is a pure function of the
//! component, its version spec and the build target. The pinned and
//! "latest" templates point at different hosting services for the
//! editor release; both variants are kept distinct on purpose.

use std::path::{Path, PathBuf};

use crate::config::{VersionSpec, SHELL_NAME};
use crate::target::BuildTarget;

const CURSOR_PINNED_BASE: &str = "https://download.todesktop.com/230313mzl4w4u92";
const CURSOR_LATEST_BASE: &str = "https://downloader.cursor.sh/builds/latest";
const CODIUM_PINNED_BASE: &str = "https://github.com/VSCodium/vscodium/releases/download";
const CODIUM_LATEST_BASE: &str = "https://update.vscodium.com/latest";
const APPIMAGETOOL_BASE: &str =
    "https://github.com/AppImage/AppImageKit/releases/download/continuous";

/// One resolvable download: where it comes from and where it is cached.
///
/// A spec is satisfied without any network access when `dest` already
/// exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSpec {
    pub url: String,
    pub dest: PathBuf,
}

/// Download source for the editor release archive.
///
/// The editor archive carries the application payload and is shared by
/// both targets; only the base shell download is target-specific.
pub fn cursor_download(version: &VersionSpec, downloads_dir: &Path) -> DownloadSpec {
    let url = match version {
        VersionSpec::Latest => format!("{}/cursor-linux.zip", CURSOR_LATEST_BASE),
        VersionSpec::Pinned(v) => format!("{}/cursor-{}-linux.zip", CURSOR_PINNED_BASE, v),
    };
    DownloadSpec {
        url,
        dest: downloads_dir.join(format!("cursor-{}.zip", version)),
    }
}

/// Download source for the base-shell release archive of one target.
pub fn codium_download(
    version: &VersionSpec,
    target: &BuildTarget,
    downloads_dir: &Path,
) -> DownloadSpec {
    let tag = target.shell_arch_tag;
    let url = match version {
        VersionSpec::Latest => format!(
            "{}/linux-{}/VSCodium-linux-{}.tar.gz",
            CODIUM_LATEST_BASE, tag, tag
        ),
        VersionSpec::Pinned(v) => format!(
            "{}/{}/VSCodium-linux-{}-{}.tar.gz",
            CODIUM_PINNED_BASE, v, tag, v
        ),
    };
    DownloadSpec {
        url,
        dest: downloads_dir.join(format!("{}-{}-{}.tar.gz", SHELL_NAME, tag, version)),
    }
}

/// Download source for the image-building tool itself.
///
/// Keyed by the host machine architecture, not by the build target:
/// the tool runs on the build host regardless of what it packages.
pub fn appimagetool_download(host_arch: &str, tools_dir: &Path) -> DownloadSpec {
    DownloadSpec {
        url: format!("{}/appimagetool-{}.AppImage", APPIMAGETOOL_BASE, host_arch),
        dest: tools_dir.join("appimagetool"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::resolve_target;

    #[test]
    fn cursor_templates_use_distinct_hosts() {
        let downloads = Path::new("downloads");
        let latest = cursor_download(&VersionSpec::Latest, downloads);
        let pinned = cursor_download(&VersionSpec::Pinned("1.2.3".into()), downloads);

        assert!(latest.url.starts_with("https://downloader.cursor.sh/"));
        assert!(pinned.url.starts_with("https://download.todesktop.com/"));
        assert!(pinned.url.contains("1.2.3"));
        assert_eq!(pinned.dest, downloads.join("cursor-1.2.3.zip"));
    }

    #[test]
    fn codium_url_uses_arm64_naming_for_aarch64() {
        let target = resolve_target("aarch64-linux").unwrap();
        let spec = codium_download(
            &VersionSpec::Pinned("1.97.2".into()),
            target,
            Path::new("downloads"),
        );
        assert!(spec.url.contains("VSCodium-linux-arm64-1.97.2.tar.gz"));
        assert_eq!(spec.dest, Path::new("downloads/vscodium-arm64-1.97.2.tar.gz"));
    }

    #[test]
    fn codium_url_uses_arm32_naming_for_armv7l() {
        let target = resolve_target("armv7l-linux").unwrap();
        let spec = codium_download(&VersionSpec::Latest, target, Path::new("downloads"));
        assert!(spec.url.contains("linux-arm32"));
        assert!(spec.url.starts_with("https://update.vscodium.com/"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let target = resolve_target("aarch64-linux").unwrap();
        let version = VersionSpec::Pinned("1.0.0".into());
        let a = codium_download(&version, target, Path::new("downloads"));
        let b = codium_download(&version, target, Path::new("downloads"));
        assert_eq!(a, b);
    }

    #[test]
    fn appimagetool_is_keyed_by_host_arch() {
        let spec = appimagetool_download("x86_64", Path::new("/tmp/tools"));
        assert!(spec.url.ends_with("appimagetool-x86_64.AppImage"));
        assert_eq!(spec.dest, Path::new("/tmp/tools/appimagetool"));
    }
}
