//! Build configuration.
//!
//! All tunable constants live in one immutable [`BuildConfig`] value
//! constructed at process start and passed by reference into every
//! stage. An optional `cursor-build.toml` in the invocation directory
//! overrides the built-in version pins.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Downstream product name, used for binaries, artifact names and the
/// extension/resource directory prefix.
pub const PRODUCT_NAME: &str = "cursor";

/// Base-shell distribution name, used in download cache naming.
pub const SHELL_NAME: &str = "vscodium";

const DEFAULT_CODIUM_VERSION: &str = "1.97.2.25045";

const CONFIG_FILENAME: &str = "cursor-build.toml";

/// A component version: either a pinned version string or the
/// "resolve latest" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Latest,
    Pinned(String),
}

impl VersionSpec {
    /// Parse a version value from configuration.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("version must not be empty (use 'latest' or a version string)");
        }
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(VersionSpec::Latest);
        }
        Ok(VersionSpec::Pinned(trimmed.to_string()))
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, VersionSpec::Latest)
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Latest => write!(f, "latest"),
            VersionSpec::Pinned(v) => write!(f, "{}", v),
        }
    }
}

/// Immutable configuration for one builder invocation.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub cursor_version: VersionSpec,
    pub codium_version: VersionSpec,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cursor_version: VersionSpec::Latest,
            codium_version: VersionSpec::Pinned(DEFAULT_CODIUM_VERSION.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    versions: Option<VersionsToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VersionsToml {
    cursor: Option<String>,
    codium: Option<String>,
}

impl BuildConfig {
    /// Load the configuration for an invocation rooted at `base_dir`.
    ///
    /// Built-in defaults apply when no `cursor-build.toml` is present.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let config_path = base_dir.join(CONFIG_FILENAME);
        if !config_path.is_file() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&config_path)
            .with_context(|| format!("reading build config '{}'", config_path.display()))?;
        let parsed: ConfigToml = toml::from_str(&raw)
            .with_context(|| format!("parsing build config '{}'", config_path.display()))?;

        let mut config = Self::default();
        if let Some(versions) = parsed.versions {
            if let Some(raw) = versions.cursor {
                config.cursor_version = VersionSpec::parse(&raw)
                    .with_context(|| format!("invalid cursor version in '{}'", config_path.display()))?;
            }
            if let Some(raw) = versions.codium {
                config.codium_version = VersionSpec::parse(&raw)
                    .with_context(|| format!("invalid codium version in '{}'", config_path.display()))?;
            }
        }
        Ok(config)
    }
}
