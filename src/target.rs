//! Build target registry.
//!
//! Each supported architecture is one row in a static descriptor table.
//! Adding an architecture means adding a row here, not editing branch
//! sites across the codebase.

use anyhow::{bail, Result};

/// Architecture parameters for one build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTarget {
    /// Target identifier as given on the command line.
    pub id: &'static str,
    /// Architecture tag used in the base-shell download naming.
    pub shell_arch_tag: &'static str,
    /// Absolute dynamic-linker path patched into the produced image.
    pub interpreter_path: &'static str,
    /// Architecture tag passed to appimagetool via the ARCH variable.
    pub packaging_arch_tag: &'static str,
    /// Human-readable architecture label used in artifact names.
    pub arch_label: &'static str,
}

/// Targets advertised to users in usage and error messages.
///
/// `x86_64-linux` is advertised but has no descriptor row; resolving it
/// fails like any other unknown identifier. See DESIGN.md.
pub const ADVERTISED_TARGETS: &[&str] = &["aarch64-linux", "armv7l-linux", "x86_64-linux"];

const TARGETS: &[BuildTarget] = &[
    BuildTarget {
        id: "aarch64-linux",
        shell_arch_tag: "arm64",
        interpreter_path: "/lib/ld-linux-aarch64.so.1",
        packaging_arch_tag: "arm_aarch64",
        arch_label: "linux-arm64",
    },
    BuildTarget {
        id: "armv7l-linux",
        shell_arch_tag: "arm32",
        interpreter_path: "/lib/ld-linux.so.3",
        packaging_arch_tag: "arm",
        arch_label: "linux-arm32",
    },
];

/// Resolve a target identifier to its descriptor.
pub fn resolve_target(id: &str) -> Result<&'static BuildTarget> {
    match TARGETS.iter().find(|t| t.id == id) {
        Some(target) => Ok(target),
        None => bail!(
            "unsupported target '{}'; expected one of: {}",
            id,
            ADVERTISED_TARGETS.join(", ")
        ),
    }
}
