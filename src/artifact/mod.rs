//! Distribution artifact builders.
//!
//! Two artifacts are produced per target: a gzip-compressed tarball of
//! the package tree and an AppImage whose embedded interpreter path is
//! patched after the build.

pub mod appimage;
pub mod tarball;

pub use appimage::{build_appimage, ensure_appimagetool, patch_interpreter};
pub use tarball::create_tar_gz;
