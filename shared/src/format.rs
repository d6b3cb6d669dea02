//! File format specification for BlockProject 3D object exports.
//!
//! `Bp3dFormat` is the single source of truth for the text headers, version
//! marker and file suffixes of the three files an export produces.
//!
//! # Example
//!
//! ```
//! use bp3d_shared::BP3D_FORMAT;
//! use std::path::Path;
//!
//! assert_eq!(BP3D_FORMAT.version, 1);
//!
//! let main = Path::new("out/robot.bp3d.obj");
//! assert_eq!(
//!     BP3D_FORMAT.armature_path(main),
//!     Path::new("out/robot.armature.bp3d.obj")
//! );
//! assert_eq!(
//!     BP3D_FORMAT.animation_path(main),
//!     Path::new("out/robot.animation.bp3d.obj")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Text format specification for BP3D exports.
#[derive(Debug, Clone, Copy)]
pub struct Bp3dFormat {
    /// Suffix of the main object file (e.g., ".bp3d.obj")
    pub object_suffix: &'static str,

    /// Suffix of the skeleton companion file
    pub armature_suffix: &'static str,

    /// Suffix of the animation companion file
    pub animation_suffix: &'static str,

    /// Value written in the `#version` directive
    pub version: u32,

    /// First line of the main object file
    pub object_header: &'static str,

    /// First line of the skeleton file
    pub armature_header: &'static str,

    /// First line of the animation file
    pub animation_header: &'static str,
}

impl Bp3dFormat {
    /// Create a new format specification.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        object_suffix: &'static str,
        armature_suffix: &'static str,
        animation_suffix: &'static str,
        version: u32,
        object_header: &'static str,
        armature_header: &'static str,
        animation_header: &'static str,
    ) -> Self {
        Self {
            object_suffix,
            armature_suffix,
            animation_suffix,
            version,
            object_header,
            armature_header,
            animation_header,
        }
    }

    /// Path of the main object file for an object name inside `dir`.
    pub fn object_path(&self, dir: &Path, object_name: &str) -> PathBuf {
        dir.join(format!("{}{}", object_name, self.object_suffix))
    }

    /// Path of the skeleton file that accompanies `main`.
    pub fn armature_path(&self, main: &Path) -> PathBuf {
        self.companion_path(main, self.armature_suffix)
    }

    /// Path of the animation file that accompanies `main`.
    pub fn animation_path(&self, main: &Path) -> PathBuf {
        self.companion_path(main, self.animation_suffix)
    }

    /// Replaces the object suffix of `main` with `suffix`.
    ///
    /// When `main` does not end with the object suffix the companion suffix is
    /// appended to the full file name instead.
    fn companion_path(&self, main: &Path, suffix: &str) -> PathBuf {
        let name = main
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.strip_suffix(self.object_suffix).unwrap_or(&name);
        main.with_file_name(format!("{}{}", stem, suffix))
    }
}

/// BlockProject 3D object format, version 1.
pub const BP3D_FORMAT: Bp3dFormat = Bp3dFormat::new(
    ".bp3d.obj",
    ".armature.bp3d.obj",
    ".animation.bp3d.obj",
    1,
    "## BlockProject 3D Object",
    "## BlockProject 3D Object Armature",
    "## BlockProject 3D Object Animation",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bp3d_format_version() {
        assert_eq!(BP3D_FORMAT.version, 1);
    }

    #[test]
    fn test_bp3d_headers() {
        assert_eq!(BP3D_FORMAT.object_header, "## BlockProject 3D Object");
        assert!(BP3D_FORMAT.armature_header.ends_with("Armature"));
        assert!(BP3D_FORMAT.animation_header.ends_with("Animation"));
    }

    #[test]
    fn test_companion_paths_replace_suffix() {
        let main = Path::new("/tmp/cube.bp3d.obj");
        assert_eq!(
            BP3D_FORMAT.armature_path(main),
            PathBuf::from("/tmp/cube.armature.bp3d.obj")
        );
        assert_eq!(
            BP3D_FORMAT.animation_path(main),
            PathBuf::from("/tmp/cube.animation.bp3d.obj")
        );
    }

    #[test]
    fn test_companion_paths_without_suffix() {
        let main = Path::new("cube.txt");
        assert_eq!(
            BP3D_FORMAT.armature_path(main),
            PathBuf::from("cube.txt.armature.bp3d.obj")
        );
    }

    #[test]
    fn test_object_path() {
        assert_eq!(
            BP3D_FORMAT.object_path(Path::new("out"), "Body"),
            PathBuf::from("out/Body.bp3d.obj")
        );
    }
}
