//! Manifest parsing and build orchestration
//!
//! Parses bp3d.toml and runs every export job it lists. Relative paths are
//! resolved against the directory holding the manifest.

use anyhow::{bail, Context, Result};
use bp3d_shared::{Scene, BP3D_FORMAT};
use hashbrown::HashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dedup::{KeyPrecision, MAX_DECIMALS};
use crate::export::{export, ExportOptions, ExportSummary};
use crate::host::{FrameRange, PoseEvaluator};

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub exports: Vec<ExportEntry>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Options shared by every export job
#[derive(Debug, Deserialize)]
pub struct Defaults {
    /// Decimal places used when deduplicating normals and UVs
    #[serde(default)]
    pub precision: Option<u8>,
    #[serde(default = "default_section_comments")]
    pub section_comments: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            precision: None,
            section_comments: default_section_comments(),
        }
    }
}

fn default_section_comments() -> bool {
    true
}

/// One export job
#[derive(Debug, Deserialize)]
pub struct ExportEntry {
    /// Scene dump (JSON)
    pub scene: PathBuf,
    /// Root object to export
    pub object: String,
    /// Output file name, `<object>.bp3d.obj` when omitted
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub frame_start: Option<i32>,
    #[serde(default)]
    pub frame_end: Option<i32>,
}

impl ExportEntry {
    /// Animation range, falling back to the scene's range for missing ends
    pub fn frame_range(&self, scene_range: FrameRange) -> FrameRange {
        FrameRange::new(
            self.frame_start.unwrap_or(scene_range.start),
            self.frame_end.unwrap_or(scene_range.end),
        )
    }

    /// Output path inside `dir`
    pub fn output_path(&self, dir: &Path) -> PathBuf {
        match &self.output {
            Some(output) => dir.join(output),
            None => BP3D_FORMAT.object_path(dir, &self.object),
        }
    }
}

impl Manifest {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Export options for `entry` given its scene
    pub fn options_for(&self, entry: &ExportEntry, scene: &Scene) -> ExportOptions {
        ExportOptions {
            frame_range: Some(entry.frame_range(scene.frame_range())),
            precision: match self.defaults.precision {
                Some(decimals) => KeyPrecision::Quantized { decimals },
                None => KeyPrecision::Exact,
            },
            section_comments: self.defaults.section_comments,
        }
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    parse_manifest(&content, base_dir)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))
}

/// Parse manifest text; relative paths resolve against `base_dir`
pub fn parse_manifest(content: &str, base_dir: PathBuf) -> Result<Manifest> {
    let mut manifest: Manifest = toml::from_str(content)?;
    manifest.base_dir = base_dir;
    Ok(manifest)
}

fn check_defaults(defaults: &Defaults) -> Result<()> {
    if let Some(decimals) = defaults.precision {
        if decimals > MAX_DECIMALS {
            bail!("[defaults] precision {} is out of range 0..={}", decimals, MAX_DECIMALS);
        }
    }
    Ok(())
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    check_defaults(&manifest.defaults)?;
    if manifest.exports.is_empty() {
        bail!("Manifest has no [[exports]] entries");
    }

    let mut outputs = HashSet::new();
    for entry in &manifest.exports {
        let scene_path = manifest.resolve(&entry.scene);
        if !scene_path.exists() {
            bail!("Scene for '{}' not found: {:?}", entry.object, scene_path);
        }
        let scene = Scene::load(&scene_path)
            .with_context(|| format!("Invalid scene for '{}'", entry.object))?;
        if scene.object_id(&entry.object).is_none() {
            bail!("Object '{}' not found in {:?}", entry.object, scene_path);
        }

        let range = entry.frame_range(scene.frame_range());
        if range.end < range.start {
            bail!(
                "Export '{}' has frame_end {} before frame_start {}",
                entry.object,
                range.end,
                range.start
            );
        }

        let output = entry.output_path(Path::new(""));
        if !outputs.insert(output.clone()) {
            bail!("Two exports write to the same output: {:?}", output);
        }
    }
    Ok(())
}

/// Run every export job of a manifest
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<ExportSummary>> {
    check_defaults(&manifest.defaults)?;
    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest.resolve(&manifest.output.dir),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut summaries = Vec::with_capacity(manifest.exports.len());
    for entry in &manifest.exports {
        let scene_path = manifest.resolve(&entry.scene);
        let mut scene = Scene::load(&scene_path)
            .with_context(|| format!("Failed to load scene: {:?}", scene_path))?;
        let root = scene
            .object_id(&entry.object)
            .with_context(|| format!("Object '{}' not found in {:?}", entry.object, scene_path))?;

        let output = entry.output_path(&output_dir);
        let options = manifest.options_for(entry, &scene);
        tracing::info!("Exporting {} -> {:?}", entry.object, output);

        let summary = export(&mut scene, root, &output, &options)
            .with_context(|| format!("Failed to export '{}'", entry.object))?;
        summaries.push(summary);
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = parse_manifest(
            r#"
            [output]
            dir = "out"

            [defaults]
            precision = 4
            section_comments = false

            [[exports]]
            scene = "scenes/robot.json"
            object = "Body"
            output = "robot.bp3d.obj"
            frame_start = 0
            frame_end = 24

            [[exports]]
            scene = "scenes/robot.json"
            object = "Hat"
            "#,
            PathBuf::from("assets"),
        )
        .unwrap();

        assert_eq!(manifest.output.dir, PathBuf::from("out"));
        assert_eq!(manifest.defaults.precision, Some(4));
        assert!(!manifest.defaults.section_comments);
        assert_eq!(manifest.exports.len(), 2);
        assert_eq!(
            manifest.resolve(&manifest.exports[0].scene),
            PathBuf::from("assets/scenes/robot.json")
        );
        assert_eq!(
            manifest.exports[1].output_path(Path::new("out")),
            PathBuf::from("out/Hat.bp3d.obj")
        );
    }

    #[test]
    fn test_defaults() {
        let manifest = parse_manifest(
            r#"
            [[exports]]
            scene = "scene.json"
            object = "Cube"
            "#,
            PathBuf::new(),
        )
        .unwrap();

        assert_eq!(manifest.output.dir, PathBuf::from("."));
        assert_eq!(manifest.defaults.precision, None);
        assert!(manifest.defaults.section_comments);

        let scene = Scene {
            frame_start: 3,
            frame_end: 9,
            ..Default::default()
        };
        let options = manifest.options_for(&manifest.exports[0], &scene);
        assert_eq!(options.frame_range, Some(FrameRange::new(3, 9)));
        assert_eq!(options.precision, KeyPrecision::Exact);
    }

    #[test]
    fn test_partial_frame_range() {
        let entry = ExportEntry {
            scene: PathBuf::from("scene.json"),
            object: "Cube".into(),
            output: None,
            frame_start: Some(5),
            frame_end: None,
        };
        assert_eq!(entry.frame_range(FrameRange::new(0, 10)), FrameRange::new(5, 10));
    }

    #[test]
    fn test_validate_missing_scene() {
        let manifest = parse_manifest(
            r#"
            [[exports]]
            scene = "does-not-exist.json"
            object = "Cube"
            "#,
            PathBuf::new(),
        )
        .unwrap();
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn test_validate_empty() {
        let manifest = parse_manifest("", PathBuf::new()).unwrap();
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn test_validate_rejects_large_precision() {
        let manifest = parse_manifest(
            r#"
            [defaults]
            precision = 40

            [[exports]]
            scene = "scene.json"
            object = "Cube"
            "#,
            PathBuf::new(),
        )
        .unwrap();
        let err = validate(&manifest).unwrap_err();
        assert!(err.to_string().contains("precision 40"));
        assert!(build_all(&manifest, None).is_err());
    }

    #[test]
    fn test_validate_reports_invalid_scene() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scene.json"), "{ not json").unwrap();
        let manifest = parse_manifest(
            r#"
            [[exports]]
            scene = "scene.json"
            object = "Cube"
            "#,
            dir.path().to_path_buf(),
        )
        .unwrap();
        let err = validate(&manifest).unwrap_err();
        assert!(err.to_string().contains("Invalid scene for 'Cube'"));
        assert!(err.chain().any(|cause| cause.downcast_ref::<bp3d_shared::SceneError>().is_some()));
    }
}
