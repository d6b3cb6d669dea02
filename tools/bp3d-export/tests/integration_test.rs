//! Integration tests for the bp3d-export binary
//!
//! Tests the full pipeline: generate scene dump -> run CLI -> verify output

mod scene_generator;

use bp3d_export::{ObjectDocument, BP3D_FORMAT};
use scene_generator::BONE_NAMES;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn bp3d_export(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bp3d-export"))
        .args(args)
        .output()
        .expect("Failed to run bp3d-export")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_export_command() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene_path = dir.path().join("scene.json");
    let output = dir.path().join("robot.bp3d.obj");
    scene_generator::write_scene(&scene_generator::rigged_scene(BONE_NAMES), &scene_path)
        .expect("Failed to write scene");

    let result = bp3d_export(&[
        "export",
        path_arg(&scene_path),
        "--object",
        "Body",
        "-o",
        path_arg(&output),
    ]);
    assert!(result.status.success(), "bp3d-export export command failed");

    assert!(output.exists());
    assert!(BP3D_FORMAT.armature_path(&output).exists());
    assert!(BP3D_FORMAT.animation_path(&output).exists());

    let inspect = bp3d_export(&["inspect", path_arg(&output)]);
    assert!(inspect.status.success(), "bp3d-export inspect command failed");
}

#[test]
fn test_export_default_output() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene_path = dir.path().join("scene.json");
    scene_generator::write_scene(&scene_generator::cube_scene(), &scene_path).unwrap();

    let result = bp3d_export(&["export", path_arg(&scene_path), "--object", "Cube", "--no-comments"]);
    assert!(result.status.success());

    let output = dir.path().join("Cube.bp3d.obj");
    let doc = ObjectDocument::read(&output).expect("Failed to read export");
    assert_eq!(doc.faces.len(), 12);
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(!text.contains("## Vertices"));
}

#[test]
fn test_export_unknown_object_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene_path = dir.path().join("scene.json");
    scene_generator::write_scene(&scene_generator::cube_scene(), &scene_path).unwrap();

    let result = bp3d_export(&["export", path_arg(&scene_path), "--object", "Nope"]);
    assert!(!result.status.success());
}

#[test]
fn test_build_and_check_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::create_dir(dir.path().join("scenes")).unwrap();
    scene_generator::write_scene(
        &scene_generator::two_part_scene(),
        &dir.path().join("scenes/props.json"),
    )
    .unwrap();
    scene_generator::write_scene(
        &scene_generator::rigged_scene(BONE_NAMES),
        &dir.path().join("scenes/robot.json"),
    )
    .unwrap();

    let manifest = dir.path().join("bp3d.toml");
    std::fs::write(
        &manifest,
        r#"
[output]
dir = "out"

[defaults]
precision = 5

[[exports]]
scene = "scenes/props.json"
object = "Body"
output = "props.bp3d.obj"

[[exports]]
scene = "scenes/robot.json"
object = "Body"
output = "robot.bp3d.obj"
frame_start = 1
frame_end = 2
"#,
    )
    .unwrap();

    let check = bp3d_export(&["check", path_arg(&manifest)]);
    assert!(check.status.success(), "bp3d-export check command failed");

    let build = bp3d_export(&["build", path_arg(&manifest)]);
    assert!(build.status.success(), "bp3d-export build command failed");

    let out = dir.path().join("out");
    assert!(out.join("props.bp3d.obj").exists());
    assert!(out.join("robot.bp3d.obj").exists());
    assert!(out.join("robot.armature.bp3d.obj").exists());

    let animation = std::fs::read_to_string(out.join("robot.animation.bp3d.obj")).unwrap();
    let frames: Vec<&str> = animation.lines().filter(|l| l.starts_with("frame")).collect();
    assert_eq!(frames, vec!["frame 1", "frame 2"]);
}

#[test]
fn test_check_rejects_unknown_object() {
    let dir = tempdir().expect("Failed to create temp dir");
    scene_generator::write_scene(&scene_generator::cube_scene(), &dir.path().join("scene.json"))
        .unwrap();
    let manifest = dir.path().join("bp3d.toml");
    std::fs::write(
        &manifest,
        "[[exports]]\nscene = \"scene.json\"\nobject = \"Sphere\"\n",
    )
    .unwrap();

    let check = bp3d_export(&["check", path_arg(&manifest)]);
    assert!(!check.status.success());
}

#[test]
fn test_export_rejects_out_of_range_precision() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene_path = dir.path().join("scene.json");
    let output = dir.path().join("cube.bp3d.obj");
    scene_generator::write_scene(&scene_generator::cube_scene(), &scene_path).unwrap();

    let result = bp3d_export(&[
        "export",
        path_arg(&scene_path),
        "--object",
        "Cube",
        "-o",
        path_arg(&output),
        "--precision",
        "40",
    ]);
    assert!(!result.status.success());
    assert!(!output.exists());
}

#[test]
fn test_list_command() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene_path = dir.path().join("scene.json");
    scene_generator::write_scene(&scene_generator::two_part_scene(), &scene_path).unwrap();

    let result = bp3d_export(&["list", path_arg(&scene_path)]);
    assert!(result.status.success());
}
