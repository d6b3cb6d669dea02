//! Human-readable reports for the `list` and `inspect` commands

use anyhow::{bail, Context, Result};
use bp3d_shared::{Scene, BP3D_FORMAT};
use std::path::Path;

use crate::reader::{AnimationDocument, ArmatureDocument, ObjectDocument};

/// Log every object of a scene with its parts and modifiers
pub fn list_scene(path: &Path) -> Result<()> {
    let scene = Scene::load(path).with_context(|| format!("Failed to load scene: {:?}", path))?;

    if scene.objects.is_empty() {
        tracing::info!("No objects in {:?}", path);
        return Ok(());
    }

    tracing::info!(
        "Objects in {:?} (frames {}..={}):",
        path,
        scene.frame_start,
        scene.frame_end
    );
    for (id, object) in scene.iter() {
        let kind = match (&object.mesh, &object.armature) {
            (Some(mesh), _) => format!(
                "mesh, {} vertices, {} polygons",
                mesh.vertices.len(),
                mesh.polygons.len()
            ),
            (None, Some(armature)) => format!("armature, {} bones", armature.bones.len()),
            (None, None) => "empty".to_string(),
        };
        tracing::info!("  {} '{}': {}", id, object.name, kind);

        let children = scene.children_of(id);
        if !children.is_empty() {
            let names: Vec<&str> = children
                .iter()
                .filter_map(|&c| scene.get(c).map(|o| o.name.as_str()))
                .collect();
            tracing::info!("      parts: {}", names.join(", "));
        }
        for modifier in &object.modifiers {
            match &modifier.object {
                Some(target) => tracing::info!("      modifier {} -> {}", modifier.kind, target),
                None => tracing::info!("      modifier {}", modifier.kind),
            }
        }
    }

    Ok(())
}

/// Statistics of an exported file and its companions
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InspectReport {
    pub parts: usize,
    pub vertices: usize,
    pub normals: usize,
    pub uvs: usize,
    pub faces: usize,
    pub bones: Option<usize>,
    pub frames: Option<usize>,
}

/// Read back an export and check that every reference resolves
pub fn inspect(path: &Path) -> Result<InspectReport> {
    let doc = ObjectDocument::read(path).with_context(|| format!("Invalid object file: {:?}", path))?;
    doc.triangles()
        .with_context(|| format!("Unresolved face reference in {:?}", path))?;

    let mut report = InspectReport {
        parts: doc.alloc_mat.unwrap_or(1),
        vertices: doc.positions.len(),
        normals: doc.normals.len(),
        uvs: doc.uvs.len(),
        faces: doc.faces.len(),
        bones: None,
        frames: None,
    };
    if doc.sub_materials.len() > 1 && doc.sub_materials.len() != report.parts {
        bail!(
            "{:?} declares {} materials but has {} #SubMaterial records",
            path,
            report.parts,
            doc.sub_materials.len()
        );
    }

    tracing::info!("{:?}: version {}", path, doc.version.unwrap_or_default());
    tracing::info!(
        "  {} part(s), {} vertices, {} normals, {} uvs, {} faces",
        report.parts,
        report.vertices,
        report.normals,
        report.uvs,
        report.faces
    );
    if let Some((min, max)) = doc.bounds() {
        tracing::info!("  bounds: {} .. {}", min, max);
    }

    if doc.uses("ArmatureAnimation") {
        let armature_path = BP3D_FORMAT.armature_path(path);
        let armature = ArmatureDocument::read(&armature_path)
            .with_context(|| format!("Invalid skeleton file: {:?}", armature_path))?;
        if armature.vertex_weights.len() != doc.positions.len() {
            bail!(
                "{:?} has weights for {} vertices, expected {}",
                armature_path,
                armature.vertex_weights.len(),
                doc.positions.len()
            );
        }

        let animation_path = BP3D_FORMAT.animation_path(path);
        let animation = AnimationDocument::read(&animation_path)
            .with_context(|| format!("Invalid animation file: {:?}", animation_path))?;
        for frame in &animation.frames {
            if let Some(t) = frame
                .transforms
                .iter()
                .find(|t| t.bone == 0 || t.bone as usize > armature.bones.len())
            {
                bail!(
                    "{:?}: frame {} animates unknown bone {}",
                    animation_path,
                    frame.frame,
                    t.bone
                );
            }
        }

        tracing::info!(
            "  {} bone(s), {} frame(s)",
            armature.bones.len(),
            animation.frames.len()
        );
        report.bones = Some(armature.bones.len());
        report.frames = Some(animation.frames.len());
    }

    Ok(report)
}
