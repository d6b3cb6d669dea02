//! Programmatic scene dumps for integration tests.
//!
//! Provides:
//! - a 2x2x2 cube (8 vertices, 6 quads, 12 triangles), optionally with UVs
//! - a two-part scene (cube body with a cube child)
//! - a 3-bone rig (root -> spine -> head) animated over frames 0..=2

#![allow(dead_code)]

use bp3d_shared::{
    ArmatureData, BoneData, GroupWeight, Keyframe, MeshData, MeshVertex, Modifier, Polygon,
    PoseTrack, Scene, SceneObject, UvLayer,
};
use std::path::Path;

/// Bone count of the test rig
pub const BONE_COUNT: usize = 3;
/// Bone names of the test rig, in hierarchy order
pub const BONE_NAMES: [&str; BONE_COUNT] = ["root", "spine", "head"];

const CUBE_CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Quads, counter-clockwise seen from outside
const CUBE_FACES: [[u32; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 4, 7, 3],
    [1, 2, 6, 5],
];

/// Cube mesh; every quad maps to the full UV square when `with_uvs` is set
pub fn cube_mesh(with_uvs: bool) -> MeshData {
    let vertices = CUBE_CORNERS
        .iter()
        .map(|&co| MeshVertex {
            co,
            groups: Vec::new(),
        })
        .collect();
    let polygons = CUBE_FACES
        .iter()
        .map(|face| Polygon {
            vertices: face.to_vec(),
            normals: None,
        })
        .collect();

    let uv_layers = if with_uvs {
        let data = CUBE_FACES
            .iter()
            .flat_map(|_| [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
            .collect();
        vec![UvLayer {
            name: "UVMap".to_string(),
            data,
        }]
    } else {
        Vec::new()
    };

    MeshData {
        vertices,
        polygons,
        uv_layers,
        active_uv_layer: None,
    }
}

/// Column-major translation matrix
pub fn translation(x: f32, y: f32, z: f32) -> [[f32; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [x, y, z, 1.0],
    ]
}

/// Column-major scale matrix
pub fn scale(x: f32, y: f32, z: f32) -> [[f32; 4]; 4] {
    [
        [x, 0.0, 0.0, 0.0],
        [0.0, y, 0.0, 0.0],
        [0.0, 0.0, z, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

fn cube_object(name: &str, with_uvs: bool) -> SceneObject {
    let mut object = SceneObject::new(name);
    object.mesh = Some(cube_mesh(with_uvs));
    object
}

/// Scene with a single cube named "Cube", no UVs
pub fn cube_scene() -> Scene {
    Scene {
        objects: vec![cube_object("Cube", false)],
        ..Default::default()
    }
}

/// Scene with a cube scaled by -1 on X, named "Mirrored"
pub fn mirrored_scene() -> Scene {
    let mut object = cube_object("Mirrored", false);
    object.matrix_world = scale(-1.0, 1.0, 1.0);
    Scene {
        objects: vec![object],
        ..Default::default()
    }
}

/// "Body" cube with a "Hat" cube child above it, both with UVs.
///
/// An unrelated "Lamp" sits between them in enumeration order.
pub fn two_part_scene() -> Scene {
    let body = cube_object("Body", true);
    let lamp = SceneObject::new("Lamp");
    let mut hat = cube_object("Hat", true);
    hat.parent = Some("Body".to_string());
    hat.matrix_world = translation(0.0, 0.0, 3.0);

    Scene {
        objects: vec![body, lamp, hat],
        ..Default::default()
    }
}

/// 3-bone rig plus a "Body" cube deformed by it.
///
/// Bottom vertices belong to `groups[0]`, top vertices are split between
/// `groups[1]` and `groups[2]`. Pass names outside [`BONE_NAMES`] to get a
/// mesh that references missing bones.
pub fn rigged_scene(groups: [&str; 3]) -> Scene {
    let mut body = cube_object("Body", false);
    body.vertex_groups = groups.iter().map(|g| g.to_string()).collect();
    body.modifiers.push(Modifier::armature("Rig"));
    if let Some(mesh) = body.mesh.as_mut() {
        for vertex in &mut mesh.vertices {
            vertex.groups = if vertex.co[2] < 0.0 {
                vec![GroupWeight {
                    group: 0,
                    weight: 1.0,
                }]
            } else {
                vec![
                    GroupWeight {
                        group: 1,
                        weight: 0.5,
                    },
                    GroupWeight {
                        group: 2,
                        weight: 0.5,
                    },
                ]
            };
        }
    }

    let bones = BONE_NAMES
        .iter()
        .enumerate()
        .map(|(i, &name)| BoneData {
            name: name.to_string(),
            parent: i.checked_sub(1).map(|p| BONE_NAMES[p].to_string()),
            head: [0.0, 0.0, i as f32],
            tail: [0.0, 0.0, i as f32 + 1.0],
        })
        .collect();

    let mut rig = SceneObject::new("Rig");
    rig.armature = Some(ArmatureData {
        bones,
        tracks: vec![PoseTrack {
            bone: "spine".to_string(),
            location: vec![
                Keyframe {
                    frame: 0.0,
                    value: [0.0, 0.0, 0.0],
                },
                Keyframe {
                    frame: 2.0,
                    value: [0.0, 2.0, 0.0],
                },
            ],
            ..Default::default()
        }],
    });

    Scene {
        frame_start: 0,
        frame_end: 2,
        frame_current: 0,
        objects: vec![rig, body],
    }
}

/// [`rigged_scene`] with a "Hat" cube parented to "Body".
///
/// The hat declares its own groups `["head", "root"]` and binds every vertex
/// to its group 0, i.e. the "head" bone.
pub fn rigged_two_part_scene() -> Scene {
    let mut scene = rigged_scene(BONE_NAMES);
    let mut hat = cube_object("Hat", false);
    hat.parent = Some("Body".to_string());
    hat.matrix_world = translation(0.0, 0.0, 3.0);
    hat.vertex_groups = vec!["head".to_string(), "root".to_string()];
    if let Some(mesh) = hat.mesh.as_mut() {
        for vertex in &mut mesh.vertices {
            vertex.groups = vec![GroupWeight {
                group: 0,
                weight: 1.0,
            }];
        }
    }
    scene.objects.push(hat);
    scene
}

/// Serialize `scene` as a JSON scene dump
pub fn write_scene(scene: &Scene, path: &Path) -> std::io::Result<()> {
    let json = scene
        .to_json_pretty()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    std::fs::write(path, json)
}
