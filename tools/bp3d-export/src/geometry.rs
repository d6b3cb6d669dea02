//! Triangulated world-space meshes
//!
//! Polygons are fan-triangulated and every triangle gets its own three
//! loops, so loop indices map 1:1 to triangle corners.

use bp3d_shared::math::triangle_normal;
use bp3d_shared::{ObjectId, Scene};

use crate::error::{ExportError, Result};
use crate::host::{scene_object, GeometrySource};

/// Vertex in world space with its vertex group memberships
#[derive(Clone, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    /// (group index, weight)
    pub groups: Vec<(usize, f32)>,
}

/// Triangle corner
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshLoop {
    /// Index into `TriangulatedMesh::vertices`
    pub vertex: u32,
    /// Split normal in world space
    pub normal: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    /// Indices into `TriangulatedMesh::loops`
    pub loops: [u32; 3],
}

/// Mesh ready for export
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangulatedMesh {
    pub vertices: Vec<MeshVertex>,
    pub loops: Vec<MeshLoop>,
    pub triangles: Vec<Triangle>,
    /// Active UV layer, one coordinate per loop
    pub uv_layer: Option<Vec<[f32; 2]>>,
}

impl TriangulatedMesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

impl GeometrySource for Scene {
    fn triangulated_mesh(&self, id: ObjectId) -> Result<TriangulatedMesh> {
        let object = scene_object(self, id)?;
        let name = object.name.as_str();
        let mesh = object
            .mesh
            .as_ref()
            .ok_or_else(|| ExportError::NotAMesh(name.to_string()))?;
        let transform = object.world_transform();
        let mirrored = transform.is_mirrored();

        let vertices: Vec<MeshVertex> = mesh
            .vertices
            .iter()
            .map(|v| MeshVertex {
                position: transform.transform_point(v.co),
                groups: v.groups.iter().map(|g| (g.group, g.weight)).collect(),
            })
            .collect();

        let source_uvs = match mesh.active_uv_layer() {
            Some(layer) if layer.data.len() != mesh.loop_count() => {
                return Err(ExportError::malformed(
                    name,
                    format!(
                        "UV layer '{}' has {} entries for {} loops",
                        layer.name,
                        layer.data.len(),
                        mesh.loop_count()
                    ),
                ));
            }
            Some(layer) => Some(layer.data.as_slice()),
            None => None,
        };

        let mut result = TriangulatedMesh {
            vertices,
            uv_layer: source_uvs.map(|_| Vec::new()),
            ..Default::default()
        };

        let mut loop_start = 0usize;
        for (p, polygon) in mesh.polygons.iter().enumerate() {
            let corners = polygon.vertices.len();
            if corners < 3 {
                return Err(ExportError::malformed(
                    name,
                    format!("polygon {} has {} corners", p, corners),
                ));
            }
            if let Some(&bad) = polygon
                .vertices
                .iter()
                .find(|&&v| v as usize >= result.vertices.len())
            {
                return Err(ExportError::malformed(
                    name,
                    format!("polygon {} references missing vertex {}", p, bad),
                ));
            }
            if let Some(normals) = &polygon.normals {
                if normals.len() != corners {
                    return Err(ExportError::malformed(
                        name,
                        format!(
                            "polygon {} has {} normals for {} corners",
                            p,
                            normals.len(),
                            corners
                        ),
                    ));
                }
            }

            for i in 1..corners - 1 {
                let fan = if mirrored {
                    [0, i + 1, i]
                } else {
                    [0, i, i + 1]
                };

                let positions = fan.map(|c| result.vertices[polygon.vertices[c] as usize].position);
                let flat = triangle_normal(positions[0], positions[1], positions[2]);

                let base = result.loops.len() as u32;
                for corner in fan {
                    let normal = match &polygon.normals {
                        Some(normals) => transform.transform_normal(normals[corner]),
                        None => flat,
                    };
                    result.loops.push(MeshLoop {
                        vertex: polygon.vertices[corner],
                        normal,
                    });
                    if let (Some(out), Some(uvs)) = (result.uv_layer.as_mut(), source_uvs) {
                        out.push(uvs[loop_start + corner]);
                    }
                }
                result.triangles.push(Triangle {
                    loops: [base, base + 1, base + 2],
                });
            }

            loop_start += corners;
        }

        Ok(result)
    }
}
