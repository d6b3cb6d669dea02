//! Normal and UV deduplication
//!
//! Both pools keep first-insertion order and hand out 0-based indices.
//! Normals are keyed by their exact value; UVs are keyed by (vertex, value)
//! so a UV is only shared between corners of the same vertex.

use std::hash::Hash;

use hashbrown::HashMap;

use crate::geometry::TriangulatedMesh;

/// How float attributes are compared when deduplicating
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyPrecision {
    /// Bit-exact comparison (-0.0 and 0.0 are the same key)
    #[default]
    Exact,
    /// Round to `decimals` places before comparing
    Quantized { decimals: u8 },
}

/// Largest accepted `Quantized` precision; f32 carries no more digits than this
pub const MAX_DECIMALS: u8 = 9;

impl KeyPrecision {
    fn key(self, value: f32) -> u32 {
        let value = match self {
            KeyPrecision::Exact => value,
            KeyPrecision::Quantized { decimals } => {
                let scale = 10f64.powi(decimals as i32);
                let rounded = ((value as f64 * scale).round() / scale) as f32;
                if rounded.is_finite() {
                    rounded
                } else {
                    value
                }
            }
        };
        // +0.0 == -0.0 must map to the same key
        if value == 0.0 {
            0
        } else {
            value.to_bits()
        }
    }

    fn key3(self, v: [f32; 3]) -> [u32; 3] {
        v.map(|x| self.key(x))
    }

    fn key2(self, v: [f32; 2]) -> [u32; 2] {
        v.map(|x| self.key(x))
    }
}

/// Insertion-ordered pool of unique attribute values
#[derive(Clone, Debug)]
pub struct AttributePool<K, V> {
    index: HashMap<K, u32>,
    values: Vec<V>,
}

impl<K, V> Default for AttributePool<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            values: Vec::new(),
        }
    }
}

impl<K: Hash + Eq, V> AttributePool<K, V> {
    /// Index of `value` under `key`, inserting it when first seen
    pub fn insert(&mut self, key: K, value: V) -> u32 {
        let next = self.values.len() as u32;
        let index = *self.index.entry(key).or_insert(next);
        if index == next {
            self.values.push(value);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn into_values(self) -> Vec<V> {
        self.values
    }
}

/// Unique normals and UVs of one mesh plus per-corner indices into them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Deduplicated {
    pub normals: Vec<[f32; 3]>,
    /// Present when the mesh has an active UV layer
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Normal index of every loop
    pub loop_normals: Vec<u32>,
    /// UV index of every triangle corner
    pub face_uvs: Option<Vec<[u32; 3]>>,
}

/// Collapse the normals and UVs of `mesh` into unique pools.
///
/// Both pools are filled triangle by triangle in corner order.
pub fn deduplicate(mesh: &TriangulatedMesh, precision: KeyPrecision) -> Deduplicated {
    let mut normals: AttributePool<[u32; 3], [f32; 3]> = AttributePool::default();
    let mut loop_normals = vec![0u32; mesh.loops.len()];
    for triangle in &mesh.triangles {
        for &l in &triangle.loops {
            let normal = mesh.loops[l as usize].normal;
            loop_normals[l as usize] = normals.insert(precision.key3(normal), normal);
        }
    }

    let (uvs, face_uvs) = match &mesh.uv_layer {
        Some(layer) => {
            let mut pool: AttributePool<(u32, [u32; 2]), [f32; 2]> = AttributePool::default();
            let faces: Vec<[u32; 3]> = mesh
                .triangles
                .iter()
                .map(|t| {
                    t.loops.map(|l| {
                        let uv = layer[l as usize];
                        let vertex = mesh.loops[l as usize].vertex;
                        pool.insert((vertex, precision.key2(uv)), uv)
                    })
                })
                .collect();
            (Some(pool.into_values()), Some(faces))
        }
        None => (None, None),
    };

    Deduplicated {
        normals: normals.into_values(),
        uvs,
        loop_normals,
        face_uvs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MeshLoop, MeshVertex, Triangle};

    fn two_triangles(uv_layer: Option<Vec<[f32; 2]>>) -> TriangulatedMesh {
        let vertices = (0..4)
            .map(|i| MeshVertex {
                position: [i as f32, 0.0, 0.0],
                groups: Vec::new(),
            })
            .collect();
        let loops = [0, 1, 2, 0, 2, 3]
            .into_iter()
            .map(|vertex| MeshLoop {
                vertex,
                normal: [0.0, 0.0, 1.0],
            })
            .collect();
        TriangulatedMesh {
            vertices,
            loops,
            triangles: vec![Triangle { loops: [0, 1, 2] }, Triangle { loops: [3, 4, 5] }],
            uv_layer,
        }
    }

    #[test]
    fn test_pool_keeps_first_insertion_order() {
        let mut pool: AttributePool<u32, &str> = AttributePool::default();
        assert_eq!(pool.insert(7, "a"), 0);
        assert_eq!(pool.insert(3, "b"), 1);
        assert_eq!(pool.insert(7, "c"), 0);
        assert_eq!(pool.values(), &["a", "b"]);
    }

    #[test]
    fn test_shared_normal_collapses() {
        let d = deduplicate(&two_triangles(None), KeyPrecision::Exact);
        assert_eq!(d.normals, vec![[0.0, 0.0, 1.0]]);
        assert_eq!(d.loop_normals, vec![0; 6]);
        assert!(d.uvs.is_none());
        assert!(d.face_uvs.is_none());
    }

    #[test]
    fn test_negative_zero_is_same_key() {
        let mut mesh = two_triangles(None);
        mesh.loops[1].normal = [-0.0, 0.0, 1.0];
        let d = deduplicate(&mesh, KeyPrecision::Exact);
        assert_eq!(d.normals.len(), 1);
    }

    #[test]
    fn test_uv_not_shared_across_vertices() {
        // Every corner has the same UV value
        let d = deduplicate(&two_triangles(Some(vec![[0.5, 0.5]; 6])), KeyPrecision::Exact);
        let uvs = d.uvs.unwrap();
        // One entry per distinct vertex: 0, 1, 2, 3
        assert_eq!(uvs.len(), 4);
        assert_eq!(d.face_uvs.unwrap(), vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_quantized_merges_near_values() {
        let mut mesh = two_triangles(None);
        mesh.loops[2].normal = [0.0, 0.0, 0.999_999_9];
        assert_eq!(deduplicate(&mesh, KeyPrecision::Exact).normals.len(), 2);
        let d = deduplicate(&mesh, KeyPrecision::Quantized { decimals: 4 });
        assert_eq!(d.normals.len(), 1);
        assert_eq!(d.loop_normals[2], 0);
    }

    #[test]
    fn test_normals_follow_triangle_order() {
        let mut mesh = two_triangles(None);
        for l in &mut mesh.loops[3..] {
            l.normal = [0.0, 0.0, -1.0];
        }
        mesh.triangles = vec![Triangle { loops: [3, 4, 5] }, Triangle { loops: [0, 1, 2] }];
        let d = deduplicate(&mesh, KeyPrecision::Exact);
        assert_eq!(d.normals, vec![[0.0, 0.0, -1.0], [0.0, 0.0, 1.0]]);
        assert_eq!(d.loop_normals, vec![1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_huge_precision_keeps_distinct_normals() {
        let mut mesh = two_triangles(None);
        mesh.loops[0].normal = [0.6, 0.8, 0.0];
        mesh.loops[1].normal = [0.8, 0.6, 0.0];
        mesh.loops[2].normal = [0.0, 0.6, 0.8];
        mesh.triangles.truncate(1);
        let d = deduplicate(&mesh, KeyPrecision::Quantized { decimals: 40 });
        assert_eq!(d.normals.len(), 3);
        assert_eq!(&d.loop_normals[..3], &[0, 1, 2]);
    }
}
