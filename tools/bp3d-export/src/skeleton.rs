//! Skeleton file writer (`.armature.bp3d.obj`)
//!
//! Writes the rest pose of every bone and assigns bone ids. The file stays
//! open afterwards: per-vertex bone weights of every part are appended to it
//! while the main file is written.

use std::path::{Path, PathBuf};

use bp3d_shared::BP3D_FORMAT;
use hashbrown::HashMap;

use crate::error::{ExportError, Result};
use crate::formats::{write_bone, write_header, write_vertex_weights, TextFile};
use crate::geometry::MeshVertex;
use crate::host::RestBone;

/// Bone name to 1-based bone id, in armature order
#[derive(Clone, Debug, Default)]
pub struct BoneMap {
    ids: HashMap<String, u32>,
}

impl BoneMap {
    /// Assign the next id to `name`
    pub fn insert(&mut self, name: &str) -> Result<u32> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ExportError::InvalidBoneName(name.to_string()));
        }
        if self.ids.contains_key(name) {
            return Err(ExportError::DuplicateBone(name.to_string()));
        }
        let id = self.ids.len() as u32 + 1;
        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Open skeleton file accepting vertex weight records
pub struct SkeletonFile {
    file: TextFile,
}

impl SkeletonFile {
    /// Append `vb`/`vw` records for every vertex of one part.
    ///
    /// `group_names` are the part's vertex groups; each membership is
    /// translated into a bone id through `bones`.
    pub fn write_vertex_weights(
        &mut self,
        object: &str,
        group_names: &[String],
        vertices: &[MeshVertex],
        bones: &BoneMap,
    ) -> Result<()> {
        let mut influences = Vec::new();
        for vertex in vertices {
            influences.clear();
            for &(group, weight) in &vertex.groups {
                let name = group_names
                    .get(group)
                    .ok_or_else(|| ExportError::InvalidVertexGroup {
                        object: object.to_string(),
                        index: group,
                    })?;
                let bone = bones
                    .get(name)
                    .ok_or_else(|| ExportError::MissingArmatureData {
                        object: object.to_string(),
                        group: name.clone(),
                    })?;
                influences.push((bone, weight));
            }
            self.file.emit(|w| write_vertex_weights(w, &influences))?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn finish(self) -> Result<PathBuf> {
        self.file.finish()
    }
}

/// Write the skeleton header and one `bone` record per bone into `file`.
///
/// Bone ids are assigned in the order given, starting at 1. Nothing is
/// written when a bone name is rejected.
pub fn write_skeleton(mut file: TextFile, bones: &[RestBone]) -> Result<(BoneMap, SkeletonFile)> {
    let mut map = BoneMap::default();
    for bone in bones {
        map.insert(&bone.name)?;
    }

    file.emit(|w| {
        write_header(w, BP3D_FORMAT.armature_header)?;
        for bone in bones {
            write_bone(w, &bone.name, bone.head, bone.tail)?;
        }
        Ok(())
    })?;

    tracing::debug!("Wrote {} bones to {}", bones.len(), file.path().display());
    Ok((map, SkeletonFile { file }))
}
