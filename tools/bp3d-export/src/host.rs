//! Host collaborator seams
//!
//! The exporter never touches a concrete scene type. It talks to the host
//! through three traits:
//! - [`SceneGraph`]: object lookup, parenthood, modifiers and bones
//! - [`GeometrySource`]: triangulated world-space meshes
//! - [`PoseEvaluator`]: the mutable "current frame" and posed bones
//!
//! `bp3d_shared::Scene` implements all three, so scene dumps can be exported
//! directly.

use std::ops::RangeInclusive;

use bp3d_shared::{ObjectId, Scene, SceneObject};

use crate::error::{ExportError, Result};
use crate::geometry::TriangulatedMesh;

/// Rest-pose bone geometry, local to the armature
#[derive(Clone, Debug, PartialEq)]
pub struct RestBone {
    pub name: String,
    pub head: [f32; 3],
    pub tail: [f32; 3],
}

/// Pose-bone local transform at the current frame
#[derive(Clone, Debug, PartialEq)]
pub struct PoseBone {
    pub name: String,
    pub location: [f32; 3],
    pub scale: [f32; 3],
    /// Quaternion [w, x, y, z]
    pub rotation: [f32; 4],
}

/// Inclusive range of integer frames
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRange {
    pub start: i32,
    pub end: i32,
}

impl FrameRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Frames in increasing order
    pub fn frames(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }

    /// Number of frames (0 when `end < start`)
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end as i64 - self.start as i64 + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Object queries on the host scene graph
pub trait SceneGraph {
    fn object_name(&self, id: ObjectId) -> Result<&str>;

    /// Objects whose parent is `id`, in scene enumeration order
    fn children_of(&self, id: ObjectId) -> Vec<ObjectId>;

    /// Armature object referenced by the first armature modifier of `id`
    fn armature_of(&self, id: ObjectId) -> Result<Option<ObjectId>>;

    /// Bones of an armature object, in hierarchy order
    fn rest_bones(&self, armature: ObjectId) -> Result<Vec<RestBone>>;

    /// Vertex group names of `id`, indexed by group index
    fn vertex_groups(&self, id: ObjectId) -> Result<&[String]>;
}

/// Source of triangulated, world-transformed meshes
pub trait GeometrySource {
    /// Triangulate the mesh of `id` and bring it into world space.
    ///
    /// Mirrored transforms (negative determinant) must come back with
    /// reversed winding so faces keep pointing outwards.
    fn triangulated_mesh(&self, id: ObjectId) -> Result<TriangulatedMesh>;
}

/// Frame-dependent pose evaluation
///
/// The current frame is shared host state: setting it re-evaluates every
/// pose, so frames must be visited sequentially.
pub trait PoseEvaluator {
    /// Frame range configured on the host
    fn frame_range(&self) -> FrameRange;

    fn current_frame(&self) -> i32;

    /// Move the host to `frame` and re-evaluate poses
    fn set_frame(&mut self, frame: i32);

    /// Pose bones of `armature` at the current frame, in pose-bone order
    fn pose_bones(&self, armature: ObjectId) -> Result<Vec<PoseBone>>;
}

/// Everything an export needs from the host
pub trait SceneHost: SceneGraph + GeometrySource + PoseEvaluator {}

impl<T: SceneGraph + GeometrySource + PoseEvaluator + ?Sized> SceneHost for T {}

pub(crate) fn scene_object(scene: &Scene, id: ObjectId) -> Result<&SceneObject> {
    scene
        .get(id)
        .ok_or_else(|| ExportError::UnknownObject(id.to_string()))
}

impl SceneGraph for Scene {
    fn object_name(&self, id: ObjectId) -> Result<&str> {
        Ok(scene_object(self, id)?.name.as_str())
    }

    fn children_of(&self, id: ObjectId) -> Vec<ObjectId> {
        Scene::children_of(self, id)
    }

    fn armature_of(&self, id: ObjectId) -> Result<Option<ObjectId>> {
        let Some(target) = scene_object(self, id)?.armature_modifier() else {
            return Ok(None);
        };

        let armature = self
            .object_id(target)
            .filter(|&a| self.get(a).is_some_and(|o| o.armature.is_some()))
            .ok_or_else(|| ExportError::MissingArmatureObject {
                target: target.to_string(),
            })?;
        Ok(Some(armature))
    }

    fn rest_bones(&self, armature: ObjectId) -> Result<Vec<RestBone>> {
        let object = scene_object(self, armature)?;
        let data = object
            .armature
            .as_ref()
            .ok_or_else(|| ExportError::MissingArmatureObject {
                target: object.name.clone(),
            })?;

        Ok(data
            .bones
            .iter()
            .map(|b| RestBone {
                name: b.name.clone(),
                head: b.head,
                tail: b.tail,
            })
            .collect())
    }

    fn vertex_groups(&self, id: ObjectId) -> Result<&[String]> {
        Ok(scene_object(self, id)?.vertex_groups.as_slice())
    }
}

impl PoseEvaluator for Scene {
    fn frame_range(&self) -> FrameRange {
        FrameRange::new(self.frame_start, self.frame_end)
    }

    fn current_frame(&self) -> i32 {
        self.frame_current
    }

    fn set_frame(&mut self, frame: i32) {
        self.frame_current = frame;
    }

    fn pose_bones(&self, armature: ObjectId) -> Result<Vec<PoseBone>> {
        let object = scene_object(self, armature)?;
        let data = object
            .armature
            .as_ref()
            .ok_or_else(|| ExportError::MissingArmatureObject {
                target: object.name.clone(),
            })?;

        Ok(data
            .pose_at(self.frame_current)
            .into_iter()
            .map(|(name, pose)| PoseBone {
                name: name.to_string(),
                location: pose.location,
                scale: pose.scale,
                rotation: pose.rotation,
            })
            .collect())
    }
}
