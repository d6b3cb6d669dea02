//! Shared types for the BlockProject 3D export tools.
//!
//! - [`format`]: headers, version marker and file naming of BP3D exports
//! - [`scene`]: serializable scene dump standing in for the host editor
//! - [`pose`]: keyframed pose tracks
//! - [`math`]: world transform helpers

pub mod format;
pub mod math;
pub mod pose;
pub mod scene;

pub use format::{Bp3dFormat, BP3D_FORMAT};
pub use math::WorldTransform;
pub use pose::{Keyframe, LocalPose, PoseTrack};
pub use scene::{
    ArmatureData, BoneData, GroupWeight, MeshData, MeshVertex, Modifier, ObjectId, Polygon,
    Scene, SceneError, SceneObject, UvLayer,
};
