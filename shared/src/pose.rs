//! Keyframed pose tracks and per-frame sampling
//!
//! Rotations are stored as quaternions in `[w, x, y, z]` order, matching the
//! order they are written in animation files.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A single key of an animation channel
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    /// Frame number the key sits on (may be fractional)
    pub frame: f32,
    /// Channel value at that frame
    pub value: T,
}

/// Local transform of a pose bone relative to its rest pose
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalPose {
    /// Translation
    pub location: [f32; 3],
    /// Rotation quaternion [w, x, y, z]
    pub rotation: [f32; 4],
    /// Scale
    pub scale: [f32; 3],
}

impl LocalPose {
    /// Rest pose: no translation, identity rotation, unit scale
    pub const REST: Self = Self {
        location: [0.0, 0.0, 0.0],
        rotation: [1.0, 0.0, 0.0, 0.0],
        scale: [1.0, 1.0, 1.0],
    };
}

impl Default for LocalPose {
    fn default() -> Self {
        Self::REST
    }
}

/// Animation channels targeting one bone
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoseTrack {
    /// Name of the animated bone
    pub bone: String,
    #[serde(default)]
    pub location: Vec<Keyframe<[f32; 3]>>,
    #[serde(default)]
    pub rotation: Vec<Keyframe<[f32; 4]>>,
    #[serde(default)]
    pub scale: Vec<Keyframe<[f32; 3]>>,
}

impl PoseTrack {
    /// Sort every channel by frame so sampling can bracket keys linearly.
    pub fn sort_keys(&mut self) {
        self.location.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        self.rotation.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        self.scale.sort_by(|a, b| a.frame.total_cmp(&b.frame));
    }

    /// Evaluate the track at `frame`. Channels without keys keep the rest value.
    pub fn sample(&self, frame: f32) -> LocalPose {
        LocalPose {
            location: sample_vec3(&self.location, frame, LocalPose::REST.location),
            rotation: sample_quat(&self.rotation, frame),
            scale: sample_vec3(&self.scale, frame, LocalPose::REST.scale),
        }
    }
}

/// Locate the keys surrounding `frame`.
///
/// Returns the lower key index and the blend factor towards the next key, or
/// `None` for the factor when `frame` is at or past the last key.
fn bracket<T>(keys: &[Keyframe<T>], frame: f32) -> (usize, Option<f32>) {
    let mut i = 0;
    while i < keys.len() - 1 && keys[i + 1].frame < frame {
        i += 1;
    }

    if i >= keys.len() - 1 {
        return (keys.len() - 1, None);
    }

    let f0 = keys[i].frame;
    let f1 = keys[i + 1].frame;
    let factor = if f1 > f0 { (frame - f0) / (f1 - f0) } else { 0.0 };
    (i, Some(factor.clamp(0.0, 1.0)))
}

fn sample_vec3(keys: &[Keyframe<[f32; 3]>], frame: f32, rest: [f32; 3]) -> [f32; 3] {
    if keys.is_empty() {
        return rest;
    }

    match bracket(keys, frame) {
        (i, None) => keys[i].value,
        (i, Some(factor)) => {
            let v0 = Vec3::from(keys[i].value);
            let v1 = Vec3::from(keys[i + 1].value);
            v0.lerp(v1, factor).to_array()
        }
    }
}

fn sample_quat(keys: &[Keyframe<[f32; 4]>], frame: f32) -> [f32; 4] {
    if keys.is_empty() {
        return LocalPose::REST.rotation;
    }

    match bracket(keys, frame) {
        (i, None) => keys[i].value,
        (i, Some(factor)) => {
            let q0 = quat_from_wxyz(keys[i].value);
            let q1 = quat_from_wxyz(keys[i + 1].value);
            let q = q0.slerp(q1, factor);
            [q.w, q.x, q.y, q.z]
        }
    }
}

fn quat_from_wxyz(q: [f32; 4]) -> Quat {
    Quat::from_xyzw(q[1], q[2], q[3], q[0]).normalize()
}
