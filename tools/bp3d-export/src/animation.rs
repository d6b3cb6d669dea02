//! Animation file writer (`.animation.bp3d.obj`)
//!
//! Steps the host through every frame of a range and records the local
//! transform of each pose bone.

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use bp3d_shared::{ObjectId, BP3D_FORMAT};

use crate::error::{ExportError, Result};
use crate::formats::{write_frame, write_header, write_transform, TextFile};
use crate::host::{FrameRange, PoseEvaluator, SceneGraph};
use crate::skeleton::BoneMap;

/// Frame the host is returned to once an animation pass ends
pub const REST_FRAME: i32 = 0;

/// Exclusive access to the host's current frame.
///
/// Dropping the guard moves the host back to [`REST_FRAME`], whether the pass
/// finished or bailed out with an error.
pub struct FrameGuard<'a, P: PoseEvaluator + ?Sized> {
    host: &'a mut P,
}

impl<'a, P: PoseEvaluator + ?Sized> FrameGuard<'a, P> {
    pub fn new(host: &'a mut P) -> Self {
        Self { host }
    }
}

impl<P: PoseEvaluator + ?Sized> Deref for FrameGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.host
    }
}

impl<P: PoseEvaluator + ?Sized> DerefMut for FrameGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.host
    }
}

impl<P: PoseEvaluator + ?Sized> Drop for FrameGuard<'_, P> {
    fn drop(&mut self) {
        self.host.set_frame(REST_FRAME);
    }
}

/// Result of an animation pass
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenAnimation {
    pub path: PathBuf,
    pub frame_count: usize,
}

/// Write one `frame` block per frame of `range`, in increasing order.
///
/// Every pose bone of `armature` must have an id in `bones`. The host is back
/// on [`REST_FRAME`] when this returns, successfully or not.
pub fn write_animation<H>(
    host: &mut H,
    armature: ObjectId,
    range: FrameRange,
    bones: &BoneMap,
    mut file: TextFile,
) -> Result<WrittenAnimation>
where
    H: PoseEvaluator + SceneGraph + ?Sized,
{
    let armature_name = host.object_name(armature)?.to_string();
    file.emit(|w| write_header(w, BP3D_FORMAT.animation_header))?;

    let mut host = FrameGuard::new(host);
    for frame in range.frames() {
        host.set_frame(frame);
        let pose = host.pose_bones(armature)?;

        let mut records = Vec::with_capacity(pose.len());
        for bone in &pose {
            let id = bones
                .get(&bone.name)
                .ok_or_else(|| ExportError::MissingArmatureData {
                    object: armature_name.clone(),
                    group: bone.name.clone(),
                })?;
            records.push((id, bone));
        }

        file.emit(|w| {
            write_frame(w, frame)?;
            for (id, bone) in &records {
                write_transform(w, *id, bone.location, bone.scale, bone.rotation)?;
            }
            Ok(())
        })?;
        tracing::debug!("Frame {}: {} bones", frame, records.len());
    }
    drop(host);

    Ok(WrittenAnimation {
        path: file.finish()?,
        frame_count: range.len(),
    })
}
