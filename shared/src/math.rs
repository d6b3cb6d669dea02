//! Transform helpers for world-space mesh evaluation
//!
//! Scene dumps store plain arrays so they serialize without glam; this module
//! converts them into glam types and back.

use glam::{Mat3, Mat4, Vec3};

/// Object-to-world transform of a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTransform {
    matrix: Mat4,
    normal_matrix: Mat3,
}

impl WorldTransform {
    /// Identity transform (object space equals world space)
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
        normal_matrix: Mat3::IDENTITY,
    };

    /// Create from a column-major 4x4 matrix, as stored in scene dumps.
    pub fn from_cols(cols: &[[f32; 4]; 4]) -> Self {
        Self::from_matrix(Mat4::from_cols_array_2d(cols))
    }

    /// Create from a glam matrix.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let linear = Mat3::from_mat4(matrix);
        // Degenerate (zero-scale) transforms keep the linear part so that
        // normals collapse instead of turning into NaN.
        let normal_matrix = if linear.determinant() == 0.0 {
            linear
        } else {
            linear.inverse().transpose()
        };
        Self {
            matrix,
            normal_matrix,
        }
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// True when the transform flips handedness (negative determinant).
    pub fn is_mirrored(&self) -> bool {
        self.matrix.determinant() < 0.0
    }

    /// Transform a position into world space.
    pub fn transform_point(&self, point: [f32; 3]) -> [f32; 3] {
        self.matrix.transform_point3(Vec3::from(point)).to_array()
    }

    /// Transform a normal into world space (inverse-transpose, renormalized).
    pub fn transform_normal(&self, normal: [f32; 3]) -> [f32; 3] {
        (self.normal_matrix * Vec3::from(normal))
            .normalize_or_zero()
            .to_array()
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Unit normal of the triangle `a b c` (counter-clockwise winding).
///
/// Returns zero for degenerate triangles.
pub fn triangle_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let a = Vec3::from(a);
    let e1 = Vec3::from(b) - a;
    let e2 = Vec3::from(c) - a;
    e1.cross(e2).normalize_or_zero().to_array()
}
