// Object transforms
//
// An object is placed by a translation / Euler rotation / scale triple. The
// derived matrices are a pure function of that triple, so they are computed
// once per render pass and handed to workers by value.

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform components that can be composed into a matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Rotation as Euler angles in degrees, applied X then Y then Z
    pub rotation: Vec3,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Builder: set the Euler rotation (degrees).
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder: set the scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation quaternion composed X -> Y -> Z.
    pub fn quaternion(&self) -> Quat {
        Quat::from_rotation_x(self.rotation.x.to_radians())
            * Quat::from_rotation_y(self.rotation.y.to_radians())
            * Quat::from_rotation_z(self.rotation.z.to_radians())
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Translate * Rotate * Scale
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quaternion(), self.translation)
    }

    /// Derive the full set of world-space matrices.
    pub fn world(&self) -> WorldTransform {
        WorldTransform::from_matrix(self.to_matrix())
    }
}

/// Forward, inverse and normal matrices of an object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTransform {
    /// Local -> world
    pub matrix: Mat4,
    /// World -> local
    pub inverse: Mat4,
    /// Inverse-transpose of the upper 3x3, for normals
    pub normal: Mat3,
}

impl WorldTransform {
    /// Build from a local -> world matrix.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let inverse = matrix.inverse();
        let normal = Mat3::from_mat4(inverse).transpose();
        Self {
            matrix,
            inverse,
            normal,
        }
    }

    /// Transform a point from local to world space.
    #[inline]
    pub fn point_to_world(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point3(point)
    }

    /// Transform a point from world to local space.
    #[inline]
    pub fn point_to_local(&self, point: Vec3) -> Vec3 {
        self.inverse.transform_point3(point)
    }

    /// Transform a direction from world to local space (no translation,
    /// no renormalization).
    #[inline]
    pub fn vector_to_local(&self, vector: Vec3) -> Vec3 {
        self.inverse.transform_vector3(vector)
    }

    /// Transform a local normal to a unit world-space normal.
    #[inline]
    pub fn normal_to_world(&self, normal: Vec3) -> Vec3 {
        (self.normal * normal).normalize_or_zero()
    }

    /// Whether the matrix can be inverted at all (no zero scale axis).
    pub fn is_invertible(&self) -> bool {
        self.matrix.determinant().abs() > f32::EPSILON && self.inverse.is_finite()
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::from_matrix(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_1_SQRT_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_identity_by_default() {
        assert_eq!(Transform::default().to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_translate_rotate_scale_order() {
        let t = Transform::from_translation(Vec3::new(10.0, 0.0, 0.0))
            .with_rotation(Vec3::new(0.0, 0.0, 90.0))
            .with_scale(Vec3::new(2.0, 1.0, 1.0));

        // Scale first (x doubled), then rotate +X onto +Y, then translate.
        let p = t.to_matrix().transform_point3(Vec3::X);
        assert!(approx(p, Vec3::new(10.0, 2.0, 0.0)), "got {p}");
    }

    #[test]
    fn test_rotation_composes_x_then_y_then_z() {
        let t = Transform::default().with_rotation(Vec3::new(90.0, 90.0, 0.0));
        let expected = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)
            * Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(t.quaternion().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Vec3::new(15.0, 30.0, 45.0))
            .with_scale(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.world(), t.world());
    }

    #[test]
    fn test_point_round_trip() {
        let w = Transform::from_translation(Vec3::new(5.0, -2.0, 1.0))
            .with_rotation(Vec3::new(0.0, 45.0, 0.0))
            .world();
        let p = Vec3::new(5.0, 3.0, 2.0);
        assert!(approx(w.point_to_local(w.point_to_world(p)), p));
    }

    #[test]
    fn test_normal_under_non_uniform_scale() {
        // A 45-degree surface squashed along Y: the normal must tilt towards Y,
        // which transforming with the plain matrix would get wrong.
        let w = Transform::default()
            .with_scale(Vec3::new(1.0, 0.5, 1.0))
            .world();
        let n = w.normal_to_world(Vec3::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0));
        let expected = Vec3::new(1.0, 2.0, 0.0).normalize();
        assert!(approx(n, expected), "got {n}");
    }

    #[test]
    fn test_zero_scale_not_invertible() {
        let w = Transform::default().with_scale(Vec3::new(1.0, 0.0, 1.0)).world();
        assert!(!w.is_invertible());
        assert!(Transform::default().world().is_invertible());
    }
}
