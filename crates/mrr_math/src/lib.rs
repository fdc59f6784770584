// Re-export glam for convenience
pub use glam::*;

// MRR math types
mod camera;
mod ray;
mod transform;
mod vector;

pub use camera::ViewState;
pub use ray::Ray;
pub use transform::{Transform, WorldTransform};
pub use vector::{normalize, reflect, refract};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_reexports_compose() {
        let t = Transform::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let moved = t.world().matrix.transform_point3(ray.at(2.0));
        assert_eq!(moved, Vec3::new(2.0, 1.0, 0.0));
    }
}
