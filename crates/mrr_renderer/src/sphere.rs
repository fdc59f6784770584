//! Analytic sphere primitive.
//!
//! The sphere is defined in local space (center, radius); its world-space
//! placement, size and any squash come from the object transform. Rays are
//! intersected in local space and the result mapped back.

use crate::{
    error::{RenderError, RenderResult},
    hittable::{Hit, HIT_EPSILON},
    material::SurfaceMaterial,
};
use mrr_math::{Ray, Vec3, WorldTransform};
use std::f32::consts::PI;

/// A (possibly transformed) sphere.
#[derive(Clone, Debug)]
pub struct Sphere {
    name: String,
    center: Vec3,
    radius: f32,
    transform: WorldTransform,
    material: SurfaceMaterial,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(
        name: impl Into<String>,
        center: Vec3,
        radius: f32,
        transform: WorldTransform,
        material: SurfaceMaterial,
    ) -> Self {
        Self {
            name: name.into(),
            center,
            radius: radius.max(0.0),
            transform,
            material,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn material(&self) -> &SurfaceMaterial {
        &self.material
    }

    /// Get the UV coordinates for a point on the unit sphere.
    ///
    /// theta: angle around Y from +X, in [0, 2pi)
    /// phi: angle down from +Y, in [0, pi]
    fn sphere_uv(n: Vec3) -> (f32, f32) {
        let mut theta = n.z.atan2(n.x);
        if theta < 0.0 {
            theta += 2.0 * PI;
        }
        let phi = n.y.clamp(-1.0, 1.0).acos();

        (theta / (2.0 * PI), phi / PI)
    }

    /// Nearest intersection in front of the ray origin.
    ///
    /// Fails only when a textured sphere produces texture coordinates outside
    /// the unit square.
    pub fn intersect(&self, ray: &Ray) -> RenderResult<Option<Hit>> {
        let origin = self.transform.point_to_local(ray.origin());
        let direction = self.transform.vector_to_local(ray.direction());

        let oc = self.center - origin;
        let a = direction.length_squared();
        let h = direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return Ok(None);
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in front of the origin
        let mut root = (h - sqrtd) / a;
        if root <= HIT_EPSILON {
            root = (h + sqrtd) / a;
            if root <= HIT_EPSILON {
                return Ok(None);
            }
        }

        let local_point = origin + root * direction;
        let local_normal = (local_point - self.center) / self.radius;

        // Local t is not a distance once scale is non-uniform.
        let world_point = self.transform.point_to_world(local_point);
        let t = world_point.distance(ray.origin());
        let normal = self.transform.normal_to_world(local_normal);

        let color = if self.material.is_textured() {
            let (u, v) = Self::sphere_uv(local_normal.normalize_or_zero());
            if !((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v)) {
                return Err(RenderError::UvOutOfRange {
                    object: self.name.clone(),
                    u,
                    v,
                });
            }
            self.material.color_at(u, v)
        } else {
            self.material.color
        };

        Ok(Some(Hit {
            t,
            normal,
            color,
            object: 0,
        }))
    }
}
