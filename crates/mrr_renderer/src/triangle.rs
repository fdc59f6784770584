//! Triangle mesh primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection. Every
//! triangle of the mesh is tested for every ray; vertices are moved to world
//! space once, when the mesh is built for a render.

use std::sync::Arc;

use mrr_core::{Mesh, SceneError};
use mrr_math::{Ray, Vec2, Vec3, WorldTransform};

use crate::error::RenderResult;
use crate::hittable::{Hit, HIT_EPSILON};
use crate::material::SurfaceMaterial;

/// Determinant threshold below which a ray counts as parallel to a triangle.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Möller-Trumbore ray-triangle intersection.
///
/// Returns `(t, u, v)` where `u` and `v` are the barycentric weights of `v1`
/// and `v2`. Parallel rays and degenerate triangles are misses.
pub fn intersect_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<(f32, f32, f32)> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction().cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < PARALLEL_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin() - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction().dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > HIT_EPSILON).then_some((t, u, v))
}

/// A triangle mesh placed in the world.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    name: String,
    /// World-space vertex positions
    positions: Vec<Vec3>,
    /// World-space unit vertex normals
    normals: Vec<Vec3>,
    uvs: Option<Vec<Vec2>>,
    triangles: Vec<[u32; 3]>,
    material: SurfaceMaterial,
}

impl TriangleMesh {
    /// Build the world-space form of `mesh`.
    ///
    /// Missing normals are generated. A textured material needs UVs.
    pub fn new(
        name: impl Into<String>,
        mesh: &Arc<Mesh>,
        transform: &WorldTransform,
        material: SurfaceMaterial,
    ) -> RenderResult<Self> {
        let name = name.into();
        mesh.validate(&name)?;

        if material.is_textured() && !mesh.has_uvs() {
            return Err(SceneError::InvalidMesh {
                name,
                reason: "textured mesh has no UV coordinates".to_string(),
            }
            .into());
        }

        let generated;
        let mesh: &Mesh = if mesh.has_normals() {
            &**mesh
        } else {
            let mut owned = Mesh::clone(mesh);
            owned.ensure_normals();
            generated = owned;
            &generated
        };

        let positions = mesh
            .positions
            .iter()
            .map(|&p| transform.point_to_world(p))
            .collect();
        let normals = mesh
            .normals
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|&n| transform.normal_to_world(n))
            .collect();

        Ok(Self {
            name,
            positions,
            normals,
            uvs: mesh.uvs.clone(),
            triangles: mesh.triangles().collect(),
            material,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn material(&self) -> &SurfaceMaterial {
        &self.material
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Nearest hit over all triangles.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let mut best: Option<(f32, f32, f32, [u32; 3])> = None;

        for &tri in &self.triangles {
            let [i0, i1, i2] = tri.map(|i| i as usize);
            let Some((t, u, v)) =
                intersect_triangle(ray, self.positions[i0], self.positions[i1], self.positions[i2])
            else {
                continue;
            };
            if best.map_or(true, |(best_t, ..)| t < best_t) {
                best = Some((t, u, v, tri));
            }
        }

        let (t, u, v, tri) = best?;
        let [i0, i1, i2] = tri.map(|i| i as usize);

        let normal = self.shading_normal(i0, i1, i2);
        let color = match &self.uvs {
            Some(uvs) if self.material.is_textured() => {
                let uv = (1.0 - u - v) * uvs[i0] + u * uvs[i1] + v * uvs[i2];
                self.material.color_at(uv.x, uv.y)
            }
            _ => self.material.color,
        };

        Some(Hit {
            t,
            normal,
            color,
            object: 0,
        })
    }

    /// Sum of the vertex normals, renormalized.
    ///
    /// Falls back to the face normal when the vertex normals cancel out.
    fn shading_normal(&self, i0: usize, i1: usize, i2: usize) -> Vec3 {
        let summed = self.normals[i0] + self.normals[i1] + self.normals[i2];
        if summed.length_squared() > 0.0 {
            return summed.normalize();
        }
        let (p0, p1, p2) = (self.positions[i0], self.positions[i1], self.positions[i2]);
        (p1 - p0).cross(p2 - p0).normalize_or_zero()
    }
}
