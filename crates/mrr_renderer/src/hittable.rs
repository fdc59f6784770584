//! Ray-object intersection: the closed set of primitives and the scene-wide
//! nearest-hit search.

use mrr_core::{SceneError, SceneObject, Shape, TextureCache};
use mrr_math::{Ray, Vec3};

use crate::error::{RenderError, RenderResult};
use crate::material::{Color, SurfaceMaterial};
use crate::sphere::Sphere;
use crate::triangle::TriangleMesh;

/// Smallest accepted ray parameter.
pub const HIT_EPSILON: f32 = 1e-6;

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// World-space distance along the ray
    pub t: f32,
    /// Unit world-space surface normal
    pub normal: Vec3,
    /// Surface color at the hit point (texture or flat color)
    pub color: Color,
    /// Index of the primitive in its `World`
    pub object: usize,
}

/// A renderable object. One variant per shape kind.
#[derive(Clone, Debug)]
pub enum Primitive {
    Sphere(Sphere),
    Mesh(TriangleMesh),
}

impl Primitive {
    /// Build the render-time form of a scene object.
    ///
    /// Derives the world transform once and loads textures through `textures`.
    pub fn from_object(object: &SceneObject, textures: &mut TextureCache) -> RenderResult<Self> {
        let transform = object.transform.world();
        if !transform.is_invertible() {
            return Err(SceneError::InvalidObject {
                name: object.name.clone(),
                reason: format!("transform is not invertible (scale {:?})", object.transform.scale),
            }
            .into());
        }

        let material = SurfaceMaterial::resolve(&object.material, textures).map_err(|source| {
            RenderError::Texture {
                object: object.name.clone(),
                source,
            }
        })?;

        Ok(match &object.shape {
            Shape::Sphere { center, radius } => Primitive::Sphere(Sphere::new(
                object.name.clone(),
                *center,
                *radius,
                transform,
                material,
            )),
            Shape::Mesh(mesh) => Primitive::Mesh(TriangleMesh::new(
                object.name.clone(),
                mesh,
                &transform,
                material,
            )?),
        })
    }

    /// Nearest intersection with this primitive.
    ///
    /// The returned hit has `object` set to 0; `World` fills in the index.
    pub fn intersect(&self, ray: &Ray) -> RenderResult<Option<Hit>> {
        match self {
            Primitive::Sphere(sphere) => sphere.intersect(ray),
            Primitive::Mesh(mesh) => Ok(mesh.intersect(ray)),
        }
    }

    pub fn material(&self) -> &SurfaceMaterial {
        match self {
            Primitive::Sphere(sphere) => sphere.material(),
            Primitive::Mesh(mesh) => mesh.material(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Primitive::Sphere(sphere) => sphere.name(),
            Primitive::Mesh(mesh) => mesh.name(),
        }
    }
}

/// All primitives of a scene, searched by linear scan.
///
/// There is deliberately no acceleration structure: every ray is tested
/// against every primitive (and every triangle of every mesh).
#[derive(Clone, Debug, Default)]
pub struct World {
    primitives: Vec<Primitive>,
}

impl World {
    /// Create a new empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from scene objects, in scan order.
    pub fn from_objects(objects: &[SceneObject], textures: &mut TextureCache) -> RenderResult<Self> {
        let primitives = objects
            .iter()
            .map(|object| Primitive::from_object(object, textures))
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(Self { primitives })
    }

    /// Add a primitive at the end of the scan order.
    pub fn add(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Get the number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Check if the world is empty.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Get a primitive by index (as stored in `Hit::object`).
    pub fn get(&self, index: usize) -> Option<&Primitive> {
        self.primitives.get(index)
    }

    /// Nearest hit over all primitives.
    ///
    /// On exactly equal distances the primitive scanned first wins.
    pub fn hit(&self, ray: &Ray) -> RenderResult<Option<Hit>> {
        let mut closest: Option<Hit> = None;

        for (index, primitive) in self.primitives.iter().enumerate() {
            if let Some(mut hit) = primitive.intersect(ray)? {
                if closest.map_or(true, |best| hit.t < best.t) {
                    hit.object = index;
                    closest = Some(hit);
                }
            }
        }

        Ok(closest)
    }
}
