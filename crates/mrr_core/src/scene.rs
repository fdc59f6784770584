//! Scene types handed from the editor to the renderer.
//!
//! The renderer treats a `Scene` as an immutable snapshot for the whole
//! duration of a render.

use std::sync::Arc;

use mrr_math::{Transform, Vec3};
use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;

/// Blinn-Phong surface material.
///
/// The coefficients are scalar weights applied to the surface color and the
/// light's per-channel intensities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Base color (RGB, 0-1), used when no texture is set
    pub color: Vec3,

    /// Path to a color texture; replaces `color` where set
    pub texture: Option<String>,

    /// Ambient coefficient
    pub ambient: f32,

    /// Diffuse coefficient
    pub diffuse: f32,

    /// Specular coefficient
    pub specular: f32,

    /// Specular exponent
    pub shininess: f32,

    /// Mirror reflectivity in [0, 1]
    pub reflectivity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            texture: None,
            ambient: 0.4,
            diffuse: 1.0,
            specular: 0.3,
            shininess: 8.0,
            reflectivity: 0.5,
        }
    }
}

impl Material {
    /// Create a new material with just a color.
    pub fn new(color: Vec3) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    /// Builder: set the reflectivity.
    pub fn with_reflectivity(mut self, reflectivity: f32) -> Self {
        self.reflectivity = reflectivity;
        self
    }

    /// Builder: set a texture path.
    pub fn with_texture(mut self, path: impl Into<String>) -> Self {
        self.texture = Some(path.into());
        self
    }

    /// Check if this material uses a texture.
    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }
}

/// Single point light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Light {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Light {
    /// Derive the three intensities from one light color.
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position,
            ambient: 0.1 * color,
            diffuse: color,
            specular: 0.5 * color,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec3::new(-1.0, 3.0, -2.0), Vec3::ONE)
    }
}

/// Geometry of a scene object, in local space.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Analytic sphere; the world-space size is carried by the transform
    Sphere { center: Vec3, radius: f32 },
    /// Triangle mesh (cuboid, plane or arbitrary geometry)
    Mesh(Arc<Mesh>),
}

impl Shape {
    /// Unit sphere at the local origin.
    pub fn unit_sphere() -> Self {
        Shape::Sphere {
            center: Vec3::ZERO,
            radius: 1.0,
        }
    }

    /// Wrap a mesh.
    pub fn mesh(mesh: Mesh) -> Self {
        Shape::Mesh(Arc::new(mesh))
    }

    /// Number of triangles (0 for analytic shapes).
    pub fn triangle_count(&self) -> usize {
        match self {
            Shape::Sphere { .. } => 0,
            Shape::Mesh(mesh) => mesh.triangle_count(),
        }
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Sphere { .. } => "sphere",
            Shape::Mesh(_) => "mesh",
        }
    }
}

/// An object in the scene: geometry + transform + material.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub id: usize,
    pub name: String,
    pub shape: Shape,
    pub transform: Transform,
    pub material: Material,
}

impl SceneObject {
    /// Create an object with an identity transform and the default material.
    pub fn new(id: usize, name: impl Into<String>, shape: Shape) -> Self {
        Self {
            id,
            name: name.into(),
            shape,
            transform: Transform::default(),
            material: Material::default(),
        }
    }

    /// Builder: set the transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder: set the material.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }
}

/// A complete scene: objects and the light illuminating them.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Scene objects, in scan order
    pub objects: Vec<SceneObject>,

    /// The point light
    pub light: Light,

    /// Scene name (usually from filename)
    pub name: String,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an object (ids are assigned in insertion order) and return it.
    pub fn add_object(&mut self, name: impl Into<String>, shape: Shape) -> &mut SceneObject {
        let id = self.objects.len();
        self.objects.push(SceneObject::new(id, name, shape));
        let last = self.objects.len() - 1;
        &mut self.objects[last]
    }

    /// Get total object count.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Get total triangle count across all mesh objects.
    pub fn total_triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.shape.triangle_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_creation() {
        let mut scene = Scene::new("test");

        scene.add_object("ball", Shape::unit_sphere());
        scene
            .add_object("box", Shape::mesh(Mesh::cuboid(1.0, 1.0, 1.0)))
            .transform = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));

        assert_eq!(scene.object_count(), 2);
        assert_eq!(scene.objects[1].id, 1);
        assert_eq!(scene.objects[1].transform.translation, Vec3::X);
        assert_eq!(scene.total_triangle_count(), 12);
    }

    #[test]
    fn test_light_from_color() {
        let light = Light::new(Vec3::ZERO, Vec3::new(1.0, 0.5, 0.0));
        assert!((light.ambient - Vec3::new(0.1, 0.05, 0.0)).length() < 1e-6);
        assert_eq!(light.diffuse, Vec3::new(1.0, 0.5, 0.0));
        assert!((light.specular - Vec3::new(0.5, 0.25, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_material_defaults() {
        let m = Material::default();
        assert_eq!(m.color, Vec3::ONE);
        assert_eq!(m.shininess, 8.0);
        assert_eq!(m.reflectivity, 0.5);
        assert!(!m.has_texture());
        assert!(m.with_texture("a.png").has_texture());
    }
}
