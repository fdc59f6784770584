//! JSON scene descriptions.
//!
//! The editor hands scenes over as JSON documents. Shapes are either one of
//! the stock kinds or raw mesh buffers:
//!
//! ```json
//! {
//!   "name": "demo",
//!   "light": { "position": [5, 5, 5], "ambient": [0.1, 0.1, 0.1],
//!              "diffuse": [1, 1, 1], "specular": [0.5, 0.5, 0.5] },
//!   "objects": [
//!     { "name": "ball", "shape": { "kind": "sphere" },
//!       "material": { "color": [1, 0, 0], "reflectivity": 0.2 } },
//!     { "name": "floor", "shape": { "kind": "plane", "size": 8 },
//!       "transform": { "translation": [0, -1, 0] } }
//!   ]
//! }
//! ```

use std::path::Path;

use mrr_math::{Transform, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;
use crate::scene::{Light, Material, Scene, SceneObject, Shape};
use crate::{SceneError, SceneResult};

fn one() -> f32 {
    1.0
}

fn default_segments() -> u32 {
    32
}

/// Geometry as written in a scene description.
///
/// For the stock kinds `size` is a half-extent: a cuboid of size 1 spans
/// [-1, 1] on every axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeDesc {
    Sphere {
        #[serde(default)]
        center: Vec3,
        #[serde(default = "one")]
        radius: f32,
    },
    Cuboid {
        #[serde(default = "one")]
        size: f32,
    },
    Plane {
        #[serde(default = "one")]
        size: f32,
    },
    UvSphere {
        #[serde(default = "one")]
        radius: f32,
        #[serde(default = "default_segments")]
        segments: u32,
        #[serde(default = "default_segments")]
        rings: u32,
    },
    Mesh {
        positions: Vec<Vec3>,
        #[serde(default)]
        normals: Option<Vec<Vec3>>,
        indices: Vec<u32>,
        #[serde(default)]
        uvs: Option<Vec<Vec2>>,
    },
}

impl ShapeDesc {
    /// Build the runtime shape, validating mesh buffers.
    pub fn into_shape(self, name: &str) -> SceneResult<Shape> {
        let mut mesh = match self {
            ShapeDesc::Sphere { center, radius } => {
                if !(radius > 0.0 && radius.is_finite()) {
                    return Err(SceneError::InvalidObject {
                        name: name.to_string(),
                        reason: format!("sphere radius must be positive, got {}", radius),
                    });
                }
                return Ok(Shape::Sphere { center, radius });
            }
            ShapeDesc::Cuboid { size } => Mesh::cuboid(size * 2.0, size * 2.0, size * 2.0),
            ShapeDesc::Plane { size } => Mesh::plane(size * 2.0),
            ShapeDesc::UvSphere {
                radius,
                segments,
                rings,
            } => Mesh::uv_sphere(radius, segments, rings),
            ShapeDesc::Mesh {
                positions,
                normals,
                indices,
                uvs,
            } => Mesh::new_with_uvs(positions, indices, normals, uvs),
        };

        mesh.validate(name)?;
        mesh.ensure_normals();
        Ok(Shape::mesh(mesh))
    }
}

/// One object in a scene description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDesc {
    #[serde(default)]
    pub name: Option<String>,
    pub shape: ShapeDesc,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub material: Material,
}

/// A scene as handed over by the editor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDesc {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub light: Light,
    #[serde(default)]
    pub objects: Vec<ObjectDesc>,
}

impl SceneDesc {
    /// Parse a description from a JSON string.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a description file.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Build the runtime scene. Object ids follow description order.
    pub fn into_scene(self) -> SceneResult<Scene> {
        let mut scene = Scene::new(self.name);
        scene.light = self.light;

        for (id, desc) in self.objects.into_iter().enumerate() {
            let name = desc.name.unwrap_or_else(|| format!("object_{}", id));
            let shape = desc.shape.into_shape(&name)?;
            log::debug!(
                "Scene object {} '{}': {} ({} triangles)",
                id,
                name,
                shape.kind(),
                shape.triangle_count()
            );
            scene.objects.push(
                SceneObject::new(id, name, shape)
                    .with_transform(desc.transform)
                    .with_material(desc.material),
            );
        }

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r#"{
        "name": "demo",
        "light": { "position": [5, 5, 5], "ambient": [0.1, 0.1, 0.1],
                   "diffuse": [1, 1, 1], "specular": [0.5, 0.5, 0.5] },
        "objects": [
            { "name": "ball", "shape": { "kind": "sphere" },
              "material": { "color": [1, 0, 0], "reflectivity": 0.2 } },
            { "shape": { "kind": "plane", "size": 8 },
              "transform": { "translation": [0, -1, 0] } },
            { "shape": { "kind": "cuboid" } },
            { "shape": { "kind": "mesh",
                         "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
                         "indices": [0, 1, 2] } }
        ]
    }"#;

    #[test]
    fn test_parse_and_build() {
        let scene = SceneDesc::from_json(DEMO).unwrap().into_scene().unwrap();

        assert_eq!(scene.name, "demo");
        assert_eq!(scene.light.position, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(scene.object_count(), 4);

        let ball = &scene.objects[0];
        assert_eq!(ball.name, "ball");
        assert_eq!(ball.shape, Shape::unit_sphere());
        assert_eq!(ball.material.color, Vec3::X);
        assert_eq!(ball.material.reflectivity, 0.2);
        // Unspecified material fields keep their defaults
        assert_eq!(ball.material.ambient, 0.4);

        let floor = &scene.objects[1];
        assert_eq!(floor.name, "object_1");
        assert_eq!(floor.transform.translation, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(floor.transform.scale, Vec3::ONE);

        // Raw meshes without normals get smooth normals
        match &scene.objects[3].shape {
            Shape::Mesh(mesh) => assert!(mesh.has_normals()),
            other => panic!("expected mesh, got {:?}", other),
        }
        assert_eq!(scene.total_triangle_count(), 2 + 12 + 1);
    }

    #[test]
    fn test_stock_sizes_are_half_extents() {
        let shape = ShapeDesc::Cuboid { size: 1.5 }.into_shape("c").unwrap();
        let Shape::Mesh(mesh) = shape else {
            panic!("cuboid should be a mesh");
        };
        assert!(mesh.positions.iter().all(|p| p.abs() == Vec3::splat(1.5)));
    }

    #[test]
    fn test_bad_mesh_is_rejected() {
        let json = r#"{ "objects": [ { "name": "broken", "shape": { "kind": "mesh",
            "positions": [[0, 0, 0]], "indices": [0, 1, 2] } } ] }"#;
        let err = SceneDesc::from_json(json).unwrap().into_scene().unwrap_err();
        match err {
            SceneError::InvalidMesh { name, .. } => assert_eq!(name, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_kind_is_a_parse_error() {
        let json = r#"{ "objects": [ { "shape": { "kind": "torus" } } ] }"#;
        assert!(matches!(
            SceneDesc::from_json(json),
            Err(SceneError::Parse(_))
        ));
    }

    #[test]
    fn test_non_positive_sphere_radius() {
        let err = ShapeDesc::Sphere {
            center: Vec3::ZERO,
            radius: 0.0,
        }
        .into_shape("s")
        .unwrap_err();
        assert!(matches!(err, SceneError::InvalidObject { .. }));
    }
}
