//! Render-time materials.
//!
//! A scene `Material` names its texture by path; the render-time version
//! holds the loaded texture so workers never touch the filesystem.

use std::sync::Arc;

use mrr_core::{Material, Texture, TextureCache, TextureError};
use mrr_math::Vec3;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Blinn-Phong material with its texture resolved.
#[derive(Clone, Debug)]
pub struct SurfaceMaterial {
    pub color: Color,
    pub texture: Option<Arc<Texture>>,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
    pub reflectivity: f32,
}

impl SurfaceMaterial {
    /// Resolve a scene material, loading its texture through the cache.
    ///
    /// An unreadable texture is an error; there is no fallback to the flat
    /// color.
    pub fn resolve(material: &Material, textures: &mut TextureCache) -> Result<Self, TextureError> {
        let texture = match &material.texture {
            Some(path) => Some(textures.load(path)?),
            None => None,
        };

        Ok(Self {
            color: material.color,
            texture,
            ambient: material.ambient,
            diffuse: material.diffuse,
            specular: material.specular,
            shininess: material.shininess,
            reflectivity: material.reflectivity.clamp(0.0, 1.0),
        })
    }

    /// Untextured material with the default coefficients.
    pub fn flat(color: Color) -> Self {
        let defaults = Material::default();
        Self {
            color,
            texture: None,
            ambient: defaults.ambient,
            diffuse: defaults.diffuse,
            specular: defaults.specular,
            shininess: defaults.shininess,
            reflectivity: defaults.reflectivity,
        }
    }

    /// Builder: set the reflectivity.
    pub fn with_reflectivity(mut self, reflectivity: f32) -> Self {
        self.reflectivity = reflectivity.clamp(0.0, 1.0);
        self
    }

    /// Check if a texture lookup is needed at hit time.
    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }

    /// Surface color at the given texture coordinates.
    pub fn color_at(&self, u: f32, v: f32) -> Color {
        match &self.texture {
            Some(texture) => texture.sample(u, v),
            None => self.color,
        }
    }
}
