//! Whitted-style shading.
//!
//! Implements recursive ray tracing with:
//! - Blinn-Phong lighting from a single point light
//! - Hard shadows via shadow rays
//! - Mirror reflection bounded by depth and an energy cutoff
//! - Anti-aliasing via an N×N sub-pixel grid

use std::path::Path;

use mrr_core::Light;
use mrr_math::{reflect, Ray, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::hittable::World;
use crate::material::Color;

/// Termination guards and offsets for `Tracer::trace`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    /// Rays at this depth or deeper return black
    pub max_depth: u32,
    /// Rays carrying less than this fraction of energy return black
    pub strength_cutoff: f32,
    /// Offset along the normal for secondary ray origins
    pub shading_bias: f32,
    /// Color of rays that hit nothing
    pub background: Color,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            max_depth: 4,
            strength_cutoff: 0.1,
            shading_bias: 1e-3,
            background: Color::ZERO,
        }
    }
}

/// Shades rays against a world lit by one point light.
#[derive(Clone, Copy)]
pub struct Tracer<'a> {
    world: &'a World,
    light: &'a Light,
    eye: Vec3,
    settings: &'a TraceSettings,
}

impl<'a> Tracer<'a> {
    pub fn new(world: &'a World, light: &'a Light, eye: Vec3, settings: &'a TraceSettings) -> Self {
        Self {
            world,
            light,
            eye,
            settings,
        }
    }

    /// Compute the color seen by a ray.
    ///
    /// `depth` counts bounces so far and `strength` is the product of the
    /// reflectivities along the path. The result is clamped to [0, 1].
    pub fn trace(&self, ray: &Ray, depth: u32, strength: f32) -> RenderResult<Color> {
        if depth >= self.settings.max_depth || strength < self.settings.strength_cutoff {
            return Ok(Color::ZERO);
        }

        let Some(hit) = self.world.hit(ray)? else {
            return Ok(self.settings.background);
        };
        let Some(primitive) = self.world.get(hit.object) else {
            return Ok(self.settings.background);
        };
        let material = primitive.material();
        let light = self.light;

        let normal = hit.normal;
        let point = ray.at(hit.t) + self.settings.shading_bias * normal;
        let surface = hit.color;

        // Non-directional, so never shadowed
        let mut color = material.ambient * surface * light.ambient;

        let to_light = light.position - point;
        let light_distance = to_light.length();
        let to_light = to_light.normalize_or_zero();

        if !self.occluded(point, to_light, light_distance)? {
            let diffuse = to_light.dot(normal).max(0.0);
            color += material.diffuse * surface * light.diffuse * diffuse;

            let to_camera = (self.eye - point).normalize_or_zero();
            let halfway = (to_light + to_camera).normalize_or_zero();
            let specular = normal.dot(halfway).max(0.0).powf(material.shininess);
            color += material.specular * surface * light.specular * specular;
        }

        let reflected = Ray::new(point, reflect(ray.direction(), normal).normalize_or_zero());
        let bounce = self.trace(&reflected, depth + 1, strength * material.reflectivity)?;
        // Colored reflections are blended halfway to white
        color += material.reflectivity * (surface + Color::ONE) / 2.0 * bounce;

        Ok(color.clamp(Color::ZERO, Color::ONE))
    }

    fn occluded(&self, point: Vec3, to_light: Vec3, light_distance: f32) -> RenderResult<bool> {
        let shadow_ray = Ray::new(point, to_light);
        Ok(self
            .world
            .hit(&shadow_ray)?
            .map_or(false, |hit| hit.t < light_distance))
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a color to 8-bit RGB. No gamma is applied.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let to_byte = |c: f32| (255.0 * clamp_01(c)).round() as u8;
    [to_byte(color.x), to_byte(color.y), to_byte(color.z)]
}

/// Render a single pixel by averaging its sub-pixel samples.
pub fn render_pixel(
    camera: &Camera,
    tracer: &Tracer<'_>,
    x: u32,
    y: u32,
    rng: &mut dyn RngCore,
) -> RenderResult<Color> {
    let n = camera.samples_per_axis;
    let mut pixel_color = Color::ZERO;

    for sy in 0..n {
        for sx in 0..n {
            let ray = camera.get_ray(x, y, sx, sy, rng);
            pixel_color += tracer.trace(&ray, 0, 1.0)?;
        }
    }

    Ok((pixel_color / camera.samples_per_pixel() as f32).clamp(Color::ZERO, Color::ONE))
}

/// Float RGB image in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width as usize) * (height as usize)],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Copy a row-major block of `width`×`height` pixels to (x, y).
    pub fn blit(&mut self, x: u32, y: u32, width: u32, height: u32, block: &[Color]) {
        debug_assert_eq!(block.len(), width as usize * height as usize);
        for (row, line) in block.chunks_exact(width.max(1) as usize).enumerate() {
            let start = self.index(x, y + row as u32);
            self.pixels[start..start + line.len()].copy_from_slice(line);
        }
    }

    /// Convert to an 8-bit RGB image.
    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |x, y| {
            image::Rgb(color_to_rgb(self.get(x, y)))
        })
    }

    /// Write the image; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        self.to_rgb_image()
            .save(path)
            .map_err(|source| RenderError::Image {
                path: path.display().to_string(),
                source,
            })
    }
}
