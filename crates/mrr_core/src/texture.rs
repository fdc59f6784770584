//! Texture loading and caching for materials.
//!
//! Textures are loaded from disk once per render (keyed by path) and shared
//! read-only between render workers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mrr_math::Vec3;
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {0} has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A loaded texture with pixel data.
///
/// Stores RGB as floats in [0, 1], exactly as encoded in the file (no color
/// space conversion), so a texel shades the same as an equal flat color.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel data, row-major, top row first
    pub pixels: Vec<Vec3>,

    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<Vec3>, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self::new(1, 1, vec![color], "<solid>")
    }

    /// Sample the texture at UV coordinates (bilinear filtering).
    ///
    /// UV coordinates are in [0, 1] with (0, 0) at the top-left, so v runs
    /// down the image rows; values outside wrap around (repeat addressing).
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        if self.width == 0 || self.height == 0 {
            return Vec3::ZERO;
        }

        // Wrap UV coordinates
        let u = if u == 1.0 { 1.0 } else { u.rem_euclid(1.0) };
        let v = if v == 1.0 { 1.0 } else { v.rem_euclid(1.0) };

        // Convert to pixel coordinates
        let x = u * (self.width as f32 - 1.0);
        let y = v * (self.height as f32 - 1.0);

        let x0 = (x.floor() as u32).min(self.width - 1);
        let y0 = (y.floor() as u32).min(self.height - 1);
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let top = self.get_pixel(x0, y0).lerp(self.get_pixel(x1, y0), fx);
        let bottom = self.get_pixel(x0, y1).lerp(self.get_pixel(x1, y1), fx);

        top.lerp(bottom, fy)
    }

    /// Get pixel at integer coordinates.
    fn get_pixel(&self, x: u32, y: u32) -> Vec3 {
        let idx = (y * self.width + x) as usize;
        self.pixels.get(idx).copied().unwrap_or(Vec3::ZERO)
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Vec3>()
    }
}

/// Cache for loaded textures.
///
/// Textures are loaded on-demand and cached for reuse.
pub struct TextureCache {
    /// Cached textures by file path
    textures: HashMap<String, Arc<Texture>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    /// Create a new empty texture cache.
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a texture cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load a texture from file, using cache if available.
    pub fn load(&mut self, path: &str) -> TextureResult<Arc<Texture>> {
        if let Some(texture) = self.textures.get(path) {
            return Ok(texture.clone());
        }

        let full_path = self.resolve_path(path);
        let texture = Arc::new(load_texture_file(&full_path)?);
        self.textures.insert(path.to_string(), texture.clone());

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            path,
            texture.width,
            texture.height,
            texture.size_bytes() as f32 / 1024.0
        );

        Ok(texture)
    }

    /// Check if a texture is cached.
    pub fn is_cached(&self, path: &str) -> bool {
        self.textures.contains_key(path)
    }

    /// Get the number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a texture from a file path.
fn load_texture_file(path: &Path) -> TextureResult<Texture> {
    let display = path.display().to_string();
    let img = image::open(path).map_err(|source| TextureError::Load {
        path: display.clone(),
        source,
    })?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty(display));
    }

    let pixels = rgb
        .pixels()
        .map(|p| {
            Vec3::new(
                p[0] as f32 / 255.0,
                p[1] as f32 / 255.0,
                p[2] as f32 / 255.0,
            )
        })
        .collect();

    Ok(Texture::new(width, height, pixels, display))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(name: &str, pixels: &[[u8; 3]], width: u32, height: u32) -> PathBuf {
        let path = std::env::temp_dir().join(format!("mrr_core_{}_{}.png", name, std::process::id()));
        let mut img = image::RgbImage::new(width, height);
        for (i, px) in img.pixels_mut().enumerate() {
            *px = image::Rgb(pixels[i]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_solid_color_texture() {
        let tex = Texture::solid_color(Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(tex.width, 1);
        assert_eq!(tex.height, 1);

        let sample = tex.sample(0.5, 0.5);
        assert!((sample - Vec3::new(1.0, 0.5, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_sample_corners() {
        // 2x2: top row red/green, bottom row blue/white
        let tex = Texture::new(
            2,
            2,
            vec![Vec3::X, Vec3::Y, Vec3::Z, Vec3::ONE],
            "<test>",
        );
        assert!((tex.sample(0.0, 0.0) - Vec3::X).length() < 1e-5);
        assert!((tex.sample(1.0, 0.0) - Vec3::Y).length() < 1e-5);
        assert!((tex.sample(0.0, 1.0) - Vec3::Z).length() < 1e-5);
        assert!((tex.sample(1.0, 1.0) - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn test_cache_loads_once() {
        let path = write_png("cache", &[[255, 0, 0], [0, 0, 255]], 2, 1);
        let key = path.to_string_lossy().to_string();

        let mut cache = TextureCache::new();
        assert!(cache.is_empty());

        let a = cache.load(&key).unwrap();
        let b = cache.load(&key).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert!(cache.is_cached(&key));
        assert_eq!((a.width, a.height), (2, 1));
        assert!((a.pixels[0] - Vec3::X).length() < 1e-6);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut cache = TextureCache::with_base_dir(std::env::temp_dir());
        let err = cache.load("mrr_definitely_missing_texture.png").unwrap_err();
        assert!(matches!(err, TextureError::Load { .. }));
        assert!(cache.is_empty());
    }
}
