//! Camera for ray generation.
//!
//! Only the eye and the inverse projection·view matrix are kept from the
//! view state. Each sample position is mapped to normalized device
//! coordinates and unprojected back into the world.

use mrr_math::{Mat4, Ray, Vec2, Vec3, ViewState};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Placement of samples inside their sub-pixel grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SampleJitter {
    /// Every sample sits at the centre of its cell.
    #[default]
    Centered,
    /// Uniformly random inside the cell. Tiles derive their RNG from `seed`.
    Stratified { seed: u64 },
}

/// Camera for generating primary rays.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    inverse_view_projection: Mat4,
    pub image_width: u32,
    pub image_height: u32,
    /// Samples per pixel along each axis (N for an N×N grid)
    pub samples_per_axis: u32,
    pub jitter: SampleJitter,
}

impl Camera {
    /// Create a camera for a `width`×`height` image, one sample per pixel.
    pub fn new(view: &ViewState, width: u32, height: u32) -> RenderResult<Self> {
        view.validate().map_err(RenderError::InvalidConfig)?;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "image size must be non-zero, got {}x{}",
                width, height
            )));
        }

        let aspect = width as f32 / height as f32;
        let inverse_view_projection = view.inverse_view_projection(aspect);
        if !inverse_view_projection.is_finite() {
            return Err(RenderError::InvalidConfig(
                "view projection is not invertible".to_string(),
            ));
        }

        Ok(Self {
            eye: view.eye,
            inverse_view_projection,
            image_width: width,
            image_height: height,
            samples_per_axis: 1,
            jitter: SampleJitter::Centered,
        })
    }

    /// Builder: set the sub-pixel grid and sample placement.
    pub fn with_samples(mut self, samples_per_axis: u32, jitter: SampleJitter) -> Self {
        self.samples_per_axis = samples_per_axis.max(1);
        self.jitter = jitter;
        self
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_axis * self.samples_per_axis
    }

    /// Normalized device coordinates of an image-space position.
    ///
    /// `(0, 0)` is the top-left corner of the image and maps to `(-1, 1)`.
    pub fn to_ndc(&self, px: f32, py: f32) -> Vec2 {
        Vec2::new(
            2.0 * px / self.image_width as f32 - 1.0,
            1.0 - 2.0 * py / self.image_height as f32,
        )
    }

    /// Generate the ray for sample `(sx, sy)` of pixel `(x, y)`.
    pub fn get_ray(&self, x: u32, y: u32, sx: u32, sy: u32, rng: &mut dyn RngCore) -> Ray {
        let n = self.samples_per_axis as f32;
        let (ox, oy) = match self.jitter {
            SampleJitter::Centered => (0.5, 0.5),
            SampleJitter::Stratified { .. } => (rng.gen::<f32>(), rng.gen::<f32>()),
        };

        let px = x as f32 + (sx as f32 + ox) / n;
        let py = y as f32 + (sy as f32 + oy) / n;
        let ndc = self.to_ndc(px, py);

        // Unproject a point on the near plane
        let point = self
            .inverse_view_projection
            .project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        Ray::new(self.eye, (point - self.eye).normalize_or_zero())
    }
}
