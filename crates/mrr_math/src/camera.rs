use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Camera placement and lens, as handed over by the scene editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 5.0, 10.0),
            center: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl ViewState {
    /// Create a view looking from `eye` at `center` with +Y up.
    pub fn new(eye: Vec3, center: Vec3) -> Self {
        Self {
            eye,
            center,
            ..Default::default()
        }
    }

    /// Builder: set the vertical field of view (degrees).
    pub fn with_fov(mut self, fov_y: f32) -> Self {
        self.fov_y = fov_y;
        self
    }

    /// Get the view matrix (world → camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    /// Get the projection matrix (camera → clip space)
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect, self.near, self.far)
    }

    /// Get the combined projection * view matrix
    pub fn view_projection_matrix(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Inverse of the projection * view matrix (clip space → world).
    pub fn inverse_view_projection(&self, aspect: f32) -> Mat4 {
        self.view_projection_matrix(aspect).inverse()
    }

    /// Check that the view can produce a finite, invertible projection.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.fov_y > 0.0 && self.fov_y < 180.0) {
            return Err(format!("field of view must be in (0, 180) degrees, got {}", self.fov_y));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            ));
        }
        let forward = self.center - self.eye;
        if forward.length_squared() <= f32::EPSILON {
            return Err("eye and center coincide".to_string());
        }
        if forward.cross(self.up).length_squared() <= f32::EPSILON {
            return Err("up vector is parallel to the viewing direction".to_string());
        }
        Ok(())
    }
}
