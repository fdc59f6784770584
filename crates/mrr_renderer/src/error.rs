//! Render-level errors.

use mrr_core::{SceneError, TextureError};
use thiserror::Error;

/// Everything that can abort a render.
///
/// A render either completes or returns exactly one of these.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Texture for object '{object}': {source}")]
    Texture {
        object: String,
        #[source]
        source: TextureError,
    },

    /// The analytic sphere parameterization produced a coordinate outside
    /// the unit square. Distinct from a miss.
    #[error("UV ({u}, {v}) outside [0, 1] on sphere '{object}'")]
    UvOutOfRange { object: String, u: f32, v: f32 },

    /// The error source is the boxed cause; walk it with
    /// `downcast_ref::<Box<RenderError>>()` or use [`RenderError::tile_cause`].
    #[error("Tile at ({x}, {y}) failed: {source}")]
    TileFailed {
        x: u32,
        y: u32,
        #[source]
        source: Box<RenderError>,
    },

    #[error("Worker panicked on tile at ({x}, {y}): {message}")]
    WorkerPanicked { x: u32, y: u32, message: String },

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Workers stopped with {missing} tiles outstanding")]
    WorkersLost { missing: usize },

    #[error("Failed to write image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

impl RenderError {
    /// The error that stopped a failed tile.
    pub fn tile_cause(&self) -> Option<&RenderError> {
        match self {
            RenderError::TileFailed { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
