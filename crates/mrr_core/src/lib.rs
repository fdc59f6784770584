//! MRR Core - scene description for the offline ray tracer.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `SceneObject`, `Shape`, `Material`, `Light`
//! - **Geometry**: `Mesh` with cuboid / plane / UV-sphere generators
//! - **Textures**: image loading and a per-render `TextureCache`
//! - **Scene descriptions**: JSON documents handed over by the editor
//!
//! # Example
//!
//! ```ignore
//! use mrr_core::SceneDesc;
//!
//! let scene = SceneDesc::load("scenes/spheres.json")?.into_scene()?;
//! println!("Loaded {} objects, {} triangles",
//!     scene.object_count(),
//!     scene.total_triangle_count());
//! ```

pub mod job;
pub mod mesh;
pub mod scene;
pub mod texture;

use thiserror::Error;

// Re-export commonly used types
pub use job::{ObjectDesc, SceneDesc, ShapeDesc};
pub use mesh::Mesh;
pub use scene::{Light, Material, Scene, SceneObject, Shape};
pub use texture::{Texture, TextureCache, TextureError};

/// Errors raised while building or validating a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Invalid mesh '{name}': {reason}")]
    InvalidMesh { name: String, reason: String },

    #[error("Invalid object '{name}': {reason}")]
    InvalidObject { name: String, reason: String },

    #[error("Scene description parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SceneResult<T> = Result<T, SceneError>;
