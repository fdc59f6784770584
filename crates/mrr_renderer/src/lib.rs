//! MiniRayRender renderer - CPU ray tracing
//!
//! A Whitted-style ray tracer: Blinn-Phong shading with hard shadows and
//! mirror reflection, brute-force intersection against spheres and
//! triangle meshes, and a tile scheduler that spreads the image over a
//! worker pool.

mod camera;
mod error;
mod hittable;
mod material;
mod renderer;
mod scheduler;
mod sphere;
mod tile;
mod triangle;

pub use camera::{Camera, SampleJitter};
pub use error::{RenderError, RenderResult};
pub use hittable::{Hit, Primitive, World, HIT_EPSILON};
pub use material::{Color, SurfaceMaterial};
pub use renderer::{color_to_rgb, render_pixel, ImageBuffer, TraceSettings, Tracer};
pub use scheduler::{render, render_image, RenderEvent, RenderSettings, SceneSnapshot};
pub use sphere::Sphere;
pub use tile::{generate_tiles, grid_side_for, render_tile, Tile, TileResult};
pub use triangle::{intersect_triangle, TriangleMesh};

/// Re-export common math types from mrr_math
pub use mrr_math::{Ray, Vec3};
