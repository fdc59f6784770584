//! Tile partitioning for parallel rendering.
//!
//! Divides the image into a grid of tiles that are rendered independently
//! and merged by the scheduler.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::camera::{Camera, SampleJitter};
use crate::error::RenderResult;
use crate::material::Color;
use crate::renderer::{render_pixel, Tracer};

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X coordinate of the tile's top-left corner
    pub x: u32,
    /// Y coordinate of the tile's top-left corner
    pub y: u32,
    /// Width of the tile in pixels
    pub width: u32,
    /// Height of the tile in pixels
    pub height: u32,
    /// Index of this tile in the dispatch order
    pub index: usize,
}

impl Tile {
    /// Create a new tile.
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Get the total number of pixels in this tile.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Tiles per image side for a pool of `workers`: ceil(sqrt(4 * workers)).
///
/// Four tiles per worker keeps the pool busy when tile costs differ.
pub fn grid_side_for(workers: usize) -> u32 {
    let target = 4 * workers.max(1);
    let mut side = (target as f64).sqrt() as u32;
    while (side as usize) * (side as usize) < target {
        side += 1;
    }
    side
}

/// Split `[0, extent)` into `parts` contiguous spans of near-equal size.
fn spans(extent: u32, parts: u32) -> impl Iterator<Item = (u32, u32)> {
    let parts = parts.clamp(1, extent.max(1));
    (0..parts).map(move |i| {
        let start = (extent as u64 * i as u64 / parts as u64) as u32;
        let end = (extent as u64 * (i as u64 + 1) / parts as u64) as u32;
        (start, end - start)
    })
}

/// Generate a `grid_side`×`grid_side` grid of tiles, sorted in spiral order
/// from the centre.
///
/// The grid is clamped to the image size so no tile is empty. Together the
/// tiles cover every pixel exactly once.
pub fn generate_tiles(width: u32, height: u32, grid_side: u32) -> Vec<Tile> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut tiles = Vec::new();
    for (y, tile_height) in spans(height, grid_side) {
        for (x, tile_width) in spans(width, grid_side) {
            tiles.push(Tile::new(x, y, tile_width, tile_height, tiles.len()));
        }
    }

    // Sort by distance from center (spiral order)
    sort_spiral(&mut tiles, width, height);

    // Update indices after sorting
    for (i, tile) in tiles.iter_mut().enumerate() {
        tile.index = i;
    }

    tiles
}

/// Sort tiles by distance from image center, so the middle of the image
/// fills in first.
fn sort_spiral(tiles: &mut [Tile], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let distance = |t: &Tile| {
        let dx = t.x as f32 + t.width as f32 / 2.0 - center_x;
        let dy = t.y as f32 + t.height as f32 / 2.0 - center_y;
        dx * dx + dy * dy
    };

    // Stable, so equally distant tiles keep row-major order
    tiles.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Rendered pixels of one tile.
#[derive(Debug, Clone)]
pub struct TileResult {
    /// The tile that was rendered
    pub tile: Tile,
    /// Pixel colors in row-major order
    pub pixels: Vec<Color>,
}

impl TileResult {
    /// Create a new tile result.
    pub fn new(tile: Tile, pixels: Vec<Color>) -> Self {
        Self { tile, pixels }
    }
}

/// RNG seed for a tile: the same tile always gets the same samples.
fn tile_seed(tile: &Tile, jitter: SampleJitter) -> u64 {
    let base = match jitter {
        SampleJitter::Centered => 0,
        SampleJitter::Stratified { seed } => seed,
    };
    base ^ ((tile.y as u64) << 32 | tile.x as u64)
}

/// Render every pixel of a tile.
///
/// Returns pixels in row-major order within the tile.
pub fn render_tile(tile: &Tile, camera: &Camera, tracer: &Tracer<'_>) -> RenderResult<TileResult> {
    let mut rng = StdRng::seed_from_u64(tile_seed(tile, camera.jitter));
    let mut pixels = Vec::with_capacity(tile.pixel_count());

    for local_y in 0..tile.height {
        for local_x in 0..tile.width {
            let global_x = tile.x + local_x;
            let global_y = tile.y + local_y;
            pixels.push(render_pixel(camera, tracer, global_x, global_y, &mut rng)?);
        }
    }

    Ok(TileResult::new(*tile, pixels))
}
