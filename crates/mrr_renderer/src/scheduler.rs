//! Parallel tile scheduler.
//!
//! The image is split into tiles that a fixed-size worker pool renders
//! against one immutable scene snapshot. Finished tiles come back over a
//! channel and are merged by the calling thread, which is the only writer
//! of the final image.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::unbounded;
use log::{debug, error, info};
use mrr_core::{Light, SceneObject, TextureCache};
use mrr_math::ViewState;
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, SampleJitter};
use crate::error::{RenderError, RenderResult};
use crate::hittable::World;
use crate::material::Color;
use crate::renderer::{ImageBuffer, TraceSettings, Tracer};
use crate::tile::{generate_tiles, grid_side_for, render_tile, Tile, TileResult};

/// Everything about a render that is not the scene itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub max_depth: u32,
    /// N for an N×N sub-pixel grid
    pub samples_per_axis: u32,
    pub strength_cutoff: f32,
    pub shading_bias: f32,
    pub background: Color,
    pub jitter: SampleJitter,
    /// Worker threads; defaults to the number of cores
    pub workers: Option<usize>,
    /// Tiles per image side; defaults to ceil(sqrt(4 * workers))
    pub tile_grid: Option<u32>,
    /// Attach the partially merged image to progress events
    pub emit_partial_images: bool,
    /// Directory relative texture paths are resolved against
    pub texture_dir: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        let trace = TraceSettings::default();
        Self {
            width: 640,
            height: 480,
            max_depth: trace.max_depth,
            samples_per_axis: 2,
            strength_cutoff: trace.strength_cutoff,
            shading_bias: trace.shading_bias,
            background: trace.background,
            jitter: SampleJitter::default(),
            workers: None,
            tile_grid: None,
            emit_partial_images: false,
            texture_dir: None,
        }
    }
}

impl RenderSettings {
    /// Create settings for a `width`×`height` image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Builder: set the recursion depth and sub-pixel grid.
    pub fn with_quality(mut self, max_depth: u32, samples_per_axis: u32) -> Self {
        self.max_depth = max_depth;
        self.samples_per_axis = samples_per_axis;
        self
    }

    /// Builder: set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Reject settings that cannot produce an image.
    pub fn validate(&self) -> RenderResult<()> {
        let invalid = |reason: String| Err(RenderError::InvalidConfig(reason));

        if self.width == 0 || self.height == 0 {
            return invalid(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            ));
        }
        if self.samples_per_axis == 0 {
            return invalid("samples_per_axis must be at least 1".to_string());
        }
        if self.workers == Some(0) {
            return invalid("worker pool must have at least one worker".to_string());
        }
        if self.tile_grid == Some(0) {
            return invalid("tile grid must be at least 1x1".to_string());
        }
        if !(self.strength_cutoff.is_finite() && self.strength_cutoff >= 0.0) {
            return invalid(format!("invalid strength cutoff {}", self.strength_cutoff));
        }
        if !(self.shading_bias.is_finite() && self.shading_bias >= 0.0) {
            return invalid(format!("invalid shading bias {}", self.shading_bias));
        }
        Ok(())
    }

    /// Number of worker threads to start.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(rayon::current_num_threads).max(1)
    }

    /// Tiles per image side.
    pub fn grid_side(&self) -> u32 {
        self.tile_grid
            .unwrap_or_else(|| grid_side_for(self.worker_count()))
    }

    pub fn trace_settings(&self) -> TraceSettings {
        TraceSettings {
            max_depth: self.max_depth,
            strength_cutoff: self.strength_cutoff,
            shading_bias: self.shading_bias,
            background: self.background,
        }
    }
}

/// Read-only state shared by all workers of one render.
#[derive(Debug)]
pub struct SceneSnapshot {
    pub world: World,
    pub light: Light,
    pub camera: Camera,
    pub trace: TraceSettings,
}

impl SceneSnapshot {
    /// Resolve objects, textures and camera for one render.
    pub fn build(
        objects: &[SceneObject],
        view: &ViewState,
        light: &Light,
        settings: &RenderSettings,
    ) -> RenderResult<Self> {
        let mut textures = match &settings.texture_dir {
            Some(dir) => TextureCache::with_base_dir(dir),
            None => TextureCache::new(),
        };
        let world = World::from_objects(objects, &mut textures)?;
        let camera = Camera::new(view, settings.width, settings.height)?
            .with_samples(settings.samples_per_axis, settings.jitter);

        debug!(
            "Scene snapshot: {} primitives, {} textures",
            world.len(),
            textures.len()
        );

        Ok(Self {
            world,
            light: *light,
            camera,
            trace: settings.trace_settings(),
        })
    }

    pub fn tracer(&self) -> Tracer<'_> {
        Tracer::new(&self.world, &self.light, self.camera.eye(), &self.trace)
    }

    pub fn render_tile(&self, tile: &Tile) -> RenderResult<TileResult> {
        render_tile(tile, &self.camera, &self.tracer())
    }
}

/// Notification from a running render.
#[derive(Debug)]
pub enum RenderEvent<'a> {
    /// Sent once per merged tile.
    Progress {
        /// completed / total, in [0, 100]
        percent: f32,
        completed: usize,
        total: usize,
        /// The image so far, if partial images were requested
        image: Option<&'a ImageBuffer>,
    },
    /// Sent once, after the image has been written.
    Completed { path: &'a Path },
}

enum TileOutcome {
    Done(TileResult),
    Failed(Tile, RenderError),
    Panicked(Tile, String),
    Skipped,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Render `objects` and write the image to `output`.
///
/// Progress events are sent per tile; the completion event follows the
/// write. On error nothing is written.
pub fn render(
    objects: &[SceneObject],
    view: &ViewState,
    light: &Light,
    settings: &RenderSettings,
    output: impl AsRef<Path>,
    mut on_event: impl FnMut(RenderEvent<'_>),
) -> RenderResult<ImageBuffer> {
    let output = output.as_ref();
    let image = render_image(objects, view, light, settings, &mut on_event)?;

    image.save(output)?;
    info!("Wrote {}", output.display());
    on_event(RenderEvent::Completed { path: output });

    Ok(image)
}

/// Render `objects` to an in-memory image.
pub fn render_image(
    objects: &[SceneObject],
    view: &ViewState,
    light: &Light,
    settings: &RenderSettings,
    on_event: impl FnMut(RenderEvent<'_>),
) -> RenderResult<ImageBuffer> {
    settings.validate()?;
    let start = Instant::now();

    let snapshot = Arc::new(SceneSnapshot::build(objects, view, light, settings)?);
    let workers = settings.worker_count();
    let tiles = generate_tiles(settings.width, settings.height, settings.grid_side());

    info!(
        "Rendering {}x{} ({} spp, depth {}) with {} workers, {} tiles",
        settings.width,
        settings.height,
        snapshot.camera.samples_per_pixel(),
        settings.max_depth,
        workers,
        tiles.len()
    );

    let image = run_tiles(
        &tiles,
        settings.width,
        settings.height,
        workers,
        settings.emit_partial_images,
        move |tile| snapshot.render_tile(tile),
        on_event,
    )?;

    info!("Render finished in {:.2}s", start.elapsed().as_secs_f32());
    Ok(image)
}

/// Dispatch `tiles` to a pool of `workers` and merge the results.
///
/// The first failing tile cancels the tiles not yet started and becomes the
/// error of the whole render.
fn run_tiles<F>(
    tiles: &[Tile],
    width: u32,
    height: u32,
    workers: usize,
    emit_partial_images: bool,
    render_fn: F,
    mut on_event: impl FnMut(RenderEvent<'_>),
) -> RenderResult<ImageBuffer>
where
    F: Fn(&Tile) -> RenderResult<TileResult> + Send + Sync + 'static,
{
    if tiles.is_empty() {
        return Err(RenderError::InvalidConfig("no tiles to render".to_string()));
    }
    if workers == 0 {
        return Err(RenderError::InvalidConfig(
            "worker pool must have at least one worker".to_string(),
        ));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("mrr-worker-{}", i))
        .build()?;

    let render_fn = Arc::new(render_fn);
    let cancel = Arc::new(AtomicBool::new(false));
    let (sender, receiver) = unbounded();

    for &tile in tiles {
        let sender = sender.clone();
        let render_fn = Arc::clone(&render_fn);
        let cancel = Arc::clone(&cancel);

        pool.spawn(move || {
            let outcome = if cancel.load(Ordering::Relaxed) {
                TileOutcome::Skipped
            } else {
                match panic::catch_unwind(AssertUnwindSafe(|| (*render_fn)(&tile))) {
                    Ok(Ok(result)) => TileOutcome::Done(result),
                    Ok(Err(err)) => TileOutcome::Failed(tile, err),
                    Err(payload) => TileOutcome::Panicked(tile, panic_message(payload)),
                }
            };
            // The receiver outlives every worker
            let _ = sender.send(outcome);
        });
    }
    drop(sender);

    let total = tiles.len();
    let mut completed = 0;
    let mut failure: Option<RenderError> = None;
    let mut image = ImageBuffer::new(width, height);

    // Ends once every spawned job has dropped its sender
    for outcome in receiver.iter() {
        match outcome {
            TileOutcome::Done(result) => {
                if failure.is_some() {
                    continue;
                }
                let tile = result.tile;
                image.blit(tile.x, tile.y, tile.width, tile.height, &result.pixels);
                completed += 1;

                let percent = 100.0 * completed as f32 / total as f32;
                info!("Progress: {:.1}% ({}/{} tiles)", percent, completed, total);
                on_event(RenderEvent::Progress {
                    percent,
                    completed,
                    total,
                    image: emit_partial_images.then_some(&image),
                });
            }
            TileOutcome::Failed(tile, err) => {
                error!("Tile at ({}, {}) failed: {}", tile.x, tile.y, err);
                cancel.store(true, Ordering::Relaxed);
                if failure.is_none() {
                    failure = Some(RenderError::TileFailed {
                        x: tile.x,
                        y: tile.y,
                        source: Box::new(err),
                    });
                }
            }
            TileOutcome::Panicked(tile, message) => {
                error!("Worker panicked on tile at ({}, {}): {}", tile.x, tile.y, message);
                cancel.store(true, Ordering::Relaxed);
                if failure.is_none() {
                    failure = Some(RenderError::WorkerPanicked {
                        x: tile.x,
                        y: tile.y,
                        message,
                    });
                }
            }
            TileOutcome::Skipped => {}
        }
    }

    if let Some(err) = failure {
        return Err(err);
    }
    if completed != total {
        return Err(RenderError::WorkersLost {
            missing: total - completed,
        });
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrr_core::{Material, Shape};
    use mrr_math::{Transform, Vec3};

    fn matte(color: Vec3) -> Material {
        Material::new(color).with_reflectivity(0.0)
    }

    fn unit_sphere_scene() -> (Vec<SceneObject>, ViewState, Light) {
        let objects = vec![SceneObject::new(0, "ball", Shape::unit_sphere())
            .with_material(matte(Vec3::new(1.0, 0.2, 0.2)))];
        let view = ViewState::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO).with_fov(45.0);
        let light = Light::new(Vec3::new(5.0, 5.0, 5.0), Vec3::ONE);
        (objects, view, light)
    }

    fn small_settings() -> RenderSettings {
        RenderSettings {
            width: 4,
            height: 4,
            max_depth: 1,
            samples_per_axis: 1,
            workers: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_unit_sphere_4x4() {
        let (objects, view, light) = unit_sphere_scene();
        let image = render_image(&objects, &view, &light, &small_settings(), |_| {}).unwrap();

        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            assert!(image.get(x, y).length() > 0.0, "pixel ({}, {}) is black", x, y);
        }
        for (x, y) in [(0, 0), (3, 0), (0, 3), (3, 3)] {
            assert_eq!(image.get(x, y), Vec3::ZERO, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_occluded_sphere_does_not_blend() {
        let (front_only, view, light) = unit_sphere_scene();
        let mut both = front_only.clone();
        both.push(
            SceneObject::new(1, "hidden", Shape::unit_sphere())
                .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, -3.0)))
                .with_material(matte(Vec3::new(0.0, 0.0, 1.0))),
        );
        let settings = small_settings();

        let a = render_image(&front_only, &view, &light, &settings, |_| {}).unwrap();
        let b = render_image(&both, &view, &light, &settings, |_| {}).unwrap();
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            assert_eq!(a.get(x, y), b.get(x, y));
        }
    }

    #[test]
    fn test_worker_count_does_not_change_image() {
        let (objects, view, light) = unit_sphere_scene();
        let mut settings = RenderSettings::new(24, 16).with_quality(3, 2);
        settings.jitter = SampleJitter::Stratified { seed: 11 };
        // Tile seeds follow the tile layout, so pin it
        settings.tile_grid = Some(3);

        let one = render_image(&objects, &view, &light, &settings.clone().with_workers(1), |_| {})
            .unwrap();
        let four = render_image(&objects, &view, &light, &settings.with_workers(4), |_| {})
            .unwrap();
        assert_eq!(one, four);
    }

    #[test]
    fn test_progress_per_tile() {
        let (objects, view, light) = unit_sphere_scene();
        let settings = RenderSettings {
            width: 10,
            height: 10,
            tile_grid: Some(3),
            emit_partial_images: true,
            ..small_settings()
        };

        let mut percents = Vec::new();
        let mut saw_image = true;
        render_image(&objects, &view, &light, &settings, |event| {
            if let RenderEvent::Progress { percent, total, image, .. } = event {
                assert_eq!(total, 9);
                saw_image &= image.is_some();
                percents.push(percent);
            }
        })
        .unwrap();

        assert_eq!(percents.len(), 9);
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert!((percents[8] - 100.0).abs() < 1e-4);
        assert!(saw_image);
    }

    #[test]
    fn test_invalid_settings_fail_fast() {
        let (objects, view, light) = unit_sphere_scene();
        let cases = [
            RenderSettings { width: 0, ..small_settings() },
            RenderSettings { height: 0, ..small_settings() },
            RenderSettings { workers: Some(0), ..small_settings() },
            RenderSettings { tile_grid: Some(0), ..small_settings() },
            RenderSettings { samples_per_axis: 0, ..small_settings() },
        ];
        for settings in cases {
            let mut events = 0;
            let err = render_image(&objects, &view, &light, &settings, |_| events += 1).unwrap_err();
            assert!(matches!(err, RenderError::InvalidConfig(_)), "{:?}", settings);
            assert_eq!(events, 0);
        }
    }

    #[test]
    fn test_tile_error_fails_render() {
        let tiles = generate_tiles(8, 8, 2);
        let mut progress = 0;
        let err = run_tiles(
            &tiles,
            8,
            8,
            2,
            false,
            |tile| {
                if tile.x == 4 && tile.y == 0 {
                    Err(RenderError::UvOutOfRange {
                        object: "ball".into(),
                        u: 1.5,
                        v: 0.0,
                    })
                } else {
                    Ok(TileResult::new(*tile, vec![Vec3::ONE; tile.pixel_count()]))
                }
            },
            |_| progress += 1,
        )
        .unwrap_err();

        match err {
            RenderError::TileFailed { x, y, source } => {
                assert_eq!((x, y), (4, 0));
                assert!(matches!(*source, RenderError::UvOutOfRange { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(progress < tiles.len());
    }

    #[test]
    fn test_worker_panic_fails_render() {
        let tiles = generate_tiles(8, 8, 2);
        let err = run_tiles(
            &tiles,
            8,
            8,
            2,
            false,
            |tile| {
                if tile.x == 0 && tile.y == 4 {
                    panic!("boom");
                }
                Ok(TileResult::new(*tile, vec![Vec3::ONE; tile.pixel_count()]))
            },
            |_| {},
        )
        .unwrap_err();

        match err {
            RenderError::WorkerPanicked { x, y, message } => {
                assert_eq!((x, y), (0, 4));
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_writes_then_completes() {
        let (objects, view, light) = unit_sphere_scene();
        let path = std::env::temp_dir().join("mrr_scheduler_render_test.png");
        let _ = std::fs::remove_file(&path);

        let mut completed = 0;
        let image = render(&objects, &view, &light, &small_settings(), &path, |event| {
            if let RenderEvent::Completed { path } = event {
                assert!(path.exists());
                completed += 1;
            }
        })
        .unwrap();

        assert_eq!(completed, 1);
        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (image.width, image.height));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_settings_from_json_defaults() {
        let settings: RenderSettings =
            serde_json::from_str(r#"{ "width": 320, "jitter": { "mode": "stratified", "seed": 5 } }"#)
                .unwrap();
        assert_eq!(settings.width, 320);
        assert_eq!(settings.height, 480);
        assert_eq!(settings.max_depth, 4);
        assert_eq!(settings.samples_per_axis, 2);
        assert_eq!(settings.jitter, SampleJitter::Stratified { seed: 5 });
        assert!(settings.validate().is_ok());
    }
}
