//! Simple ray tracer example.
//!
//! Renders three spheres on a floor and saves to PNG.

use mrr_core::{Light, Material, Mesh, Scene, Shape};
use mrr_math::{Transform, ViewState};
use mrr_renderer::{render, RenderEvent, RenderSettings, Vec3};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scene = build_scene();
    let view = ViewState::new(Vec3::new(0.0, 2.0, 8.0), Vec3::new(0.0, 0.5, 0.0)).with_fov(45.0);
    let settings = RenderSettings::new(400, 300).with_quality(4, 2);

    let filename = "simple_render.png";
    let image = render(&scene.objects, &view, &scene.light, &settings, filename, |event| {
        if let RenderEvent::Completed { path } = event {
            println!("Saved to {}", path.display());
        }
    })?;

    println!("Rendered {}x{}", image.width, image.height);
    Ok(())
}

fn build_scene() -> Scene {
    let mut scene = Scene::new("simple");
    scene.light = Light::new(Vec3::new(-3.0, 6.0, 4.0), Vec3::ONE);

    scene
        .add_object("floor", Shape::mesh(Mesh::plane(20.0)))
        .material = Material::new(Vec3::splat(0.8)).with_reflectivity(0.3);

    let spheres = [
        (Vec3::new(-2.2, 1.0, 0.0), Vec3::new(0.9, 0.2, 0.2)),
        (Vec3::new(0.0, 1.0, -1.0), Vec3::new(0.2, 0.9, 0.2)),
        (Vec3::new(2.2, 1.0, 0.0), Vec3::new(0.2, 0.3, 0.9)),
    ];
    for (i, (position, color)) in spheres.into_iter().enumerate() {
        let object = scene.add_object(format!("sphere_{}", i), Shape::unit_sphere());
        object.transform = Transform::from_translation(position);
        object.material = Material::new(color).with_reflectivity(0.2);
    }

    scene
}
