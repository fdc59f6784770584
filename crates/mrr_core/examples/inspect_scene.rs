//! Example: Load and inspect a scene description.
//!
//! Run with: cargo run --example inspect_scene -- scenes/spheres.json

use std::env;

use mrr_core::{SceneDesc, Shape};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: inspect_scene <path-to-scene-json>");
        println!("\nExample:");
        println!("  cargo run --example inspect_scene -- scenes/spheres.json");
        return;
    }

    let path = &args[1];
    println!("Loading scene description: {}", path);

    let scene = match SceneDesc::load(path).and_then(SceneDesc::into_scene) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Failed to load scene: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n=== Scene: {} ===", scene.name);
    println!("Objects: {}", scene.object_count());
    println!("Triangles: {}", scene.total_triangle_count());
    println!("Light at {:?}", scene.light.position);

    for object in &scene.objects {
        let geometry = match &object.shape {
            Shape::Sphere { center, radius } => format!("sphere r={} c={:?}", radius, center),
            Shape::Mesh(mesh) => format!(
                "mesh {} verts / {} tris{}",
                mesh.vertex_count(),
                mesh.triangle_count(),
                if mesh.has_uvs() { " (uv)" } else { "" }
            ),
        };
        println!(
            "  [{}] {:<16} {:<32} t={:?} r={:?} s={:?}{}",
            object.id,
            object.name,
            geometry,
            object.transform.translation,
            object.transform.rotation,
            object.transform.scale,
            object
                .material
                .texture
                .as_deref()
                .map(|t| format!(" tex={}", t))
                .unwrap_or_default()
        );
    }
}
