//! `mrr`: render a JSON job file to an image.

mod job;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use mrr_renderer::{render, RenderEvent};

use crate::job::RenderJob;

/// Ray trace a scene description and write the image.
#[derive(Parser, Debug)]
#[command(name = "mrr", version, about)]
struct Cli {
    /// Render job (JSON)
    #[arg(value_name = "JOB")]
    job: PathBuf,

    /// Output image; the format follows the extension
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Worker threads (defaults to the number of cores)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Samples per pixel along each axis
    #[arg(short, long)]
    samples: Option<u32>,

    /// Maximum reflection depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command-line values win over the job file.
    fn apply(&self, job: &mut RenderJob) {
        let settings = &mut job.settings;
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(workers) = self.workers {
            settings.workers = Some(workers);
        }
        if let Some(samples) = self.samples {
            settings.samples_per_axis = samples;
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
        if let Some(output) = &self.output {
            job.output = Some(output.clone());
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut job = RenderJob::load(&cli.job)?;
    cli.apply(&mut job);

    let output = job
        .output
        .clone()
        .unwrap_or_else(|| cli.job.with_extension("png"));
    let scene = job
        .scene
        .into_scene()
        .with_context(|| format!("Invalid scene in {}", cli.job.display()))?;

    info!(
        "Loaded scene '{}': {} objects, {} triangles",
        scene.name,
        scene.object_count(),
        scene.total_triangle_count()
    );

    render(
        &scene.objects,
        &job.camera,
        &scene.light,
        &job.settings,
        &output,
        |event| {
            if let RenderEvent::Completed { path } = event {
                println!("{}", path.display());
            }
        },
    )
    .with_context(|| format!("Failed to render {}", cli.job.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win() {
        let cli = Cli::try_parse_from([
            "mrr", "scene.json", "--width", "32", "-s", "3", "-j", "2", "-o", "out.png",
        ])
        .unwrap();
        let mut job = RenderJob::from_json(r#"{ "settings": { "width": 640, "height": 20 } }"#).unwrap();
        cli.apply(&mut job);

        assert_eq!(job.settings.width, 32);
        assert_eq!(job.settings.height, 20);
        assert_eq!(job.settings.samples_per_axis, 3);
        assert_eq!(job.settings.workers, Some(2));
        assert_eq!(job.output, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn test_job_is_required() {
        assert!(Cli::try_parse_from(["mrr"]).is_err());
    }
}
