//! Render job files.
//!
//! A job is a scene description plus the camera, render settings and an
//! optional output path, all in one JSON document:
//!
//! ```json
//! {
//!   "name": "spheres",
//!   "camera": { "eye": [0, 2, 8], "center": [0, 0.5, 0], "fov_y": 45 },
//!   "settings": { "width": 800, "height": 600, "samples_per_axis": 3 },
//!   "light": { "position": [-3, 6, 4], "ambient": [0.1, 0.1, 0.1],
//!              "diffuse": [1, 1, 1], "specular": [0.5, 0.5, 0.5] },
//!   "objects": [ { "shape": { "kind": "sphere" } } ],
//!   "output": "spheres.png"
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mrr_core::SceneDesc;
use mrr_math::ViewState;
use mrr_renderer::RenderSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    #[serde(flatten)]
    pub scene: SceneDesc,
    #[serde(default)]
    pub camera: ViewState,
    #[serde(default)]
    pub settings: RenderSettings,
    /// Relative to the job file
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl RenderJob {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Malformed render job")
    }

    /// Read a job file. Relative texture and output paths are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?;
        let mut job = Self::from_json(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        if job.settings.texture_dir.is_none() {
            job.settings.texture_dir = Some(base.clone());
        }
        if let Some(output) = &job.output {
            if output.is_relative() {
                job.output = Some(base.join(output));
            }
        }
        Ok(job)
    }
}
