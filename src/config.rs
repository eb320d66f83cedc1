use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use url::Url;

use crate::{
    foundation::core::{CameraPose, Resolution},
    foundation::error::{AnimcapError, AnimcapResult},
    tracks::bones::default_bones,
};

/// Which rendering surface workers drive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Headless Chromium pointed at the viewer application.
    #[default]
    Chrome,
    /// In-process synthetic frames carrying a frame-index marker. No browser required.
    Synthetic,
}

/// Immutable configuration for one pipeline run.
///
/// Loaded from an optional JSON file (every field has a default), then adjusted by CLI flags
/// before being handed to each component. Workers receive the resolved copy on disk so every
/// process sees the same values.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Dataset root containing the tracks directory.
    pub dataset_root: PathBuf,
    /// Tracks directory name under `dataset_root`.
    pub tracks_dir: String,
    /// Output directory for video artifacts.
    pub videos_root: PathBuf,
    /// Base URL of the viewer application.
    pub render_base_url: String,
    /// Model asset path segment requested from the viewer.
    pub model_asset: String,
    /// Camera pose used for every frame of the run.
    pub camera: CameraPose,
    /// Viewport, capture and video resolution.
    pub viewport: Resolution,
    /// Output frame rate (frames per second).
    pub fps: u32,
    /// Output container extension (without the dot).
    pub video_ext: String,
    /// JPEG screenshot quality in `1..=100`.
    pub jpeg_quality: u32,
    /// CSS selector of the readiness indicator.
    pub ready_selector: String,
    /// Upper bound on the readiness wait for a single frame, in milliseconds.
    pub ready_timeout_ms: u64,
    /// How long the browser connection may sit without traffic before it is considered dead, in
    /// milliseconds. Must outlast the encode that runs between two animations of a worker.
    pub browser_idle_timeout_ms: u64,
    /// Worker process count. `None` uses the available CPU parallelism.
    pub workers: Option<usize>,
    /// Only consider the first `limit` animations (sorted by name).
    pub limit: Option<usize>,
    /// Bones considered when deriving frame counts.
    pub bones: Vec<String>,
    /// Rendering surface driven by workers.
    pub surface: SurfaceKind,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_root: PathBuf::from("dataset"),
            tracks_dir: "anim-json-euler".to_string(),
            videos_root: PathBuf::from("videos"),
            render_base_url: "http://localhost:5173".to_string(),
            model_asset: "dors.glb".to_string(),
            camera: CameraPose::default(),
            viewport: Resolution::default(),
            fps: 60,
            video_ext: "mp4".to_string(),
            jpeg_quality: 100,
            ready_selector: "#done".to_string(),
            ready_timeout_ms: 30_000,
            browser_idle_timeout_ms: 600_000,
            workers: None,
            limit: None,
            bones: default_bones(),
            surface: SurfaceKind::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON configuration file. Missing fields fall back to defaults.
    pub fn from_path(path: &Path) -> AnimcapResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| AnimcapError::validation(format!("parse config '{}': {e}", path.display())))?;
        Ok(cfg)
    }

    /// Write the resolved configuration as pretty JSON.
    pub fn write_to(&self, path: &Path) -> AnimcapResult<()> {
        let f = File::create(path).with_context(|| format!("create config '{}'", path.display()))?;
        serde_json::to_writer_pretty(f, self)
            .with_context(|| format!("write config '{}'", path.display()))?;
        Ok(())
    }

    /// Check values that would otherwise fail deep inside a worker.
    pub fn validate(&self) -> AnimcapResult<()> {
        Resolution::new(self.viewport.width, self.viewport.height)?;
        if self.fps == 0 {
            return Err(AnimcapError::validation("fps must be non-zero"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AnimcapError::validation(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.ready_timeout_ms == 0 {
            return Err(AnimcapError::validation("ready_timeout_ms must be non-zero"));
        }
        if self.browser_idle_timeout_ms < self.ready_timeout_ms {
            return Err(AnimcapError::validation(format!(
                "browser_idle_timeout_ms ({}) must be at least ready_timeout_ms ({})",
                self.browser_idle_timeout_ms, self.ready_timeout_ms
            )));
        }
        if self.workers == Some(0) {
            return Err(AnimcapError::validation("workers must be at least 1"));
        }
        if self.bones.is_empty() {
            return Err(AnimcapError::validation("bone set must not be empty"));
        }
        if self.video_ext.is_empty() || self.video_ext.contains(['.', '/', '\\']) {
            return Err(AnimcapError::validation(format!(
                "video_ext '{}' must be a bare extension",
                self.video_ext
            )));
        }
        if self.ready_selector.trim().is_empty() {
            return Err(AnimcapError::validation("ready_selector must not be empty"));
        }
        self.render_base()?;
        Ok(())
    }

    /// Parsed viewer base URL.
    pub fn render_base(&self) -> AnimcapResult<Url> {
        let url = Url::parse(&self.render_base_url).map_err(|e| {
            AnimcapError::validation(format!(
                "invalid render_base_url '{}': {e}",
                self.render_base_url
            ))
        })?;
        if url.cannot_be_a_base() {
            return Err(AnimcapError::validation(format!(
                "render_base_url '{}' cannot carry path segments",
                self.render_base_url
            )));
        }
        Ok(url)
    }

    /// Directory holding one `<name>.json` track file per animation.
    pub fn tracks_path(&self) -> PathBuf {
        self.dataset_root.join(&self.tracks_dir)
    }

    /// Track file for `name`.
    pub fn track_file(&self, name: &str) -> PathBuf {
        self.tracks_path().join(format!("{name}.json"))
    }

    /// Deterministic artifact path `<videos_root>/<name>-<elevation>-<azimuth>.<ext>`.
    pub fn artifact_path(&self, name: &str, pose: CameraPose) -> PathBuf {
        self.videos_root.join(format!(
            "{name}-{}-{}.{}",
            pose.elevation, pose.azimuth, self.video_ext
        ))
    }

    /// Scratch directory for worker manifests and reports.
    pub fn work_dir(&self) -> PathBuf {
        self.videos_root.join(".animcap")
    }

    /// Readiness wait bound.
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Idle bound for the browser connection.
    pub fn browser_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.browser_idle_timeout_ms)
    }

    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(crate::partition::default_worker_count)
            .max(1)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
