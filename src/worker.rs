//! Worker-side runtime: one partition, one surface provider, animations strictly in sequence.

use std::{
    fs::File,
    io::BufReader,
    path::Path,
    time::Instant,
};

use anyhow::Context as _;

use crate::{
    capture::{
        chrome::ChromeBrowser, driver::FrameCaptureDriver, surface::SurfaceProvider,
        synthetic::SyntheticBrowser,
    },
    config::{PipelineConfig, SurfaceKind},
    encode::{
        artifact::{EncodeOutcome, write_video},
        ffmpeg::{FfmpegSink, FfmpegSinkOpts},
        sink::{FrameSink, SinkConfig},
    },
    foundation::error::{AnimcapError, AnimcapResult},
    tracks::inspect::AnimationJob,
};

/// Builds the sink for one artifact path.
pub type SinkFactory<'a> = dyn FnMut(&Path) -> Box<dyn FrameSink> + 'a;

/// Sink factory used by real runs: one `ffmpeg` process per artifact.
pub fn ffmpeg_sink(target: &Path) -> Box<dyn FrameSink> {
    Box::new(FfmpegSink::new(FfmpegSinkOpts::new(target)))
}

/// Partition handed to a worker process.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkerManifest {
    /// 0-based worker index.
    pub worker: usize,
    /// Animations to process, in order.
    pub jobs: Vec<AnimationJob>,
}

impl WorkerManifest {
    /// Read a manifest written by [`WorkerManifest::write_to`].
    pub fn from_path(path: &Path) -> AnimcapResult<Self> {
        read_json(path, "worker manifest")
    }

    /// Write the manifest as JSON.
    pub fn write_to(&self, path: &Path) -> AnimcapResult<()> {
        write_json(path, self, "worker manifest")
    }
}

/// What happened to one animation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// A new video was written.
    Written {
        /// Frames encoded.
        frames: u64,
    },
    /// The artifact already existed.
    Skipped,
    /// Capture or encoding failed; the worker moved on.
    Failed {
        /// Rendered error.
        error: String,
    },
}

impl From<EncodeOutcome> for JobOutcome {
    fn from(outcome: EncodeOutcome) -> Self {
        match outcome {
            EncodeOutcome::Written { frames } => Self::Written { frames },
            EncodeOutcome::Skipped => Self::Skipped,
        }
    }
}

/// Outcome of one animation within a worker.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobReport {
    /// Animation identifier.
    pub name: String,
    /// Frames requested.
    pub frame_count: u64,
    /// Result.
    pub outcome: JobOutcome,
    /// Wall-clock time spent, in milliseconds.
    pub elapsed_ms: u64,
}

/// Everything a worker did, in partition order.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkerReport {
    /// 0-based worker index.
    pub worker: usize,
    /// One entry per assigned animation.
    pub jobs: Vec<JobReport>,
}

impl WorkerReport {
    /// Read a report written by [`WorkerReport::write_to`].
    pub fn from_path(path: &Path) -> AnimcapResult<Self> {
        read_json(path, "worker report")
    }

    /// Write the report as JSON.
    pub fn write_to(&self, path: &Path) -> AnimcapResult<()> {
        write_json(path, self, "worker report")
    }

    /// Jobs that failed.
    pub fn failures(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs
            .iter()
            .filter(|j| matches!(j.outcome, JobOutcome::Failed { .. }))
    }

    /// Number of newly written videos.
    pub fn written(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| matches!(j.outcome, JobOutcome::Written { .. }))
            .count()
    }

    /// Number of skipped animations.
    pub fn skipped(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.outcome == JobOutcome::Skipped)
            .count()
    }

    /// `true` when no job failed.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Capture and encode one animation.
///
/// An existing artifact short-circuits before any surface is opened, so a finished animation
/// costs no navigation and no screenshot. The surface is released before encoding starts.
#[tracing::instrument(skip_all, fields(animation = %job.name, frames = job.frame_count))]
pub fn render_animation(
    cfg: &PipelineConfig,
    surfaces: &mut dyn SurfaceProvider,
    make_sink: &mut SinkFactory<'_>,
    job: &AnimationJob,
) -> AnimcapResult<EncodeOutcome> {
    let pose = cfg.camera;
    let target = cfg.artifact_path(&job.name, pose);
    if target.exists() {
        tracing::info!(target = %target.display(), "artifact exists, skipping");
        return Ok(EncodeOutcome::Skipped);
    }

    let driver = FrameCaptureDriver::new(cfg)?;
    let frames = {
        let mut surface = surfaces.open_surface()?;
        driver.capture(surface.as_mut(), job, pose)?
    };
    if frames.len() as u64 != job.frame_count {
        return Err(AnimcapError::encode(format!(
            "captured {} frames for '{}', expected {}",
            frames.len(),
            job.name,
            job.frame_count
        )));
    }

    let mut sink = make_sink(&target);
    let sink_cfg = SinkConfig {
        resolution: cfg.viewport,
        fps: cfg.fps,
    };
    write_video(&target, frames, sink_cfg, sink.as_mut())
}

/// Run every job of a partition in order, recording failures instead of stopping at them.
pub fn run_partition(
    cfg: &PipelineConfig,
    worker: usize,
    jobs: &[AnimationJob],
    surfaces: &mut dyn SurfaceProvider,
    make_sink: &mut SinkFactory<'_>,
) -> WorkerReport {
    let mut report = WorkerReport {
        worker,
        jobs: Vec::with_capacity(jobs.len()),
    };
    for job in jobs {
        tracing::info!(worker, animation = %job.name, frames = job.frame_count, "processing");
        let t0 = Instant::now();
        let outcome = match render_animation(cfg, surfaces, make_sink, job) {
            Ok(outcome) => JobOutcome::from(outcome),
            Err(e) => {
                tracing::error!(worker, animation = %job.name, error = %e, "animation failed");
                JobOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        report.jobs.push(JobReport {
            name: job.name.clone(),
            frame_count: job.frame_count,
            outcome,
            elapsed_ms: u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX),
        });
    }
    report
}

/// Worker process entry point: pick the configured surface and encode with `ffmpeg`.
///
/// The surface provider lives for the whole partition and is dropped (browser closed) on
/// return, whatever the outcome of individual animations.
pub fn run_worker(cfg: &PipelineConfig, manifest: &WorkerManifest) -> WorkerReport {
    let mut make_sink = ffmpeg_sink;
    match cfg.surface {
        SurfaceKind::Chrome => {
            let mut browser = ChromeBrowser::new(cfg.viewport, cfg.browser_idle_timeout());
            run_partition(cfg, manifest.worker, &manifest.jobs, &mut browser, &mut make_sink)
        }
        SurfaceKind::Synthetic => {
            let mut browser = SyntheticBrowser::new(cfg.viewport);
            run_partition(cfg, manifest.worker, &manifest.jobs, &mut browser, &mut make_sink)
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> AnimcapResult<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse {what} '{}'", path.display()))?;
    Ok(value)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T, what: &str) -> AnimcapResult<()> {
    let f = File::create(path).with_context(|| format!("create {what} '{}'", path.display()))?;
    serde_json::to_writer_pretty(f, value)
        .with_context(|| format!("write {what} '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/worker.rs"]
mod tests;
