#![forbid(unsafe_code)]
//! Batch capture of skeletal animations from a headless-browser viewer into per-animation
//! video clips.
//!
//! The pipeline inspects a dataset of per-bone keyframe tracks, keeps animations that are long
//! enough, splits them across worker processes, and has each worker drive a render surface
//! frame by frame before streaming the frames into an `ffmpeg` encode.

mod foundation;

pub mod capture;
pub mod config;
pub mod encode;
pub mod orchestrate;
pub mod partition;
pub mod tracks;
pub mod worker;

pub use capture::{
    frame::FrameImage,
    surface::{RenderSurface, SurfaceProvider},
};
pub use config::{PipelineConfig, SurfaceKind};
pub use encode::{
    artifact::EncodeOutcome,
    sink::{FrameSink, SinkConfig},
};
pub use foundation::core::{CameraPose, FrameIndex, Resolution};
pub use foundation::error::{AnimcapError, AnimcapResult};
pub use orchestrate::{Orchestrator, RunSummary, SelfExecLauncher};
pub use tracks::inspect::{AnimationJob, InspectionReport};
pub use worker::{WorkerManifest, WorkerReport};
