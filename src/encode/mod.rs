//! Frame buffering and video encoding.
//!
//! Sinks consume captured frames in frame-index order and produce one artifact per animation.

/// Artifact writing with skip-if-present semantics.
pub mod artifact;
/// In-order frame accumulation.
pub mod buffer;
/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
