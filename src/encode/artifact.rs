use std::path::Path;

use crate::{
    encode::{
        buffer::FrameBuffer,
        sink::{FrameSink, SinkConfig},
    },
    foundation::error::{AnimcapError, AnimcapResult},
};

/// Result of producing one animation's artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EncodeOutcome {
    /// A new video was written with this many frames.
    Written {
        /// Frames encoded.
        frames: u64,
    },
    /// The artifact already existed; nothing was touched.
    Skipped,
}

/// Write `frames` to `target` through `sink`, unless `target` already exists.
///
/// An existing file is the completion marker from an earlier run and is left byte-for-byte
/// unchanged. Otherwise the sink is opened with `cfg`, receives every frame in order, and is
/// finalized before returning.
pub fn write_video(
    target: &Path,
    frames: FrameBuffer,
    cfg: SinkConfig,
    sink: &mut dyn FrameSink,
) -> AnimcapResult<EncodeOutcome> {
    if target.exists() {
        tracing::info!(target = %target.display(), "artifact exists, skipping");
        return Ok(EncodeOutcome::Skipped);
    }
    if frames.is_empty() {
        return Err(AnimcapError::encode(format!(
            "refusing to write empty video '{}'",
            target.display()
        )));
    }

    sink.begin(cfg)?;
    let written = frames.drain_into(sink)?;
    sink.end()?;

    tracing::info!(target = %target.display(), frames = written, "video written");
    Ok(EncodeOutcome::Written { frames: written })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/artifact.rs"]
mod tests;
