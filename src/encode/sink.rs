use crate::capture::frame::FrameImage;
use crate::foundation::core::{FrameIndex, Resolution};
use crate::foundation::error::{AnimcapError, AnimcapResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Declared frame resolution; every pushed frame must match it exactly.
    pub resolution: Resolution,
    /// Output frames-per-second.
    pub fps: u32,
}

impl SinkConfig {
    /// Reject a frame whose dimensions differ from the declared resolution.
    pub fn check_frame(&self, idx: FrameIndex, frame: &FrameImage) -> AnimcapResult<()> {
        if frame.resolution() != self.resolution {
            return Err(AnimcapError::encode_mismatch(format!(
                "frame {idx} is {}, expected {}",
                frame.resolution(),
                self.resolution
            )));
        }
        if frame.data.len() != self.resolution.rgb8_len() {
            return Err(AnimcapError::encode_mismatch(format!(
                "frame {idx} holds {} bytes, expected {} for rgb8 {}",
                frame.data.len(),
                self.resolution.rgb8_len(),
                self.resolution
            )));
        }
        Ok(())
    }
}

/// Sink contract for consuming captured frames.
///
/// Ordering contract: `push_frame` is called with indices `0, 1, 2, ...` with no gaps.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> AnimcapResult<()>;
    /// Push one frame in strictly increasing index order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameImage) -> AnimcapResult<()>;
    /// Called once after the last frame is pushed. Flushes and finalizes the output.
    fn end(&mut self) -> AnimcapResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameImage)>,
    finished: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameImage)] {
        &self.frames
    }

    /// `true` once `end` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> AnimcapResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameImage) -> AnimcapResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| AnimcapError::encode("in-memory sink not started"))?;
        cfg.check_frame(idx, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> AnimcapResult<()> {
        self.finished = true;
        Ok(())
    }
}
