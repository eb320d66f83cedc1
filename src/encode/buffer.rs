use crate::{
    capture::frame::FrameImage,
    encode::sink::FrameSink,
    foundation::{
        core::FrameIndex,
        error::{AnimcapError, AnimcapResult},
    },
};

/// Captured frames of one animation, held in frame-index order until encoding.
///
/// Only the next expected index is accepted, so a full buffer is `0..len` with no gaps.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Vec<FrameImage>,
}

impl FrameBuffer {
    /// Empty buffer expecting `frames` frames.
    pub fn with_capacity(frames: u64) -> Self {
        Self {
            frames: Vec::with_capacity(usize::try_from(frames).unwrap_or(0)),
        }
    }

    /// Index the next pushed frame must carry.
    pub fn next_index(&self) -> FrameIndex {
        FrameIndex(self.frames.len() as u64)
    }

    /// Append `frame` as frame `idx`.
    pub fn push(&mut self, idx: FrameIndex, frame: FrameImage) -> AnimcapResult<()> {
        let expected = self.next_index();
        if idx != expected {
            return Err(AnimcapError::encode(format!(
                "frame buffer expected frame {expected}, got {idx}"
            )));
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Number of buffered frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when nothing has been buffered.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Borrow the buffered frames in order.
    pub fn frames(&self) -> &[FrameImage] {
        &self.frames
    }

    /// Push every buffered frame into `sink` in order, releasing each one after it is written.
    ///
    /// The caller owns `begin`/`end` on the sink.
    pub fn drain_into(self, sink: &mut dyn FrameSink) -> AnimcapResult<u64> {
        let mut written = 0u64;
        for (i, frame) in self.frames.into_iter().enumerate() {
            sink.push_frame(FrameIndex(i as u64), &frame)?;
            written += 1;
        }
        Ok(written)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/buffer.rs"]
mod tests;
