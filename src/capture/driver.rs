use url::Url;

use crate::{
    capture::{
        endpoint::frame_url,
        frame::{FrameImage, decode_jpeg},
        surface::RenderSurface,
    },
    config::PipelineConfig,
    encode::buffer::FrameBuffer,
    foundation::{
        core::{CameraPose, FrameIndex},
        error::{AnimcapError, AnimcapResult},
    },
    tracks::inspect::AnimationJob,
};

/// Captures an animation frame-by-frame from a [`RenderSurface`].
///
/// Each frame is a full navigate / wait-for-ready / screenshot / decode cycle. Frames are
/// strictly sequential: the page is shared state, so frame `n + 1` is never requested before
/// frame `n` has been decoded.
#[derive(Debug)]
pub struct FrameCaptureDriver<'a> {
    cfg: &'a PipelineConfig,
    base: Url,
}

impl<'a> FrameCaptureDriver<'a> {
    /// Create a driver for the viewer described by `cfg`.
    pub fn new(cfg: &'a PipelineConfig) -> AnimcapResult<Self> {
        Ok(Self {
            cfg,
            base: cfg.render_base()?,
        })
    }

    /// Render and decode a single frame.
    pub fn capture_frame(
        &self,
        surface: &mut dyn RenderSurface,
        animation: &str,
        pose: CameraPose,
        frame: FrameIndex,
    ) -> AnimcapResult<FrameImage> {
        let url = frame_url(&self.base, &self.cfg.model_asset, animation, pose, frame)?;
        surface.navigate(&url)?;
        surface
            .wait_ready(&self.cfg.ready_selector, self.cfg.ready_timeout())
            .map_err(|e| at_frame(e, animation, frame))?;
        let bytes = surface.capture_jpeg(self.cfg.jpeg_quality)?;
        decode_jpeg(&bytes).map_err(|e| at_frame(e, animation, frame))
    }

    /// Capture frames `0..job.frame_count` in order.
    ///
    /// The first failing frame aborts the animation; there is no per-frame retry and no resume.
    #[tracing::instrument(skip_all, fields(animation = %job.name, frames = job.frame_count))]
    pub fn capture(
        &self,
        surface: &mut dyn RenderSurface,
        job: &AnimationJob,
        pose: CameraPose,
    ) -> AnimcapResult<FrameBuffer> {
        let mut buffer = FrameBuffer::with_capacity(job.frame_count);
        for i in 0..job.frame_count {
            let idx = FrameIndex(i);
            let frame = self.capture_frame(surface, &job.name, pose, idx)?;
            buffer.push(idx, frame)?;

            if i % 10 == 0 || i + 1 == job.frame_count {
                tracing::info!(frame = i, "frame {i} done");
            }
        }
        Ok(buffer)
    }
}

fn at_frame(err: AnimcapError, animation: &str, frame: FrameIndex) -> AnimcapError {
    match err {
        AnimcapError::RenderTimeout(msg) => {
            AnimcapError::render_timeout(format!("'{animation}' frame {frame}: {msg}"))
        }
        AnimcapError::CaptureDecode(msg) => {
            AnimcapError::capture_decode(format!("'{animation}' frame {frame}: {msg}"))
        }
        other => other,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/driver.rs"]
mod tests;
