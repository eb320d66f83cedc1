use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use url::Url;

use crate::{
    capture::{
        endpoint::frame_of,
        surface::{BrowserSession, RenderSurface, SurfaceProvider},
    },
    foundation::{
        core::{FrameIndex, Resolution},
        error::{AnimcapError, AnimcapResult},
    },
};

/// Number of stripes in the frame-index marker.
pub const MARKER_BITS: u32 = 10;

/// Render the frame-index marker: `MARKER_BITS` vertical stripes, most significant bit on the
/// left, white for `1` and black for `0`. Indices wrap at `2^MARKER_BITS`.
pub fn marker_image(resolution: Resolution, frame: FrameIndex) -> image::RgbImage {
    let stripe = (resolution.width / MARKER_BITS).max(1);
    image::RgbImage::from_fn(resolution.width, resolution.height, |x, _| {
        let bit = (x / stripe).min(MARKER_BITS - 1);
        let set = (frame.0 >> (MARKER_BITS - 1 - bit)) & 1 == 1;
        if set {
            image::Rgb([255, 255, 255])
        } else {
            image::Rgb([0, 0, 0])
        }
    })
}

/// Read a marker back from 8-bit luma samples of a `width x height` frame.
///
/// Samples the centre of every stripe on the middle row, so it tolerates lossy compression.
pub fn read_marker(luma: &[u8], width: u32, height: u32) -> Option<u64> {
    let stripe = (width / MARKER_BITS).max(1);
    let row = (height / 2) as usize * width as usize;
    let mut value = 0u64;
    for bit in 0..MARKER_BITS {
        let x = (bit * stripe + stripe / 2) as usize;
        let sample = *luma.get(row + x)?;
        value = (value << 1) | u64::from(sample >= 128);
    }
    Some(value)
}

/// Deterministic in-process surface provider.
///
/// Every frame is a JPEG of [`marker_image`] for the frame index in the navigated URL.
/// Navigations are recorded in a shared log for inspection.
#[derive(Clone, Debug)]
pub struct SyntheticBrowser {
    resolution: Resolution,
    stall: Option<(String, FrameIndex)>,
    navigations: Arc<Mutex<Vec<String>>>,
}

impl SyntheticBrowser {
    /// Provider rendering frames at `resolution`.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            stall: None,
            navigations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Never signal readiness for `frame` of any URL whose path contains `segment`.
    pub fn stall_at(mut self, segment: impl Into<String>, frame: FrameIndex) -> Self {
        self.stall = Some((segment.into(), frame));
        self
    }

    /// A fresh surface sharing this provider's navigation log.
    pub fn surface(&self) -> SyntheticSurface {
        SyntheticSurface {
            browser: self.clone(),
            current: None,
        }
    }

    /// URLs navigated so far, across all surfaces opened from this provider.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl SurfaceProvider for SyntheticBrowser {
    fn open_surface(&mut self) -> AnimcapResult<Box<dyn RenderSurface + '_>> {
        Ok(Box::new(self.surface()))
    }
}

impl BrowserSession for SyntheticBrowser {
    fn open_tab(&self) -> AnimcapResult<Box<dyn RenderSurface>> {
        Ok(Box::new(self.surface()))
    }
}

/// A surface opened from [`SyntheticBrowser`].
pub struct SyntheticSurface {
    browser: SyntheticBrowser,
    current: Option<Url>,
}

impl SyntheticSurface {
    fn stalled(&self, url: &Url, frame: FrameIndex) -> bool {
        match &self.browser.stall {
            Some((segment, at)) => *at == frame && url.path().contains(segment.as_str()),
            None => false,
        }
    }
}

impl RenderSurface for SyntheticSurface {
    fn navigate(&mut self, url: &Url) -> AnimcapResult<()> {
        if let Ok(mut log) = self.browser.navigations.lock() {
            log.push(url.to_string());
        }
        self.current = Some(url.clone());
        Ok(())
    }

    fn wait_ready(&mut self, selector: &str, timeout: Duration) -> AnimcapResult<()> {
        let url = self
            .current
            .as_ref()
            .ok_or_else(|| AnimcapError::render_timeout("no page loaded"))?;
        let frame = frame_of(url).ok_or_else(|| {
            AnimcapError::render_timeout(format!("'{url}' does not name a frame"))
        })?;
        if self.stalled(url, frame) {
            return Err(AnimcapError::render_timeout(format!(
                "'{selector}' not present after {timeout:?}"
            )));
        }
        Ok(())
    }

    fn capture_jpeg(&mut self, quality: u32) -> AnimcapResult<Vec<u8>> {
        let frame = self
            .current
            .as_ref()
            .and_then(frame_of)
            .ok_or_else(|| AnimcapError::capture_decode("no frame rendered"))?;
        let img = marker_image(self.browser.resolution, frame);

        let mut bytes = Vec::new();
        let quality = u8::try_from(quality.clamp(1, 100)).unwrap_or(100);
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
        img.write_with_encoder(encoder)
            .map_err(|e| AnimcapError::Other(anyhow::Error::new(e)))?;
        Ok(bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/synthetic.rs"]
mod tests;
