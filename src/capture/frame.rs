use std::path::Path;

use anyhow::Context as _;

use crate::foundation::{
    core::Resolution,
    error::{AnimcapError, AnimcapResult},
};

/// A decoded frame as tightly packed, row-major RGB8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameImage {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGB8 bytes, `width * height * 3` long.
    pub data: Vec<u8>,
}

impl FrameImage {
    /// Pixel dimensions of this frame.
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    /// Write the frame to `path`; the format follows the file extension.
    pub fn save(&self, path: &Path) -> AnimcapResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgb8,
        )
        .with_context(|| format!("write frame '{}'", path.display()))?;
        Ok(())
    }
}

impl From<image::RgbImage> for FrameImage {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

/// Decode JPEG screenshot bytes into an RGB8 frame.
pub fn decode_jpeg(bytes: &[u8]) -> AnimcapResult<FrameImage> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)
        .map_err(|e| AnimcapError::capture_decode(format!("decode jpeg screenshot: {e}")))?;
    Ok(FrameImage::from(img.to_rgb8()))
}

#[cfg(test)]
#[path = "../../tests/unit/capture/frame.rs"]
mod tests;
