use std::fmt;

use crate::foundation::error::{AnimcapError, AnimcapResult};

/// Absolute 0-based frame index within one animation's sampled timeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Index of the frame after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed pixel dimensions shared by the viewport, captured frames and the encoded video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a validated resolution.
    ///
    /// Both dimensions must be non-zero and even (yuv420p output subsamples chroma 2x2).
    pub fn new(width: u32, height: u32) -> AnimcapResult<Self> {
        if width == 0 || height == 0 {
            return Err(AnimcapError::validation(
                "resolution width/height must be non-zero",
            ));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(AnimcapError::validation(format!(
                "resolution {width}x{height} must have even dimensions (required for yuv420p output)"
            )));
        }
        Ok(Self { width, height })
    }

    /// Byte length of one tightly packed RGB8 frame at this resolution.
    pub fn rgb8_len(self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Camera placement for a capture session, in whole degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CameraPose {
    /// Elevation above the horizon.
    pub elevation: i32,
    /// Rotation around the vertical axis.
    pub azimuth: i32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            elevation: 30,
            azimuth: 0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
