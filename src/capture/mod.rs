//! Frame capture: drive a rendering surface frame-by-frame and decode each screenshot.
//!
//! The driver only talks to a [`surface::RenderSurface`]. Production runs use headless Chromium
//! ([`chrome`]); tests and dry runs use deterministic [`synthetic`] frames.

/// Headless Chromium surface.
pub mod chrome;
/// Per-animation capture loop.
pub mod driver;
/// Viewer URL construction.
pub mod endpoint;
/// Decoded frame rasters.
pub mod frame;
/// Rendering surface seam.
pub mod surface;
/// Synthetic surface producing marker frames.
pub mod synthetic;
