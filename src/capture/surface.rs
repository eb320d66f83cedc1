use std::time::Duration;

use url::Url;

use crate::foundation::error::AnimcapResult;

/// A page that renders one requested frame per navigation.
///
/// Calls come in `navigate`, `wait_ready`, `capture_jpeg` order for every frame. Implementations
/// must not return from `wait_ready` before the readiness indicator is visible.
pub trait RenderSurface {
    /// Load `url` and wait for the navigation to settle.
    fn navigate(&mut self, url: &Url) -> AnimcapResult<()>;

    /// Block until an element matching `selector` is visible, or fail with
    /// [`AnimcapError::RenderTimeout`](crate::AnimcapError::RenderTimeout) after `timeout`.
    fn wait_ready(&mut self, selector: &str, timeout: Duration) -> AnimcapResult<()>;

    /// Screenshot the full viewport as JPEG.
    fn capture_jpeg(&mut self, quality: u32) -> AnimcapResult<Vec<u8>>;
}

/// Long-lived owner of surfaces, held by one worker for its whole partition.
///
/// Each animation gets a fresh surface; dropping it releases the page.
pub trait SurfaceProvider {
    /// Open a surface for one animation.
    fn open_surface(&mut self) -> AnimcapResult<Box<dyn RenderSurface + '_>>;
}

/// A connection to a rendering process that hands out independent surfaces.
pub trait BrowserSession {
    /// Open a new page in this session.
    fn open_tab(&self) -> AnimcapResult<Box<dyn RenderSurface>>;
}

type Launcher<S> = Box<dyn FnMut() -> AnimcapResult<S>>;

/// Session held across animations, launched on first use and replaced when it stops handing
/// out surfaces.
///
/// A failed `open_tab` on the cached session drops it and launches a new one, at most once per
/// [`SurfaceProvider::open_surface`] call. A session that never gets used is never launched.
pub struct ReusableSession<S> {
    launch: Launcher<S>,
    session: Option<S>,
    launches: usize,
}

impl<S: BrowserSession> ReusableSession<S> {
    /// Provider that starts sessions with `launch`.
    pub fn with_launcher(launch: impl FnMut() -> AnimcapResult<S> + 'static) -> Self {
        Self {
            launch: Box::new(launch),
            session: None,
            launches: 0,
        }
    }

    /// Sessions launched so far.
    pub fn launches(&self) -> usize {
        self.launches
    }
}

impl<S: BrowserSession> SurfaceProvider for ReusableSession<S> {
    fn open_surface(&mut self) -> AnimcapResult<Box<dyn RenderSurface + '_>> {
        if let Some(session) = &self.session {
            match session.open_tab() {
                Ok(surface) => return Ok(surface),
                Err(e) => {
                    tracing::warn!(error = %e, "browser session unusable, relaunching");
                    self.session = None;
                }
            }
        }
        let session = (self.launch)()?;
        self.launches += 1;
        let session = self.session.insert(session);
        session.open_tab()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/surface.rs"]
mod tests;
