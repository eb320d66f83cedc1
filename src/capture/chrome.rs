use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use headless_chrome::{
    Browser, LaunchOptions, Tab, browser::tab::NoElementFound,
    protocol::cdp::Page::CaptureScreenshotFormatOption, util::Timeout,
};
use url::Url;

use crate::{
    capture::surface::{BrowserSession, RenderSurface, ReusableSession},
    foundation::{
        core::Resolution,
        error::{AnimcapError, AnimcapResult},
    },
};

/// Headless Chromium owned by one worker.
///
/// The browser process is launched on the first surface request, so a worker whose animations
/// are all already rendered never starts one. A browser whose connection has dropped is replaced
/// on the next request. Dropping the value kills the browser process.
pub type ChromeBrowser = ReusableSession<Browser>;

impl ReusableSession<Browser> {
    /// Provider whose tabs render at `viewport`.
    ///
    /// `idle_timeout` bounds how long the connection may go without traffic; it has to cover the
    /// encode that runs between two animations.
    pub fn new(viewport: Resolution, idle_timeout: Duration) -> Self {
        Self::with_launcher(move || launch(viewport, idle_timeout))
    }
}

fn launch(viewport: Resolution, idle_timeout: Duration) -> AnimcapResult<Browser> {
    let opts = LaunchOptions::default_builder()
        .headless(true)
        .window_size(Some((viewport.width, viewport.height)))
        .idle_browser_timeout(idle_timeout)
        .build()
        .map_err(|e| AnimcapError::validation(format!("invalid chrome launch options: {e}")))?;
    let browser = Browser::new(opts).context("launch headless chrome")?;
    tracing::info!(%viewport, ?idle_timeout, "launched headless chrome");
    Ok(browser)
}

impl BrowserSession for Browser {
    fn open_tab(&self) -> AnimcapResult<Box<dyn RenderSurface>> {
        let tab = self.new_tab().context("open chrome tab")?;
        Ok(Box::new(ChromeSurface { tab }))
    }
}

/// One browser tab, closed when dropped.
pub struct ChromeSurface {
    tab: Arc<Tab>,
}

impl RenderSurface for ChromeSurface {
    fn navigate(&mut self, url: &Url) -> AnimcapResult<()> {
        self.tab
            .navigate_to(url.as_str())
            .with_context(|| format!("navigate to '{url}'"))?
            .wait_until_navigated()
            .with_context(|| format!("wait for navigation to '{url}'"))?;
        Ok(())
    }

    fn wait_ready(&mut self, selector: &str, timeout: Duration) -> AnimcapResult<()> {
        self.tab
            .wait_until_visible_with_custom_timeout(selector, timeout)
            .map_err(|e| readiness_error(selector, timeout, e))?;
        Ok(())
    }

    fn capture_jpeg(&mut self, quality: u32) -> AnimcapResult<Vec<u8>> {
        let bytes = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Jpeg, Some(quality), None, true)
            .context("capture jpeg screenshot")?;
        Ok(bytes)
    }
}

impl Drop for ChromeSurface {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            tracing::debug!(error = %e, "failed to close chrome tab");
        }
    }
}

/// Only a missing or never-visible indicator is a render timeout; transport failures are not.
fn readiness_error(selector: &str, timeout: Duration, err: anyhow::Error) -> AnimcapError {
    let expired = err
        .chain()
        .any(|cause| cause.is::<Timeout>() || cause.is::<NoElementFound>());
    if expired {
        AnimcapError::render_timeout(format!(
            "'{selector}' not visible after {timeout:?}: {err:#}"
        ))
    } else {
        AnimcapError::Other(err.context(format!("wait for '{selector}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/chrome.rs"]
mod tests;
