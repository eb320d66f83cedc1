use url::Url;

use crate::foundation::{
    core::{CameraPose, FrameIndex},
    error::{AnimcapError, AnimcapResult},
};

/// Viewer URL for one frame: `<base>/<model>/<animation>/<elevation>/<azimuth>/<frame>`.
///
/// Every segment is percent-escaped, so animation names may contain spaces, `/`, `?` or `#`.
/// A trailing slash on `base` is absorbed; any existing base path is kept as a prefix.
pub fn frame_url(
    base: &Url,
    model: &str,
    animation: &str,
    pose: CameraPose,
    frame: FrameIndex,
) -> AnimcapResult<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut segments = url.path_segments_mut().map_err(|()| {
            AnimcapError::validation(format!("render base url '{base}' cannot carry path segments"))
        })?;
        segments
            .pop_if_empty()
            .push(model)
            .push(animation)
            .push(&pose.elevation.to_string())
            .push(&pose.azimuth.to_string())
            .push(&frame.0.to_string());
    }
    Ok(url)
}

/// Frame index encoded in the last path segment of a viewer URL.
pub fn frame_of(url: &Url) -> Option<FrameIndex> {
    url.path_segments()?
        .next_back()?
        .parse::<u64>()
        .ok()
        .map(FrameIndex)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/endpoint.rs"]
mod tests;
