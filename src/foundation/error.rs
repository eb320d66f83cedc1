/// Convenience result type used across animcap.
pub type AnimcapResult<T> = Result<T, AnimcapError>;

/// Top-level error taxonomy for the capture pipeline.
///
/// Every variant except [`AnimcapError::Validation`] is scoped to a single animation: callers
/// record it against that animation and move on to the next one.
#[derive(thiserror::Error, Debug)]
pub enum AnimcapError {
    /// Invalid configuration or argument values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Track file missing or malformed.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// The readiness indicator did not appear within the configured bound.
    #[error("render timeout: {0}")]
    RenderTimeout(String),

    /// Screenshot bytes could not be decoded into a raster.
    #[error("capture decode error: {0}")]
    CaptureDecode(String),

    /// A frame's resolution disagrees with the declared video resolution.
    #[error("encode mismatch: {0}")]
    EncodeMismatch(String),

    /// Encoder process failures (spawn, pipe, exit status, ordering).
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnimcapError {
    /// Build an [`AnimcapError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`AnimcapError::Dataset`] value.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Build an [`AnimcapError::RenderTimeout`] value.
    pub fn render_timeout(msg: impl Into<String>) -> Self {
        Self::RenderTimeout(msg.into())
    }

    /// Build an [`AnimcapError::CaptureDecode`] value.
    pub fn capture_decode(msg: impl Into<String>) -> Self {
        Self::CaptureDecode(msg.into())
    }

    /// Build an [`AnimcapError::EncodeMismatch`] value.
    pub fn encode_mismatch(msg: impl Into<String>) -> Self {
        Self::EncodeMismatch(msg.into())
    }

    /// Build an [`AnimcapError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
