use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::capture::frame::FrameImage;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{AnimcapError, AnimcapResult};

/// Options for [`FfmpegSink`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Final artifact path.
    pub out_path: PathBuf,
    /// Replace `out_path` if it already exists when the encode finishes.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    /// Create options for writing `out_path`, refusing to replace an existing file.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: false,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGB24 frames to its stdin.
///
/// `ffmpeg` writes to a staging file next to `out_path`; only a clean `end()` renames it into
/// place. An artifact at `out_path` therefore always holds a complete video, and an aborted
/// encode leaves nothing behind.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    staging: Option<PathBuf>,
    cfg: Option<SinkConfig>,
    next_idx: FrameIndex,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            staging: None,
            cfg: None,
            next_idx: FrameIndex(0),
        }
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        if let Some(staging) = self.staging.take() {
            let _ = std::fs::remove_file(&staging);
        }
        self.cfg = None;
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> AnimcapResult<()> {
        if self.child.is_some() {
            return Err(AnimcapError::encode("ffmpeg sink already started"));
        }
        if cfg.fps == 0 {
            return Err(AnimcapError::validation("fps must be non-zero"));
        }
        let res = cfg.resolution;
        crate::foundation::core::Resolution::new(res.width, res.height)?;

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(AnimcapError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(AnimcapError::encode(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        let staging = staging_path(&self.opts.out_path);

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: raw RGB24 frames at a fixed rate. `-r` before `-i` sets the input rate.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", res.width, res.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
        ]);
        // Output: h264 + yuv420p at the input rate.
        cmd.args([
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&staging);

        let mut child = cmd.spawn().map_err(|e| {
            AnimcapError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AnimcapError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AnimcapError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(out = %self.opts.out_path.display(), resolution = %res, fps = cfg.fps, "ffmpeg started");
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.staging = Some(staging);
        self.cfg = Some(cfg);
        self.next_idx = FrameIndex(0);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameImage) -> AnimcapResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| AnimcapError::encode("ffmpeg sink not started"))?;
        if idx != self.next_idx {
            return Err(AnimcapError::encode(format!(
                "ffmpeg sink expected frame {}, got {idx}",
                self.next_idx
            )));
        }
        cfg.check_frame(idx, frame)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(AnimcapError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            AnimcapError::encode(format!("failed to write frame {idx} to ffmpeg stdin: {e}"))
        })?;
        self.next_idx = idx.next();
        Ok(())
    }

    fn end(&mut self) -> AnimcapResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| AnimcapError::encode("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| AnimcapError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| AnimcapError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| AnimcapError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            self.abort();
            return Err(AnimcapError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let staging = self
            .staging
            .take()
            .ok_or_else(|| AnimcapError::encode("ffmpeg staging path missing (unexpected)"))?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            let _ = std::fs::remove_file(&staging);
            return Err(AnimcapError::validation(format!(
                "output file '{}' appeared during encode",
                self.opts.out_path.display()
            )));
        }
        std::fs::rename(&staging, &self.opts.out_path).map_err(|e| {
            let _ = std::fs::remove_file(&staging);
            AnimcapError::encode(format!(
                "failed to move '{}' into place: {e}",
                self.opts.out_path.display()
            ))
        })?;

        tracing::debug!(out = %self.opts.out_path.display(), frames = self.next_idx.0, "ffmpeg finished");
        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() || self.staging.is_some() {
            self.abort();
        }
    }
}

/// Staging file for `out_path`: `.<stem>.partial.<ext>` in the same directory.
///
/// The original extension stays last so `ffmpeg` picks the same container.
pub fn staging_path(out_path: &Path) -> PathBuf {
    let stem = out_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match out_path.extension() {
        Some(ext) => format!(".{stem}.partial.{}", ext.to_string_lossy()),
        None => format!(".{stem}.partial"),
    };
    out_path.with_file_name(name)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> AnimcapResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
