use std::collections::BTreeMap;

use anyhow::Context as _;

use crate::{
    config::PipelineConfig,
    foundation::error::{AnimcapError, AnimcapResult},
};

/// Animations with fewer frames than this are discarded as too short to be useful.
pub const MIN_LONG_FRAMES: u64 = 30;

/// One bone's sampled timeline. Only `times` is read; values and interpolation are ignored.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct TrackRecord {
    /// Ordered sample timestamps.
    pub times: Vec<f64>,
}

/// Tracks of one animation, restricted to the configured bone set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationTrackSet {
    tracks: BTreeMap<String, TrackRecord>,
}

impl AnimationTrackSet {
    /// Parse a track document keyed by bone name.
    ///
    /// Bones outside `bones` are dropped before their payload is looked at, so unrelated
    /// props or helpers may carry any shape.
    pub fn from_slice(bytes: &[u8], bones: &[String]) -> AnimcapResult<Self> {
        let doc: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(bytes)
            .map_err(|e| AnimcapError::dataset(format!("track document is not a JSON object: {e}")))?;

        let mut tracks = BTreeMap::new();
        for (bone, value) in doc {
            if !bones.iter().any(|b| *b == bone) {
                continue;
            }
            let record: TrackRecord = serde_json::from_value(value)
                .map_err(|e| AnimcapError::dataset(format!("bone '{bone}': {e}")))?;
            tracks.insert(bone, record);
        }
        Ok(Self { tracks })
    }

    /// Sample count of `bone`'s track, if present.
    pub fn len_of(&self, bone: &str) -> Option<usize> {
        self.tracks.get(bone).map(|t| t.times.len())
    }

    /// Number of retained bones.
    pub fn bone_count(&self) -> usize {
        self.tracks.len()
    }
}

/// Bone with the longest `times` sequence and that length.
///
/// Bones are visited in `bones` order and only a strictly longer track replaces the current
/// pick, so ties resolve to the earlier canonical bone. Returns `(0, "")` when no bone in
/// `bones` is present.
pub fn dominant_track(set: &AnimationTrackSet, bones: &[String]) -> (u64, String) {
    let mut max_len = 0u64;
    let mut max_name = String::new();
    for bone in bones {
        let Some(len) = set.len_of(bone) else {
            continue;
        };
        if len as u64 > max_len {
            max_len = len as u64;
            max_name = bone.clone();
        }
    }
    (max_len, max_name)
}

/// `true` when an animation has enough frames to be captured.
pub fn is_long(frame_count: u64) -> bool {
    frame_count >= MIN_LONG_FRAMES
}

/// A single animation scheduled (or considered) for capture.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnimationJob {
    /// Animation identifier (track file stem).
    pub name: String,
    /// Number of frames to capture.
    pub frame_count: u64,
    /// Bone whose track determined `frame_count`.
    pub dominant_bone: String,
}

/// Read and measure the track file of `name`.
pub fn inspect_animation(cfg: &PipelineConfig, name: &str) -> AnimcapResult<AnimationJob> {
    let path = cfg.track_file(name);
    let bytes = std::fs::read(&path).map_err(|e| {
        AnimcapError::dataset(format!("read track file '{}': {e}", path.display()))
    })?;
    let set = AnimationTrackSet::from_slice(&bytes, &cfg.bones).map_err(|e| match e {
        AnimcapError::Dataset(msg) => {
            AnimcapError::dataset(format!("'{}': {msg}", path.display()))
        }
        other => other,
    })?;
    let (frame_count, dominant_bone) = dominant_track(&set, &cfg.bones);
    Ok(AnimationJob {
        name: name.to_string(),
        frame_count,
        dominant_bone,
    })
}

/// List animation names (track file stems) in the tracks directory.
///
/// Names are sorted so runs are reproducible across filesystems; `cfg.limit` keeps the first
/// `limit` of them.
pub fn discover_animations(cfg: &PipelineConfig) -> AnimcapResult<Vec<String>> {
    let dir = cfg.tracks_path();
    let entries = std::fs::read_dir(&dir)
        .with_context(|| format!("list tracks directory '{}'", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    if let Some(limit) = cfg.limit {
        names.truncate(limit);
    }
    Ok(names)
}

/// An animation whose track file could not be inspected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetFailure {
    /// Animation identifier.
    pub name: String,
    /// Rendered error.
    pub error: String,
}

/// Batch inspection result.
#[derive(Clone, Debug, Default)]
pub struct InspectionReport {
    /// Animations with at least [`MIN_LONG_FRAMES`] frames, in input order.
    pub long: Vec<AnimationJob>,
    /// Animations below the threshold, in input order.
    pub short: Vec<AnimationJob>,
    /// Animations whose track file failed to load.
    pub failures: Vec<DatasetFailure>,
}

impl InspectionReport {
    /// Number of animations examined.
    pub fn total(&self) -> usize {
        self.long.len() + self.short.len() + self.failures.len()
    }
}

/// Inspect every animation in `names`, isolating failures per animation.
#[tracing::instrument(skip_all, fields(animations = names.len()))]
pub fn inspect_all(cfg: &PipelineConfig, names: &[String]) -> InspectionReport {
    let mut report = InspectionReport::default();
    for name in names {
        match inspect_animation(cfg, name) {
            Ok(job) if is_long(job.frame_count) => report.long.push(job),
            Ok(job) => {
                tracing::debug!(animation = %job.name, frames = job.frame_count, "short animation");
                report.short.push(job);
            }
            Err(e) => {
                tracing::warn!(animation = %name, error = %e, "track inspection failed");
                report.failures.push(DatasetFailure {
                    name: name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    report
}

#[cfg(test)]
#[path = "../../tests/unit/tracks/inspect.rs"]
mod tests;
