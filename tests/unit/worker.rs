use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use super::*;
use crate::{
    capture::{
        frame::FrameImage,
        surface::{BrowserSession, RenderSurface, ReusableSession},
        synthetic::read_marker,
    },
    foundation::core::{FrameIndex, Resolution},
};

const RES: Resolution = Resolution {
    width: 40,
    height: 30,
};

type Log = Arc<Mutex<Vec<(PathBuf, Vec<u64>)>>>;

/// Decodes the frame marker of every pushed frame and touches the target file on `end`.
struct RecordingSink {
    target: PathBuf,
    markers: Vec<u64>,
    log: Log,
}

impl FrameSink for RecordingSink {
    fn begin(&mut self, cfg: SinkConfig) -> AnimcapResult<()> {
        assert_eq!(cfg.resolution, RES);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameImage) -> AnimcapResult<()> {
        let luma: Vec<u8> = frame
            .data
            .chunks_exact(3)
            .map(|px| ((u16::from(px[0]) + u16::from(px[1]) + u16::from(px[2])) / 3) as u8)
            .collect();
        let marker = read_marker(&luma, frame.width, frame.height).unwrap();
        assert_eq!(marker, idx.0);
        self.markers.push(marker);
        Ok(())
    }

    fn end(&mut self) -> AnimcapResult<()> {
        std::fs::write(&self.target, b"video").unwrap();
        self.log
            .lock()
            .unwrap()
            .push((self.target.clone(), std::mem::take(&mut self.markers)));
        Ok(())
    }
}

fn recording(log: &Log) -> impl FnMut(&Path) -> Box<dyn FrameSink> + '_ {
    move |target: &Path| -> Box<dyn FrameSink> {
        Box::new(RecordingSink {
            target: target.to_path_buf(),
            markers: Vec::new(),
            log: Arc::clone(log),
        })
    }
}

fn cfg(videos: &Path) -> PipelineConfig {
    PipelineConfig {
        videos_root: videos.to_path_buf(),
        viewport: RES,
        surface: SurfaceKind::Synthetic,
        ..PipelineConfig::default()
    }
}

fn job(name: &str, frame_count: u64) -> AnimationJob {
    AnimationJob {
        name: name.to_string(),
        frame_count,
        dominant_bone: "Hips".to_string(),
    }
}

#[test]
fn writes_each_animation_with_ordered_frames() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg(dir.path());
    let log = Log::default();
    let mut sinks = recording(&log);
    let mut browser = SyntheticBrowser::new(RES);

    let report = run_partition(
        &cfg,
        0,
        &[job("Walk", 45), job("Run", 33)],
        &mut browser,
        &mut sinks,
    );
    assert!(report.is_success());
    assert_eq!(report.written(), 2);
    assert_eq!(
        report.jobs[0].outcome,
        JobOutcome::Written { frames: 45 }
    );

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].0, cfg.artifact_path("Walk", cfg.camera));
    assert_eq!(log[0].1, (0..45).collect::<Vec<u64>>());
    assert_eq!(log[1].1, (0..33).collect::<Vec<u64>>());
}

#[test]
fn existing_artifact_skips_capture_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg(dir.path());
    let target = cfg.artifact_path("Walk", cfg.camera);
    std::fs::write(&target, b"from an earlier run").unwrap();

    let log = Log::default();
    let mut sinks = recording(&log);
    let mut browser = SyntheticBrowser::new(RES);
    let report = run_partition(&cfg, 0, &[job("Walk", 45)], &mut browser, &mut sinks);

    assert_eq!(report.jobs[0].outcome, JobOutcome::Skipped);
    assert_eq!(report.skipped(), 1);
    assert!(browser.navigations().is_empty());
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(std::fs::read(&target).unwrap(), b"from an earlier run");
}

#[test]
fn failed_animation_does_not_stop_the_partition() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg(dir.path());
    let log = Log::default();
    let mut sinks = recording(&log);
    let mut browser = SyntheticBrowser::new(RES).stall_at("Walk", FrameIndex(7));

    let report = run_partition(
        &cfg,
        1,
        &[job("Walk", 45), job("Run", 31)],
        &mut browser,
        &mut sinks,
    );
    assert!(!report.is_success());
    assert_eq!(report.worker, 1);

    let failed: Vec<&str> = report.failures().map(|j| j.name.as_str()).collect();
    assert_eq!(failed, vec!["Walk"]);
    match &report.jobs[0].outcome {
        JobOutcome::Failed { error } => assert!(error.contains("render timeout")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(report.jobs[1].outcome, JobOutcome::Written { frames: 31 });

    assert!(!cfg.artifact_path("Walk", cfg.camera).exists());
    assert!(cfg.artifact_path("Run", cfg.camera).exists());
    // 8 navigations for Walk (0..=7) and 31 for Run.
    assert_eq!(browser.navigations().len(), 8 + 31);
}

/// Synthetic session whose connection drops after one tab, like a browser that idled out while
/// the previous clip was encoding.
struct OneTabSession {
    frames: SyntheticBrowser,
    used: std::cell::Cell<bool>,
}

impl BrowserSession for OneTabSession {
    fn open_tab(&self) -> AnimcapResult<Box<dyn RenderSurface>> {
        if self.used.replace(true) {
            return Err(AnimcapError::Other(anyhow::anyhow!("transport loop timed out")));
        }
        self.frames.open_tab()
    }
}

#[test]
fn dropped_browser_session_does_not_fail_later_animations() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg(dir.path());
    let log = Log::default();
    let mut sinks = recording(&log);
    let frames = SyntheticBrowser::new(RES);
    let launcher_frames = frames.clone();
    let mut sessions = ReusableSession::with_launcher(move || {
        Ok(OneTabSession {
            frames: launcher_frames.clone(),
            used: std::cell::Cell::new(false),
        })
    });

    let report = run_partition(
        &cfg,
        0,
        &[job("Walk", 31), job("Run", 33), job("Jump", 30)],
        &mut sessions,
        &mut sinks,
    );
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.written(), 3);
    assert_eq!(sessions.launches(), 3);
    assert_eq!(frames.navigations().len(), 31 + 33 + 30);

    let log = log.lock().unwrap();
    assert_eq!(log[1].1, (0..33).collect::<Vec<u64>>());
    assert_eq!(log[2].1, (0..30).collect::<Vec<u64>>());
}

#[test]
fn empty_partition_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg(dir.path());
    let log = Log::default();
    let mut sinks = recording(&log);
    let mut browser = SyntheticBrowser::new(RES);

    let report = run_partition(&cfg, 3, &[], &mut browser, &mut sinks);
    assert!(report.jobs.is_empty());
    assert!(report.is_success());
}

#[test]
fn manifest_and_report_survive_the_process_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = WorkerManifest {
        worker: 2,
        jobs: vec![job("Walk", 45)],
    };
    let path = dir.path().join("worker-2.json");
    manifest.write_to(&path).unwrap();
    assert_eq!(WorkerManifest::from_path(&path).unwrap(), manifest);

    let report = WorkerReport {
        worker: 2,
        jobs: vec![JobReport {
            name: "Walk".to_string(),
            frame_count: 45,
            outcome: JobOutcome::Failed {
                error: "render timeout: x".to_string(),
            },
            elapsed_ms: 12,
        }],
    };
    let path = dir.path().join("worker-2.report.json");
    report.write_to(&path).unwrap();
    assert_eq!(WorkerReport::from_path(&path).unwrap(), report);
}

#[test]
fn missing_manifest_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(WorkerManifest::from_path(&dir.path().join("absent.json")).is_err());
}
