//! Orchestrator side: one OS process per partition, joined before reporting.

use std::{
    path::PathBuf,
    process::{Child, Command, Stdio},
    time::{Duration, Instant},
};

use anyhow::Context as _;

use crate::{
    config::PipelineConfig,
    foundation::error::{AnimcapError, AnimcapResult},
    partition::JobPartition,
    worker::{JobOutcome, WorkerManifest, WorkerReport},
};

/// Files exchanged with one worker process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerInvocation {
    /// 0-based worker index.
    pub worker: usize,
    /// Resolved pipeline configuration shared by all workers.
    pub config: PathBuf,
    /// Partition to process.
    pub manifest: PathBuf,
    /// Where the worker writes its [`WorkerReport`].
    pub report: PathBuf,
}

/// Starts worker processes.
pub trait WorkerLauncher {
    /// Spawn the worker described by `inv` without waiting for it.
    fn launch(&self, inv: &WorkerInvocation) -> AnimcapResult<Child>;
}

/// Launches workers by re-executing an `animcap` binary with its `worker` subcommand.
#[derive(Clone, Debug)]
pub struct SelfExecLauncher {
    exe: PathBuf,
}

impl SelfExecLauncher {
    /// Launcher for the binary at `exe`.
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    /// Launcher for the currently running executable.
    pub fn current() -> AnimcapResult<Self> {
        let exe = std::env::current_exe().context("resolve current executable")?;
        Ok(Self::new(exe))
    }

    /// Command line for `inv`.
    pub fn command(&self, inv: &WorkerInvocation) -> Command {
        let mut cmd = Command::new(&self.exe);
        cmd.arg("worker")
            .arg("--config")
            .arg(&inv.config)
            .arg("--manifest")
            .arg(&inv.manifest)
            .arg("--report")
            .arg(&inv.report)
            .stdin(Stdio::null());
        cmd
    }
}

impl WorkerLauncher for SelfExecLauncher {
    fn launch(&self, inv: &WorkerInvocation) -> AnimcapResult<Child> {
        let child = self.command(inv).spawn().with_context(|| {
            format!("spawn worker {} ('{}')", inv.worker, self.exe.display())
        })?;
        Ok(child)
    }
}

/// Terminal state of one worker process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerStatus {
    /// 0-based worker index.
    pub worker: usize,
    /// Animations assigned.
    pub assigned: usize,
    /// Process exit code, if the process ran and exited normally.
    pub exit_code: Option<i32>,
    /// `true` when the process exited successfully.
    pub success: bool,
    /// Launch or join failure.
    pub error: Option<String>,
    /// Report written by the worker, if any.
    pub report: Option<WorkerReport>,
}

/// Aggregate result of a run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// One entry per partition, in worker order.
    pub workers: Vec<WorkerStatus>,
    /// Wall-clock time from first launch to last join.
    pub elapsed: Duration,
}

impl RunSummary {
    /// `true` when every worker exited cleanly and no animation failed.
    pub fn is_success(&self) -> bool {
        self.workers.iter().all(|w| {
            w.success && w.report.as_ref().is_some_and(WorkerReport::is_success)
        })
    }

    /// Newly written videos across all workers.
    pub fn written(&self) -> usize {
        self.reports().map(WorkerReport::written).sum()
    }

    /// Skipped animations across all workers.
    pub fn skipped(&self) -> usize {
        self.reports().map(WorkerReport::skipped).sum()
    }

    /// `(subject, error)` pairs: failed animations plus workers that did not finish cleanly.
    pub fn failures(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for w in &self.workers {
            if let Some(report) = &w.report {
                for job in report.failures() {
                    if let JobOutcome::Failed { error } = &job.outcome {
                        out.push((job.name.clone(), error.clone()));
                    }
                }
            }
            if !w.success {
                let why = match (&w.error, w.exit_code) {
                    (Some(e), _) => e.clone(),
                    (None, Some(code)) => format!("exited with code {code}"),
                    (None, None) => "terminated by signal".to_string(),
                };
                out.push((format!("worker {}", w.worker), why));
            } else if w.report.is_none() {
                out.push((format!("worker {}", w.worker), "no report written".to_string()));
            }
        }
        out
    }

    fn reports(&self) -> impl Iterator<Item = &WorkerReport> {
        self.workers.iter().filter_map(|w| w.report.as_ref())
    }
}

/// Runs partitions in parallel worker processes.
pub struct Orchestrator<'a, L: WorkerLauncher> {
    cfg: &'a PipelineConfig,
    launcher: L,
}

impl<'a, L: WorkerLauncher> Orchestrator<'a, L> {
    /// Create an orchestrator for `cfg`.
    pub fn new(cfg: &'a PipelineConfig, launcher: L) -> Self {
        Self { cfg, launcher }
    }

    /// Start one worker per partition, wait for all of them, and collect their reports.
    ///
    /// Manifests and the resolved configuration are written before any process starts. A
    /// worker that fails to launch or exits non-zero is recorded; it never stops the others.
    #[tracing::instrument(skip_all, fields(workers = partitions.len()))]
    pub fn run(&self, partitions: &[JobPartition]) -> AnimcapResult<RunSummary> {
        let work_dir = self.cfg.work_dir();
        std::fs::create_dir_all(&work_dir)
            .with_context(|| format!("create work dir '{}'", work_dir.display()))?;

        let config = work_dir.join("config.json");
        self.cfg.write_to(&config)?;

        let mut invocations = Vec::with_capacity(partitions.len());
        for (worker, jobs) in partitions.iter().enumerate() {
            let inv = WorkerInvocation {
                worker,
                config: config.clone(),
                manifest: work_dir.join(format!("worker-{worker}.json")),
                report: work_dir.join(format!("worker-{worker}.report.json")),
            };
            if inv.report.exists() {
                std::fs::remove_file(&inv.report).with_context(|| {
                    format!("remove stale report '{}'", inv.report.display())
                })?;
            }
            WorkerManifest {
                worker,
                jobs: jobs.clone(),
            }
            .write_to(&inv.manifest)?;
            invocations.push(inv);
        }

        let start = Instant::now();
        let mut running: Vec<(WorkerInvocation, usize, AnimcapResult<Child>)> = Vec::new();
        for (inv, jobs) in invocations.into_iter().zip(partitions) {
            tracing::info!(worker = inv.worker, animations = jobs.len(), "starting worker");
            let child = self.launcher.launch(&inv);
            running.push((inv, jobs.len(), child));
        }

        let mut workers = Vec::with_capacity(running.len());
        for (inv, assigned, child) in running {
            workers.push(join_worker(inv, assigned, child));
        }

        let summary = RunSummary {
            workers,
            elapsed: start.elapsed(),
        };
        tracing::info!(elapsed = ?summary.elapsed, ok = summary.is_success(), "all workers joined");
        Ok(summary)
    }
}

fn join_worker(
    inv: WorkerInvocation,
    assigned: usize,
    child: AnimcapResult<Child>,
) -> WorkerStatus {
    let mut status = WorkerStatus {
        worker: inv.worker,
        assigned,
        exit_code: None,
        success: false,
        error: None,
        report: None,
    };

    let exit = child.and_then(|mut c| {
        c.wait().map_err(|e| {
            AnimcapError::Other(anyhow::anyhow!("wait for worker {}: {e}", inv.worker))
        })
    });
    match exit {
        Ok(exit) => {
            status.exit_code = exit.code();
            status.success = exit.success();
        }
        Err(e) => {
            tracing::error!(worker = inv.worker, error = %e, "worker did not run");
            status.error = Some(e.to_string());
            return status;
        }
    }

    if inv.report.exists() {
        match WorkerReport::from_path(&inv.report) {
            Ok(report) => status.report = Some(report),
            Err(e) => {
                tracing::warn!(worker = inv.worker, error = %e, "unreadable worker report");
                status.error = Some(e.to_string());
            }
        }
    }
    if !status.success {
        tracing::warn!(worker = inv.worker, code = ?status.exit_code, "worker exited unsuccessfully");
    }
    status
}

#[cfg(test)]
#[path = "../tests/unit/orchestrate.rs"]
mod tests;
