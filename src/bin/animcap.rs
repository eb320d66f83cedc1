use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use animcap::{
    FrameIndex, Orchestrator, PipelineConfig, Resolution, SelfExecLauncher, SurfaceKind,
    SurfaceProvider, WorkerManifest,
    capture::{chrome::ChromeBrowser, driver::FrameCaptureDriver, synthetic::SyntheticBrowser},
    partition::partition_jobs,
    tracks::inspect::{InspectionReport, discover_animations, inspect_all},
    worker::run_worker,
};

#[derive(Parser, Debug)]
#[command(name = "animcap", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count long and short animations in the dataset.
    Inspect(SharedArgs),
    /// Capture every long animation into a video (requires `ffmpeg` on PATH).
    Run(SharedArgs),
    /// Capture a single frame of one animation to an image file.
    Frame(FrameArgs),
    /// Process one partition (spawned by `run`).
    #[command(hide = true)]
    Worker(WorkerArgs),
}

#[derive(Args, Debug, Clone)]
struct SharedArgs {
    /// JSON configuration file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset root containing the tracks directory.
    #[arg(long)]
    dataset_root: Option<PathBuf>,

    /// Output directory for videos.
    #[arg(long)]
    videos_root: Option<PathBuf>,

    /// Number of worker processes.
    #[arg(long)]
    workers: Option<usize>,

    /// Only process the first N animations (sorted by name).
    #[arg(long)]
    limit: Option<usize>,

    /// Base URL of the viewer application.
    #[arg(long)]
    render_url: Option<String>,

    /// Rendering surface.
    #[arg(long, value_enum)]
    surface: Option<SurfaceChoice>,

    /// Shorthand for `--surface synthetic`.
    #[arg(long, conflicts_with = "surface")]
    synthetic: bool,

    /// Viewport width in pixels.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Viewport height in pixels.
    #[arg(long, requires = "width")]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Animation name (track file stem).
    #[arg(long)]
    name: String,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output image path (format from extension).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct WorkerArgs {
    /// Resolved configuration written by the orchestrator.
    #[arg(long)]
    config: PathBuf,

    /// Partition manifest.
    #[arg(long)]
    manifest: PathBuf,

    /// Where to write the worker report.
    #[arg(long)]
    report: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SurfaceChoice {
    Chrome,
    Synthetic,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Run(args) => cmd_run(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Worker(args) => cmd_worker(args),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("animcap=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &SharedArgs) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = &args.dataset_root {
        cfg.dataset_root = root.clone();
    }
    if let Some(root) = &args.videos_root {
        cfg.videos_root = root.clone();
    }
    if args.workers.is_some() {
        cfg.workers = args.workers;
    }
    if args.limit.is_some() {
        cfg.limit = args.limit;
    }
    if let Some(url) = &args.render_url {
        cfg.render_base_url = url.clone();
    }
    if args.synthetic {
        cfg.surface = SurfaceKind::Synthetic;
    } else if let Some(choice) = args.surface {
        cfg.surface = match choice {
            SurfaceChoice::Chrome => SurfaceKind::Chrome,
            SurfaceChoice::Synthetic => SurfaceKind::Synthetic,
        };
    }
    if let (Some(w), Some(h)) = (args.width, args.height) {
        cfg.viewport = Resolution::new(w, h)?;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn inspect(cfg: &PipelineConfig) -> anyhow::Result<InspectionReport> {
    let names = discover_animations(cfg)?;
    let report = inspect_all(cfg, &names);
    eprintln!(
        "total {}, long {}, short {}, dataset failures {}",
        report.total(),
        report.long.len(),
        report.short.len(),
        report.failures.len()
    );
    for f in &report.failures {
        eprintln!("  {}: {}", f.name, f.error);
    }
    Ok(report)
}

fn cmd_inspect(args: SharedArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args)?;
    inspect(&cfg)?;
    Ok(())
}

fn cmd_run(args: SharedArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args)?;
    let report = inspect(&cfg)?;

    let partitions = partition_jobs(&report.long, cfg.worker_count());
    let launcher = SelfExecLauncher::current()?;
    let summary = Orchestrator::new(&cfg, launcher).run(&partitions)?;

    let failures = summary.failures();
    eprintln!(
        "written {}, skipped {}, failed {} in {:.1}s",
        summary.written(),
        summary.skipped(),
        failures.len(),
        summary.elapsed.as_secs_f64()
    );
    for (subject, error) in &failures {
        eprintln!("  {subject}: {error}");
    }

    if !failures.is_empty() || !report.failures.is_empty() {
        anyhow::bail!(
            "{} capture failure(s), {} dataset failure(s)",
            failures.len(),
            report.failures.len()
        );
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.shared)?;
    let mut surfaces: Box<dyn SurfaceProvider> = match cfg.surface {
        SurfaceKind::Chrome => {
            Box::new(ChromeBrowser::new(cfg.viewport, cfg.browser_idle_timeout()))
        }
        SurfaceKind::Synthetic => Box::new(SyntheticBrowser::new(cfg.viewport)),
    };

    let driver = FrameCaptureDriver::new(&cfg)?;
    let frame = {
        let mut surface = surfaces.open_surface()?;
        driver.capture_frame(surface.as_mut(), &args.name, cfg.camera, FrameIndex(args.frame))?
    };

    frame.save(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_worker(args: WorkerArgs) -> anyhow::Result<()> {
    let cfg = PipelineConfig::from_path(&args.config)?;
    let manifest = WorkerManifest::from_path(&args.manifest)?;
    tracing::info!(worker = manifest.worker, animations = manifest.jobs.len(), "worker started");

    let report = run_worker(&cfg, &manifest);
    report.write_to(&args.report)?;
    tracing::info!(
        worker = manifest.worker,
        written = report.written(),
        skipped = report.skipped(),
        failed = report.failures().count(),
        "worker finished"
    );
    Ok(())
}
