use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use boids3d_core::{FlockManager, FrameReport, Vector3};
use boids3d_shared::{BehaviorMode, FlockSettings};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per reported frame
    Summary,
    /// One JSON frame report per line
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Headless 3D boid flock simulation", long_about = None)]
pub struct Args {
    /// JSON settings file; missing fields fall back to defaults
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Behavior to simulate: none, tag or flock
    #[arg(short, long)]
    pub mode: Option<BehaviorMode>,

    /// Number of agents to spawn
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    pub ticks: u64,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub dt: f32,

    /// Report every Nth frame
    #[arg(short, long, default_value_t = 60)]
    pub every: u64,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

/// What a finished run looked like
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub agents: usize,
    pub reports: usize,
    pub tagged: Option<u32>,
}

/// Read settings from `path`, or use the defaults when no path is given.
pub fn load_settings(path: Option<&Path>) -> Result<FlockSettings> {
    let Some(path) = path else {
        return Ok(FlockSettings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
    log::info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Command-line flags win over the settings file.
pub fn apply_overrides(mut settings: FlockSettings, args: &Args) -> FlockSettings {
    if let Some(mode) = args.mode {
        settings.behavior_mode = mode;
    }
    if let Some(count) = args.count {
        settings.spawn_count = count;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    settings
}

fn summary_line(report: &FrameReport) -> String {
    let count = report.agents.len().max(1) as f32;
    let (mut cx, mut cy, mut cz, mut speed) = (0.0, 0.0, 0.0, 0.0);
    for agent in &report.agents {
        cx += agent.position.x;
        cy += agent.position.y;
        cz += agent.position.z;
        speed += Vector3::from(agent.velocity).length();
    }
    let tagged = report
        .tagged
        .map(|id| format!("#{}", id))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "frame {} t={:.2}s mode={} agents={} tagged={} mean_speed={:.3} centroid=({:.1}, {:.1}, {:.1})",
        report.frame,
        report.elapsed,
        report.mode,
        report.agents.len(),
        tagged,
        speed / count,
        cx / count,
        cy / count,
        cz / count
    )
}

fn emit<W: Write>(out: &mut W, report: &FrameReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Summary => writeln!(out, "{}", summary_line(report))?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Build a manager, spawn a batch and tick it `args.ticks` times, writing a
/// report to `out` every `args.every` frames and after the last one.
pub fn run<W: Write>(settings: FlockSettings, args: &Args, out: &mut W) -> Result<RunSummary> {
    if !(args.dt.is_finite() && args.dt > 0.0) {
        anyhow::bail!("Frame time must be a positive number, got {}", args.dt);
    }

    let mode = settings.behavior_mode;
    let mut manager = FlockManager::new(settings).context("Invalid flock settings")?;
    if manager.is_empty() {
        manager.spawn().context("Failed to spawn agents")?;
    }
    log::info!(
        "Simulating {} agents in {} mode for {} frames",
        manager.len(),
        mode,
        args.ticks
    );

    let every = args.every.max(1);
    let mut reports = 0;
    for frame in 1..=args.ticks {
        manager.tick(args.dt);
        if frame % every == 0 || frame == args.ticks {
            emit(out, &manager.frame_report(), args.format)?;
            reports += 1;
        }
    }
    out.flush()?;

    Ok(RunSummary {
        frames: manager.frame(),
        agents: manager.len(),
        reports,
        tagged: manager.tagged().map(|id| id.get()),
    })
}
