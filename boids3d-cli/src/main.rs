use anyhow::{Context, Result};
use boids3d_cli::{apply_overrides, load_settings, run, Args};
use clap::Parser;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    log::info!("Boid flock starting...");

    let settings = load_settings(args.settings.as_deref())?;
    let settings = apply_overrides(settings, &args);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = run(settings, &args, &mut out).context("Simulation error")?;

    log::info!(
        "Finished {} frames with {} agents ({} reports)",
        summary.frames,
        summary.agents,
        summary.reports
    );
    if let Some(id) = summary.tagged {
        log::info!("Agent #{} ended the run tagged", id);
    }

    Ok(())
}
