mod audio;
mod cli;
mod config;
mod gcc;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

use cli::Cli;
use gcc::{Band, GccContext, PipelineConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    if let Some(ref path) = config::discover(cli.config.clone()) {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            apply_config(&mut cli, cfg);
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    if !cli.buffer_size.is_power_of_two() {
        anyhow::bail!("Buffer size must be a power of two, got {}", cli.buffer_size);
    }

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    log::info!("gccphat - GCC-PHAT time delay estimation");
    log::info!("Input: {}", cli.input.display());
    log::info!(
        "Buffer: {} samples, band: {}-{} Hz, PHAT: {}",
        cli.buffer_size,
        cli.fmin,
        cli.fmax,
        !cli.no_phat
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio = audio::decode::decode_stereo(&cli.input)?;
    log::info!("Duration: {:.1}s", audio.duration());

    let nyquist = audio.sample_rate as f64 / 2.0;
    if cli.fmin < 0.0 || cli.fmin >= cli.fmax || cli.fmax > nyquist {
        log::warn!(
            "Band {}-{} Hz is outside 0 <= fmin < fmax <= {} Hz; results may be degenerate",
            cli.fmin,
            cli.fmax,
            nyquist
        );
    }

    // 2. Estimate delays
    let pipeline = PipelineConfig {
        buffer_size: cli.buffer_size,
        band: Band::new(cli.fmin, cli.fmax),
        normalize: !cli.no_phat,
    };
    let mut ctx = GccContext::new(cli.buffer_size, audio.sample_rate, cli.lookup_points)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} windows ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let start = Instant::now();
    let series = gcc::process(
        &mut ctx,
        &audio.left,
        &audio.right,
        audio.sample_rate,
        &pipeline,
        &pb,
    )?;
    let elapsed = start.elapsed();
    pb.finish_and_clear();

    // 3. Report
    if let Some(path) = report::emit(cli.mode, &series, &cli.input, cli.output.as_deref())? {
        log::info!("Time delays written to {}", path.display());
    }

    log::info!("Execution time: {:.3} seconds", elapsed.as_secs_f64());
    Ok(())
}

/// Config values apply only where the CLI is still at its default.
fn apply_config(cli: &mut Cli, cfg: config::Config) {
    let analysis = cfg.analysis;
    if cli.buffer_size == config::default_buffer_size() { cli.buffer_size = analysis.buffer_size; }
    if cli.fmin == config::default_fmin() { cli.fmin = analysis.fmin; }
    if cli.fmax == config::default_fmax() { cli.fmax = analysis.fmax; }
    if !cli.no_phat { cli.no_phat = !analysis.normalize; }
    if cli.lookup_points == config::default_lookup_points() {
        cli.lookup_points = analysis.lookup_points;
    }
    if cli.threads == 0 { cli.threads = analysis.threads; }
    if cli.mode == report::OutputMode::Console { cli.mode = cfg.output.mode; }
    if cli.output.is_none() { cli.output = cfg.output.path; }
}
