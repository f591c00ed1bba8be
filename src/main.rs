//! Binary entrypoint for the shader slider.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use shader_slider::config::Configuration;

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "shader-slider", about = "GPU-shaded looping image slider")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override time per image (ms)
    #[arg(long, value_name = "MILLIS")]
    dwell_ms: Option<u64>,

    /// Override transition duration (ms)
    #[arg(long, value_name = "MILLIS")]
    transition_ms: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("shader_slider={}", level).parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(ms) = cli.dwell_ms {
        cfg.dwell_ms = ms;
    }
    if let Some(ms) = cli.transition_ms {
        cfg.transition_ms = ms;
    }
    let cfg = cfg.validated().context("validating configuration")?;
    info!(
        count = cfg.images.len(),
        dwell_ms = cfg.dwell_ms,
        transition_ms = cfg.transition_ms,
        "configuration loaded"
    );

    shader_slider::render::viewer::run(cfg)
}
