//! Cardhost player
//!
//! Runs the solitaire engine WASM module in a window:
//! `cardhost [MODULE] [--config PATH] [--width W] [--height H] [--fullscreen]`

mod app;
mod audio;
mod config;
mod graphics;
mod input;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "cardhost", version, about = "Run the solitaire engine module")]
struct Cli {
    /// Engine module (.wasm); overrides `module.path`
    module: Option<PathBuf>,

    /// Configuration file instead of the platform default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Windowed surface width
    #[arg(long)]
    width: Option<u32>,

    /// Windowed surface height
    #[arg(long)]
    height: Option<u32>,

    /// Start in fullscreen
    #[arg(long)]
    fullscreen: bool,
}

impl Cli {
    fn apply(self, config: &mut config::Config) {
        if let Some(module) = self.module {
            config.module.path = module;
        }
        if let Some(width) = self.width {
            config.video.width = width;
        }
        if let Some(height) = self.height {
            config.video.height = height;
        }
        if self.fullscreen {
            config.video.fullscreen = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.filter)),
        )
        .init();

    anyhow::ensure!(
        config.video.width > 0 && config.video.height > 0,
        "Surface size must be non-zero, got {}x{}",
        config.video.width,
        config.video.height
    );

    let module = std::fs::read(&config.module.path)
        .with_context(|| format!("Failed to read module {}", config.module.path.display()))?;
    tracing::info!(
        "Loaded {} ({} bytes)",
        config.module.path.display(),
        module.len()
    );

    app::App::new(config, module)?.run()
}
