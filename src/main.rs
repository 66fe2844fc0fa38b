mod app;
mod config;
mod filters;
mod ransim;
mod topo;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;

use app::Cli;
use config::RuntimeConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RuntimeConfig::load(cli.config.as_deref(), &cli.overrides())?;
    tracing::info!(
        "Config: state {:?}, topology {:?}",
        config.state_file,
        config.topo_file
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app::run(cli.command, &config, &mut out)?;
    out.flush().context("CLI: Failed to flush output")?;

    Ok(())
}
