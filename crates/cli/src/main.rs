//! fastly-tls CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; --log-level wins over [general] log_level
    let log_level = match cli.log_level.clone() {
        Some(level) => level,
        None => config::AppConfig::configured_log_level(cli.config.as_deref()),
    };
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::Schema(args) => commands::schema::execute(args),
        Commands::Plan(args) => commands::plan::execute(args, cli.config).await,
        Commands::Apply(args) => commands::apply::execute(args, cli.config).await,
        Commands::Refresh(args) => commands::refresh::execute(args, cli.config).await,
        Commands::Import(args) => commands::import::execute(args, cli.config).await,
        Commands::Destroy(args) => commands::destroy::execute(args, cli.config).await,
        Commands::Show(args) => commands::show::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
