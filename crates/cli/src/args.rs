//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// fastly-tls: plan and apply Fastly TLS subscriptions from resource files
#[derive(Parser, Debug)]
#[command(name = "fastly-tls")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resource schema
    Schema(SchemaArgs),

    /// Show what applying a resource file would change
    Plan(PlanArgs),

    /// Create, update or replace the subscription to match a resource file
    Apply(ApplyArgs),

    /// Re-read the subscription and update local state
    Refresh(StateArgs),

    /// Adopt an existing subscription into local state
    Import(ImportArgs),

    /// Delete the subscription and clear local state
    Destroy(StateArgs),

    /// Print local state
    Show(ShowArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Resource file (TOML)
    #[arg(long, short = 'f')]
    pub resource: PathBuf,

    /// Override state file
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Resource file (TOML)
    #[arg(long, short = 'f')]
    pub resource: PathBuf,

    /// Override state file
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StateArgs {
    /// Override state file
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Subscription ID
    pub id: String,

    /// Override state file
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Override state file
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Print the legacy flat key/value form
    #[arg(long, conflicts_with = "json")]
    pub flat: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./fastly-tls.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
