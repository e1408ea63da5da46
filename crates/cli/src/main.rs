//! mcache - model cache sizing for Gradle workspaces

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

/// Keep a model cache sized for the Gradle builds of a workspace
#[derive(Parser)]
#[command(name = "mcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/modelcache/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the cache size required by the builds under a directory
    Size {
        /// Workspace root (default: current directory)
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Emit a JSON report
        #[arg(long)]
        json: bool,
    },
    /// Watch a directory and resize the cache whenever a build changes
    Watch {
        /// Workspace root (default: current directory)
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Stop after this many seconds (default: run until interrupted)
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Show configuration
    Config {
        /// Print the configuration file path
        #[arg(long, conflicts_with = "example")]
        path: bool,

        /// Print an example configuration file
        #[arg(long)]
        example: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Size { dir, json } => cmd::size::run(&dir, config_path, json),
        Commands::Watch { dir, duration } => cmd::watch::run(&dir, config_path, duration),
        Commands::Config { path, example } => {
            if example {
                cmd::config::run_example()
            } else if path {
                cmd::config::run_path()
            } else {
                cmd::config::run_show(config_path)
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
