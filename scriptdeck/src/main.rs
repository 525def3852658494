//! # scriptdeck
//!
//! Command-line front end for plugin scripts.
//!
//! A plugin is a `.rhai` script in the scripts directory that exports a list
//! operation (`fetch`, or the older `retrieve`) and an action operation
//! (`doActions`). `scriptdeck` loads every script in the directory, shows the
//! items a plugin lists, and runs its action on the item you pick.
//!
//! ## Configuration
//!
//! Reads `$XDG_CONFIG_HOME/scriptdeck/config.toml`, created with documented
//! defaults on first run. The scripts directory is taken from `--dir`, then
//! from the directory stored by `scriptdeck set-dir`, then from the config.
//!
//! ## Running
//!
//! ```bash
//! scriptdeck set-dir ~/plugins
//! scriptdeck plugins
//! scriptdeck items "iTerm Tabs"
//! scriptdeck run "iTerm Tabs" 2
//!
//! # With debug logging
//! RUST_LOG=debug scriptdeck plugins
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scriptdeck::config::Config;
use scriptdeck::session::Session;
use scriptdeck::state::LocalState;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "scriptdeck")]
#[command(
    author,
    version,
    about = "Load plugin scripts, list their items and run their actions"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scripts directory for this run (overrides stored and configured ones)
    #[arg(short, long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Path to config.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded plugins and the scripts that failed to load
    Plugins {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the items of a plugin
    Items {
        /// Plugin display name or file name
        plugin: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a plugin's action on one of its items
    Run {
        /// Plugin display name or file name
        plugin: String,

        /// Item position (1-based) or name
        item: String,
    },

    /// Remember the scripts directory
    SetDir {
        /// Existing directory containing .rhai scripts
        path: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            init_tracing(&config.logging.level);
            config
        }
        None => match Config::load_default() {
            Ok(config) => {
                init_tracing(&config.logging.level);
                config
            }
            Err(e) => {
                let config = Config::default();
                init_tracing(&config.logging.level);
                warn!("Failed to load config, using defaults: {:#}", e);
                config
            }
        },
    };

    let state_path = LocalState::default_path()?;

    match &cli.command {
        // set-dir works without a usable scripts directory or state file.
        Commands::SetDir { path } => {
            let mut state = LocalState::load_or_default(&state_path);
            commands::set_dir::execute(&mut state, &state_path, path)
        }
        Commands::Plugins { json } => {
            let session = Session::open_configured(cli.dir.as_deref(), &config, &state_path)?;
            commands::plugins::execute(&session, *json)
        }
        Commands::Items { plugin, json } => {
            let session = Session::open_configured(cli.dir.as_deref(), &config, &state_path)?;
            commands::items::execute(&session, plugin, *json).await
        }
        Commands::Run { plugin, item } => {
            let session = Session::open_configured(cli.dir.as_deref(), &config, &state_path)?;
            commands::run::execute(&session, plugin, item).await
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
