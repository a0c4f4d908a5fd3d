//! rJobTracker library root.
//! Exposes the job registry, the spreadsheet sync adapter, the HTTP API and
//! the CLI dispatcher used by main.rs.

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod sheets;
pub mod ui;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Serve { port } => cli::commands::serve::handle(*port, cfg),
        Commands::Config {
            print_config,
            check,
            migrate,
        } => cli::commands::config::handle(*print_config, *check, *migrate, cfg),
        Commands::Jobs { action } => cli::commands::jobs::handle(action, cfg),
        Commands::Sync { job, file } => cli::commands::sync::handle(job, file, cfg),
        Commands::Log => cli::commands::log::handle(cfg),
    }
}

/// Initialize the `tracing` subscriber on stderr.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
pub fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    // 1️⃣ parse CLI
    let cli = Cli::parse();

    // 2️⃣ load config once
    let mut cfg = Config::load()?;

    // 3️⃣ command-line DB override
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    setup_tracing(&cfg.log_level);

    // 4️⃣ hand everything to the dispatcher
    dispatch(&cli, &cfg)
}
