mod commands;
mod render;

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use gamecat_core::{
    config::{self, AppConfig},
    CatalogSync, Notifier, RecordStore, StoreError,
};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

use crate::commands::Command;

/// Curate the game catalog: browse, edit, hide, delete and auto-fix records.
#[derive(Parser, Debug)]
#[command(name = "gamecat", version, about)]
struct Args {
    /// Committed catalog file (overrides the config file).
    #[arg(long, env = "GAMECAT_COMMITTED_PATH")]
    committed: Option<PathBuf>,

    /// Working copy file (overrides the config file).
    #[arg(long, env = "GAMECAT_WORKING_PATH")]
    working: Option<PathBuf>,

    /// Alternative config file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging()?;

    let config_path = match args.config {
        Some(path) => path,
        None => config::ensure_default_config()?,
    };
    let mut config = AppConfig::load_from(&config_path)?;
    if let Some(committed) = args.committed {
        config.committed_path = committed;
    }
    if let Some(working) = args.working {
        config.working_path = working;
    }

    let (notifier, mut notices) = Notifier::channel();
    let mut store = RecordStore::open(CatalogSync::from_config(&config), notifier.clone());
    render::drain_notices(&mut notices);

    let outcome = commands::run(args.command, &mut store, &config, &notifier);
    render::drain_notices(&mut notices);

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            // Store errors were already shown as notices.
            if err.downcast_ref::<StoreError>().is_none() {
                eprintln!("error: {err:#}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("gamecat.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gamecat=info,gamecat_core=info"));

    // Notices are printed by the renderer; the terminal only gets hard errors.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::ERROR);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
