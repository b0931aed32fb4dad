//! firedock: weighing-station CLI over an in-memory stand-in store.

mod cli;
mod error_fmt;
mod station;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::WrapErr;
use firedock_config::{Config, Logging};
use firedock_store::MemoryStore;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let code = match run() {
        Ok(()) => 0,
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            error_fmt::exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg = load_config(&cli.config)?;
    cfg.validate()?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    let mut store = MemoryStore::new();
    if let Some(seed) = &cli.seed {
        let rows = firedock_config::load_dock_seed_csv(seed)?;
        let count = station::seed_docks(&mut store, &rows)?;
        tracing::info!(count, "seeded docks from CSV");
    }

    match cli.cmd {
        Commands::InitScale => station::cmd_init_scale(&store, cli.json),
        Commands::List => station::cmd_list(&mut store, cli.json),
        Commands::Add {
            name,
            location,
            expires_in_days,
        } => station::cmd_add(&mut store, name, location, expires_in_days, cli.json),
        Commands::Remove { dock } => station::cmd_remove(&mut store, &dock),
        Commands::Import { file } => station::cmd_import(&mut store, &file, cli.json),
        Commands::Reconcile => station::cmd_reconcile(&mut store, &cfg, cli.json),
        Commands::Weigh {
            dock,
            target_kg,
            max_run_ms,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || {
                flag.store(true, Ordering::SeqCst);
            })
            .wrap_err("installing Ctrl-C handler")?;
            station::cmd_weigh(
                &store,
                &cfg,
                &dock,
                target_kg,
                max_run_ms,
                &shutdown,
                cli.json,
            )
        }
        Commands::SelfCheck => station::cmd_self_check(cli.json),
    }
}

/// Missing config file falls back to defaults; a present but broken file
/// is an error.
fn load_config(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file absent, using defaults");
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    firedock_config::load_toml(&text)
        .map_err(|e| eyre::eyre!("parsing config {}: {}", path.display(), e))
}

fn init_tracing(json: bool, log_level: &str, logging: &Logging) -> eyre::Result<()> {
    let level = logging.level.as_deref().unwrap_or(log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Optional JSON-lines file sink, kept alive through FILE_GUARD.
    let file_layer = match &logging.file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map_or_else(|| "firedock.log".to_string(), |n| n.to_string_lossy().into_owned());
            let rotation = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::Rotation::DAILY,
                Some("hourly") => tracing_appender::rolling::Rotation::HOURLY,
                _ => tracing_appender::rolling::Rotation::NEVER,
            };
            let appender = tracing_appender::rolling::RollingFileAppender::new(rotation, dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
    Ok(())
}
