//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "firedock", version, about = "Fire-extinguisher dock weighing station")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/firedock.toml")]
    pub config: PathBuf,

    /// Optional dock seed CSV loaded into the in-memory store at startup
    /// (strict header: name,location,expires_in_days)
    #[arg(long, value_name = "FILE")]
    pub seed: Option<PathBuf>,

    /// Emit JSON on stdout and log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seed the shared scale record (weight 0, status "ready")
    InitScale,
    /// List docks with weight and expiry badges
    List,
    /// Create a dock
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
        /// Days until the extinguisher expires; omit for no expiry date
        #[arg(long, value_name = "DAYS")]
        expires_in_days: Option<u32>,
    },
    /// Delete a dock
    Remove {
        /// Dock id, e.g. dock-0001
        #[arg(long)]
        dock: String,
    },
    /// Bulk-import docks from a seed CSV (strict header)
    Import {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
    /// Recompute derived dock flags (needs_reweigh, near_expiry)
    Reconcile,
    /// Run one weighing session against a dock using the simulated scale
    Weigh {
        /// Dock id, e.g. dock-0001
        #[arg(long)]
        dock: String,
        /// Weight the simulated scale settles at
        #[arg(long, value_name = "KG", default_value_t = 5.5)]
        target_kg: f64,
        /// Override: max session time in ms
        #[arg(long, value_name = "MS")]
        max_run_ms: Option<u64>,
    },
    /// Quick health check (store round-trip, feed delivery)
    SelfCheck,
}
