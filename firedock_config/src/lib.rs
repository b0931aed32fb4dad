#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and dock seed parsing for the weighing station.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The dock seed CSV loader enforces strict headers and reports bad
//!   rows with their line number, for bulk-importing docks.
use serde::Deserialize;

/// Which save policy the coordinator runs. The source system shipped both;
/// they are two variants of one strategy, selected here.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Every new sample restarts a countdown; silence persists the last
    /// applied weight.
    Countdown,
    /// The operator triggers the save; a cooldown gate deduplicates.
    #[default]
    Manual,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PolicyCfg {
    pub mode: PolicyMode,
    /// Countdown policy: silence window before an auto-save fires (ms).
    pub countdown_ms: u64,
    /// Manual policy: gate closure + live-update suspension after a
    /// trigger (ms). Guarantees at most one save per window per dock.
    pub cooldown_ms: u64,
    /// Cosmetic: how long the Saved phase is shown before reverting (ms).
    pub saved_revert_ms: u64,
    /// Cosmetic: how long the Error phase is shown before reverting (ms).
    pub error_revert_ms: u64,
}

impl Default for PolicyCfg {
    fn default() -> Self {
        Self {
            mode: PolicyMode::default(),
            countdown_ms: 3_000,
            cooldown_ms: 5_000,
            saved_revert_ms: 2_000,
            error_revert_ms: 3_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScaleCfg {
    /// Fixed store key of the one physical scale.
    pub sensor_id: String,
    /// How often the session loop drains the feed (Hz).
    pub poll_hz: u32,
}

impl Default for ScaleCfg {
    fn default() -> Self {
        Self {
            sensor_id: "weightSensor/scale1".to_string(),
            poll_hz: 20,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReconcileCfg {
    /// A dock counts as near-expiry when this many days (or fewer) remain.
    pub near_expiry_days: i64,
}

impl Default for ReconcileCfg {
    fn default() -> Self {
        Self { near_expiry_days: 5 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub policy: PolicyCfg,
    pub scale: ScaleCfg,
    pub reconcile: ReconcileCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Policy
        if self.policy.countdown_ms == 0 {
            eyre::bail!("policy.countdown_ms must be >= 1");
        }
        if self.policy.countdown_ms > 5 * 60 * 1000 {
            eyre::bail!("policy.countdown_ms is unreasonably large (>5min)");
        }
        if self.policy.cooldown_ms == 0 {
            eyre::bail!("policy.cooldown_ms must be >= 1");
        }
        if self.policy.cooldown_ms > 5 * 60 * 1000 {
            eyre::bail!("policy.cooldown_ms is unreasonably large (>5min)");
        }
        if self.policy.saved_revert_ms > 60 * 1000 {
            eyre::bail!("policy.saved_revert_ms is unreasonably large (>1min)");
        }
        if self.policy.error_revert_ms > 60 * 1000 {
            eyre::bail!("policy.error_revert_ms is unreasonably large (>1min)");
        }

        // Scale
        if self.scale.sensor_id.trim().is_empty() {
            eyre::bail!("scale.sensor_id must not be empty");
        }
        if self.scale.poll_hz == 0 {
            eyre::bail!("scale.poll_hz must be > 0");
        }
        if self.scale.poll_hz > 1_000 {
            eyre::bail!("scale.poll_hz is unreasonably large (>1kHz)");
        }

        // Reconcile
        if self.reconcile.near_expiry_days < 0 {
            eyre::bail!("reconcile.near_expiry_days must be >= 0");
        }
        if self.reconcile.near_expiry_days > 3_650 {
            eyre::bail!("reconcile.near_expiry_days is unreasonably large (>10y)");
        }

        // Logging
        if let Some(rot) = &self.logging.rotation
            && !matches!(rot.as_str(), "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Dock seed CSV schema.
///
/// Expected headers:
/// name,location,expires_in_days
///
/// Example:
/// name,location,expires_in_days
/// Dock A-1,Building A - Floor 1,365
/// Dock B-2,Building B - Floor 2,30
#[derive(Debug, Deserialize, Clone)]
pub struct DockSeedRow {
    pub name: String,
    pub location: String,
    /// Days from import time until the extinguisher expires. Empty means
    /// no expiry date on record.
    pub expires_in_days: Option<i64>,
}

pub fn load_dock_seed_csv(path: &std::path::Path) -> eyre::Result<Vec<DockSeedRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open dock seed CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["name", "location", "expires_in_days"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "dock seed CSV must have headers 'name,location,expires_in_days', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<DockSeedRow>().enumerate() {
        match rec {
            Ok(row) => {
                if row.name.trim().is_empty() {
                    eyre::bail!("invalid CSV row {}: name must not be empty", idx + 2);
                }
                if row.location.trim().is_empty() {
                    eyre::bail!("invalid CSV row {}: location must not be empty", idx + 2);
                }
                if let Some(days) = row.expires_in_days
                    && days < 0
                {
                    eyre::bail!("invalid CSV row {}: expires_in_days must be >= 0", idx + 2);
                }
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    Ok(rows)
}
