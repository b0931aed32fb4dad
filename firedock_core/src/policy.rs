//! Save policies: two variants of one strategy, selected by config.
//!
//! The source system exhibits both behaviors; the coordinator runs either
//! without forking.

use firedock_config::{PolicyCfg, PolicyMode};

/// How a bound session decides to persist a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Every applied sample (re)starts the window; expiry persists the
    /// last applied weight. Deselect cancels.
    Countdown { window_ms: u64 },
    /// The operator triggers the save explicitly; each accepted trigger
    /// closes the gate and suspends live updates for the cooldown,
    /// reopened regardless of persist outcome.
    ManualGated { cooldown_ms: u64 },
}

impl Default for SavePolicy {
    fn default() -> Self {
        SavePolicy::ManualGated { cooldown_ms: 5_000 }
    }
}

impl From<&PolicyCfg> for SavePolicy {
    fn from(cfg: &PolicyCfg) -> Self {
        match cfg.mode {
            PolicyMode::Countdown => SavePolicy::Countdown {
                window_ms: cfg.countdown_ms,
            },
            PolicyMode::Manual => SavePolicy::ManualGated {
                cooldown_ms: cfg.cooldown_ms,
            },
        }
    }
}

/// Cosmetic phase-revert windows. These never affect the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingCfg {
    pub saved_revert_ms: u64,
    pub error_revert_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            saved_revert_ms: 2_000,
            error_revert_ms: 3_000,
        }
    }
}

impl From<&PolicyCfg> for TimingCfg {
    fn from(cfg: &PolicyCfg) -> Self {
        Self {
            saved_revert_ms: cfg.saved_revert_ms,
            error_revert_ms: cfg.error_revert_ms,
        }
    }
}
