//! Blocking session runner for headless surfaces (CLI, kiosk).
//!
//! Drives one select → weigh → save → deselect cycle against an already
//! built coordinator. The interactive dashboard calls the coordinator
//! directly; this loop exists for surfaces without an operator pressing
//! buttons, so under the manual policy it triggers the save itself once
//! the reading has settled.

use crate::error::{Result, SessionError};
use crate::session::SavePhase;
use crate::units::{period_ms, quantize_ckg};
use crate::{SavePolicy, WeighingCoordinator};
use firedock_traits::{Dock, DockRegistry, ScaleFeed};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// Tunables for one runner invocation.
#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Coordinator poll rate.
    pub poll_hz: u32,
    /// Hard cap on the whole session.
    pub max_run_ms: u64,
    /// Manual policy: reading must hold still this long before the
    /// runner triggers the save.
    pub stability_window_ms: u64,
    /// Manual policy: "still" means within this many centi-kg.
    pub stability_band_ckg: i32,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            poll_hz: 20,
            max_run_ms: 60_000,
            stability_window_ms: 1_500,
            stability_band_ckg: 2,
        }
    }
}

/// What one runner invocation produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOutcome {
    /// The persisted weight, if a save completed.
    pub saved_weight_kg: Option<f64>,
    pub elapsed_ms: u64,
}

/// Run one weighing session to completion.
///
/// Returns after a save resolves (`Saved` observed), on shutdown, or
/// with an error on timeout or forced deselect. The dock is always
/// deselected on the way out.
pub fn run_session<R, F>(
    coord: &mut WeighingCoordinator<R, F>,
    dock: &Dock,
    params: RunParams,
    shutdown: &AtomicBool,
) -> Result<SessionOutcome>
where
    R: DockRegistry,
    F: ScaleFeed,
{
    let clock = coord.clock();
    let epoch = clock.now();
    let period = Duration::from_millis(period_ms(params.poll_hz));
    let manual = matches!(coord.policy(), SavePolicy::ManualGated { .. });

    coord.select(dock)?;
    info!(dock = %dock.id, manual, "weighing session started");

    let mut stable_since_ms: Option<u64> = None;
    let mut stable_ckg: i32 = 0;
    let mut triggered = false;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!(dock = %dock.id, "session interrupted");
            coord.deselect();
            return Ok(SessionOutcome {
                saved_weight_kg: None,
                elapsed_ms: clock.ms_since(epoch),
            });
        }

        coord.poll();
        let snap = coord.snapshot();
        let elapsed = clock.ms_since(epoch);

        if snap.selected_dock.is_none() {
            // NotFound mid-save force-deselects without our involvement.
            return Err(eyre::Report::new(SessionError::NotFound(dock.id.clone()))
                .wrap_err("dock vanished during weighing session"));
        }

        if snap.phase == SavePhase::Saved {
            let saved = snap.previous_weight_kg;
            info!(dock = %dock.id, weight = saved, "weighing session complete");
            coord.deselect();
            return Ok(SessionOutcome {
                saved_weight_kg: saved,
                elapsed_ms: elapsed,
            });
        }
        if snap.phase == SavePhase::Error {
            coord.deselect();
            return Err(eyre::Report::new(SessionError::Unreachable(
                "weight save failed".to_string(),
            )));
        }

        if elapsed >= params.max_run_ms {
            coord.deselect();
            return Err(eyre::Report::new(SessionError::State(
                "max session time exceeded".into(),
            )));
        }

        if manual && !triggered {
            let ckg = quantize_ckg(snap.current_weight_kg);
            if ckg > 0 && (ckg - stable_ckg).abs() <= params.stability_band_ckg {
                let since = *stable_since_ms.get_or_insert(elapsed);
                if elapsed.saturating_sub(since) >= params.stability_window_ms {
                    coord.save_weight();
                    triggered = true;
                }
            } else {
                // New plateau; re-anchor.
                stable_ckg = ckg;
                stable_since_ms = (ckg > 0).then_some(elapsed);
            }
        }

        clock.sleep(period);
    }
}
