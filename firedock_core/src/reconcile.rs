//! Explicit, idempotent reconciliation of derived dock flags.
//!
//! The source system recomputed `needs_reweigh`/`near_expiry` as a side
//! effect of rendering the dashboard, writing to the store on every
//! refresh. Here the same derivation runs as a scheduled pass: pure
//! recompute per dock, patch only the docks whose stored flags differ.
//! Running it twice in a row writes nothing the second time.

use crate::badges::derive_flags;
use crate::error::Result;
use crate::store_error::map_store_error;
use crate::SessionError;
use firedock_traits::{Clock, DockPatch, DockRegistry};
use tracing::{debug, info};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub examined: usize,
    pub patched: usize,
    /// Docks that vanished between list and update. Not an error; the
    /// next pass simply will not see them.
    pub vanished: usize,
}

/// Recompute derived flags for every dock and patch the ones that
/// changed. Never touches `updated_at`: flag maintenance is not a data
/// edit and must not masquerade as one.
pub fn reconcile<R: DockRegistry>(
    registry: &mut R,
    clock: &dyn Clock,
    near_expiry_days: u32,
) -> Result<ReconcileReport> {
    let now_wall = clock.wall_ms();
    let docks = registry
        .list()
        .map_err(|e| eyre::Report::new(map_store_error(e.as_ref())))?;

    let mut report = ReconcileReport {
        examined: docks.len(),
        ..ReconcileReport::default()
    };

    for dock in &docks {
        let flags = derive_flags(dock, now_wall, near_expiry_days);
        let patch = DockPatch {
            needs_reweigh: (flags.needs_reweigh != dock.needs_reweigh)
                .then_some(flags.needs_reweigh),
            near_expiry: (flags.near_expiry != dock.near_expiry).then_some(flags.near_expiry),
            ..DockPatch::default()
        };
        if patch.is_empty() {
            continue;
        }
        match registry.update(&dock.id, patch) {
            Ok(()) => report.patched += 1,
            Err(e) => match map_store_error(e.as_ref()) {
                SessionError::NotFound(_) => {
                    debug!(dock = %dock.id, "dock deleted mid-reconcile, skipped");
                    report.vanished += 1;
                }
                other => return Err(eyre::Report::new(other).wrap_err("patching derived flags")),
            },
        }
    }

    info!(
        examined = report.examined,
        patched = report.patched,
        "reconcile pass complete"
    );
    Ok(report)
}
