#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Weighing session coordination for fire-extinguisher docks.
//!
//! One physical scale is shared by every dock; the coordinator owns the
//! binding between the currently selected dock and the live scale feed,
//! runs the configured save policy, and writes results back through the
//! dock registry. It is single-threaded and poll-driven: timers are
//! deadline fields checked on `poll()`, with an injected [`Clock`] so
//! tests can drive time deterministically.
//!
//! ```no_run
//! use firedock_core::{Coordinator, SavePolicy};
//! use firedock_store::MemoryStore;
//! use firedock_traits::DockRegistry;
//!
//! let store = MemoryStore::new();
//! let mut coord = Coordinator::builder()
//!     .with_registry(store.clone())
//!     .with_feed(store)
//!     .with_policy(SavePolicy::ManualGated { cooldown_ms: 5_000 })
//!     .build()?;
//! let dock = coord.registry_mut().get("dock-0001").map_err(|e| eyre::eyre!(e))?;
//! coord.select(&dock)?;
//! loop {
//!     coord.poll();
//!     # break;
//! }
//! # Ok::<(), eyre::Report>(())
//! ```

pub mod badges;
pub mod builder;
pub mod error;
pub mod mocks;
pub mod policy;
pub mod reconcile;
pub mod runner;
pub mod session;
pub mod store_error;
pub mod units;

pub use badges::{DerivedFlags, ExpiryBadge, WeightBadge};
pub use builder::{build_coordinator, Coordinator, CoordinatorBuilder};
pub use error::{BuildError, Report, Result, SessionError};
pub use policy::{SavePolicy, TimingCfg};
pub use reconcile::{reconcile, ReconcileReport};
pub use session::{SavePhase, SessionSnapshot};

use crate::session::SessionState;
use crate::store_error::map_store_error;
use crate::units::{ckg_to_kg, quantize_ckg};
use firedock_traits::{Clock, Dock, DockPatch, DockRegistry, SampleSource, ScaleFeed, ScaleSample};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Provenance tag written with every weight saved from this surface.
pub const SAVED_FROM: &str = "station";

/// Coordinates one weighing session at a time against the shared scale.
///
/// At most one dock is bound; selecting another dock first unbinds the
/// current one. All persistence failures resolve to an observable
/// [`SavePhase`], never to a returned error — the session survives a
/// flaky store.
pub struct WeighingCoordinator<R: DockRegistry, F: ScaleFeed> {
    registry: R,
    feed: F,
    policy: SavePolicy,
    timing: TimingCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    /// Origin for all deadline arithmetic; `now_ms()` is measured from here.
    epoch: Instant,
    /// Bumped on every bind *and* unbind. Samples tagged with an older
    /// sequence belonged to a previous binding and are discarded.
    binding_seq: u64,
    session: Option<SessionState>,
    subscription: Option<Box<dyn SampleSource + Send>>,
}

impl<R: DockRegistry, F: ScaleFeed> std::fmt::Debug for WeighingCoordinator<R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeighingCoordinator").finish_non_exhaustive()
    }
}

impl<R: DockRegistry, F: ScaleFeed> WeighingCoordinator<R, F> {
    pub(crate) fn new(
        registry: R,
        feed: F,
        policy: SavePolicy,
        timing: TimingCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let epoch = clock.now();
        Self {
            registry,
            feed,
            policy,
            timing,
            clock,
            epoch,
            binding_seq: 0,
            session: None,
            subscription: None,
        }
    }

    /// Milliseconds since the coordinator was created, per the injected
    /// clock. All deadlines live on this axis.
    fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        Arc::clone(&self.clock)
    }

    pub fn policy(&self) -> SavePolicy {
        self.policy
    }

    /// Direct registry access for surfaces that share the coordinator's
    /// store handle (dashboard CRUD, reconciliation).
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn bound_dock_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.dock_id.as_str())
    }

    /// Current binding sequence. Samples must carry the sequence they
    /// were observed under; see [`Self::apply_sample`].
    pub fn binding_seq(&self) -> u64 {
        self.binding_seq
    }

    /// Select a dock for weighing. Selecting the already-bound dock is a
    /// toggle and deselects instead.
    ///
    /// Ordering: the weighing flag goes true before the feed subscription
    /// is opened, so hardware never sees samples consumed while it still
    /// believes the scale is idle. A flag write failure is logged and
    /// tolerated; a subscription failure aborts the select.
    pub fn select(&mut self, dock: &Dock) -> Result<()> {
        if self.bound_dock_id() == Some(dock.id.as_str()) {
            self.deselect();
            return Ok(());
        }
        if self.session.is_some() {
            self.unbind();
        }

        self.binding_seq += 1;
        let seq = self.binding_seq;

        if let Err(e) = self.feed.set_weighing(true) {
            warn!(dock = %dock.id, error = %e, "weighing flag on-write failed, continuing");
        }
        let source = match self.feed.subscribe() {
            Ok(s) => s,
            Err(e) => {
                let mapped = map_store_error(e.as_ref());
                // Roll the flag back; nobody is listening.
                if let Err(e2) = self.feed.set_weighing(false) {
                    warn!(error = %e2, "weighing flag rollback failed");
                }
                return Err(eyre::Report::new(mapped)
                    .wrap_err(format!("subscribing scale feed for dock {}", dock.id)));
            }
        };

        info!(dock = %dock.id, seq, "dock selected");
        self.subscription = Some(source);
        self.session = Some(SessionState::bind(dock, seq));
        Ok(())
    }

    /// Unbind the current dock, if any. Infallible: flag write failures
    /// are logged, the local teardown always completes.
    pub fn deselect(&mut self) {
        if self.session.is_some() {
            self.unbind();
        }
    }

    /// Flag off first, then teardown, so hardware sees "off" promptly
    /// even if dropping the subscription is slow.
    fn unbind(&mut self) {
        if let Err(e) = self.feed.set_weighing(false) {
            warn!(error = %e, "weighing flag off-write failed");
        }
        if let Some(mut s) = self.session.take() {
            s.cancel_timers();
            info!(dock = %s.dock_id, "dock deselected");
        }
        self.subscription = None;
        self.binding_seq += 1;
    }

    /// One coordinator reaction: drain the newest sample, then run due
    /// timers. Samples are applied before deadlines are checked, so a
    /// sample landing exactly on a countdown boundary restarts the window
    /// instead of firing it.
    pub fn poll(&mut self) {
        let seq = self.binding_seq;
        let sample = self.subscription.as_mut().and_then(|s| s.latest());
        if let Some(sample) = sample {
            self.apply_sample(seq, sample);
        }
        let now = self.now_ms();
        self.tick(now);
    }

    /// Apply one delivered sample, tagged with the binding sequence it
    /// was observed under. Public so tests and alternative drivers can
    /// inject delivery interleavings `poll()` cannot produce.
    pub fn apply_sample(&mut self, seq: u64, sample: ScaleSample) {
        let now = self.now_ms();
        let policy = self.policy;
        let Some(s) = &mut self.session else {
            debug!(weight = sample.weight_kg, "sample while unbound, discarded");
            return;
        };
        if s.seq != seq {
            debug!(stale = seq, current = s.seq, "stale sample discarded");
            return;
        }
        if !s.listening {
            return;
        }

        let changed = quantize_ckg(sample.weight_kg) != quantize_ckg(s.live_kg);
        s.live_kg = sample.weight_kg;
        // Only a changed reading (at 2-decimal precision) restarts the
        // window; the store echoes every write, including identical ones,
        // and a held weight must be allowed to settle into a save.
        if changed && s.phase != SavePhase::Saving {
            if let SavePolicy::Countdown { window_ms } = policy {
                s.phase = SavePhase::Countdown;
                s.phase_revert_ms = None;
                s.countdown_deadline_ms = Some(now + window_ms);
            }
        }
    }

    /// Manual policy: operator pressed save. Rejections are silent
    /// (logged at debug): no bound dock, non-positive weight, closed
    /// gate, or a persist already in flight.
    pub fn save_weight(&mut self) {
        let SavePolicy::ManualGated { cooldown_ms } = self.policy else {
            debug!("save_weight ignored under countdown policy");
            return;
        };
        let now = self.now_ms();
        let Some(s) = &mut self.session else {
            debug!("save_weight while unbound, ignored");
            return;
        };
        if s.phase == SavePhase::Saving {
            debug!(dock = %s.dock_id, "save already in flight, ignored");
            return;
        }
        if !s.can_save {
            debug!(dock = %s.dock_id, "save gate closed, ignored");
            return;
        }
        if quantize_ckg(s.live_kg) <= 0 {
            debug!(dock = %s.dock_id, weight = s.live_kg, "non-positive weight, ignored");
            return;
        }

        // Close the gate and suspend live updates before touching the
        // store; the reopen deadline runs regardless of persist outcome.
        s.can_save = false;
        s.listening = false;
        s.gate_reopen_ms = Some(now + cooldown_ms);
        let dock_id = s.dock_id.clone();
        let kg = s.live_kg;
        self.persist(&dock_id, kg, now);
    }

    /// Write one weight to the bound dock. Never returns an error: the
    /// outcome lands in the session phase, and `NotFound` forces a
    /// deselect.
    fn persist(&mut self, dock_id: &str, kg: f64, now: u64) {
        let ckg = quantize_ckg(kg);
        if ckg <= 0 {
            if let Some(s) = &mut self.session {
                s.phase = SavePhase::Idle;
            }
            return;
        }
        let Some(s) = &mut self.session else {
            return;
        };
        s.phase = SavePhase::Saving;
        let first_weigh = s.previous_reweighed_at.is_none();

        let wall = self.clock.wall_ms();
        let rounded = ckg_to_kg(ckg);
        let patch = DockPatch {
            weight_kg: Some(rounded),
            updated_at: Some(wall),
            last_reweighed_at: first_weigh.then_some(wall),
            last_saved_from: Some(SAVED_FROM.to_string()),
            needs_reweigh: first_weigh.then_some(false),
            near_expiry: None,
        };

        match self.registry.update(dock_id, patch) {
            Ok(()) => {
                info!(dock = %dock_id, weight = rounded, "weight saved");
                if let Some(s) = &mut self.session {
                    s.phase = SavePhase::Saved;
                    s.phase_revert_ms = Some(now + self.timing.saved_revert_ms);
                    s.previous_weight_kg = Some(rounded);
                    s.previous_updated_at = Some(wall);
                    if first_weigh {
                        s.previous_reweighed_at = Some(wall);
                    }
                }
            }
            Err(e) => match map_store_error(e.as_ref()) {
                SessionError::NotFound(_) => {
                    warn!(dock = %dock_id, "dock vanished during save, forcing deselect");
                    self.unbind();
                }
                other => {
                    error!(dock = %dock_id, error = %other, "weight save failed");
                    if let Some(s) = &mut self.session {
                        s.phase = SavePhase::Error;
                        s.phase_revert_ms = Some(now + self.timing.error_revert_ms);
                    }
                }
            },
        }
    }

    /// Run every deadline that is due at `now`. Order: countdown fire,
    /// cosmetic phase revert, gate reopen.
    fn tick(&mut self, now: u64) {
        let mut fire = None;
        if let Some(s) = &mut self.session {
            if s.phase == SavePhase::Countdown && s.countdown_deadline_ms.is_some_and(|d| now >= d)
            {
                s.countdown_deadline_ms = None;
                fire = Some((s.dock_id.clone(), s.live_kg));
            }
        }
        if let Some((dock_id, kg)) = fire {
            self.persist(&dock_id, kg, now);
        }

        if let Some(s) = &mut self.session {
            if s.phase_revert_ms.is_some_and(|d| now >= d) {
                s.phase_revert_ms = None;
                s.phase = if s.gate_reopen_ms.is_some() {
                    SavePhase::CooldownLocked
                } else {
                    SavePhase::Idle
                };
            }
            if s.gate_reopen_ms.is_some_and(|d| now >= d) {
                s.gate_reopen_ms = None;
                s.can_save = true;
                s.listening = true;
                if s.phase == SavePhase::CooldownLocked {
                    s.phase = SavePhase::Idle;
                }
                debug!(dock = %s.dock_id, "save gate reopened");
            }
        }
    }

    /// Observable state for the presentation layer.
    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.now_ms();
        match &self.session {
            None => SessionSnapshot::unbound(),
            Some(s) => SessionSnapshot {
                selected_dock: Some(s.dock_id.clone()),
                current_weight_kg: s.live_kg,
                phase: s.phase,
                can_save: s.can_save,
                countdown_remaining_ms: s.countdown_deadline_ms.map(|d| d.saturating_sub(now)),
                previous_weight_kg: s.previous_weight_kg,
                previous_updated_at: s.previous_updated_at,
            },
        }
    }
}

impl<R: DockRegistry, F: ScaleFeed> Drop for WeighingCoordinator<R, F> {
    /// A dropped coordinator must not leave hardware believing a session
    /// is live.
    fn drop(&mut self) {
        if self.session.is_some() {
            self.unbind();
        }
    }
}
