//! In-memory session state: which dock is bound to the scale, the live
//! weight, and the save lifecycle phase.

use firedock_traits::Dock;

/// Save lifecycle phase, observable by the presentation layer.
///
/// Countdown policy: `Idle → Countdown → Saving → {Saved, Error} → Idle`.
/// Manual policy: `Idle → Saving → {Saved, Error} → CooldownLocked → Idle`
/// (the cosmetic Saved/Error display hands over to `CooldownLocked` while
/// the gate is still closed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Idle,
    /// Countdown policy only: a save fires when the window elapses with
    /// no new sample.
    Countdown,
    /// A persist call is in flight. At most one per bound dock.
    Saving,
    Saved,
    Error,
    /// Manual policy only: the save gate is closed after a trigger.
    CooldownLocked,
}

/// State of one bound weighing session. Created on select, discarded on
/// deselect. All timers are deadline fields in coordinator-epoch
/// milliseconds; clearing a field cancels the timer.
#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    pub(crate) dock_id: String,
    /// Binding sequence this session was created under. Samples tagged
    /// with any other sequence are stale and must be discarded.
    pub(crate) seq: u64,
    /// Last sample seen while bound. Meaningless once unbound.
    pub(crate) live_kg: f64,
    pub(crate) phase: SavePhase,
    /// Manual policy suspends live updates during the cooldown so the
    /// just-placed item's settling noise cannot re-trigger a save prompt.
    pub(crate) listening: bool,
    pub(crate) can_save: bool,
    /// Countdown policy: when the pending auto-save fires.
    pub(crate) countdown_deadline_ms: Option<u64>,
    /// Manual policy: when the gate reopens and live updates resume.
    pub(crate) gate_reopen_ms: Option<u64>,
    /// Cosmetic: when Saved/Error reverts. Does not affect the gate.
    pub(crate) phase_revert_ms: Option<u64>,
    // Snapshot of the dock's last persisted reading, for display.
    pub(crate) previous_weight_kg: Option<f64>,
    pub(crate) previous_updated_at: Option<u64>,
    pub(crate) previous_reweighed_at: Option<u64>,
}

impl SessionState {
    pub(crate) fn bind(dock: &Dock, seq: u64) -> Self {
        Self {
            dock_id: dock.id.clone(),
            seq,
            live_kg: 0.0,
            phase: SavePhase::Idle,
            listening: true,
            can_save: true,
            countdown_deadline_ms: None,
            gate_reopen_ms: None,
            phase_revert_ms: None,
            previous_weight_kg: dock.weight_kg,
            previous_updated_at: Some(dock.updated_at),
            previous_reweighed_at: dock.last_reweighed_at,
        }
    }

    /// Cancel every scheduled deadline. Called on any transition that
    /// changes the binding.
    pub(crate) fn cancel_timers(&mut self) {
        self.countdown_deadline_ms = None;
        self.gate_reopen_ms = None;
        self.phase_revert_ms = None;
    }
}

/// Observable session state for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub selected_dock: Option<String>,
    /// Last live weight in kg; 0.0 while unbound.
    pub current_weight_kg: f64,
    pub phase: SavePhase,
    pub can_save: bool,
    /// Countdown policy: milliseconds until the pending auto-save.
    pub countdown_remaining_ms: Option<u64>,
    /// The dock's last persisted reading, for "previous weight" display.
    pub previous_weight_kg: Option<f64>,
    pub previous_updated_at: Option<u64>,
}

impl SessionSnapshot {
    pub(crate) fn unbound() -> Self {
        Self {
            selected_dock: None,
            current_weight_kg: 0.0,
            phase: SavePhase::Idle,
            can_save: false,
            countdown_remaining_ms: None,
            previous_weight_kg: None,
            previous_updated_at: None,
        }
    }
}
