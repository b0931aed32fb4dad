//! Pure dock-record → badge derivations for presentation layers.
//!
//! Everything here is a pure function of a [`Dock`] and a reference
//! wall-clock instant; no store access, no side effects. The reconciler
//! reuses [`derive_flags`] so the persisted flags and the displayed
//! badges can never disagree.

use crate::units::MILLIS_PER_SEC;
use firedock_traits::Dock;

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * MILLIS_PER_SEC;

/// Weight health category for the dashboard card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightBadge {
    /// Never weighed; nothing to categorize.
    Unknown,
    Good,
    Medium,
    Low,
}

impl WeightBadge {
    pub fn for_weight(weight_kg: Option<f64>) -> Self {
        match weight_kg {
            None => Self::Unknown,
            Some(w) if w >= 5.0 => Self::Good,
            Some(w) if w >= 4.0 => Self::Medium,
            Some(_) => Self::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Good => "good",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Expiry category for the dashboard card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryBadge {
    /// No expiry date recorded.
    Unknown,
    Expired,
    /// 30 days or less remaining.
    Soon,
    Ok,
}

impl ExpiryBadge {
    pub fn for_days_left(days_left: Option<i64>) -> Self {
        match days_left {
            None => Self::Unknown,
            Some(d) if d <= 0 => Self::Expired,
            Some(d) if d <= 30 => Self::Soon,
            Some(_) => Self::Ok,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Expired => "expired",
            Self::Soon => "soon",
            Self::Ok => "ok",
        }
    }
}

/// Whole days until `expires_at`, floored. A dock expiring later today
/// reports 0; one that expired within the past day reports -1.
pub fn days_until(expires_at: Option<u64>, now_wall_ms: u64) -> Option<i64> {
    let exp = expires_at?;
    let millis = i128::from(exp) - i128::from(now_wall_ms);
    Some(millis.div_euclid(i128::from(MILLIS_PER_DAY)) as i64)
}

/// Derived store flags, recomputed idempotently by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedFlags {
    /// Never reweighed since commissioning.
    pub needs_reweigh: bool,
    /// Expiry within the configured horizon (or already past).
    pub near_expiry: bool,
}

/// Compute the derived flags for one dock. Same inputs, same outputs;
/// never consults the store.
pub fn derive_flags(dock: &Dock, now_wall_ms: u64, near_expiry_days: u32) -> DerivedFlags {
    let needs_reweigh = dock.last_reweighed_at.is_none();
    let near_expiry = days_until(dock.expires_at, now_wall_ms)
        .is_some_and(|d| d <= i64::from(near_expiry_days));
    DerivedFlags {
        needs_reweigh,
        near_expiry,
    }
}
