//! Dock records and partial-merge patches.

/// One fire-extinguisher dock as stored in the dock collection.
///
/// Timestamps are wall-clock unix milliseconds. `weight_kg == None` means
/// the dock has never been weighed.
#[derive(Debug, Clone, PartialEq)]
pub struct Dock {
    /// Store-assigned unique id.
    pub id: String,
    pub name: String,
    pub location: String,
    pub weight_kg: Option<f64>,
    pub expires_at: Option<u64>,
    pub last_reweighed_at: Option<u64>,
    pub updated_at: u64,
    /// Provenance tag written by whichever surface last saved a weight.
    pub last_saved_from: Option<String>,
    /// Derived flag maintained by the reconciler: never reweighed.
    pub needs_reweigh: bool,
    /// Derived flag maintained by the reconciler: expiry imminent.
    pub near_expiry: bool,
}

/// Partial update for a dock record. Fields left as `None` are untouched
/// by `DockRegistry::update` (non-destructive merge).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DockPatch {
    pub weight_kg: Option<f64>,
    pub updated_at: Option<u64>,
    pub last_reweighed_at: Option<u64>,
    pub last_saved_from: Option<String>,
    pub needs_reweigh: Option<bool>,
    pub near_expiry: Option<bool>,
}

impl DockPatch {
    /// True when the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Fields required to create a dock. The store assigns the id and stamps
/// `updated_at`.
#[derive(Debug, Clone)]
pub struct NewDock {
    pub name: String,
    pub location: String,
    pub expires_at: Option<u64>,
}
