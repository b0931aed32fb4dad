//! Dock collection access.

use crate::dock::{Dock, DockPatch, NewDock};
use crate::BoxError;

/// The dock collection, backed by the external store.
///
/// `update` merges non-destructively and must be safe to call concurrently
/// for different dock ids. `create`/`delete` exist for dashboard-style
/// CRUD; the weighing coordinator itself never deletes.
pub trait DockRegistry {
    fn get(&mut self, dock_id: &str) -> Result<Dock, BoxError>;

    /// All docks, in no particular order. Callers sort for presentation.
    fn list(&mut self) -> Result<Vec<Dock>, BoxError>;

    fn update(&mut self, dock_id: &str, patch: DockPatch) -> Result<(), BoxError>;

    fn create(&mut self, fields: NewDock) -> Result<Dock, BoxError>;

    fn delete(&mut self, dock_id: &str) -> Result<(), BoxError>;
}

impl<T: DockRegistry + ?Sized> DockRegistry for Box<T> {
    fn get(&mut self, dock_id: &str) -> Result<Dock, BoxError> {
        (**self).get(dock_id)
    }

    fn list(&mut self) -> Result<Vec<Dock>, BoxError> {
        (**self).list()
    }

    fn update(&mut self, dock_id: &str, patch: DockPatch) -> Result<(), BoxError> {
        (**self).update(dock_id, patch)
    }

    fn create(&mut self, fields: NewDock) -> Result<Dock, BoxError> {
        (**self).create(fields)
    }

    fn delete(&mut self, dock_id: &str) -> Result<(), BoxError> {
        (**self).delete(dock_id)
    }
}
