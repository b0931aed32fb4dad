//! Boundary traits and plain data types shared across the firedock stack.
//!
//! This crate is dependency-free on purpose: every other crate meets the
//! outside world (the dock store, the shared scale, wall/monotonic time)
//! through the seams defined here.

pub mod clock;
pub mod dock;
pub mod registry;
pub mod scale;

pub use clock::{Clock, MonotonicClock};
pub use dock::{Dock, DockPatch, NewDock};
pub use registry::DockRegistry;
pub use scale::{SampleSource, ScaleFeed, ScaleSample};

/// Boundary error type. Implementations surface whatever they have; typed
/// mapping happens on the consumer side (see `firedock_core::store_error`).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
