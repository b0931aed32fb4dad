//! Quick Start Demo
//!
//! Demonstrates a complete weighing session against the in-memory store
//! with a simulated scale.

use firedock_core::runner::{run_session, RunParams};
use firedock_core::{build_coordinator, SavePolicy};
use firedock_store::{MemoryStore, SimulatedScale};
use firedock_traits::{DockRegistry, NewDock};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Runs one simulated weighing session against a freshly created dock.
///
/// Run with `cargo run --example quick_start` after wiring this file into
/// a member crate, or treat it as a reading guide to the public API.
fn main() -> Result<(), eyre::Report> {
    let mut store = MemoryStore::new();

    let dock = store
        .create(NewDock {
            name: "Dock A-1".to_string(),
            location: "Building A - Floor 1".to_string(),
            expires_at: None,
        })
        .map_err(|e| eyre::eyre!(e))?;

    // Manual policy: the runner triggers the save once the reading settles.
    let mut coord = build_coordinator(
        store.clone(),
        store.clone(),
        SavePolicy::ManualGated { cooldown_ms: 5_000 },
        None,
        None,
    )?;

    // Stands in for the scale firmware: ramps to 5.5 kg, then holds.
    let _scale = SimulatedScale::spawn(store.clone(), 5.5, 20, Duration::from_millis(50));

    let shutdown = AtomicBool::new(false);
    let outcome = run_session(&mut coord, &dock, RunParams::default(), &shutdown)?;

    match outcome.saved_weight_kg {
        Some(kg) => println!("saved {kg:.2} kg to {} in {} ms", dock.id, outcome.elapsed_ms),
        None => println!("session interrupted, nothing saved"),
    }
    Ok(())
}
