//! Countdown save policy: samples restart a window, silence persists.

mod common;

use common::{dock, harness, Harness};
use firedock_core::{SavePhase, SavePolicy};
use std::time::Duration;

const WINDOW_MS: u64 = 3_000;

fn countdown_harness() -> Harness {
    harness(SavePolicy::Countdown {
        window_ms: WINDOW_MS,
    })
}

#[test]
fn silence_after_samples_persists_once_with_last_weight() {
    let mut h = countdown_harness();
    let d = dock("dock-0001");
    h.registry.insert(d.clone());
    h.coord.select(&d).unwrap();

    // Samples at t=0, t=1s, t=2s, each with a different weight.
    h.feed.push(2.0);
    h.coord.poll();
    h.clock.advance(Duration::from_millis(1_000));
    h.feed.push(2.1);
    h.coord.poll();
    h.clock.advance(Duration::from_millis(1_000));
    h.feed.push(2.22);
    h.coord.poll();
    assert_eq!(
        h.coord.snapshot().countdown_remaining_ms,
        Some(WINDOW_MS)
    );

    // One tick before the window elapses: nothing saved.
    h.clock.advance(Duration::from_millis(WINDOW_MS - 1));
    h.coord.poll();
    assert!(h.registry.updates().is_empty());

    // Window elapses at t=5s: exactly one persist, with the t=2s weight.
    h.clock.advance(Duration::from_millis(1));
    h.coord.poll();
    let ups = h.registry.updates();
    assert_eq!(ups.len(), 1);
    assert_eq!(ups[0].0, "dock-0001");
    assert_eq!(ups[0].1.weight_kg, Some(2.22));
    assert_eq!(h.coord.snapshot().phase, SavePhase::Saved);

    // Silence afterwards never saves again.
    h.clock.advance(Duration::from_secs(30));
    h.coord.poll();
    assert_eq!(h.registry.update_count(), 1);
}

#[test]
fn sample_on_the_boundary_restarts_instead_of_firing() {
    let mut h = countdown_harness();
    let d = dock("dock-0001");
    h.registry.insert(d.clone());
    h.coord.select(&d).unwrap();

    h.feed.push(2.0);
    h.coord.poll();

    // A sample landing exactly on the deadline restarts the window,
    // never both fires and restarts.
    h.clock.advance(Duration::from_millis(WINDOW_MS));
    h.feed.push(2.5);
    h.coord.poll();
    assert!(h.registry.updates().is_empty());
    assert_eq!(h.coord.snapshot().phase, SavePhase::Countdown);

    h.clock.advance(Duration::from_millis(WINDOW_MS));
    h.coord.poll();
    let ups = h.registry.updates();
    assert_eq!(ups.len(), 1);
    assert_eq!(ups[0].1.weight_kg, Some(2.5));
}

#[test]
fn deselect_cancels_a_pending_countdown() {
    let mut h = countdown_harness();
    let d = dock("dock-0001");
    h.registry.insert(d.clone());
    h.coord.select(&d).unwrap();

    h.feed.push(3.3);
    h.coord.poll();
    h.coord.deselect();

    h.clock.advance(Duration::from_secs(10));
    h.coord.poll();
    assert!(h.registry.updates().is_empty());
    assert_eq!(h.feed.flags().last(), Some(&false));
}

#[test]
fn non_positive_weight_is_never_persisted() {
    let mut h = countdown_harness();
    let d = dock("dock-0001");
    h.registry.insert(d.clone());
    h.coord.select(&d).unwrap();

    // Negative noise arms the countdown but the fire is rejected.
    h.feed.push(-0.25);
    h.coord.poll();
    h.clock.advance(Duration::from_millis(WINDOW_MS));
    h.coord.poll();

    assert_eq!(h.registry.attempts(), 0);
    assert_eq!(h.coord.snapshot().phase, SavePhase::Idle);
}

#[test]
fn repeated_identical_readings_do_not_restart_the_window() {
    let mut h = countdown_harness();
    let d = dock("dock-0001");
    h.registry.insert(d.clone());
    h.coord.select(&d).unwrap();

    // The store echoes every write; a held weight must still settle.
    h.feed.push(4.5);
    h.coord.poll();
    for _ in 0..5 {
        h.clock.advance(Duration::from_millis(1_000));
        h.feed.push(4.5);
        h.coord.poll();
    }

    assert_eq!(h.registry.update_count(), 1);
    assert_eq!(h.registry.updates()[0].1.weight_kg, Some(4.5));
}

#[test]
fn dock_vanishing_mid_save_forces_deselect() {
    let mut h = countdown_harness();
    let d = dock("dock-0001");
    h.registry.insert(d.clone());
    h.coord.select(&d).unwrap();

    h.feed.push(3.0);
    h.coord.poll();
    h.registry.vanish_on_write("dock-0001");

    h.clock.advance(Duration::from_millis(WINDOW_MS));
    h.coord.poll();

    assert_eq!(h.coord.bound_dock_id(), None);
    assert_eq!(h.registry.attempts(), 1);
    assert_eq!(h.feed.flags().last(), Some(&false));

    // No further persist attempts against the vanished id.
    h.feed.push(3.5);
    h.clock.advance(Duration::from_secs(10));
    h.coord.poll();
    assert_eq!(h.registry.attempts(), 1);
}

#[test]
fn save_weight_is_a_noop_under_countdown_policy() {
    let mut h = countdown_harness();
    let d = dock("dock-0001");
    h.registry.insert(d.clone());
    h.coord.select(&d).unwrap();

    h.feed.push(5.0);
    h.coord.poll();
    h.coord.save_weight();
    assert_eq!(h.registry.attempts(), 0);
}
