//! Shared test doubles: a spying registry and a scripted scale feed.

#![allow(dead_code)]

use firedock_core::{build_coordinator, SavePolicy, WeighingCoordinator};
use firedock_store::error::StoreError;
use firedock_traits::clock::test_clock::TestClock;
use firedock_traits::{
    BoxError, Dock, DockPatch, DockRegistry, NewDock, SampleSource, ScaleFeed, ScaleSample,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

// ── SpyRegistry ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct RegistryInner {
    docks: BTreeMap<String, Dock>,
    /// Successful merges, in order.
    updates: Vec<(String, DockPatch)>,
    /// Every update call, successful or not.
    attempts: usize,
    unreachable: bool,
    /// Ids that list/get still return but any write rejects as NotFound,
    /// simulating deletion racing a save.
    vanish_on_write: BTreeSet<String>,
}

/// In-memory registry that records every write for assertions and can
/// inject typed store failures.
#[derive(Clone, Default)]
pub struct SpyRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl SpyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, dock: Dock) {
        let mut inner = self.inner.lock().unwrap();
        inner.docks.insert(dock.id.clone(), dock);
    }

    pub fn dock(&self, id: &str) -> Option<Dock> {
        self.inner.lock().unwrap().docks.get(id).cloned()
    }

    /// Successful patches, in application order.
    pub fn updates(&self) -> Vec<(String, DockPatch)> {
        self.inner.lock().unwrap().updates.clone()
    }

    pub fn update_count(&self) -> usize {
        self.inner.lock().unwrap().updates.len()
    }

    /// All update calls, including rejected ones.
    pub fn attempts(&self) -> usize {
        self.inner.lock().unwrap().attempts
    }

    pub fn set_unreachable(&self, down: bool) {
        self.inner.lock().unwrap().unreachable = down;
    }

    /// Keep the dock visible to reads but reject writes with NotFound.
    pub fn vanish_on_write(&self, id: &str) {
        self.inner
            .lock()
            .unwrap()
            .vanish_on_write
            .insert(id.to_string());
    }

    fn merge(dock: &mut Dock, patch: DockPatch) {
        if let Some(w) = patch.weight_kg {
            dock.weight_kg = Some(w);
        }
        if let Some(t) = patch.updated_at {
            dock.updated_at = t;
        }
        if let Some(t) = patch.last_reweighed_at {
            dock.last_reweighed_at = Some(t);
        }
        if let Some(src) = patch.last_saved_from {
            dock.last_saved_from = Some(src);
        }
        if let Some(b) = patch.needs_reweigh {
            dock.needs_reweigh = b;
        }
        if let Some(b) = patch.near_expiry {
            dock.near_expiry = b;
        }
    }
}

impl DockRegistry for SpyRegistry {
    fn get(&mut self, dock_id: &str) -> Result<Dock, BoxError> {
        let inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        inner
            .docks
            .get(dock_id)
            .cloned()
            .ok_or_else(|| Box::new(StoreError::NotFound(dock_id.to_string())) as BoxError)
    }

    fn list(&mut self) -> Result<Vec<Dock>, BoxError> {
        let inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        Ok(inner.docks.values().cloned().collect())
    }

    fn update(&mut self, dock_id: &str, patch: DockPatch) -> Result<(), BoxError> {
        let mut inner = self.inner.lock().unwrap();
        inner.attempts += 1;
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        if inner.vanish_on_write.contains(dock_id) || !inner.docks.contains_key(dock_id) {
            return Err(Box::new(StoreError::NotFound(dock_id.to_string())));
        }
        if let Some(dock) = inner.docks.get_mut(dock_id) {
            Self::merge(dock, patch.clone());
        }
        inner.updates.push((dock_id.to_string(), patch));
        Ok(())
    }

    fn create(&mut self, fields: NewDock) -> Result<Dock, BoxError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        let id = format!("dock-{:04}", inner.docks.len() + 1);
        let dock = Dock {
            id: id.clone(),
            name: fields.name,
            location: fields.location,
            weight_kg: None,
            expires_at: fields.expires_at,
            last_reweighed_at: None,
            updated_at: 0,
            last_saved_from: None,
            needs_reweigh: true,
            near_expiry: false,
        };
        inner.docks.insert(id, dock.clone());
        Ok(dock)
    }

    fn delete(&mut self, dock_id: &str) -> Result<(), BoxError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        match inner.docks.remove(dock_id) {
            Some(_) => Ok(()),
            None => Err(Box::new(StoreError::NotFound(dock_id.to_string()))),
        }
    }
}

// ── ScriptedFeed ─────────────────────────────────────────────────────────────

/// Everything the coordinator did to the feed, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    Flag(bool),
    Subscribe,
}

#[derive(Default)]
struct FeedInner {
    queue: VecDeque<ScaleSample>,
    events: Vec<FeedEvent>,
    fail_subscribe: bool,
    fail_flag: bool,
}

/// Feed whose samples are pushed by the test, delivered one per
/// `latest()` call so delivery timing stays under test control.
#[derive(Clone, Default)]
pub struct ScriptedFeed {
    inner: Arc<Mutex<FeedInner>>,
}

impl ScriptedFeed {
    pub fn push(&self, kg: f64) {
        self.inner.lock().unwrap().queue.push_back(sample(kg));
    }

    pub fn events(&self) -> Vec<FeedEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn flags(&self) -> Vec<bool> {
        self.inner
            .lock()
            .unwrap()
            .events
            .iter()
            .filter_map(|e| match e {
                FeedEvent::Flag(on) => Some(*on),
                FeedEvent::Subscribe => None,
            })
            .collect()
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.inner.lock().unwrap().fail_subscribe = fail;
    }

    pub fn set_fail_flag(&self, fail: bool) {
        self.inner.lock().unwrap().fail_flag = fail;
    }
}

impl ScaleFeed for ScriptedFeed {
    fn subscribe(&mut self) -> Result<Box<dyn SampleSource + Send>, BoxError> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(FeedEvent::Subscribe);
        if inner.fail_subscribe {
            return Err(Box::new(StoreError::Unreachable));
        }
        Ok(Box::new(ScriptedSource {
            inner: self.inner.clone(),
        }))
    }

    fn set_weighing(&mut self, on: bool) -> Result<(), BoxError> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(FeedEvent::Flag(on));
        if inner.fail_flag {
            return Err(Box::new(StoreError::Unreachable));
        }
        Ok(())
    }
}

struct ScriptedSource {
    inner: Arc<Mutex<FeedInner>>,
}

impl SampleSource for ScriptedSource {
    fn latest(&mut self) -> Option<ScaleSample> {
        self.inner.lock().unwrap().queue.pop_front()
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

pub struct Harness {
    pub clock: TestClock,
    pub registry: SpyRegistry,
    pub feed: ScriptedFeed,
    pub coord: WeighingCoordinator<SpyRegistry, ScriptedFeed>,
}

pub fn harness(policy: SavePolicy) -> Harness {
    let clock = TestClock::new();
    let registry = SpyRegistry::new();
    let feed = ScriptedFeed::default();
    let coord = build_coordinator(
        registry.clone(),
        feed.clone(),
        policy,
        None,
        Some(Box::new(clock.clone())),
    )
    .unwrap();
    Harness {
        clock,
        registry,
        feed,
        coord,
    }
}

pub fn dock(id: &str) -> Dock {
    Dock {
        id: id.to_string(),
        name: format!("Extinguisher {id}"),
        location: "Bay 1".to_string(),
        weight_kg: None,
        expires_at: None,
        last_reweighed_at: None,
        updated_at: 1_000,
        last_saved_from: None,
        needs_reweigh: true,
        near_expiry: false,
    }
}

pub fn sample(kg: f64) -> ScaleSample {
    ScaleSample {
        weight_kg: kg,
        at_ms: 0,
        is_weighing: None,
    }
}
