#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! In-process stand-in for the external key-value store.
//!
//! The production system keeps docks and the shared scale record in a
//! hosted realtime database; this crate plays that collaborator locally.
//! `MemoryStore` implements both boundary traits:
//!
//! - `DockRegistry`: dock CRUD with non-destructive partial-merge updates
//!   and store-assigned ids.
//! - `ScaleFeed`: change notifications for the single scale record
//!   (`weightSensor/scale1`), delivered last-write-wins.
//!
//! `set_unreachable(true)` makes every operation fail with
//! `StoreError::Unreachable`, which is how tests exercise the
//! coordinator's error phases. `SimulatedScale` pushes a settling weight
//! curve into the store the way the ESP32 firmware would.

pub mod error;

use crossbeam_channel as xch;
use error::StoreError;
use firedock_traits::{
    BoxError, Dock, DockPatch, DockRegistry, NewDock, SampleSource, ScaleFeed, ScaleSample,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Fixed key of the one physical scale for the whole system.
pub const SCALE_SENSOR_ID: &str = "weightSensor/scale1";

/// The scale record as stored. Single global instance; docks share it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleRecord {
    pub weight_kg: f64,
    pub at_ms: u64,
    pub is_weighing: bool,
    pub status: String,
}

impl Default for ScaleRecord {
    fn default() -> Self {
        Self {
            weight_kg: 0.0,
            at_ms: 0,
            is_weighing: false,
            status: "ready".to_string(),
        }
    }
}

struct Inner {
    docks: BTreeMap<String, Dock>,
    next_id: u64,
    scale: ScaleRecord,
    subscribers: Vec<xch::Sender<ScaleSample>>,
    unreachable: bool,
}

/// Cloneable handle to the shared store. Clones see the same data, like
/// independent clients of one database.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn wall_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                docks: BTreeMap::new(),
                next_id: 1,
                scale: ScaleRecord::default(),
                subscribers: Vec::new(),
                unreachable: false,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned store mutex means a client panicked mid-write; the
        // data itself is still coherent (every write is a single merge).
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Simulate the store becoming unreachable (network down, auth lapse).
    /// While set, every registry and feed operation fails; subscriptions
    /// simply deliver nothing new.
    pub fn set_unreachable(&self, down: bool) {
        self.lock().unreachable = down;
    }

    /// Seed the scale record the way the provisioning script does:
    /// weight 0, fresh timestamp, status "ready".
    pub fn init_scale(&self, at_ms: u64) -> error::Result<()> {
        let mut inner = self.lock();
        if inner.unreachable {
            return Err(StoreError::Unreachable);
        }
        inner.scale = ScaleRecord {
            weight_kg: 0.0,
            at_ms,
            is_weighing: false,
            status: "ready".to_string(),
        };
        let sample = ScaleSample {
            weight_kg: 0.0,
            at_ms,
            is_weighing: Some(false),
        };
        Self::notify(&mut inner, sample);
        Ok(())
    }

    /// Hardware push path: the scale firmware writing a new reading.
    /// Notifies every live subscriber; a dead store drops the write.
    pub fn publish_weight(&self, weight_kg: f64, at_ms: u64) -> error::Result<()> {
        let mut inner = self.lock();
        if inner.unreachable {
            return Err(StoreError::Unreachable);
        }
        inner.scale.weight_kg = weight_kg;
        inner.scale.at_ms = at_ms;
        let sample = ScaleSample {
            weight_kg,
            at_ms,
            is_weighing: Some(inner.scale.is_weighing),
        };
        Self::notify(&mut inner, sample);
        Ok(())
    }

    /// Current scale record (dashboard/debug view).
    pub fn scale_record(&self) -> ScaleRecord {
        self.lock().scale.clone()
    }

    fn notify(inner: &mut Inner, sample: ScaleSample) {
        // Drop subscribers whose receiver is gone.
        inner
            .subscribers
            .retain(|tx| match tx.send(sample) {
                Ok(()) => true,
                Err(_) => {
                    tracing::trace!("dropping disconnected scale subscriber");
                    false
                }
            });
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

impl DockRegistry for MemoryStore {
    fn get(&mut self, dock_id: &str) -> Result<Dock, BoxError> {
        let inner = self.lock();
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
        let inner = self.lock();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        Ok(inner.docks.values().cloned().collect())
    }

    fn update(&mut self, dock_id: &str, patch: DockPatch) -> Result<(), BoxError> {
        let mut inner = self.lock();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        match inner.docks.get_mut(dock_id) {
            Some(dock) => {
                Self::merge(dock, patch);
                Ok(())
            }
            None => Err(Box::new(StoreError::NotFound(dock_id.to_string()))),
        }
    }

    fn create(&mut self, fields: NewDock) -> Result<Dock, BoxError> {
        let mut inner = self.lock();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        let id = format!("dock-{:04}", inner.next_id);
        inner.next_id += 1;
        let dock = Dock {
            id: id.clone(),
            name: fields.name,
            location: fields.location,
            weight_kg: None,
            expires_at: fields.expires_at,
            last_reweighed_at: None,
            updated_at: wall_ms_now(),
            last_saved_from: None,
            needs_reweigh: true,
            near_expiry: false,
        };
        inner.docks.insert(id, dock.clone());
        Ok(dock)
    }

    fn delete(&mut self, dock_id: &str) -> Result<(), BoxError> {
        let mut inner = self.lock();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        match inner.docks.remove(dock_id) {
            Some(_) => Ok(()),
            None => Err(Box::new(StoreError::NotFound(dock_id.to_string()))),
        }
    }
}

/// Receiver end of a scale subscription. Coalesces at the consumer: only
/// the newest delivery survives a `latest()` call.
struct MemorySubscription {
    rx: xch::Receiver<ScaleSample>,
}

impl SampleSource for MemorySubscription {
    fn latest(&mut self) -> Option<ScaleSample> {
        self.rx.try_iter().last()
    }
}

impl ScaleFeed for MemoryStore {
    fn subscribe(&mut self) -> Result<Box<dyn SampleSource + Send>, BoxError> {
        let mut inner = self.lock();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        let (tx, rx) = xch::unbounded();
        inner.subscribers.push(tx);
        Ok(Box::new(MemorySubscription { rx }))
    }

    fn set_weighing(&mut self, on: bool) -> Result<(), BoxError> {
        let mut inner = self.lock();
        if inner.unreachable {
            return Err(Box::new(StoreError::Unreachable));
        }
        inner.scale.is_weighing = on;
        let sample = ScaleSample {
            weight_kg: inner.scale.weight_kg,
            at_ms: inner.scale.at_ms,
            is_weighing: Some(on),
        };
        Self::notify(&mut inner, sample);
        Ok(())
    }
}

/// Background publisher that stands in for the scale firmware: ramps the
/// published weight toward a target, then holds it steady.
///
/// Exactly one thread per instance, signalled and joined on drop so no
/// publish can land after the owner is gone.
pub struct SimulatedScale {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl SimulatedScale {
    /// Publish readings every `period`, approaching `target_kg` in
    /// `ramp_steps` increments and holding it afterwards.
    pub fn spawn(store: MemoryStore, target_kg: f64, ramp_steps: u32, period: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            let steps = ramp_steps.max(1);
            let mut step = 0u32;
            loop {
                if shutdown_flag.load(Ordering::Relaxed) {
                    tracing::debug!("simulated scale received shutdown signal");
                    break;
                }
                step = step.saturating_add(1);
                let frac = f64::from(step.min(steps)) / f64::from(steps);
                let weight = target_kg * frac;
                if let Err(e) = store.publish_weight(weight, wall_ms_now()) {
                    // Store went away; the real firmware would just keep
                    // retrying, the simulation can idle until told to stop.
                    tracing::trace!(error = %e, "simulated publish dropped");
                }
                if shutdown_flag.load(Ordering::Relaxed) {
                    break;
                }
                std::thread::sleep(period);
            }
            tracing::trace!("simulated scale thread exiting cleanly");
        });

        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }
}

impl Drop for SimulatedScale {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("simulated scale thread joined"),
                Err(e) => tracing::warn!(?e, "simulated scale thread panicked during shutdown"),
            }
        }
    }
}
