//! Command implementations: store assembly, session runs, dashboards.

use eyre::WrapErr;
use firedock_config::{Config, DockSeedRow};
use firedock_core::badges::{days_until, ExpiryBadge, WeightBadge};
use firedock_core::runner::{run_session, RunParams};
use firedock_core::units::period_ms;
use firedock_core::{build_coordinator, reconcile, SavePolicy, TimingCfg};
use firedock_store::{MemoryStore, SimulatedScale};
use firedock_traits::{Clock, DockRegistry, MonotonicClock, NewDock, SampleSource, ScaleFeed};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1_000;

fn near_expiry_days(cfg: &Config) -> u32 {
    // Validated to 0..=3650 already.
    u32::try_from(cfg.reconcile.near_expiry_days).unwrap_or(0)
}

/// Load a seed CSV into the store. Expiry offsets are resolved against
/// the current wall clock at import time.
pub fn seed_docks(store: &mut MemoryStore, rows: &[DockSeedRow]) -> eyre::Result<usize> {
    let now_wall = MonotonicClock::new().wall_ms();
    for row in rows {
        let expires_at = row
            .expires_in_days
            .map(|days| now_wall + u64::try_from(days).unwrap_or(0) * MILLIS_PER_DAY);
        store
            .create(NewDock {
                name: row.name.clone(),
                location: row.location.clone(),
                expires_at,
            })
            .map_err(|e| eyre::eyre!("seeding dock {:?}: {}", row.name, e))?;
    }
    Ok(rows.len())
}

pub fn cmd_init_scale(store: &MemoryStore, json: bool) -> eyre::Result<()> {
    let now_wall = MonotonicClock::new().wall_ms();
    store
        .init_scale(now_wall)
        .wrap_err("initializing scale record")?;
    let record = store.scale_record();
    if json {
        println!(
            "{}",
            serde_json::json!({
                "sensor": firedock_store::SCALE_SENSOR_ID,
                "weight_kg": record.weight_kg,
                "at_ms": record.at_ms,
                "status": record.status,
            })
        );
    } else {
        println!(
            "scale {} initialized: weight {:.2} kg, status {}",
            firedock_store::SCALE_SENSOR_ID,
            record.weight_kg,
            record.status
        );
    }
    Ok(())
}

pub fn cmd_list(store: &mut MemoryStore, json: bool) -> eyre::Result<()> {
    let now_wall = MonotonicClock::new().wall_ms();
    let mut docks = store.list().map_err(|e| eyre::eyre!("listing docks: {e}"))?;
    // Dashboard ordering: soonest expiry first, undated docks last.
    docks.sort_by_key(|d| d.expires_at.unwrap_or(u64::MAX));

    if json {
        let rows: Vec<_> = docks
            .iter()
            .map(|d| {
                let days = days_until(d.expires_at, now_wall);
                serde_json::json!({
                    "id": d.id,
                    "name": d.name,
                    "location": d.location,
                    "weight_kg": d.weight_kg,
                    "weight_badge": WeightBadge::for_weight(d.weight_kg).label(),
                    "days_left": days,
                    "expiry_badge": ExpiryBadge::for_days_left(days).label(),
                    "needs_reweigh": d.needs_reweigh,
                    "near_expiry": d.near_expiry,
                })
            })
            .collect();
        println!("{}", serde_json::json!(rows));
        return Ok(());
    }

    if docks.is_empty() {
        println!("no docks");
        return Ok(());
    }
    for d in &docks {
        let days = days_until(d.expires_at, now_wall);
        let weight = match d.weight_kg {
            Some(w) => format!("{w:.2} kg"),
            None => "never weighed".to_string(),
        };
        let expiry = match days {
            Some(n) => format!("{n}d left"),
            None => "no expiry".to_string(),
        };
        println!(
            "{}  {:<20} {:<24} {:<14} [{}]  {:<12} [{}]{}{}",
            d.id,
            d.name,
            d.location,
            weight,
            WeightBadge::for_weight(d.weight_kg).label(),
            expiry,
            ExpiryBadge::for_days_left(days).label(),
            if d.needs_reweigh { "  needs-reweigh" } else { "" },
            if d.near_expiry { "  near-expiry" } else { "" },
        );
    }
    Ok(())
}

pub fn cmd_add(
    store: &mut MemoryStore,
    name: String,
    location: String,
    expires_in_days: Option<u32>,
    json: bool,
) -> eyre::Result<()> {
    let now_wall = MonotonicClock::new().wall_ms();
    let expires_at = expires_in_days.map(|d| now_wall + u64::from(d) * MILLIS_PER_DAY);
    let dock = store
        .create(NewDock {
            name,
            location,
            expires_at,
        })
        .map_err(|e| eyre::eyre!("creating dock: {e}"))?;
    if json {
        println!("{}", serde_json::json!({ "id": dock.id, "name": dock.name }));
    } else {
        println!("created {} ({})", dock.id, dock.name);
    }
    Ok(())
}

pub fn cmd_remove(store: &mut MemoryStore, dock_id: &str) -> eyre::Result<()> {
    store
        .delete(dock_id)
        .map_err(|e| eyre::eyre!("deleting dock {dock_id}: {e}"))?;
    println!("deleted {dock_id}");
    Ok(())
}

pub fn cmd_import(store: &mut MemoryStore, path: &std::path::Path, json: bool) -> eyre::Result<()> {
    let rows = firedock_config::load_dock_seed_csv(path)?;
    let count = seed_docks(store, &rows)?;
    if json {
        println!("{}", serde_json::json!({ "imported": count }));
    } else {
        println!("imported {count} docks");
    }
    Ok(())
}

pub fn cmd_reconcile(store: &mut MemoryStore, cfg: &Config, json: bool) -> eyre::Result<()> {
    let clock = MonotonicClock::new();
    let report = reconcile(store, &clock, near_expiry_days(cfg))?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "examined": report.examined,
                "patched": report.patched,
                "vanished": report.vanished,
            })
        );
    } else {
        println!(
            "reconciled {} docks, patched {}, vanished {}",
            report.examined, report.patched, report.vanished
        );
    }
    Ok(())
}

pub fn cmd_weigh(
    store: &MemoryStore,
    cfg: &Config,
    dock_id: &str,
    target_kg: f64,
    max_run_ms: Option<u64>,
    shutdown: &Arc<AtomicBool>,
    json: bool,
) -> eyre::Result<()> {
    let policy = SavePolicy::from(&cfg.policy);
    let timing = TimingCfg::from(&cfg.policy);
    let mut coord = build_coordinator(store.clone(), store.clone(), policy, Some(timing), None)?;
    let dock = coord
        .registry_mut()
        .get(dock_id)
        .map_err(|e| eyre::Report::new(firedock_core::store_error::map_store_error(e.as_ref())))?;

    let period = Duration::from_millis(period_ms(cfg.scale.poll_hz));
    // Stands in for the scale firmware publishing into the store.
    let _sim = SimulatedScale::spawn(store.clone(), target_kg, 20, period);

    let params = RunParams {
        poll_hz: cfg.scale.poll_hz,
        max_run_ms: max_run_ms.unwrap_or(RunParams::default().max_run_ms),
        ..RunParams::default()
    };
    let outcome = run_session(&mut coord, &dock, params, shutdown)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "dock": dock.id,
                "saved_weight_kg": outcome.saved_weight_kg,
                "elapsed_ms": outcome.elapsed_ms,
            })
        );
    } else {
        match outcome.saved_weight_kg {
            Some(w) => println!("Saved {:.2} kg to {} in {} ms", w, dock.id, outcome.elapsed_ms),
            None => println!("Interrupted, nothing saved"),
        }
    }
    Ok(())
}

/// Round-trip the store and feed once, without touching any real dock.
pub fn cmd_self_check(json: bool) -> eyre::Result<()> {
    let mut store = MemoryStore::new();
    let now_wall = MonotonicClock::new().wall_ms();
    store.init_scale(now_wall).wrap_err("scale init")?;

    let dock = store
        .create(NewDock {
            name: "self-check".to_string(),
            location: "nowhere".to_string(),
            expires_at: None,
        })
        .map_err(|e| eyre::eyre!("store create: {e}"))?;

    let mut sub = store
        .subscribe()
        .map_err(|e| eyre::eyre!("feed subscribe: {e}"))?;
    store.publish_weight(1.23, now_wall).wrap_err("feed publish")?;
    let sample = sub
        .latest()
        .ok_or_else(|| eyre::eyre!("feed delivered no sample"))?;
    if (sample.weight_kg - 1.23).abs() > 1e-9 {
        eyre::bail!("feed delivered wrong sample: {}", sample.weight_kg);
    }

    store
        .delete(&dock.id)
        .map_err(|e| eyre::eyre!("store delete: {e}"))?;

    if json {
        println!("{}", serde_json::json!({ "status": "ok" }));
    } else {
        println!("self-check ok");
    }
    Ok(())
}
