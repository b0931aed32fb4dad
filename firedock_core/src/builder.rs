//! Type-state builder for [`WeighingCoordinator`] and the generic
//! `build_coordinator` constructor.
//!
//! The builder enforces at compile time that a registry and a feed are
//! provided before `build()` is available. `try_build()` is always
//! available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use firedock_traits::clock::{Clock, MonotonicClock};
use firedock_traits::{DockRegistry, ScaleFeed};

use crate::error::{BuildError, Result};
use crate::policy::{SavePolicy, TimingCfg};
use crate::WeighingCoordinator;

/// Boxed, dynamically-dispatched coordinator as produced by the builder.
pub type Coordinator = WeighingCoordinator<Box<dyn DockRegistry>, Box<dyn ScaleFeed>>;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for a boxed [`Coordinator`]. Policy, timing, and clock are
/// optional and default to manual gating, standard revert windows, and
/// the real monotonic clock.
pub struct CoordinatorBuilder<R, F> {
    registry: Option<Box<dyn DockRegistry>>,
    feed: Option<Box<dyn ScaleFeed>>,
    policy: Option<SavePolicy>,
    timing: Option<TimingCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _r: PhantomData<R>,
    _f: PhantomData<F>,
}

impl Default for CoordinatorBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            registry: None,
            feed: None,
            policy: None,
            timing: None,
            clock: None,
            _r: PhantomData,
            _f: PhantomData,
        }
    }
}

/// Validate timings and construct the coordinator.
///
/// Single source of truth for validation, used by both
/// `CoordinatorBuilder::try_build()` and [`build_coordinator`].
fn validate_and_build<R: DockRegistry, F: ScaleFeed>(
    registry: R,
    feed: F,
    policy: SavePolicy,
    timing: TimingCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<WeighingCoordinator<R, F>> {
    match policy {
        SavePolicy::Countdown { window_ms } if window_ms == 0 => {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "countdown window must be > 0",
            )));
        }
        SavePolicy::ManualGated { cooldown_ms } if cooldown_ms == 0 => {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "cooldown must be > 0",
            )));
        }
        _ => {}
    }
    if timing.saved_revert_ms == 0 || timing.error_revert_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "phase revert windows must be > 0",
        )));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    Ok(WeighingCoordinator::new(registry, feed, policy, timing, clock))
}

impl<R, F> CoordinatorBuilder<R, F> {
    /// Fallible build available in any type-state; reports the missing
    /// piece precisely.
    pub fn try_build(self) -> Result<Coordinator> {
        let registry = self
            .registry
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRegistry))?;
        let feed = self
            .feed
            .ok_or_else(|| eyre::Report::new(BuildError::MissingFeed))?;
        validate_and_build(
            registry,
            feed,
            self.policy.unwrap_or_default(),
            self.timing.unwrap_or_default(),
            self.clock,
        )
    }

    pub fn with_policy(mut self, policy: SavePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

impl<F> CoordinatorBuilder<Missing, F> {
    pub fn with_registry(
        self,
        registry: impl DockRegistry + 'static,
    ) -> CoordinatorBuilder<Set, F> {
        CoordinatorBuilder {
            registry: Some(Box::new(registry)),
            feed: self.feed,
            policy: self.policy,
            timing: self.timing,
            clock: self.clock,
            _r: PhantomData,
            _f: PhantomData,
        }
    }
}

impl<R> CoordinatorBuilder<R, Missing> {
    pub fn with_feed(self, feed: impl ScaleFeed + 'static) -> CoordinatorBuilder<R, Set> {
        CoordinatorBuilder {
            registry: self.registry,
            feed: Some(Box::new(feed)),
            policy: self.policy,
            timing: self.timing,
            clock: self.clock,
            _r: PhantomData,
            _f: PhantomData,
        }
    }
}

impl Coordinator {
    /// Start building a boxed coordinator.
    pub fn builder() -> CoordinatorBuilder<Missing, Missing> {
        CoordinatorBuilder::default()
    }
}

impl CoordinatorBuilder<Set, Set> {
    /// Validate and build. Only available once registry and feed are set.
    pub fn build(self) -> Result<Coordinator> {
        self.try_build()
    }
}

/// Build a generic, statically-dispatched coordinator from concrete
/// registry and feed. Delegates to the shared validation.
pub fn build_coordinator<R, F>(
    registry: R,
    feed: F,
    policy: SavePolicy,
    timing: Option<TimingCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<WeighingCoordinator<R, F>>
where
    R: DockRegistry + 'static,
    F: ScaleFeed + 'static,
{
    validate_and_build(registry, feed, policy, timing.unwrap_or_default(), clock)
}
