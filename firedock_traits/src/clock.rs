use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Clock abstraction for session timing and persisted timestamps.
///
/// - now(): returns a monotonic Instant (countdowns, cooldowns, reverts)
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - ms_since(): helper to compute elapsed milliseconds from an epoch Instant
/// - wall_ms(): wall-clock unix milliseconds, used only for values written
///   into dock records (`updated_at`, `last_reweighed_at`)
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis() as u64
    }

    /// Wall-clock unix milliseconds. Saturates at 0 if the system clock is
    /// set before the unix epoch.
    fn wall_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
            .unwrap_or(0)
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

pub mod test_clock {
    //! Deterministic clock for tests. Lives outside `#[cfg(test)]` so that
    //! downstream crates can drive coordinator timing from their own
    //! integration tests.
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Test clock whose time can be advanced manually.
    ///
    /// now() = origin + offset; wall_ms() = base_wall_ms + offset.
    /// sleep(d) advances internal time by d without actually sleeping.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        base_wall_ms: u64,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self::with_wall_ms(1_700_000_000_000)
        }

        /// Start the wall clock at a chosen unix-ms value.
        pub fn with_wall_ms(base_wall_ms: u64) -> Self {
            Self {
                origin: Instant::now(),
                base_wall_ms,
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        /// Advance both monotonic and wall time by the given duration.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }

        /// Set the absolute offset relative to origin.
        pub fn set_offset(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = d;
            }
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
            self.origin + off
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }

        fn wall_ms(&self) -> u64 {
            let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
            self.base_wall_ms.saturating_add(off.as_millis() as u64)
        }
    }
}
