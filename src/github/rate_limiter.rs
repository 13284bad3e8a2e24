//! Quota gating for GitHub API calls.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_derive::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::call::ApiCallError;
use crate::constants::{
    RATE_LIMIT_BUFFER, RATE_LIMIT_FALLBACK_WAIT, RATE_LIMIT_LOW_WATER_MARK,
    RATE_LIMIT_MAX_ITERATIONS,
};

/// Snapshot of the core API quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub remaining: u64,
    /// Unix time in seconds at which `remaining` is refilled.
    pub reset: u64,
}

/// Source of the current quota, usually the API client itself.
pub trait RateLimitProvider {
    fn rate_limit(&self) -> Result<RateLimit, ApiCallError>;
}

pub trait Clock {
    /// Current Unix time in seconds.
    fn now(&self) -> u64;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// Delays calls until the API quota allows them.
///
/// A call goes through right away while more than one request is left. At or
/// below that, the limiter sleeps until the reported reset (plus a buffer) and
/// re-reads the quota until it is no longer exhausted. After
/// `max_iterations` unsuccessful waits it logs a warning, sleeps one fallback
/// period and lets the call through anyway.
pub struct RateLimiter<P, C = SystemClock> {
    provider: P,
    clock: C,
    max_iterations: u32,
}

impl<P: RateLimitProvider> RateLimiter<P> {
    pub fn new(provider: P) -> Self {
        Self::with_clock(provider, SystemClock)
    }
}

impl<P: RateLimitProvider, C: Clock> RateLimiter<P, C> {
    pub fn with_clock(provider: P, clock: C) -> Self {
        Self {
            provider,
            clock,
            max_iterations: RATE_LIMIT_MAX_ITERATIONS,
        }
    }

    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Waits for quota, then runs `f` exactly once and returns its result.
    pub fn call<T>(&self, f: impl FnOnce() -> T) -> T {
        self.wait_for_quota();
        f()
    }

    /// Blocks until the quota allows another request or the iteration cap is
    /// reached. Never fails: an unreadable quota lets the call through.
    pub fn wait_for_quota(&self) {
        let mut limit = match self.read_limit() {
            Some(limit) => limit,
            None => return,
        };
        if limit.remaining > RATE_LIMIT_LOW_WATER_MARK {
            return;
        }

        for iteration in 0..self.max_iterations {
            let wait = self.wait_until_reset(limit);
            info!(
                remaining = limit.remaining,
                reset = limit.reset,
                iteration,
                "Sleeping for {} seconds to reset rate limit.",
                wait.as_secs()
            );
            self.clock.sleep(wait);

            limit = match self.read_limit() {
                Some(limit) => limit,
                None => return,
            };
            if limit.remaining > 0 {
                debug!(remaining = limit.remaining, "Rate limit quota restored.");
                return;
            }
        }

        let wait = RATE_LIMIT_FALLBACK_WAIT + RATE_LIMIT_BUFFER;
        warn!(
            max_iterations = self.max_iterations,
            "Rate limit still exhausted after maximum iterations ({}); sleeping {} seconds and proceeding.",
            self.max_iterations,
            wait.as_secs()
        );
        self.clock.sleep(wait);
    }

    fn wait_until_reset(&self, limit: RateLimit) -> Duration {
        Duration::from_secs(limit.reset.saturating_sub(self.clock.now()))
            .saturating_add(RATE_LIMIT_BUFFER)
    }

    fn read_limit(&self) -> Option<RateLimit> {
        match self.provider.rate_limit() {
            Ok(limit) => Some(limit),
            Err(err) => {
                warn!(error = ?err, "Unable to read rate limit, proceeding: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::test_support::LogCapture;

    pub(crate) struct FixedProvider {
        pub limit: Cell<RateLimit>,
        pub reads: Cell<usize>,
    }

    impl FixedProvider {
        pub(crate) fn new(remaining: u64, reset: u64) -> Self {
            Self {
                limit: Cell::new(RateLimit { remaining, reset }),
                reads: Cell::new(0),
            }
        }
    }

    impl RateLimitProvider for FixedProvider {
        fn rate_limit(&self) -> Result<RateLimit, ApiCallError> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.limit.get())
        }
    }

    /// Provider that reports an exhausted quota once, then a full one.
    struct RecoveringProvider {
        reads: Cell<usize>,
    }

    impl RateLimitProvider for RecoveringProvider {
        fn rate_limit(&self) -> Result<RateLimit, ApiCallError> {
            let reads = self.reads.get();
            self.reads.set(reads + 1);
            let remaining = if reads == 0 { 0 } else { 5000 };
            Ok(RateLimit {
                remaining,
                reset: 1_000,
            })
        }
    }

    struct FailingProvider;

    impl RateLimitProvider for FailingProvider {
        fn rate_limit(&self) -> Result<RateLimit, ApiCallError> {
            Err(ApiCallError::Http("connection closed".into()))
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeClock {
        pub now: u64,
        pub sleeps: RefCell<Vec<Duration>>,
    }

    impl FakeClock {
        pub(crate) fn at(now: u64) -> Self {
            Self {
                now,
                sleeps: RefCell::default(),
            }
        }
    }

    impl Clock for &FakeClock {
        fn now(&self) -> u64 {
            self.now
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn low_quota_sleeps_once_until_reset() {
        let clock = FakeClock::at(NOW);
        let limiter = RateLimiter::with_clock(FixedProvider::new(1, NOW + 1000), &clock);
        let calls = Cell::new(0);

        let result = limiter.call(|| {
            calls.set(calls.get() + 1);
            "ok"
        });

        assert_eq!(result, "ok");
        assert_eq!(calls.get(), 1);
        assert_eq!(*clock.sleeps.borrow(), vec![Duration::from_secs(1005)]);
    }

    #[test]
    fn sufficient_quota_never_sleeps() {
        let clock = FakeClock::at(NOW);
        let limiter = RateLimiter::with_clock(FixedProvider::new(10, NOW + 3600), &clock);
        let calls = Cell::new(0);

        limiter.call(|| calls.set(calls.get() + 1));

        assert_eq!(calls.get(), 1);
        assert!(clock.sleeps.borrow().is_empty());
        assert_eq!(limiter.provider().reads.get(), 1);
    }

    #[test]
    fn past_reset_sleeps_only_the_buffer() {
        let clock = FakeClock::at(NOW);
        let limiter = RateLimiter::with_clock(FixedProvider::new(1, NOW - 1000), &clock);

        limiter.call(|| ());

        assert_eq!(*clock.sleeps.borrow(), vec![RATE_LIMIT_BUFFER]);
    }

    #[test]
    fn exhausted_quota_rechecks_until_restored() {
        let clock = FakeClock::at(0);
        let limiter = RateLimiter::with_clock(RecoveringProvider { reads: Cell::new(0) }, &clock);

        limiter.call(|| ());

        assert_eq!(*clock.sleeps.borrow(), vec![Duration::from_secs(1005)]);
        assert_eq!(limiter.provider().reads.get(), 2);
    }

    #[test]
    fn exceeding_max_iterations_proceeds_anyway() {
        let clock = FakeClock::at(200_000_000);
        let limiter = RateLimiter::with_clock(FixedProvider::new(0, 1000), &clock);
        let calls = Cell::new(0);

        let (result, logs) = LogCapture::run(|| {
            limiter.call(|| {
                calls.set(calls.get() + 1);
                "ok"
            })
        });

        assert_eq!(result, "ok");
        assert_eq!(calls.get(), 1);
        let warnings = logs.lines("WARN");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("maximum iterations"));

        let sleeps = clock.sleeps.borrow();
        assert_eq!(sleeps.len(), RATE_LIMIT_MAX_ITERATIONS as usize + 1);
        assert_eq!(sleeps.last(), Some(&Duration::from_secs(65)));
    }

    #[test]
    fn far_future_reset_does_not_overflow() {
        let clock = FakeClock::at(0);
        let limiter =
            RateLimiter::with_clock(FixedProvider::new(0, u64::MAX), &clock).max_iterations(1);

        let result = limiter.call(|| "ok");

        assert_eq!(result, "ok");
        let sleeps = clock.sleeps.borrow();
        assert_eq!(sleeps[0], Duration::MAX);
        assert_eq!(sleeps.last(), Some(&Duration::from_secs(65)));
    }

    #[test]
    fn max_iterations_is_configurable() {
        let clock = FakeClock::at(NOW);
        let limiter =
            RateLimiter::with_clock(FixedProvider::new(0, NOW + 10), &clock).max_iterations(2);

        limiter.call(|| ());

        let sleeps = clock.sleeps.borrow();
        assert_eq!(
            *sleeps,
            vec![
                Duration::from_secs(15),
                Duration::from_secs(15),
                Duration::from_secs(65)
            ]
        );
    }

    #[test]
    fn unreadable_quota_fails_open() {
        let clock = FakeClock::at(NOW);
        let limiter = RateLimiter::with_clock(FailingProvider, &clock);

        let (result, logs) = LogCapture::run(|| limiter.call(|| 42));

        assert_eq!(result, 42);
        assert!(clock.sleeps.borrow().is_empty());
        assert_eq!(logs.lines("WARN").len(), 1);
    }
}
