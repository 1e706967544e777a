//! API call quota enforcement
//!
//! Keeps provider usage within two limits at once:
//! - a sliding one-minute window of at most `calls_per_minute` calls
//! - a calendar-day budget of `daily_limit` calls, reset when the local date
//!   advances
//!
//! The check, the optional wait and the bookkeeping all happen under a single
//! mutex, so concurrent callers observe one consistent sequence of calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, NaiveDate};

use crate::core::{ForecastError, ForecastResult};

/// Length of the sliding window
const WINDOW_SECS: i64 = 60;

/// Time source used by the limiter
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
    fn sleep(&self, duration: StdDuration);
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }

    fn sleep(&self, duration: StdDuration) {
        (**self).sleep(duration)
    }
}

/// Clock that only moves when told to. Sleeping advances it instantly and
/// records the requested duration.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
    slept: Mutex<Vec<StdDuration>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
            slept: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now = *now + by;
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<StdDuration> {
        lock(&self.slept).clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *lock(&self.now)
    }

    fn sleep(&self, duration: StdDuration) {
        lock(&self.slept).push(duration);
        if let Ok(by) = Duration::from_std(duration) {
            self.advance(by);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // guarded state is only ever updated in whole steps; ignore poisoning
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mutable limiter state, only touched while the mutex is held
#[derive(Debug)]
struct RateLimitState {
    /// Timestamps of calls inside the trailing window, oldest first
    window: VecDeque<DateTime<Local>>,
    daily_calls: u32,
    last_reset: NaiveDate,
}

/// Snapshot of limiter usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitUsage {
    pub calls_in_window: usize,
    pub daily_calls: u32,
    pub daily_limit: u32,
    pub last_reset: NaiveDate,
}

/// Per-minute and per-day quota guard
pub struct RateLimiter {
    calls_per_minute: u32,
    daily_limit: u32,
    clock: Box<dyn Clock>,
    state: Mutex<RateLimitState>,
}

impl RateLimiter {
    pub fn new(calls_per_minute: u32, daily_limit: u32) -> Self {
        Self::with_clock(calls_per_minute, daily_limit, Box::new(SystemClock))
    }

    pub fn with_clock(calls_per_minute: u32, daily_limit: u32, clock: Box<dyn Clock>) -> Self {
        let today = clock.now().date_naive();
        Self {
            calls_per_minute: calls_per_minute.max(1),
            daily_limit,
            clock,
            state: Mutex::new(RateLimitState {
                window: VecDeque::with_capacity(calls_per_minute as usize),
                daily_calls: 0,
                last_reset: today,
            }),
        }
    }

    pub fn calls_per_minute(&self) -> u32 {
        self.calls_per_minute
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Block until a call is allowed, then record it.
    ///
    /// Fails with `QuotaExceeded` without waiting once today's budget is
    /// spent.
    pub fn acquire(&self) -> ForecastResult<()> {
        let mut state = lock(&self.state);
        let mut now = self.clock.now();

        let today = now.date_naive();
        if today != state.last_reset {
            tracing::debug!(
                "New day {}: resetting daily API counter ({} calls on {})",
                today,
                state.daily_calls,
                state.last_reset
            );
            state.daily_calls = 0;
            state.last_reset = today;
        }

        if state.daily_calls >= self.daily_limit {
            return Err(ForecastError::QuotaExceeded {
                limit: self.daily_limit,
            });
        }

        Self::evict_expired(&mut state.window, now);

        if state.window.len() >= self.calls_per_minute as usize {
            if let Some(&oldest) = state.window.front() {
                let wait = Duration::seconds(WINDOW_SECS) - (now - oldest);
                if wait > Duration::zero() {
                    if let Ok(wait) = wait.to_std() {
                        tracing::info!("Rate limit: waiting {:.1} seconds...", wait.as_secs_f64());
                        self.clock.sleep(wait);
                    }
                    now = self.clock.now();
                    Self::evict_expired(&mut state.window, now);
                }
            }
        }

        state.window.push_back(now);
        state.daily_calls += 1;
        Ok(())
    }

    /// Current usage, rolling the daily counter if the date has moved on
    pub fn usage(&self) -> RateLimitUsage {
        let state = lock(&self.state);
        let now = self.clock.now();
        let rolled = now.date_naive() != state.last_reset;
        let cutoff = now - Duration::seconds(WINDOW_SECS);

        RateLimitUsage {
            calls_in_window: state.window.iter().filter(|&&t| t > cutoff).count(),
            daily_calls: if rolled { 0 } else { state.daily_calls },
            daily_limit: self.daily_limit,
            last_reset: state.last_reset,
        }
    }

    fn evict_expired(window: &mut VecDeque<DateTime<Local>>, now: DateTime<Local>) {
        let cutoff = now - Duration::seconds(WINDOW_SECS);
        while window.front().is_some_and(|&t| t <= cutoff) {
            window.pop_front();
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("calls_per_minute", &self.calls_per_minute)
            .field("daily_limit", &self.daily_limit)
            .finish()
    }
}
