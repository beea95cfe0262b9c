//! Sliding-window throttle for the place-search API

use crate::config::RateLimitConfig;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimiterStatus {
    pub calls_in_window: usize,
    pub calls_remaining: usize,
    pub max_calls: usize,
    pub window: Duration,
    /// Zero when a call would be permitted right now
    pub next_available_in: Duration,
}

/// Permits at most `max_calls` recorded calls in any trailing `window`.
///
/// Callers never get rejected: `wait_if_needed` suspends until a slot frees
/// up. Waiters are admitted in arrival order.
pub struct RateLimiter {
    calls: Mutex<VecDeque<Instant>>,
    turnstile: tokio::sync::Mutex<()>,
    max_calls: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
            turnstile: tokio::sync::Mutex::new(()),
            max_calls: max_calls.max(1),
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_calls, Duration::from_secs(config.window_sec))
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn prune(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while calls
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            calls.pop_front();
        }
    }

    /// Whether a call would be permitted right now
    #[allow(dead_code)]
    pub fn can_call(&self) -> bool {
        let now = Instant::now();
        let mut calls = self.lock();
        self.prune(&mut calls, now);
        calls.len() < self.max_calls
    }

    /// Record a call issued now
    #[allow(dead_code)]
    pub fn record_call(&self) {
        self.lock().push_back(Instant::now());
    }

    /// Check and record in one step, or return how long until the oldest
    /// call in the window ages out
    fn try_acquire(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut calls = self.lock();
        self.prune(&mut calls, now);

        if calls.len() < self.max_calls {
            calls.push_back(now);
            return Ok(());
        }

        let oldest = calls.front().copied().unwrap_or(now);
        Err((oldest + self.window).saturating_duration_since(now))
    }

    /// Wait until a call is permitted, then record it. Returns the time spent waiting.
    pub async fn wait_if_needed(&self) -> Duration {
        let _turn = self.turnstile.lock().await;
        let mut waited = Duration::ZERO;

        loop {
            match self.try_acquire() {
                Ok(()) => {
                    if waited > Duration::ZERO {
                        debug!("Rate limiter admitted call after {:?}", waited);
                    }
                    return waited;
                }
                Err(delay) => {
                    info!(
                        "Rate limit reached ({} calls / {:?}), waiting {:.1}s",
                        self.max_calls,
                        self.window,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                    waited += delay;
                }
            }
        }
    }

    /// Read-only snapshot; stale timestamps are skipped, not pruned
    pub fn status(&self) -> LimiterStatus {
        let now = Instant::now();
        let calls = self.lock();

        let live: Vec<&Instant> = calls
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .collect();
        let in_window = live.len();

        let next_available_in = if in_window < self.max_calls {
            Duration::ZERO
        } else {
            live.first()
                .map(|t| (**t + self.window).saturating_duration_since(now))
                .unwrap_or(Duration::ZERO)
        };

        LimiterStatus {
            calls_in_window: in_window,
            calls_remaining: self.max_calls.saturating_sub(in_window),
            max_calls: self.max_calls,
            window: self.window,
            next_available_in,
        }
    }
}
