//! # Per-Actor Rate Limiting
//!
//! Bounds how many lifecycle-changing operations a single actor may issue
//! per rolling window. All four transitions share one operation class; the
//! target account does not matter.
//!
//! The engine depends on the [`RateLimiter`] capability. The in-memory
//! [`SlidingWindowLimiter`] serves single-instance deployments; a shared
//! backend implements the same trait for multi-instance ones.

use std::collections::{HashMap, VecDeque};

use chrono::Duration;
use fleet_core::{AccountId, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::RateLimitConfig;

/// Longest window honoured (ten years); larger settings are clamped.
const MAX_WINDOW_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Tracked-actor count at which idle actors are first swept.
const MIN_SWEEP_THRESHOLD: usize = 1024;

/// Structured detail of a denied request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDetail {
    /// Operations admitted per window.
    pub limit: u32,
    /// Window length in seconds.
    pub window_secs: u64,
    /// Seconds until the oldest admitted operation leaves the window.
    pub retry_after_secs: u64,
}

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Admitted; one slot was consumed.
    Admitted {
        /// Slots left in the current window.
        remaining: u32,
    },
    /// Denied; no slot was consumed.
    Denied(RateLimitDetail),
}

/// Admission control for lifecycle operations.
pub trait RateLimiter: Send + Sync {
    /// Check whether `actor` may perform another lifecycle operation at
    /// `now`. Admission consumes a slot; denial must not.
    fn check(&self, actor: &AccountId, now: Timestamp) -> RateDecision;

    /// Return the slot taken by an admission at `admitted_at` whose
    /// operation was rolled back before anything was recorded.
    fn release(&self, actor: &AccountId, admitted_at: Timestamp);
}

/// Rolling-window counter keyed by actor.
///
/// Each actor keeps the admission times inside the current window; entries
/// older than the window are pruned on every check.
///
/// Actors whose window has fully expired are swept in bulk each time the
/// tracked set doubles.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    windows: Mutex<Windows>,
}

#[derive(Debug)]
struct Windows {
    by_actor: HashMap<AccountId, VecDeque<Timestamp>>,
    sweep_at: usize,
}

impl SlidingWindowLimiter {
    /// Create a limiter with the given policy.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(Windows {
                by_actor: HashMap::new(),
                sweep_at: MIN_SWEEP_THRESHOLD,
            }),
        }
    }

    /// The policy this limiter enforces.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn window(&self) -> Duration {
        let secs = self.config.window_secs.min(MAX_WINDOW_SECS);
        Duration::seconds(i64::try_from(secs).unwrap_or(0))
    }

    /// Number of actors currently holding window state.
    pub fn tracked_actors(&self) -> usize {
        self.windows.lock().by_actor.len()
    }

    /// Drop every actor whose admissions have all left the window.
    pub fn evict_expired(&self, now: Timestamp) -> usize {
        let window = self.window();
        let mut windows = self.windows.lock();
        let before = windows.by_actor.len();
        windows
            .by_actor
            .retain(|_, admitted| admitted.back().is_some_and(|last| now.since(last) < window));
        before - windows.by_actor.len()
    }
}

fn prune(admitted: &mut VecDeque<Timestamp>, now: Timestamp, window: Duration) {
    while let Some(oldest) = admitted.front() {
        if now.since(oldest) >= window {
            admitted.pop_front();
        } else {
            break;
        }
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn check(&self, actor: &AccountId, now: Timestamp) -> RateDecision {
        let window = self.window();
        let mut guard = self.windows.lock();
        let windows = &mut *guard;

        if windows.by_actor.len() >= windows.sweep_at {
            windows
                .by_actor
                .retain(|_, admitted| admitted.back().is_some_and(|last| now.since(last) < window));
            windows.sweep_at = (windows.by_actor.len() * 2).max(MIN_SWEEP_THRESHOLD);
        }

        let admitted = windows.by_actor.entry(*actor).or_default();
        prune(admitted, now, window);

        let used = u32::try_from(admitted.len()).unwrap_or(u32::MAX);
        if used >= self.config.max_operations {
            let retry_after = admitted
                .front()
                .map(|oldest| window - now.since(oldest))
                .unwrap_or(window);
            if admitted.is_empty() {
                windows.by_actor.remove(actor);
            }
            let detail = RateLimitDetail {
                limit: self.config.max_operations,
                window_secs: self.config.window_secs,
                retry_after_secs: ceil_secs(retry_after),
            };
            tracing::debug!(actor = %actor, ?detail, "lifecycle rate limit exceeded");
            return RateDecision::Denied(detail);
        }

        admitted.push_back(now);
        RateDecision::Admitted {
            remaining: self.config.max_operations - used - 1,
        }
    }

    fn release(&self, actor: &AccountId, admitted_at: Timestamp) {
        let mut windows = self.windows.lock();
        let Some(admitted) = windows.by_actor.get_mut(actor) else {
            return;
        };
        if let Some(pos) = admitted.iter().rposition(|t| *t == admitted_at) {
            admitted.remove(pos);
            tracing::debug!(actor = %actor, "lifecycle rate limit slot released");
        }
        if admitted.is_empty() {
            windows.by_actor.remove(actor);
        }
    }
}

/// Whole seconds, rounded up, never below one.
fn ceil_secs(d: Duration) -> u64 {
    let millis = d.num_milliseconds().max(1);
    let secs = (millis + 999) / 1000;
    u64::try_from(secs).unwrap_or(1)
}

/// A limiter that admits everything. Used by offline tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn check(&self, _actor: &AccountId, _now: Timestamp) -> RateDecision {
        RateDecision::Admitted {
            remaining: u32::MAX,
        }
    }

    fn release(&self, _actor: &AccountId, _admitted_at: Timestamp) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_secs: u64) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(RateLimitConfig {
            max_operations: max,
            window_secs,
        })
    }

    fn t0() -> Timestamp {
        "2026-05-01T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn admits_up_to_limit() {
        let l = limiter(3, 60);
        let actor = AccountId::new();
        assert_eq!(l.check(&actor, t0()), RateDecision::Admitted { remaining: 2 });
        assert_eq!(l.check(&actor, t0()), RateDecision::Admitted { remaining: 1 });
        assert_eq!(l.check(&actor, t0()), RateDecision::Admitted { remaining: 0 });
        assert!(matches!(l.check(&actor, t0()), RateDecision::Denied(_)));
    }

    #[test]
    fn denial_does_not_consume_a_slot() {
        let l = limiter(1, 60);
        let actor = AccountId::new();
        l.check(&actor, t0());
        for _ in 0..5 {
            assert!(matches!(l.check(&actor, t0()), RateDecision::Denied(_)));
        }
        // The single admitted slot expires on schedule despite the denials.
        let later = t0().plus(Duration::seconds(60));
        assert!(matches!(l.check(&actor, later), RateDecision::Admitted { .. }));
    }

    #[test]
    fn window_slides() {
        let l = limiter(2, 60);
        let actor = AccountId::new();
        l.check(&actor, t0());
        l.check(&actor, t0().plus(Duration::seconds(30)));

        let denied = l.check(&actor, t0().plus(Duration::seconds(45)));
        match denied {
            RateDecision::Denied(detail) => {
                assert_eq!(detail.limit, 2);
                assert_eq!(detail.window_secs, 60);
                assert_eq!(detail.retry_after_secs, 15);
            }
            other => panic!("expected denial, got {other:?}"),
        }

        // First admission has left the window.
        assert!(matches!(
            l.check(&actor, t0().plus(Duration::seconds(61))),
            RateDecision::Admitted { .. }
        ));
    }

    #[test]
    fn actors_are_independent() {
        let l = limiter(1, 60);
        let a = AccountId::new();
        let b = AccountId::new();
        assert!(matches!(l.check(&a, t0()), RateDecision::Admitted { .. }));
        assert!(matches!(l.check(&b, t0()), RateDecision::Admitted { .. }));
        assert!(matches!(l.check(&a, t0()), RateDecision::Denied(_)));
    }

    #[test]
    fn unlimited_always_admits() {
        let actor = AccountId::new();
        for _ in 0..100 {
            assert!(matches!(
                Unlimited.check(&actor, t0()),
                RateDecision::Admitted { .. }
            ));
        }
    }

    #[test]
    fn release_returns_the_slot() {
        let l = limiter(1, 60);
        let actor = AccountId::new();
        assert!(matches!(l.check(&actor, t0()), RateDecision::Admitted { .. }));
        l.release(&actor, t0());
        assert_eq!(l.tracked_actors(), 0);
        assert!(matches!(l.check(&actor, t0()), RateDecision::Admitted { .. }));
        assert!(matches!(l.check(&actor, t0()), RateDecision::Denied(_)));
    }

    #[test]
    fn release_of_unknown_admission_is_a_no_op() {
        let l = limiter(2, 60);
        let actor = AccountId::new();
        l.check(&actor, t0());
        l.release(&actor, t0().plus(Duration::seconds(5)));
        l.release(&AccountId::new(), t0());
        assert_eq!(l.check(&actor, t0()), RateDecision::Admitted { remaining: 0 });
    }

    #[test]
    fn expired_actors_are_evicted() {
        let l = limiter(5, 60);
        for _ in 0..10 {
            l.check(&AccountId::new(), t0());
        }
        let fresh = AccountId::new();
        l.check(&fresh, t0().plus(Duration::seconds(30)));
        assert_eq!(l.tracked_actors(), 11);

        assert_eq!(l.evict_expired(t0().plus(Duration::seconds(60))), 10);
        assert_eq!(l.tracked_actors(), 1);
    }

    #[test]
    fn tracked_actors_stay_bounded() {
        let l = limiter(1, 60);
        for i in 0..(3 * MIN_SWEEP_THRESHOLD as i64) {
            // Each actor's window has expired before the next one arrives.
            l.check(&AccountId::new(), t0().plus(Duration::seconds(i * 60)));
        }
        assert!(l.tracked_actors() <= MIN_SWEEP_THRESHOLD);
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(ceil_secs(Duration::milliseconds(1)), 1);
        assert_eq!(ceil_secs(Duration::milliseconds(1500)), 2);
        assert_eq!(ceil_secs(Duration::seconds(0)), 1);
    }
}
