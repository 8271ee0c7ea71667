//! Deadline Evaluator
//!
//! Pure, total comparisons between a sweep's "now" and stored epoch-ms
//! timestamps. No I/O, no clock reads: the clock is sampled once per sweep
//! into a [`SweepClock`] and passed down by value.
//!
//! - expiry checks are strict (`now > reference`)
//! - start triggers are inclusive (`now >= start`)

use crate::port::TimeProvider;

/// True iff `reference_time` has strictly passed.
pub fn has_elapsed(reference_time: i64, now: i64) -> bool {
    now > reference_time
}

/// True iff a window starting at `start` should begin now (inclusive).
pub fn has_started(start: i64, now: i64) -> bool {
    now >= start
}

/// True iff `now` lies in `[start, end)`.
pub fn is_within(now: i64, start: i64, end: i64) -> bool {
    has_started(start, now) && now < end
}

/// True iff more than `grace_ms` has passed since `created_at`.
///
/// Saturating so a bogus far-future `created_at` never overflows into "expired".
pub fn grace_expired(created_at: i64, grace_ms: i64, now: i64) -> bool {
    now.saturating_sub(created_at) > grace_ms
}

/// Single "now" snapshot shared by every item in one sweep pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepClock {
    now: i64,
}

impl SweepClock {
    /// Sample the provider once
    pub fn sample(time_provider: &dyn TimeProvider) -> Self {
        Self {
            now: time_provider.now_millis(),
        }
    }

    pub fn at(now: i64) -> Self {
        Self { now }
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn has_elapsed(&self, reference_time: i64) -> bool {
        has_elapsed(reference_time, self.now)
    }

    pub fn has_started(&self, start: i64) -> bool {
        has_started(start, self.now)
    }

    pub fn grace_expired(&self, created_at: i64, grace_ms: i64) -> bool {
        grace_expired(created_at, grace_ms, self.now)
    }
}
