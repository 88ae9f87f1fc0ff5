// ============================================================================
// src/throttle/state.rs – Attempt-state entity and pure transition rules
// ============================================================================

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Consecutive-failure bookkeeping for the admin login screen.
///
/// "Locked" is never cached as a flag; it is recomputed from `lock_until`
/// against the injected clock on every check, so stored state can never
/// drift ahead of (or behind) real elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttemptState {
    /// Failed attempts since the last success or natural expiry.
    pub failure_count: u32,
    /// Absolute instant the current lockout ends; `None` when unlocked.
    pub lock_until: Option<DateTime<Utc>>,
}

/// What a recorded failure means for the caller's messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Below every tier: warn with the running attempt number.
    Warned { attempts: u32 },
    /// A tier was crossed on this increment; a fresh lock was set.
    Locked { duration: Duration },
}

/// A failure count at which a lockout of the given length begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockTier {
    pub at: u32,
    pub secs: u64,
}

/// Escalation rules: which counts lock, for how long, and whether
/// provider-unreachable failures count at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottlePolicy {
    /// Ascending by `at`. Intermediate tiers fire on an exact count match;
    /// the final tier fires on every increment at or above its count.
    pub tiers: Vec<LockTier>,
    /// Count authenticator outages toward lockout, same as bad credentials.
    pub count_unreachable: bool,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                LockTier { at: 5, secs: 60 },
                LockTier { at: 10, secs: 300 },
                LockTier { at: 15, secs: 900 },
            ],
            count_unreachable: true,
        }
    }
}

impl ThrottlePolicy {
    /// Lock length triggered by reaching `failure_count`, if any.
    pub fn lock_seconds(&self, failure_count: u32) -> Option<u64> {
        let last = self.tiers.last()?;
        if failure_count >= last.at {
            return Some(last.secs);
        }
        self.tiers
            .iter()
            .find(|t| t.at == failure_count)
            .map(|t| t.secs)
    }
}

impl AttemptState {
    /// True while a lock deadline exists and lies in the future.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    /// Whole seconds until the lock ends, rounded up; 0 when unlocked.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> u64 {
        match self.lock_until {
            Some(until) if until > now => {
                let ms = (until - now).num_milliseconds().max(0) as u64;
                ms.div_ceil(1000)
            }
            _ => 0,
        }
    }

    /// One more consecutive failure at `now`. Exactly the highest tier met
    /// on this increment sets a new deadline; below the first tier the
    /// caller gets a warning carrying the running count.
    ///
    /// Must not be called while locked; locked attempts are refused before
    /// the authenticator is ever consulted.
    pub fn after_failure(
        &self,
        policy: &ThrottlePolicy,
        now: DateTime<Utc>,
    ) -> (AttemptState, FailureOutcome) {
        let attempts = self.failure_count.saturating_add(1);
        match policy.lock_seconds(attempts) {
            Some(secs) => {
                let duration = Duration::from_secs(secs);
                let next = AttemptState {
                    failure_count: attempts,
                    lock_until: Some(now + chrono::Duration::seconds(secs as i64)),
                };
                (next, FailureOutcome::Locked { duration })
            }
            None => {
                let next = AttemptState {
                    failure_count: attempts,
                    lock_until: None,
                };
                (next, FailureOutcome::Warned { attempts })
            }
        }
    }

    /// A confirmed successful login clears everything.
    pub fn after_success(&self) -> AttemptState {
        AttemptState::default()
    }

    /// Re-evaluate expiry at `now`. A deadline at or before `now` decays the
    /// whole record to its zero value; the second return says whether that
    /// reset happened on this call. Repeated ticks after expiry are no-ops.
    pub fn after_tick(&self, now: DateTime<Utc>) -> (AttemptState, bool) {
        match self.lock_until {
            Some(until) if until <= now => (AttemptState::default(), true),
            _ => (self.clone(), false),
        }
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&PersistedState::from(self))
    }

    /// Decode persisted bytes; anything unparseable is treated as absent
    /// state by the caller, never as an error.
    pub fn decode(bytes: &[u8]) -> Option<AttemptState> {
        let raw: PersistedState = serde_json::from_slice(bytes).ok()?;
        let lock_until = match raw.lock_until_ms {
            Some(ms) => Some(Utc.timestamp_millis_opt(ms).single()?),
            None => None,
        };
        Some(AttemptState {
            failure_count: raw.failure_count,
            lock_until,
        })
    }
}

/// On-disk form: the deadline travels as epoch milliseconds, the same shape
/// the web console kept in its origin-scoped storage keys.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    failure_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lock_until_ms: Option<i64>,
}

impl From<&AttemptState> for PersistedState {
    fn from(state: &AttemptState) -> Self {
        Self {
            failure_count: state.failure_count,
            lock_until_ms: state.lock_until.map(|t| t.timestamp_millis()),
        }
    }
}
