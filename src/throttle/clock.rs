// ============================================================================
// src/throttle/clock.rs – Injected wall-clock capability
// ============================================================================

use chrono::{DateTime, Utc};

/// Time source for every lock-deadline comparison. Injected so tests can
/// replay arbitrary elapsed time without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real wall clock used by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
