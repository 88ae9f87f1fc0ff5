// ============================================================================
// src/throttle/mod.rs – Login throttle guard (failure counting + lockouts)
// ============================================================================

pub mod clock;
pub mod countdown;
pub mod state;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use countdown::Countdown;
pub use state::{AttemptState, FailureOutcome, LockTier, ThrottlePolicy};
pub use store::{FileStore, MemoryStore, StateStore, StoreError};

use crate::auth::{AuthError, Authenticator};
use std::time::Duration;
use tracing::warn;

/// What a single user-initiated login attempt came to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The authenticator confirmed the credentials; state is cleared.
    Success,
    /// The attempt failed below every lock tier; warn with the running count.
    Rejected { attempts: u32 },
    /// This failure crossed a tier and started a fresh lockout.
    LockedOut { duration: Duration },
    /// Refused locally; the authenticator was never contacted.
    Locked { remaining_secs: u64 },
    /// Provider outage with outage-counting disabled; nothing recorded.
    NotCounted { reason: String },
}

/// Decides, per login attempt, whether the external authenticator may be
/// contacted, and keeps the failure/lockout bookkeeping across restarts.
///
/// All persistence faults are swallowed after a WARN: throttling is
/// defense-in-depth, the identity provider stays the enforcement boundary
/// of record.
pub struct LoginGuard<S: StateStore, C: Clock> {
    state: AttemptState,
    store: S,
    clock: C,
    policy: ThrottlePolicy,
    persistence_down: bool,
}

impl<S: StateStore, C: Clock> LoginGuard<S, C> {
    /// Load persisted state (absent or corrupt bytes become the zero state)
    /// and lazily expire a stale lock, persisting the cleared record.
    pub fn initialize(store: S, clock: C, policy: ThrottlePolicy) -> Self {
        let loaded = match store.load() {
            Ok(Some(bytes)) => match AttemptState::decode(&bytes) {
                Some(state) => state,
                None => {
                    warn!("stored attempt state unparseable; starting from zero");
                    AttemptState::default()
                }
            },
            Ok(None) => AttemptState::default(),
            Err(e) => {
                warn!(error = %e, "attempt-state store unreadable; tracking in memory only");
                AttemptState::default()
            }
        };

        let mut guard = Self {
            state: AttemptState::default(),
            store,
            clock,
            policy,
            persistence_down: false,
        };
        let (normalized, expired) = loaded.after_tick(guard.clock.now());
        guard.state = normalized;
        if expired {
            guard.persist();
        }
        guard
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_locked(self.clock.now())
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.state.seconds_remaining(self.clock.now())
    }

    /// The single entry point for a user-initiated attempt: refuse locally
    /// while locked, otherwise consult the authenticator exactly once and
    /// record the result.
    pub fn attempt(
        &mut self,
        authenticator: &dyn Authenticator,
        identifier: &str,
        secret: &str,
    ) -> AttemptOutcome {
        let now = self.clock.now();
        if self.state.is_locked(now) {
            return AttemptOutcome::Locked {
                remaining_secs: self.state.seconds_remaining(now),
            };
        }

        match authenticator.verify(identifier, secret) {
            Ok(()) => {
                self.record_success();
                AttemptOutcome::Success
            }
            Err(AuthError::Unavailable(reason)) if !self.policy.count_unreachable => {
                warn!(%reason, "authenticator unreachable; failure not counted");
                AttemptOutcome::NotCounted { reason }
            }
            Err(_) => match self.record_failure() {
                FailureOutcome::Warned { attempts } => AttemptOutcome::Rejected { attempts },
                FailureOutcome::Locked { duration } => AttemptOutcome::LockedOut { duration },
            },
        }
    }

    /// Record one failed attempt. Callers must have checked `is_locked`
    /// first; locked attempts never reach the authenticator, so there is
    /// nothing to record for them.
    pub fn record_failure(&mut self) -> FailureOutcome {
        let (next, outcome) = self.state.after_failure(&self.policy, self.clock.now());
        self.state = next;
        self.persist();
        outcome
    }

    /// Record a confirmed successful login: zero the count, clear any lock.
    pub fn record_success(&mut self) {
        self.state = self.state.after_success();
        self.persist();
    }

    /// Countdown-driven expiry check. Returns true when the lock expired on
    /// this call and the state decayed to zero.
    pub fn tick(&mut self) -> bool {
        let (next, expired) = self.state.after_tick(self.clock.now());
        if expired {
            self.state = next;
            self.persist();
        }
        expired
    }

    /// Operator reset: wipe the recorded failures and any active lock.
    pub fn clear(&mut self) {
        self.state = AttemptState::default();
        self.persist();
    }

    fn persist(&mut self) {
        if self.persistence_down {
            return;
        }
        let bytes = match self.state.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "attempt state unserializable; not persisted");
                return;
            }
        };
        if let Err(e) = self.store.save(&bytes) {
            warn!(error = %e, "attempt-state store unwritable; tracking in memory only");
            self.persistence_down = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::clock::testing::ManualClock;
    use super::*;
    use std::cell::Cell;

    struct ScriptedAuthenticator {
        accept: bool,
        unavailable: bool,
        calls: Cell<u32>,
    }

    impl ScriptedAuthenticator {
        fn rejecting() -> Self {
            Self {
                accept: false,
                unavailable: false,
                calls: Cell::new(0),
            }
        }

        fn accepting() -> Self {
            Self {
                accept: true,
                unavailable: false,
                calls: Cell::new(0),
            }
        }

        fn unreachable() -> Self {
            Self {
                accept: false,
                unavailable: true,
                calls: Cell::new(0),
            }
        }
    }

    impl Authenticator for ScriptedAuthenticator {
        fn verify(&self, _identifier: &str, _secret: &str) -> Result<(), AuthError> {
            self.calls.set(self.calls.get() + 1);
            if self.unavailable {
                Err(AuthError::Unavailable("connection refused".into()))
            } else if self.accept {
                Ok(())
            } else {
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    fn guard_at(
        ms: i64,
    ) -> (
        LoginGuard<MemoryStore, ManualClock>,
        ManualClock,
    ) {
        let clock = ManualClock::starting_at(ms);
        let guard = LoginGuard::initialize(
            MemoryStore::default(),
            clock.clone(),
            ThrottlePolicy::default(),
        );
        (guard, clock)
    }

    #[test]
    fn four_failures_warn_and_keep_the_gate_open() {
        let (mut guard, _clock) = guard_at(0);
        let auth = ScriptedAuthenticator::rejecting();
        for expected in 1..=4u32 {
            let outcome = guard.attempt(&auth, "admin@rent.example", "wrong");
            assert_eq!(outcome, AttemptOutcome::Rejected { attempts: expected });
        }
        assert!(!guard.is_locked());
        assert_eq!(auth.calls.get(), 4);
    }

    #[test]
    fn fifth_failure_locks_and_locked_attempts_never_reach_the_authenticator() {
        let (mut guard, clock) = guard_at(0);
        let auth = ScriptedAuthenticator::rejecting();
        for _ in 0..4 {
            guard.attempt(&auth, "admin@rent.example", "wrong");
        }
        let outcome = guard.attempt(&auth, "admin@rent.example", "wrong");
        assert_eq!(
            outcome,
            AttemptOutcome::LockedOut {
                duration: Duration::from_secs(60)
            }
        );
        assert_eq!(auth.calls.get(), 5);

        clock.advance_secs(30);
        let outcome = guard.attempt(&auth, "admin@rent.example", "wrong");
        assert_eq!(outcome, AttemptOutcome::Locked { remaining_secs: 30 });
        assert_eq!(auth.calls.get(), 5, "locked attempt must not call verify");
    }

    #[test]
    fn attempt_after_unobserved_expiry_reaches_the_authenticator_again() {
        let (mut guard, clock) = guard_at(0);
        let auth = ScriptedAuthenticator::rejecting();
        for _ in 0..5 {
            guard.attempt(&auth, "admin@rent.example", "wrong");
        }
        assert!(guard.is_locked());
        assert_eq!(guard.state().failure_count, 5);

        // No tick observed the expiry; the count is still 5 going in.
        clock.advance_secs(61);
        assert!(!guard.is_locked());
        let outcome = guard.attempt(&auth, "admin@rent.example", "wrong");
        assert_eq!(outcome, AttemptOutcome::Rejected { attempts: 6 });
        assert_eq!(auth.calls.get(), 6);
        assert_eq!(guard.state().lock_until, None, "stale deadline cleared");
    }

    #[test]
    fn success_resets_everything() {
        let (mut guard, _clock) = guard_at(0);
        let bad = ScriptedAuthenticator::rejecting();
        for _ in 0..3 {
            guard.attempt(&bad, "admin@rent.example", "wrong");
        }
        let good = ScriptedAuthenticator::accepting();
        let outcome = guard.attempt(&good, "admin@rent.example", "right");
        assert_eq!(outcome, AttemptOutcome::Success);
        assert_eq!(guard.state(), &AttemptState::default());
    }

    #[test]
    fn outages_count_by_default_but_can_be_exempted() {
        let (mut guard, _clock) = guard_at(0);
        let flaky = ScriptedAuthenticator::unreachable();
        let outcome = guard.attempt(&flaky, "admin@rent.example", "pw");
        assert_eq!(outcome, AttemptOutcome::Rejected { attempts: 1 });

        let clock = ManualClock::starting_at(0);
        let mut exempting = LoginGuard::initialize(
            MemoryStore::default(),
            clock,
            ThrottlePolicy {
                count_unreachable: false,
                ..ThrottlePolicy::default()
            },
        );
        let outcome = exempting.attempt(&flaky, "admin@rent.example", "pw");
        assert!(matches!(outcome, AttemptOutcome::NotCounted { .. }));
        assert_eq!(exempting.state().failure_count, 0);
    }

    #[test]
    fn tick_resets_on_expiry_and_is_idempotent() {
        let (mut guard, clock) = guard_at(0);
        let auth = ScriptedAuthenticator::rejecting();
        for _ in 0..5 {
            guard.attempt(&auth, "admin@rent.example", "wrong");
        }

        clock.advance_secs(30);
        assert!(!guard.tick());
        assert_eq!(guard.state().failure_count, 5);

        clock.advance_secs(30);
        assert!(guard.tick());
        assert_eq!(guard.state(), &AttemptState::default());
        assert!(!guard.tick());
        assert_eq!(guard.state(), &AttemptState::default());
    }

    #[test]
    fn state_survives_a_restart_through_the_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let clock = ManualClock::starting_at(5_000);

        let mut guard = LoginGuard::initialize(
            FileStore::new(&path),
            clock.clone(),
            ThrottlePolicy::default(),
        );
        let auth = ScriptedAuthenticator::rejecting();
        for _ in 0..3 {
            guard.attempt(&auth, "admin@rent.example", "wrong");
        }
        drop(guard);

        let revived = LoginGuard::initialize(
            FileStore::new(&path),
            clock.clone(),
            ThrottlePolicy::default(),
        );
        assert_eq!(revived.state().failure_count, 3);
        assert_eq!(revived.state().lock_until, None);
    }

    #[test]
    fn initialize_clears_an_already_expired_lock_and_persists_the_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let clock = ManualClock::starting_at(0);

        let mut guard = LoginGuard::initialize(
            FileStore::new(&path),
            clock.clone(),
            ThrottlePolicy::default(),
        );
        let auth = ScriptedAuthenticator::rejecting();
        for _ in 0..5 {
            guard.attempt(&auth, "admin@rent.example", "wrong");
        }
        assert!(guard.is_locked());
        drop(guard);

        clock.advance_secs(120);
        let revived = LoginGuard::initialize(
            FileStore::new(&path),
            clock.clone(),
            ThrottlePolicy::default(),
        );
        assert_eq!(revived.state(), &AttemptState::default());

        // The cleared record was written back, not just held in memory.
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(AttemptState::decode(&bytes), Some(AttemptState::default()));
    }

    #[test]
    fn corrupt_state_file_resets_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{definitely not json").unwrap();

        let clock = ManualClock::starting_at(0);
        let guard = LoginGuard::initialize(
            FileStore::new(&path),
            clock,
            ThrottlePolicy::default(),
        );
        assert_eq!(guard.state(), &AttemptState::default());
    }

    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::Read(std::io::Error::other("disk gone")))
        }
        fn save(&mut self, _bytes: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Write("disk gone".into()))
        }
    }

    #[test]
    fn broken_store_degrades_to_in_memory_tracking() {
        let clock = ManualClock::starting_at(0);
        let mut guard = LoginGuard::initialize(BrokenStore, clock, ThrottlePolicy::default());
        let auth = ScriptedAuthenticator::rejecting();
        for expected in 1..=4u32 {
            let outcome = guard.attempt(&auth, "admin@rent.example", "wrong");
            assert_eq!(outcome, AttemptOutcome::Rejected { attempts: expected });
        }
        let outcome = guard.attempt(&auth, "admin@rent.example", "wrong");
        assert!(matches!(outcome, AttemptOutcome::LockedOut { .. }));
        assert!(guard.is_locked());
    }

    #[test]
    fn clear_wipes_count_and_lock() {
        let (mut guard, _clock) = guard_at(0);
        let auth = ScriptedAuthenticator::rejecting();
        for _ in 0..5 {
            guard.attempt(&auth, "admin@rent.example", "wrong");
        }
        assert!(guard.is_locked());
        guard.clear();
        assert_eq!(guard.state(), &AttemptState::default());
        assert!(!guard.is_locked());
    }
}
