// ============================================================================
// src/lib.rs – rentguard library surface
// ============================================================================

pub mod auth;
pub mod cmd;
pub mod config;
pub mod throttle;
pub mod ui;
pub mod util;

pub use auth::{AuthError, Authenticator};
pub use throttle::{
    AttemptOutcome, AttemptState, Clock, Countdown, FailureOutcome, FileStore, LockTier,
    LoginGuard, MemoryStore, StateStore, StoreError, SystemClock, ThrottlePolicy,
};
