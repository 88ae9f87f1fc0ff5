// ============================================================================
// src/throttle/countdown.rs – Cancellable lockout countdown ticker
// ============================================================================

use crate::throttle::clock::Clock;
use crate::throttle::store::StateStore;
use crate::throttle::LoginGuard;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Background ticker for an active lockout. Once per interval it re-reads
/// the shared guard, reports the remaining seconds to `on_tick`, and stops
/// on its own when the lock expires. `cancel` (or dropping the handle)
/// stops it early without touching the guard state.
pub struct Countdown {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Spawn the ticker against a shared guard. `on_tick` runs on the
    /// ticker thread, including one final call with 0 when the lock ends.
    pub fn start<S, C, F>(
        guard: Arc<Mutex<LoginGuard<S, C>>>,
        interval: Duration,
        mut on_tick: F,
    ) -> Self
    where
        S: StateStore + Send + 'static,
        C: Clock + 'static,
        F: FnMut(u64) + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let cancelled = Arc::clone(&cancel);
        let handle = thread::spawn(move || loop {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let remaining = {
                // Guard state stays consistent across a poisoned lock.
                let mut g = guard.lock().unwrap_or_else(|p| p.into_inner());
                g.tick();
                g.seconds_remaining()
            };
            on_tick(remaining);
            if remaining == 0 {
                break;
            }
            thread::sleep(interval);
        });
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Ask the ticker to stop after its current iteration.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Block until the ticker thread exits (lock expiry or cancellation).
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
