// ============================================================================
// src/cmd/login.rs – Interactive sign-in workflow with throttle enforcement
// ============================================================================

use crate::auth::CredentialFileAuthenticator;
use crate::cmd::{build_guard, ConsoleGuard};
use crate::config::Config;
use crate::throttle::{AttemptOutcome, Countdown};
use crate::ui::{self, UX};
use crate::util::audit::audit_log;
use anyhow::Result;
use dialoguer::{Input, Password};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zeroize::Zeroizing;

pub fn run_login(ui: &UX, cfg: &Config) -> Result<()> {
    ui.banner();

    let authenticator = CredentialFileAuthenticator::new(&cfg.admin.credential_path);
    let audit = cfg.persistence.audit_log_path.clone();
    let guard = Arc::new(Mutex::new(build_guard(cfg)));
    let interval = Duration::from_secs(cfg.throttle.tick_interval_secs.max(1));

    loop {
        // --------------------------------------------------------------------
        // Step 1: Sit out any lockout already in force
        // --------------------------------------------------------------------
        wait_out_active_lock(&guard, interval);

        // --------------------------------------------------------------------
        // Step 2: Collect credentials
        // --------------------------------------------------------------------
        let email: String = Input::new().with_prompt("E-mail").interact_text()?;
        let secret = Zeroizing::new(Password::new().with_prompt("Password").interact()?);

        // --------------------------------------------------------------------
        // Step 3: One guarded attempt
        // --------------------------------------------------------------------
        let outcome = {
            let mut g = guard.lock().unwrap_or_else(|p| p.into_inner());
            g.attempt(&authenticator, &email, &secret)
        };

        match outcome {
            AttemptOutcome::Success => {
                audit_log(&audit, "LOGIN_OK", &email);
                ui.success("Login successful. Welcome back.");
                return Ok(());
            }
            AttemptOutcome::Rejected { attempts } => {
                audit_log(&audit, "LOGIN_FAIL", &format!("{email} attempt {attempts}"));
                ui.error(&format!("Invalid email or password. Attempts: {attempts}"));
            }
            AttemptOutcome::LockedOut { duration } => {
                let secs = duration.as_secs();
                audit_log(&audit, "LOGIN_LOCKED", &format!("{email} blocked {secs}s"));
                ui.error(&format!(
                    "Too many failed login attempts. Account blocked for {}.",
                    ui::format_block_duration(secs)
                ));
            }
            AttemptOutcome::Locked { remaining_secs } => {
                ui.warn(&format!(
                    "Account is temporarily blocked. Try again in {remaining_secs} seconds."
                ));
            }
            AttemptOutcome::NotCounted { reason } => {
                audit_log(&audit, "LOGIN_OUTAGE", &reason);
                ui.warn("Sign-in service is unreachable. This attempt was not counted.");
            }
        }
    }
}

/// Block on an in-place countdown until the current lock (if any) expires.
/// The ticker owns expiry detection; it resets the persisted state when the
/// deadline passes and stops on its own.
fn wait_out_active_lock(guard: &Arc<Mutex<ConsoleGuard>>, interval: Duration) {
    let locked = guard.lock().unwrap_or_else(|p| p.into_inner()).is_locked();
    if !locked {
        return;
    }

    let ticker = Countdown::start(Arc::clone(guard), interval, |remaining| {
        ui::render_countdown_tick(remaining);
        if remaining == 0 {
            ui::render_countdown_end();
        }
    });
    ticker.wait();
}
