// ============================================================================
// src/cmd/mod.rs – command subsystem root
// ============================================================================
pub mod init; // rentguard init
pub mod login; // rentguard login
pub mod reset; // rentguard reset
pub mod status; // rentguard status

use crate::config::Config;
use crate::throttle::{FileStore, LoginGuard, SystemClock};

/// Guard wired to the real clock and the configured state file.
pub type ConsoleGuard = LoginGuard<FileStore, SystemClock>;

pub(crate) fn build_guard(cfg: &Config) -> ConsoleGuard {
    LoginGuard::initialize(
        FileStore::new(&cfg.persistence.state_path),
        SystemClock,
        cfg.throttle.policy(),
    )
}
