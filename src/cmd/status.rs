// ============================================================================
// src/cmd/status.rs – Inspect the persisted throttle state
// ============================================================================

use crate::cmd::build_guard;
use crate::config::Config;
use crate::ui::{self, UX};
use anyhow::Result;

pub fn run_status(ui: &UX, cfg: &Config) -> Result<()> {
    ui.banner();

    let guard = build_guard(cfg);
    let state = guard.state();

    ui.info(&format!(
        "State file: {}",
        cfg.persistence.state_path.display()
    ));
    ui.info(&format!(
        "Credential file: {}{}",
        cfg.admin.credential_path.display(),
        if cfg.admin.credential_path.exists() {
            ""
        } else {
            " (missing; run `rentguard init`)"
        }
    ));

    println!("Consecutive failed attempts: {}", state.failure_count);
    if guard.is_locked() {
        let remaining = guard.seconds_remaining();
        ui.warn(&format!(
            "Locked: try again in {remaining} seconds ({}).",
            ui::format_mmss(remaining)
        ));
    } else {
        ui.success("Not locked.");
    }
    Ok(())
}
