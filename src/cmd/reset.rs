// ============================================================================
// src/cmd/reset.rs – Operator reset of the throttle state
// ============================================================================

use crate::cmd::build_guard;
use crate::config::Config;
use crate::throttle::AttemptState;
use crate::ui::UX;
use crate::util::audit::audit_log;
use anyhow::Result;
use dialoguer::Confirm;

pub fn run_reset(ui: &UX, cfg: &Config, yes: bool) -> Result<()> {
    let mut guard = build_guard(cfg);
    let before = guard.state().clone();

    if before == AttemptState::default() {
        ui.info("Nothing to reset; no failures recorded.");
        return Ok(());
    }

    if !yes {
        let prompt = format!(
            "Clear {} recorded failure(s) and any active lock?",
            before.failure_count
        );
        if !Confirm::new().with_prompt(prompt).default(false).interact()? {
            ui.info("Reset cancelled.");
            return Ok(());
        }
    }

    guard.clear();
    audit_log(
        &cfg.persistence.audit_log_path,
        "THROTTLE_RESET",
        &format!("cleared failure count {}", before.failure_count),
    );
    ui.success("Throttle state cleared.");
    Ok(())
}
