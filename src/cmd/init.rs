// ============================================================================
// src/cmd/init.rs – First-run setup: write the local admin credential
// ============================================================================

use crate::auth::AdminCredential;
use crate::config::Config;
use crate::ui::UX;
use crate::util::audit::audit_log;
use anyhow::{bail, Result};
use dialoguer::{Input, Password};
use zeroize::Zeroizing;

pub fn run_init(ui: &UX, cfg: &Config, force: bool) -> Result<()> {
    ui.banner();
    ui.info("Setting up the local admin credential.");

    if cfg.admin.credential_path.exists() && !force {
        bail!(
            "credential file already exists: {} (re-run with --force to replace it)",
            cfg.admin.credential_path.display()
        );
    }

    // ------------------------------------------------------------------------
    // Collect the admin identity
    // ------------------------------------------------------------------------
    let email: String = Input::new()
        .with_prompt("Admin e-mail")
        .validate_with(|s: &String| {
            if s.trim().contains('@') {
                Ok(())
            } else {
                Err("enter an e-mail address")
            }
        })
        .interact_text()?;

    let password = Zeroizing::new(
        Password::new()
            .with_prompt("Admin password")
            .with_confirmation("Confirm password", "Passwords do not match.")
            .interact()?,
    );

    // ------------------------------------------------------------------------
    // Derive and persist the credential record
    // ------------------------------------------------------------------------
    ui.info("Deriving the credential hash; this takes a moment.");
    let credential = AdminCredential::derive(&email, &password);
    credential.save(&cfg.admin.credential_path, true)?;

    audit_log(
        &cfg.persistence.audit_log_path,
        "ADMIN_INIT",
        &format!("credential written for {}", credential.email),
    );
    ui.success(&format!(
        "Credential stored at {}",
        cfg.admin.credential_path.display()
    ));
    ui.info("Run `rentguard login` to sign in.");
    Ok(())
}
