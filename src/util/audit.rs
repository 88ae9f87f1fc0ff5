// ============================================================================
// src/util/audit.rs – Minimal append-only audit trail
// ============================================================================

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Append a timestamped event to the audit log (0600 permissions).
/// Silent failure if the log is unwritable – auditing never blocks a login.
pub fn audit_log(path: &Path, event: &str, detail: &str) {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            let _ = fs::create_dir_all(dir);
        }
    }
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)
    {
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(file, "[{ts}] {event}: {detail}");
    }
}
