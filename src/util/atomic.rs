// ============================================================================
// src/util/atomic.rs – Durable, permissioned atomic writes (state + config)
// ============================================================================

use anyhow::{bail, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;

/// Fsync a directory so a completed rename survives power loss.
fn fsync_dir(dir: &Path) -> Result<()> {
    let f = File::open(dir).with_context(|| format!("open dir for fsync: {}", dir.display()))?;
    f.sync_all()
        .with_context(|| format!("fsync dir: {}", dir.display()))?;
    Ok(())
}

/// Refuse to replace a symlink; the rename would follow it elsewhere.
fn reject_symlink_target(path: &Path) -> Result<()> {
    if let Ok(meta) = fs::symlink_metadata(path) {
        if meta.file_type().is_symlink() {
            bail!("refusing to write through symlink: {}", path.display());
        }
    }
    Ok(())
}

/// Write bytes to a temp file in the target's directory, fsync, rename into
/// place, then fsync the directory. The exact POSIX mode is applied
/// regardless of umask. With `force` false an existing file is an error.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8], mode: u32, force: bool) -> Result<()> {
    reject_symlink_target(path)?;

    let dir = path
        .parent()
        .context("target path has no parent directory")?;
    if !dir.as_os_str().is_empty() && !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("create parent directory: {}", dir.display()))?;
    }

    if !force && path.exists() {
        bail!("file already exists: {}", path.display());
    }

    let file_name = path
        .file_name()
        .context("target path missing file name")?
        .to_string_lossy();

    // Unique temp sibling; a handful of retries covers name collisions.
    let mut tmp = dir.join(format!("{file_name}.tmp-{}", nanoid::nanoid!(8)));
    for _ in 0..8 {
        if !tmp.exists() {
            break;
        }
        tmp = dir.join(format!("{file_name}.tmp-{}", nanoid::nanoid!(8)));
    }

    let mut f = OpenOptions::new()
        .create_new(true)
        .write(true)
        .mode(mode)
        .open(&tmp)
        .with_context(|| format!("open temp file: {}", tmp.display()))?;
    f.write_all(bytes).context("write temp file")?;
    f.sync_all().context("fsync temp file")?;

    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("set permissions on {}", path.display()))?;

    if !dir.as_os_str().is_empty() {
        fsync_dir(dir)?;
    }
    Ok(())
}

/// Atomic write of a TOML-serializable document with 0600 permissions.
pub fn atomic_write_toml<T: serde::Serialize>(path: &Path, value: &T, force: bool) -> Result<()> {
    let s = toml::to_string_pretty(value).context("serialize toml")?;
    atomic_write_bytes(path, s.as_bytes(), 0o600, force)
}
