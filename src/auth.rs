// ============================================================================
// src/auth.rs – Authenticator seam + local admin credential file
// ============================================================================

use crate::util::atomic::atomic_write_toml;
use crate::util::kdf::pbkdf2_sha256;
use anyhow::{Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroizing;

const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Why a login attempt did not succeed. Both variants count as a failed
/// attempt for throttling purposes; only `Unavailable` can be exempted by
/// policy.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("authenticator unavailable: {0}")]
    Unavailable(String),
}

/// The identity check behind the throttle. The guard calls this at most
/// once per unlocked attempt and never while a lockout is in force.
pub trait Authenticator {
    fn verify(&self, identifier: &str, secret: &str) -> Result<(), AuthError>;
}

/// Salted PBKDF2-HMAC-SHA256 record for the single console admin,
/// stored as TOML with 0600 permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredential {
    pub email: String,
    pub salt: String,
    pub iterations: u32,
    pub hash: String,
}

impl AdminCredential {
    /// Derive a fresh credential record with a random salt.
    pub fn derive(email: &str, password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let mut hash = Zeroizing::new([0u8; HASH_LEN]);
        pbkdf2_sha256(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut *hash);
        Self {
            email: email.trim().to_string(),
            salt: hex::encode(salt),
            iterations: PBKDF2_ITERATIONS,
            hash: hex::encode(*hash),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("read credential file {}", path.display()))?;
        toml::from_str(&s).context("credential file parse")
    }

    pub fn save(&self, path: &Path, force: bool) -> Result<()> {
        atomic_write_toml(path, self, force)
            .with_context(|| format!("write credential file {}", path.display()))
    }

    /// Check a presented email/password pair against the stored record.
    pub fn matches(&self, email: &str, password: &str) -> Result<bool> {
        if !self.email.eq_ignore_ascii_case(email.trim()) {
            return Ok(false);
        }
        let salt = hex::decode(&self.salt).context("decode credential salt")?;
        let stored = Zeroizing::new(hex::decode(&self.hash).context("decode credential hash")?);
        let mut derived = Zeroizing::new(vec![0u8; stored.len()]);
        pbkdf2_sha256(password.as_bytes(), &salt, self.iterations, &mut derived);
        Ok(ct_eq(&derived, &stored))
    }
}

/// Constant-time byte comparison so hash checks leak no prefix length.
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// File-backed authenticator standing in for the hosted identity provider.
/// An unreadable or missing credential file is an outage, not a rejection.
#[derive(Debug, Clone)]
pub struct CredentialFileAuthenticator {
    path: PathBuf,
}

impl CredentialFileAuthenticator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Authenticator for CredentialFileAuthenticator {
    fn verify(&self, identifier: &str, secret: &str) -> Result<(), AuthError> {
        let credential = AdminCredential::load(&self.path)
            .map_err(|e| AuthError::Unavailable(format!("{e:#}")))?;
        match credential.matches(identifier, secret) {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => Err(AuthError::Unavailable(format!("{e:#}"))),
        }
    }
}
