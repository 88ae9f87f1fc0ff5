// ============================================================================
// src/config.rs – Config loader (TOML or YAML, serde defaults)
// ============================================================================

use crate::throttle::state::{LockTier, ThrottlePolicy};
use crate::util::atomic::atomic_write_toml;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "rentguard";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleCfg {
    /// Lockout tiers as (attempt count, lock seconds) pairs. The last tier
    /// applies to every count at or above its threshold.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<LockTier>,

    /// Count provider-unreachable failures toward the tiers.
    #[serde(default = "default_count_unreachable")]
    pub count_unreachable: bool,

    /// Countdown refresh interval while a lockout is in force.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

fn default_tiers() -> Vec<LockTier> {
    ThrottlePolicy::default().tiers
}

fn default_count_unreachable() -> bool {
    true
}

fn default_tick_interval_secs() -> u64 {
    1
}

impl Default for ThrottleCfg {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            count_unreachable: default_count_unreachable(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

impl ThrottleCfg {
    pub fn policy(&self) -> ThrottlePolicy {
        ThrottlePolicy {
            tiers: self.tiers.clone(),
            count_unreachable: self.count_unreachable,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceCfg {
    /// Serialized attempt state (survives console restarts).
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Append-only auth event trail.
    #[serde(default = "default_audit_path")]
    pub audit_log_path: PathBuf,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_state_path() -> PathBuf {
    data_dir().join("attempts.json")
}

fn default_audit_path() -> PathBuf {
    data_dir().join("audit.log")
}

impl Default for PersistenceCfg {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            audit_log_path: default_audit_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCfg {
    /// Local admin credential record written by `rentguard init`.
    #[serde(default = "default_credential_path")]
    pub credential_path: PathBuf,
}

fn default_credential_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("admin.toml")
}

impl Default for AdminCfg {
    fn default() -> Self {
        Self {
            credential_path: default_credential_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub throttle: ThrottleCfg,
    #[serde(default)]
    pub persistence: PersistenceCfg,
    #[serde(default)]
    pub admin: AdminCfg,
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    pub fn load<P: AsRef<Path>>(p: P) -> Result<Self> {
        let s = fs::read_to_string(&p)
            .with_context(|| format!("read config: {}", p.as_ref().display()))?;
        let cfg: Self = if p.as_ref().extension().and_then(|e| e.to_str()) == Some("toml") {
            toml::from_str(&s).context("toml parse")?
        } else {
            serde_yaml::from_str(&s).context("yaml parse")?
        };
        Ok(cfg)
    }

    /// Explicit path must load; the default path may be absent (defaults).
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let p = Self::default_path();
                if p.exists() {
                    Self::load(&p)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        atomic_write_toml(path, self, true)
            .with_context(|| format!("write config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_full_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.throttle.tiers.len(), 3);
        assert!(cfg.throttle.count_unreachable);
        assert_eq!(cfg.throttle.tick_interval_secs, 1);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg: Config = toml::from_str(
            r#"
            [throttle]
            count_unreachable = false

            [persistence]
            state_path = "/tmp/attempts.json"
            "#,
        )
        .unwrap();
        assert!(!cfg.throttle.count_unreachable);
        assert_eq!(cfg.persistence.state_path, PathBuf::from("/tmp/attempts.json"));
        assert_eq!(cfg.throttle.tiers.len(), 3, "tier table keeps its default");
    }

    #[test]
    fn tier_table_override_parses() {
        let cfg: Config = toml::from_str(
            r#"
            [throttle]
            tiers = [{ at = 3, secs = 10 }, { at = 6, secs = 120 }]
            "#,
        )
        .unwrap();
        let policy = cfg.throttle.policy();
        assert_eq!(policy.lock_seconds(3), Some(10));
        assert_eq!(policy.lock_seconds(6), Some(120));
        assert_eq!(policy.lock_seconds(7), Some(120));
    }

    #[test]
    fn yaml_loads_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "throttle:\n  tick_interval_secs: 2\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.throttle.tick_interval_secs, 2);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.throttle.count_unreachable = false;
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert!(!loaded.throttle.count_unreachable);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        assert!(Config::load_or_default(Some(Path::new("/nonexistent/cfg.toml"))).is_err());
    }
}
