// ============================================================================
// src/throttle/store.rs – Durable key-value persistence for attempt state
// ============================================================================

use crate::util::atomic::atomic_write_bytes;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Persistence faults. The guard swallows these after logging; a broken
/// store degrades throttling to in-memory tracking, it never fails a login.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read attempt state: {0}")]
    Read(#[source] io::Error),
    #[error("write attempt state: {0}")]
    Write(String),
}

/// Origin-scoped durable storage for the serialized attempt state.
/// Survives restarts of the console; not shared across machines.
pub trait StateStore: Send {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;
    fn save(&mut self, bytes: &[u8]) -> Result<(), StoreError>;
}

/// State file on disk, written atomically with 0600 permissions.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read(e)),
        }
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        atomic_write_bytes(&self.path, bytes, 0o600, true)
            .map_err(|e| StoreError::Write(format!("{e:#}")))
    }
}

/// Volatile store used in tests and as the conceptual degraded mode.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Option<Vec<u8>>,
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.bytes.clone())
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }
}
