//! Per-user progress snapshot persistence.
//!
//! The gamification service treats storage as an injected `ProgressStore`
//! so it can run against memory in tests and a JSON file on disk in real
//! clients. Snapshots are whole-value replace on every save: concurrent
//! writers (e.g. two clients on one account) are last-write-wins, and the
//! backend remains the authority for XP and badges.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::gamification::GameStats;

/// Quest mini-game position: where the player is and what they finished.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestSnapshot {
    pub current_challenge: usize,
    pub completed_challenges: BTreeSet<String>,
}

/// Everything the client persists for one user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub stats: GameStats,
    pub completed_lessons: BTreeSet<i64>,
    pub quest: QuestSnapshot,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Storage seam for the gamification engine (get/set/clear per user id).
pub trait ProgressStore {
    fn load(&self, user_id: &str) -> Result<Option<PlayerSnapshot>, StoreError>;
    fn save(&self, user_id: &str, snapshot: &PlayerSnapshot) -> Result<(), StoreError>;
    fn clear(&self, user_id: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and throwaway sessions. Cloning shares the
/// underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, PlayerSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, user_id: &str) -> Result<Option<PlayerSnapshot>, StoreError> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(user_id).cloned())
    }

    fn save(&self, user_id: &str, snapshot: &PlayerSnapshot) -> Result<(), StoreError> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(user_id.to_string(), snapshot.clone());
        Ok(())
    }

    fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(user_id);
        Ok(())
    }
}

/// One JSON file per user under a base directory. Saves replace the file
/// wholesale; a corrupt file surfaces as `StoreError::Corrupt` on load so
/// the caller can decide to start fresh.
#[derive(Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        // User ids come from the backend but are embedded in a path, so
        // anything outside [A-Za-z0-9._-] is replaced.
        let safe: String = user_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self, user_id: &str) -> Result<Option<PlayerSnapshot>, StoreError> {
        let path = self.path_for(user_id);
        match std::fs::read_to_string(&path) {
            Ok(s) => {
                let snapshot = serde_json::from_str(&s)?;
                debug!(target: "mlquest_client", path = %path.display(), "Loaded progress snapshot");
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, user_id: &str, snapshot: &PlayerSnapshot) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(user_id);
        let body = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&path, body)?;
        debug!(target: "mlquest_client", path = %path.display(), "Saved progress snapshot");
        Ok(())
    }

    fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(user_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(target: "mlquest_client", path = %path.display(), error = %e, "Failed to clear snapshot");
                Err(e.into())
            }
        }
    }
}

/// Convenience constructor honoring `StorageConfig`: a file store when a
/// directory is configured, memory otherwise.
pub fn store_from_config(cfg: &crate::config::StorageConfig) -> ConfiguredStore {
    match &cfg.dir {
        Some(dir) => ConfiguredStore::File(JsonFileStore::new(dir.as_path())),
        None => ConfiguredStore::Memory(MemoryStore::new()),
    }
}

/// Either concrete store; implements `ProgressStore` by delegation so
/// callers don't need their own dispatch.
#[derive(Clone)]
pub enum ConfiguredStore {
    Memory(MemoryStore),
    File(JsonFileStore),
}

impl ProgressStore for ConfiguredStore {
    fn load(&self, user_id: &str) -> Result<Option<PlayerSnapshot>, StoreError> {
        match self {
            ConfiguredStore::Memory(s) => s.load(user_id),
            ConfiguredStore::File(s) => s.load(user_id),
        }
    }

    fn save(&self, user_id: &str, snapshot: &PlayerSnapshot) -> Result<(), StoreError> {
        match self {
            ConfiguredStore::Memory(s) => s.save(user_id, snapshot),
            ConfiguredStore::File(s) => s.save(user_id, snapshot),
        }
    }

    fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        match self {
            ConfiguredStore::Memory(s) => s.clear(user_id),
            ConfiguredStore::File(s) => s.clear(user_id),
        }
    }
}
