/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Persistent viewer session ids, one per channel.

use crate::constants::SESSION_KEY_PREFIX;
use crate::error::{LiveError, Result};
use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

/// Key/value storage that outlives the page (the browser's localStorage).
pub trait SessionIdStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, session_id: &str) -> Result<()>;
}

pub fn session_key(channel: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{channel}")
}

/// The stored session id for `channel`, created on first use.
pub fn session_id_for(store: &dyn SessionIdStore, channel: &str) -> String {
    let key = session_key(channel);
    match store.load(&key) {
        Some(id) if !id.is_empty() => id,
        _ => {
            let id = Uuid::new_v4().to_string();
            if let Err(e) = store.save(&key, &id) {
                warn!("viewer session id not persisted: {e}");
            }
            id
        }
    }
}

/// Replace the stored session id for `channel` with a fresh one.
pub fn regenerate_session_id(store: &dyn SessionIdStore, channel: &str) -> String {
    let id = Uuid::new_v4().to_string();
    if let Err(e) = store.save(&session_key(channel), &id) {
        warn!("viewer session id not persisted: {e}");
    }
    id
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionIdStore for MemorySessionStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    fn save(&self, key: &str, session_id: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), session_id.to_string());
        Ok(())
    }
}

/// Session ids in a JSON object on disk.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> HashMap<String, String> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("ignoring unreadable session store {}: {e}", self.path.display());
            HashMap::new()
        })
    }
}

impl SessionIdStore for FileSessionStore {
    fn load(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.read_all().remove(key)
    }

    fn save(&self, key: &str, session_id: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut entries = self.read_all();
        entries.insert(key.to_string(), session_id.to_string());
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| LiveError::Storage(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LiveError::Storage(format!("{}: {e}", parent.display())))?;
            }
        }
        std::fs::write(&self.path, json)
            .map_err(|e| LiveError::Storage(format!("{}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_per_channel() {
        let store = MemorySessionStore::default();
        let a = session_id_for(&store, "zktv");
        let b = session_id_for(&store, "zktv");
        let other = session_id_for(&store, "other");
        assert_eq!(a, b);
        assert_ne!(a, other);
        assert!(Uuid::parse_str(&a).is_ok());
        assert_eq!(store.load("zktv_viewer_session_zktv"), Some(a));
    }

    #[test]
    fn regenerate_replaces_stored_id() {
        let store = MemorySessionStore::default();
        let old = session_id_for(&store, "zktv");
        let new = regenerate_session_id(&store, "zktv");
        assert_ne!(old, new);
        assert_eq!(session_id_for(&store, "zktv"), new);
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!("zktv-sessions-{}.json", Uuid::new_v4()));
        let id = session_id_for(&FileSessionStore::new(&path), "zktv");
        assert_eq!(session_id_for(&FileSessionStore::new(&path), "zktv"), id);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let path = std::env::temp_dir().join(format!("zktv-sessions-{}.json", Uuid::new_v4()));
        std::fs::write(&path, "not json").unwrap();
        let store = FileSessionStore::new(&path);
        assert_eq!(store.load("anything"), None);
        store.save("k", "v").unwrap();
        assert_eq!(store.load("k"), Some("v".to_string()));
        let _ = std::fs::remove_file(&path);
    }
}
