// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistent storage for the session tokens.
//!
//! The store is a plain key/value map, the analogue of browser local
//! storage. It does not encrypt and does not enforce expiry; expiry is
//! decided by the session decoder. Storage failures are logged and
//! recovered here, never returned to callers.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Key holding the access token.
pub const TOKEN_KEY: &str = "auth_token";
/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Key of the cached user blob written by older dashboard builds.
pub const USER_KEY: &str = "user";

/// String key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// Process-wide in-memory storage.
#[derive(Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|v| v.value().clone())
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.remove(key);
    }
}

/// Storage errors (logged, never propagated past this module).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt storage file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON-file storage that survives process restarts.
///
/// Every write rewrites the whole file via a temporary file and rename, so a
/// crash mid-write leaves the previous contents intact.
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty; the next write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match load(&path) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session storage");
                BTreeMap::new()
            }
        };

        Self {
            path,
            items: Mutex::new(items),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, items: &BTreeMap<String, String>) {
        if let Err(e) = write_atomic(&self.path, items) {
            tracing::warn!(error = %e, "Failed to persist session storage");
        }
    }
}

impl KeyValueStore for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        let mut items = self.lock();
        items.insert(key.to_string(), value.to_string());
        self.persist(&items);
    }

    fn remove_item(&self, key: &str) {
        let mut items = self.lock();
        if items.remove(key).is_some() {
            self.persist(&items);
        }
    }
}

fn load(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
        path: path.display().to_string(),
        source,
    })
}

fn write_atomic(path: &Path, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(items).map_err(|source| StorageError::Corrupt {
        path: path.display().to_string(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

/// Typed access to the session tokens.
///
/// Every session start or end bumps a generation number. Work that began
/// under one generation (a token refresh) writes back only if the session
/// it belongs to is still current.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
    generation: Arc<Mutex<u64>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            generation: Arc::new(Mutex::new(0)),
        }
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current session generation.
    pub fn generation(&self) -> u64 {
        *self.lock_generation()
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::open(path)))
    }

    /// Current access token, if any. Empty strings count as absent.
    pub fn token(&self) -> Option<String> {
        self.storage.get_item(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        self.storage.set_item(TOKEN_KEY, token);
    }

    pub fn remove_token(&self) {
        self.storage.remove_item(TOKEN_KEY);
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage
            .get_item(REFRESH_TOKEN_KEY)
            .filter(|t| !t.is_empty())
    }

    pub fn set_refresh_token(&self, token: &str) {
        self.storage.set_item(REFRESH_TOKEN_KEY, token);
    }

    pub fn remove_refresh_token(&self) {
        self.storage.remove_item(REFRESH_TOKEN_KEY);
    }

    /// Remove every session key, including the legacy cached user blob.
    pub fn clear(&self) {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.remove_all();
    }

    /// [`TokenStore::clear`], but only while `generation` is current.
    pub fn clear_if_current(&self, generation: u64) -> bool {
        let mut current = self.lock_generation();
        if *current != generation {
            return false;
        }
        *current += 1;
        self.remove_all();
        true
    }

    /// Store the tokens of a new session, replacing any previous one.
    pub fn start_session(&self, token: &str, refresh_token: Option<&str>) {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.set_token(token);
        match refresh_token {
            Some(refresh) => self.set_refresh_token(refresh),
            None => self.remove_refresh_token(),
        }
    }

    /// Store refreshed tokens if `generation` is still current.
    ///
    /// Without a new refresh token the stored one is kept.
    pub fn replace_if_current(
        &self,
        generation: u64,
        token: &str,
        refresh_token: Option<&str>,
    ) -> bool {
        let current = self.lock_generation();
        if *current != generation {
            return false;
        }
        self.set_token(token);
        if let Some(refresh) = refresh_token {
            self.set_refresh_token(refresh);
        }
        true
    }

    fn remove_all(&self) {
        self.storage.remove_item(TOKEN_KEY);
        self.storage.remove_item(REFRESH_TOKEN_KEY);
        self.storage.remove_item(USER_KEY);
    }
}
