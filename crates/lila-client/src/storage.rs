//! Local key-value snapshot store.
//!
//! Holds the session token and the checkout snapshots the order-success
//! step reads back. Values are JSON; the whole map is persisted to one file
//! on every write.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Bearer token of the signed-in account.
pub const TOKEN_KEY: &str = "token";
/// Preview of the last placed order.
pub const LATEST_ORDER_KEY: &str = "lila_latest_order";
/// Checkout state kept across the MoMo redirect.
pub const CHECKOUT_INFO_KEY: &str = "lila_checkout_info";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed for {path}: {message}")]
    Io { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// JSON-backed key-value store. Without a path it lives in memory only.
#[derive(Debug, Default)]
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl LocalStore {
    /// Open the store at `path`, reading existing entries. A missing or
    /// unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                debug!(path = %path.display(), error = %e, "ignoring unreadable storage file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read and decode a value. Entries that no longer decode as `T` read as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok()))
    }

    /// Store a value. The file is written first; if that fails the
    /// in-memory entries are left as they were.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    /// Remove a key, returning whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        if !entries.contains_key(key) {
            return Ok(false);
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(true)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The stored session token, if any.
    pub fn token(&self) -> Option<String> {
        self.get::<String>(TOKEN_KEY)
            .ok()
            .flatten()
            .filter(|t| !t.trim().is_empty())
    }

    pub fn set_token(&self, token: &str) -> Result<(), StoreError> {
        self.set(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<(), StoreError> {
        self.remove(TOKEN_KEY).map(|_| ())
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_error = |e: std::io::Error| StoreError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        std::fs::write(path, bytes).map_err(io_error)
    }
}
