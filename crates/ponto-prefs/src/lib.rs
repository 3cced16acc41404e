#![warn(missing_docs)]
//! # ponto-prefs
//!
//! ## Purpose
//! Local key-value storage for the saved-credentials preference record.
//!
//! ## Responsibilities
//! - Define a backend-agnostic [`PreferenceStore`] trait (`get`/`set`/`remove`).
//! - Provide a JSON-file backend for real installs and an in-memory backend
//!   for tests.
//! - Load, save and reset the single [`UserPreferences`] record under
//!   [`USER_PREFERENCES_KEY`].
//!
//! ## Data flow
//! Controller -> [`save_preferences`] / [`reset_preferences`] /
//! [`load_preferences`] -> [`PreferenceStore`] -> device storage.
//!
//! ## Error model
//! I/O and JSON failures return [`PrefsError`]; callers decide whether to
//! surface or log them.
//!
//! ## Security and privacy notes
//! The record holds a plaintext password, exactly as the user asked to save
//! it. It is only written while "remember credentials" is on and is removed
//! as soon as it is turned off. `Debug` output never shows the password.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Storage key of the saved-credentials record.
pub const USER_PREFERENCES_KEY: &str = "@ELETRONIC_POINT_STEFANINI:USER_PREFERENCES";

/// Saved-credentials record.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Saved username.
    #[serde(default)]
    pub username: String,
    /// Saved password.
    #[serde(default)]
    pub password: String,
    /// Remember-credentials flag at save time.
    #[serde(rename = "saveUserAndPass", default)]
    pub save_user_and_pass: bool,
}

impl fmt::Debug for UserPreferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPreferences")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("save_user_and_pass", &self.save_user_and_pass)
            .finish()
    }
}

/// Key-value storage backend.
pub trait PreferenceStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError>;

    /// Removes `key`; removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), PrefsError>;
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        let entries = self.entries.lock().map_err(|_| PrefsError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        let mut entries = self.entries.lock().map_err(|_| PrefsError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PrefsError> {
        let mut entries = self.entries.lock().map_err(|_| PrefsError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON object file.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FilePreferenceStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PrefsError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(PrefsError::Codec),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(error) => Err(self.io_error(error)),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| self.io_error(error))?;
        }

        let encoded = serde_json::to_vec_pretty(entries).map_err(PrefsError::Codec)?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, encoded).map_err(|error| self.io_error(error))?;
        fs::rename(&staging, &self.path).map_err(|error| self.io_error(error))?;
        debug!(path = %self.path.display(), keys = entries.len(), "preference file written");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> PrefsError {
        PrefsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        let _guard = self.guard.lock().map_err(|_| PrefsError::Poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        let _guard = self.guard.lock().map_err(|_| PrefsError::Poisoned)?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), PrefsError> {
        let _guard = self.guard.lock().map_err(|_| PrefsError::Poisoned)?;
        let mut entries = self.read_all()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&entries)
    }
}

/// Reads the saved-credentials record.
///
/// # Errors
/// Returns [`PrefsError::Codec`] when a stored record is not valid JSON.
pub fn load_preferences(
    store: &dyn PreferenceStore,
) -> Result<Option<UserPreferences>, PrefsError> {
    store
        .get(USER_PREFERENCES_KEY)?
        .map(|raw| serde_json::from_str(&raw).map_err(PrefsError::Codec))
        .transpose()
}

/// Writes the saved-credentials record.
///
/// # Errors
/// Propagates backend failures.
pub fn save_preferences(
    store: &dyn PreferenceStore,
    preferences: &UserPreferences,
) -> Result<(), PrefsError> {
    let encoded = serde_json::to_string(preferences).map_err(PrefsError::Codec)?;
    store.set(USER_PREFERENCES_KEY, &encoded)
}

/// Removes the saved-credentials record.
///
/// # Errors
/// Propagates backend failures.
pub fn reset_preferences(store: &dyn PreferenceStore) -> Result<(), PrefsError> {
    store.remove(USER_PREFERENCES_KEY)
}

/// Preference storage errors.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// File backend I/O failure.
    #[error("preference file {path} failed: {source}")]
    Io {
        /// Backing file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Stored value is not valid JSON for its type.
    #[error("preference codec failure: {0}")]
    Codec(serde_json::Error),
    /// A previous holder of the store lock panicked.
    #[error("preference store lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    //! Unit tests for the record codec.

    use super::*;

    #[test]
    fn record_uses_wire_field_names() {
        let store = MemoryPreferenceStore::new();
        save_preferences(
            &store,
            &UserPreferences {
                username: "maria".to_string(),
                password: "segredo".to_string(),
                save_user_and_pass: true,
            },
        )
        .expect("save should work");

        let raw = store
            .get(USER_PREFERENCES_KEY)
            .expect("get should work")
            .expect("record should exist");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(value["saveUserAndPass"], serde_json::Value::Bool(true));
        assert_eq!(value["username"], "maria");
    }

    #[test]
    fn malformed_record_is_a_codec_error() {
        let store = MemoryPreferenceStore::new();
        store
            .set(USER_PREFERENCES_KEY, "{not json")
            .expect("set should work");
        assert!(matches!(load_preferences(&store), Err(PrefsError::Codec(_))));
    }
}
