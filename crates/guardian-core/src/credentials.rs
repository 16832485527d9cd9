//! Router API credentials and their persistent store.
//!
//! Credentials are persisted verbatim (no encryption) as a JSON value under
//! [`STORAGE_KEY_CREDENTIALS`] in a small key-value file. Other keys in the
//! same file are left untouched.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Storage key for the persisted credential record.
pub const STORAGE_KEY_CREDENTIALS: &str = "mikrotik-api-creds";

/// Directory name used under the platform config directory.
pub const APP_DIR_NAME: &str = "mikrotik-guardian";

/// Router API login.
///
/// `Debug` output redacts the password.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Router address, usually `host:port`
    pub host: String,
    /// API user name
    pub user: String,
    /// API password (may be empty)
    pub pass: String,
}

impl Credentials {
    /// Build a credential triple.
    pub fn new(host: impl Into<String>, user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            pass: pass.into(),
        }
    }

    /// Host and user are both non-empty. Says nothing about validity.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.user.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("pass", &if self.pass.is_empty() { "" } else { "***" })
            .finish()
    }
}

/// Durable key-value home for the credential record.
///
/// Only the connection manager writes through this trait.
pub trait CredentialStore: Send + Sync {
    /// Read the stored record, `None` if nothing was saved.
    fn load(&self) -> Result<Option<Credentials>, StoreError>;

    /// Overwrite the stored record.
    fn save(&self, credentials: &Credentials) -> Result<(), StoreError>;

    /// Remove the stored record.
    fn clear(&self) -> Result<(), StoreError>;
}

/// JSON file backed store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store backed by the given file. The file and its parent directory are
    /// created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location
    /// (`<config dir>/mikrotik-guardian/storage.json`).
    pub fn at_default_location() -> Result<Self, StoreError> {
        Ok(Self::new(default_storage_path()?))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(serde_json::Map::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(serde_json::Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Map to update on save or clear. An unparsable file is replaced.
    fn read_map_for_update(
        &self,
    ) -> Result<(serde_json::Map<String, serde_json::Value>, bool), StoreError> {
        match self.read_map() {
            Ok(map) => Ok((map, false)),
            Err(StoreError::Json(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Credential store is unreadable, overwriting"
                );
                Ok((serde_json::Map::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_map(&self, map: &serde_json::Map<String, serde_json::Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, StoreError> {
        let map = self.read_map()?;
        match map.get(STORAGE_KEY_CREDENTIALS) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let (mut map, _) = self.read_map_for_update()?;
        map.insert(
            STORAGE_KEY_CREDENTIALS.to_string(),
            serde_json::to_value(credentials)?,
        );
        self.write_map(&map)?;
        tracing::debug!(path = %self.path.display(), "Saved router credentials");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let (mut map, corrupt) = self.read_map_for_update()?;
        if map.remove(STORAGE_KEY_CREDENTIALS).is_some() || corrupt {
            self.write_map(&map)?;
            tracing::debug!(path = %self.path.display(), "Removed router credentials");
        }
        Ok(())
    }
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a record.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: Mutex::new(Some(credentials)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, StoreError> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StoreError> {
        *self.inner.lock() = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.inner.lock() = None;
        Ok(())
    }
}

/// Default location of the key-value storage file.
pub fn default_storage_path() -> Result<PathBuf, StoreError> {
    let base = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
    Ok(base.join(APP_DIR_NAME).join("storage.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_requires_host_and_user() {
        assert!(Credentials::new("10.0.0.1:8728", "admin", "").is_configured());
        assert!(!Credentials::new("", "admin", "x").is_configured());
        assert!(!Credentials::new("10.0.0.1", "", "x").is_configured());
        assert!(!Credentials::default().is_configured());
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("10.0.0.1", "admin", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("10.0.0.1"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("storage.json"));

        assert_eq!(store.load().unwrap(), None);

        let creds = Credentials::new("103.172.204.153:8728", "apiuser", "secret");
        store.save(&creds).unwrap();
        assert_eq!(store.load().unwrap(), Some(creds));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let store = FileCredentialStore::new(&path);
        store.save(&Credentials::new("r1", "admin", "")).unwrap();
        store.clear().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let map: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(map["theme"], "dark");
        assert!(map.get(STORAGE_KEY_CREDENTIALS).is_none());
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn file_store_save_overwrites_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let store = FileCredentialStore::new(&path);
        let creds = Credentials::new("r1", "admin", "");

        for garbage in ["{ truncated", "[1,2]"] {
            std::fs::write(&path, garbage).unwrap();
            store.save(&creds).unwrap();
            assert_eq!(store.load().unwrap(), Some(creds.clone()));
        }
    }

    #[test]
    fn file_store_clear_resets_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ truncated").unwrap();

        let store = FileCredentialStore::new(&path);
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn memory_store() {
        let store = MemoryCredentialStore::with_credentials(Credentials::new("r1", "u", "p"));
        assert!(store.load().unwrap().is_some());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
