//! Persistent slot holding the bearer token.
//!
//! The stored value is opaque: no validation happens here, claims decoding
//! lives in the auth service.

#[cfg(test)]
#[path = "token_store_test.rs"]
mod token_store_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;

/// Fixed storage key; also the file name used by [`FileTokenStore`].
pub const TOKEN_STORAGE_KEY: &str = "flapper-news-token";

/// A single-value key/value slot for the bearer token.
pub trait TokenStore: Send + Sync {
    /// Persist `token`, overwriting any previous value.
    fn save(&self, token: &str) -> Result<(), StoreError>;

    /// The last persisted token, or `None` if the slot is empty.
    fn get(&self) -> Result<Option<String>, StoreError>;

    /// Remove the persisted token. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Token slot backed by one file on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, token).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "token saved");
        Ok(())
    }

    fn get(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "token cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-process token slot.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { slot: Mutex::new(Some(token.into())) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        // A poisoned slot still holds a valid Option<String>.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.lock() = Some(token.to_owned());
        Ok(())
    }

    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock().clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.lock() = None;
        Ok(())
    }
}
