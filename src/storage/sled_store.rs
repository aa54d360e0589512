//! `sled`-backed implementation of [`KeyValueStore`]

use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use sled::Db;

use super::KeyValueStore;
use crate::error::{CodeChatError, Result};

/// Environment variable that overrides the default store location
pub const STORAGE_PATH_ENV: &str = "CODECHAT_STORAGE_PATH";

/// Embedded on-disk key-value store
pub struct SledStore {
    db: Db,
    path: PathBuf,
}

impl SledStore {
    /// Open the store at the default location
    ///
    /// Honors `CODECHAT_STORAGE_PATH`, otherwise uses `workspace.db` in the
    /// user's data directory.
    ///
    /// # Errors
    ///
    /// Returns `CodeChatError::Storage` if the data directory cannot be
    /// determined or the database cannot be opened.
    pub fn open_default() -> Result<Self> {
        if let Ok(override_path) = std::env::var(STORAGE_PATH_ENV) {
            return Self::open(override_path);
        }

        let proj_dirs = ProjectDirs::from("dev", "codechat", "codechat")
            .ok_or_else(|| CodeChatError::Storage("Could not determine data directory".into()))?;

        Self::open(proj_dirs.data_dir().join("workspace.db"))
    }

    /// Open or create the store at `path`
    ///
    /// # Examples
    ///
    /// ```
    /// use codechat::storage::{KeyValueStore, SledStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SledStore::open(dir.path().join("workspace.db")).unwrap();
    /// store.set("theme", "light").unwrap();
    /// assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| CodeChatError::Storage(e.to_string()))?;
        }

        let db = sled::open(&path)
            .map_err(|e| CodeChatError::Storage(format!("Failed to open database: {}", e)))?;
        tracing::debug!(path = %path.display(), "Opened workspace store");

        Ok(Self { db, path })
    }

    /// Location of the database directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| CodeChatError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let value = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    CodeChatError::Storage(format!("Value for {} is not UTF-8: {}", key, e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| CodeChatError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| CodeChatError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }
}
