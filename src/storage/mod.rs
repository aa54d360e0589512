//! Durable key-value store for workspace state
//!
//! The workspace keeps its state (theme, selected language and saved code)
//! in a small process-wide key-value store. Writes are whole-value
//! overwrites from a single writer, so no transactional discipline is
//! needed.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{CodeChatError, Result};

pub mod sled_store;
pub use sled_store::SledStore;

/// Key holding `"dark"` or `"light"`
pub const THEME_KEY: &str = "theme";

/// Key holding the id of the last selected language
pub const SELECTED_LANGUAGE_KEY: &str = "selectedLanguage";

/// Key holding the buffer in global persistence mode
pub const SAVED_CODE_KEY: &str = "savedCode";

/// Key holding the buffer of one language in per-language persistence mode
///
/// # Examples
///
/// ```
/// use codechat::storage::saved_code_key;
///
/// assert_eq!(saved_code_key("python"), "savedCode.python");
/// ```
pub fn saved_code_key(language_id: &str) -> String {
    format!("{}.{}", SAVED_CODE_KEY, language_id)
}

/// String key-value store shared by the workspace components
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store used for ephemeral workspaces and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored entry
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CodeChatError::Storage("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CodeChatError::Storage("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
