use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_DATA_DIR, STORAGE_KEY};
use crate::store::FileStore;

/// Overrides the data directory
pub const ENV_DATA_DIR: &str = "CHRONICLE_DATA_DIR";
/// Overrides the storage key
pub const ENV_STORAGE_KEY: &str = "CHRONICLE_STORAGE_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub storage_key: String,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            storage_key: STORAGE_KEY.to_string(),
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Defaults overridden by `CHRONICLE_DATA_DIR` / `CHRONICLE_STORAGE_KEY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = lookup(ENV_STORAGE_KEY).filter(|v| !v.is_empty()) {
            config.storage_key = key;
        }
        config
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}
