use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chronicle_core::config::ENV_DATA_DIR;
use chronicle_core::CoreConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Directory holding the history file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Storage key (file stem) of the history blob
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

/// Resolve the core config.
///
/// Priority: `--data-dir` > config file > environment > platform data dir.
pub fn resolve_core_config(data_dir: Option<PathBuf>, file: Option<CliConfig>) -> CoreConfig {
    let mut config = CoreConfig::from_env();

    if std::env::var_os(ENV_DATA_DIR).map_or(true, |v| v.is_empty()) {
        if let Some(dir) = dirs::data_dir() {
            config.data_dir = dir.join("chronicle");
        }
    }

    if let Some(file) = file {
        if let Some(dir) = file.data_dir {
            config.data_dir = dir;
        }
        if let Some(key) = file.storage_key {
            config.storage_key = key;
        }
    }

    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{"dataDir": "/tmp/chronicle", "storageKey": "workHistory"}"#;
        let config: CliConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/chronicle")));
        assert_eq!(config.storage_key.as_deref(), Some("workHistory"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: CliConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_flag_overrides_file() {
        let file = CliConfig {
            data_dir: Some(PathBuf::from("/from/file")),
            storage_key: Some("fileKey".to_string()),
        };
        let config = resolve_core_config(Some(PathBuf::from("/from/flag")), Some(file));
        assert_eq!(config.data_dir, PathBuf::from("/from/flag"));
        assert_eq!(config.storage_key, "fileKey");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = CliConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
