//! Search configuration, loaded from TOML.
//!
//! Every field has a default, so a configuration file only needs to list the values it
//! overrides:
//!
//! ```toml
//! max_depth = 16
//! timeout_ms = 500
//! ```
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    magic::{
        CONFIG_DIR_NAME, DEFAULT_MAX_DEPTH, DEFAULT_TIMEOUT_MS, ENV_SEARCH_CONFIG_PATH,
        SEARCH_CONFIG_FILE_NAME,
    },
    utils::error::{CyError, CyResult},
};

/// Budgets of a proof search session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of rule applications on a single branch.
    pub max_depth: usize,
    /// Maximum number of worker threads. `0` and `1` both search on the calling thread.
    pub max_workers: usize,
    /// Wall-clock budget of the whole session.
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SearchConfig {
    /// Get the default path to the search configuration file.
    pub fn default_path() -> PathBuf {
        if let Ok(config_path) = std::env::var(ENV_SEARCH_CONFIG_PATH) {
            return config_path.into();
        }

        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push(CONFIG_DIR_NAME);
        path.push(SEARCH_CONFIG_FILE_NAME);
        path
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> CyResult<Self> {
        toml::from_str(text).map_err(|source| CyError::ConfigParseError {
            source,
            file: "<inline>".to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> CyResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;

        toml::from_str(&toml_str).map_err(|source| CyError::ConfigParseError {
            source,
            file: path.display().to_string(),
        })
    }

    /// Load the file at [`SearchConfig::default_path`], falling back to the defaults when it
    /// does not exist.
    pub fn load_or_default() -> CyResult<Self> {
        let path = Self::default_path();
        if path.is_file() {
            Self::load_from_toml(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the configuration to a TOML file, creating parent directories as needed.
    pub fn save_to_toml(&self, path: &Path) -> CyResult<()> {
        let toml_str = toml::to_string(self).map_err(|e| {
            CyError::SerializationError(format!(
                "Failed during serialization of TOML to path `{}`: {}",
                path.display(),
                e
            ))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str).map_err(CyError::IoError)
    }

    pub(crate) fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = SearchConfig::from_toml_str("max_depth = 3\n").unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = SearchConfig::from_toml_str("max_depth = \"deep\"").unwrap_err();
        assert!(err.is_config_parse_error());
    }
}
