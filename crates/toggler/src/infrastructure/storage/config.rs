//! TOML-based configuration for the `toggler` binary.
//!
//! Read from `toggler.toml` in the working directory unless another path is
//! given with `--config` / `TOGGLER_CONFIG`:
//!
//! ```toml
//! [store]
//! path = "envs.json"
//! concurrency = "serialized"   # or "unsynchronized"
//! write_mode = "atomic"        # or "overwrite"
//!
//! [log]
//! level = "info"
//! ```
//!
//! Every field has a default, so a missing file, a missing section, or a
//! missing key all fall back to the values above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::manage_flags::ConcurrencyMode;
use crate::infrastructure::storage::json_file::WriteMode;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "toggler.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TogglerConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Where and how the flag document is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path of the JSON document.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Coordination of overlapping load → mutate → save cycles.
    #[serde(default)]
    pub concurrency: ConcurrencyMode,
    /// How saves replace the document on disk.
    #[serde(default)]
    pub write_mode: WriteMode,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// `tracing` level used when `RUST_LOG` is unset: `"error"` … `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_store_path() -> PathBuf {
    PathBuf::from("envs.json")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            concurrency: ConcurrencyMode::default(),
            write_mode: WriteMode::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Load / save ───────────────────────────────────────────────────────────────

/// Loads the configuration at `path`, returning defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<TogglerConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TogglerConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path` as pretty TOML, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &TogglerConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_default_config_values() {
        let cfg = TogglerConfig::default();
        assert_eq!(cfg.store.path, PathBuf::from("envs.json"));
        assert_eq!(cfg.store.concurrency, ConcurrencyMode::Serialized);
        assert_eq!(cfg.store.write_mode, WriteMode::Atomic);
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: TogglerConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, TogglerConfig::default());
    }

    #[test]
    fn test_partial_store_section_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[store]
path = "/var/lib/toggler/envs.json"
concurrency = "unsynchronized"
"#;

        // Act
        let cfg: TogglerConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.store.path, PathBuf::from("/var/lib/toggler/envs.json"));
        assert_eq!(cfg.store.concurrency, ConcurrencyMode::Unsynchronized);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.store.write_mode, WriteMode::Atomic);
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn test_write_mode_parses_overwrite() {
        let cfg: TogglerConfig =
            toml::from_str("[store]\nwrite_mode = \"overwrite\"\n").expect("deserialize");
        assert_eq!(cfg.store.write_mode, WriteMode::Overwrite);
    }

    #[test]
    fn test_unknown_concurrency_mode_is_a_parse_error() {
        let result: Result<TogglerConfig, _> = toml::from_str("[store]\nconcurrency = \"yolo\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = std::env::temp_dir()
            .join(format!("toggler_missing_{}", Uuid::new_v4()))
            .join("toggler.toml");

        let cfg = load_config(&path).expect("missing file is not an error");

        assert_eq!(cfg, TogglerConfig::default());
    }

    #[test]
    fn test_load_config_rejects_invalid_toml() {
        let dir = std::env::temp_dir().join(format!("toggler_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("toggler.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_config(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("toggler_test_{}", Uuid::new_v4()));
        let path = dir.join("nested").join("toggler.toml");
        let mut cfg = TogglerConfig::default();
        cfg.store.path = PathBuf::from("data/flags.json");
        cfg.store.write_mode = WriteMode::Overwrite;
        cfg.log.level = "debug".to_string();

        // Act
        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }
}
