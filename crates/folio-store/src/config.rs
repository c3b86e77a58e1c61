//! Store configuration.
//!
//! ```toml
//! name = "folio"
//! version = 2
//! path = "/var/lib/folio/folio.db"
//!
//! [size_estimate]
//! book_bytes = 51200
//! business_plan_bytes = 30720
//!
//! [progress]
//! debounce_ms = 500
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_types::SizeEstimate;
use serde::{Deserialize, Serialize};

use crate::schema::SCHEMA_VERSION;

/// Minimum progress debounce in milliseconds.
pub const MIN_DEBOUNCE_MS: u64 = 50;
/// Maximum progress debounce in milliseconds.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store name; also the default database file stem.
    pub name: String,
    /// Schema version to open the database at.
    pub version: u32,
    /// Database file path. Defaults to `<data dir>/folio/<name>.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Per-record size assumptions for storage statistics.
    pub size_estimate: SizeEstimate,
    /// Reading progress settings.
    pub progress: ProgressConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "folio".to_string(),
            version: SCHEMA_VERSION,
            path: None,
            size_estimate: SizeEstimate::default(),
            progress: ProgressConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from the default path, or defaults if it does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every problem found.
    ///
    /// ```
    /// use folio_store::StoreConfig;
    ///
    /// StoreConfig::default().validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError {
                field: "name".to_string(),
                message: "store name cannot be empty".to_string(),
            });
        }

        if self.version == 0 || self.version > SCHEMA_VERSION {
            errors.push(ValidationError {
                field: "version".to_string(),
                message: format!(
                    "schema version {} is not supported (expected 1-{})",
                    self.version, SCHEMA_VERSION
                ),
            });
        }

        if let Some(path) = &self.path
            && path.as_os_str().is_empty()
        {
            errors.push(ValidationError {
                field: "path".to_string(),
                message: "database path cannot be empty (omit it for the default)".to_string(),
            });
        }

        errors.extend(self.progress.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Database file the store opens.
    pub fn db_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => crate::default_data_dir().join(format!("{}.db", self.name)),
        }
    }
}

/// Reading progress settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Quiet period before a pending progress update is written.
    pub debounce_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl ProgressConfig {
    /// Debounce as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Validate progress settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&self.debounce_ms) {
            errors.push(ValidationError {
                field: "progress.debounce_ms".to_string(),
                message: format!(
                    "debounce {}ms is out of range ({}-{}ms)",
                    self.debounce_ms, MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS
                ),
            });
        }

        errors
    }
}

/// Default configuration file path.
///
/// - Linux: `~/.config/folio/store.toml`
/// - macOS: `~/Library/Application Support/folio/store.toml`
/// - Windows: `C:\Users\<user>\AppData\Roaming\folio\store.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
        .join("store.toml")
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `progress.debounce_ms`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
