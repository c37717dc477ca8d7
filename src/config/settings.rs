//! Engine settings
//!
//! Tunables for the numeric core and logging, stored as TOML. The settings
//! file is looked up at `$SIGVIEW_CONFIG` first and then at
//! `settings.toml` inside the app data directory.
//!
//! # Main Types
//!
//! - [`EngineSettings`] - Decimation, precision and timebase tunables
//! - [`LogSettings`] - Log filter and optional log directory
//!
//! # Example
//!
//! ```toml
//! default_trim_width = 1900
//! default_precision = 6
//! union_concat_limit = 50000000
//! recompute_debounce_ms = 50
//!
//! [log]
//! filter = "info,sigview_rs=debug"
//! directory = "/var/log/sigview"
//! ```

use crate::config::{app_data_dir, ensure_app_data_dir};
use crate::error::{Result, SigViewError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the settings path
pub const CONFIG_ENV_VAR: &str = "SIGVIEW_CONFIG";

/// Settings filename inside the app data directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "info,sigview_rs=debug";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Pixel columns assumed when the plot has not reported its width
    pub default_trim_width: usize,

    /// Decimal digits for signals that do not specify their own
    pub default_precision: usize,

    /// Total timestamp count above which the union timebase is built
    /// pairwise instead of by one concatenation
    pub union_concat_limit: usize,

    /// Delay the UI waits after enable/disable toggles before asking for a
    /// new union timebase
    pub recompute_debounce_ms: u64,

    pub log: LogSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_trim_width: 1900,
            default_precision: crate::signal::DEFAULT_PRECISION,
            union_concat_limit: crate::analysis::timebase::DEFAULT_CONCAT_LIMIT,
            recompute_debounce_ms: 50,
            log: LogSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,

    /// Directory for daily-rolling log files; console only when unset
    pub directory: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            directory: None,
        }
    }
}

impl EngineSettings {
    /// Path the settings are loaded from by default
    pub fn default_path() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => app_data_dir().map(|p| p.join(SETTINGS_FILE)),
        }
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SigViewError::Config(format!("Failed to read settings {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            SigViewError::Config(format!("Failed to parse settings {:?}: {}", path, e))
        })
    }

    /// Load from the default path, returning defaults on any error.
    ///
    /// A missing file is not an error.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SigViewError::Config(format!("Failed to create settings directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SigViewError::Serialization(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            SigViewError::Config(format!("Failed to write settings {:?}: {}", path, e))
        })
    }

    /// Save to the app data directory
    pub fn save_default(&self) -> Result<PathBuf> {
        let path = ensure_app_data_dir()?.join(SETTINGS_FILE);
        self.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.default_trim_width, 1900);
        assert_eq!(settings.union_concat_limit, 50_000_000);
        assert_eq!(settings.recompute_debounce_ms, 50);
        assert_eq!(settings.log.filter, DEFAULT_LOG_FILTER);
        assert!(settings.log.directory.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: EngineSettings = toml::from_str(
            r#"
default_precision = 3

[log]
filter = "warn"
"#,
        )
        .unwrap();
        assert_eq!(settings.default_precision, 3);
        assert_eq!(settings.default_trim_width, 1900);
        assert_eq!(settings.log.filter, "warn");
    }

    #[test]
    fn test_unparseable_toml() {
        assert!(toml::from_str::<EngineSettings>("default_precision = \"six\"").is_err());
    }
}
