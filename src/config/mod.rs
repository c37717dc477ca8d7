//! Configuration module for sigview-rs
//!
//! This module handles:
//! - Channel descriptors, the transferable record of one signal's display
//!   state (used for saved views and for moving channels between windows)
//! - View configuration files (JSON) holding every channel of a plot
//! - Engine settings (TOML), see [`settings`]
//!
//! # App Data Location
//!
//! Settings are looked up in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.hxyulin.sigview-rs/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.sigview-rs/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.sigview-rs\`
//!
//! # Example
//!
//! ```ignore
//! use sigview_rs::config::ViewConfig;
//!
//! let config = view.to_config();
//! config.save("session.sigview")?;
//!
//! let restored = ViewConfig::load("session.sigview")?;
//! other_view.apply_config(&restored)?;
//! ```

pub mod settings;

pub use settings::{EngineSettings, LogSettings};

use crate::error::{Result, SigViewError};
use crate::format::AxisFormat;
use crate::signal::{Samples, Signal, SignalBuilder};
use crate::types::{color_from_hex, color_to_hex, DisplayFormat, SampleMode, SourceId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.hxyulin.sigview-rs";

/// Extension used for saved views
pub const VIEW_FILE_EXTENSION: &str = "sigview";

/// Current view file version
pub const VIEW_CONFIG_VERSION: u32 = 1;

// ==================== App Data Directory ====================

pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        SigViewError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            SigViewError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

// ==================== Channel Descriptor ====================

/// A value range highlighted in the channel's value column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRange {
    pub start: f64,
    pub stop: f64,
    /// `#RRGGBB`
    pub color: String,
}

impl HighlightRange {
    pub fn new(start: f64, stop: f64, color: impl Into<String>) -> Self {
        Self {
            start,
            stop,
            color: color.into(),
        }
    }

    /// True when `value` lies inside the range (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value <= self.stop
    }
}

/// Serializable display state of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub name: String,

    #[serde(default)]
    pub unit: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Drawn against its own y axis
    #[serde(default)]
    pub individual_axis: bool,

    /// Shares the common y axis with other channels
    #[serde(default)]
    pub common_axis: bool,

    /// `#RRGGBB` or `#RRGGBBAA`
    pub color: String,

    #[serde(default)]
    pub computed: bool,

    /// Expression the channel is computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computation: Option<String>,

    #[serde(default)]
    pub ranges: Vec<HighlightRange>,

    #[serde(default = "default_precision")]
    pub precision: usize,

    #[serde(default, rename = "fmt")]
    pub format: DisplayFormat,

    #[serde(default)]
    pub mode: SampleMode,

    /// Dataset the channel was extracted from
    #[serde(default)]
    pub source: SourceId,

    /// Group and channel index inside the dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<(usize, usize)>,
}

fn default_true() -> bool {
    true
}

fn default_precision() -> usize {
    crate::signal::DEFAULT_PRECISION
}

impl ChannelDescriptor {
    /// Describe a signal with default display flags
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            name: signal.name().to_string(),
            unit: signal.unit().to_string(),
            enabled: true,
            individual_axis: false,
            common_axis: false,
            color: color_to_hex(signal.color()),
            computed: signal.is_computed(),
            computation: signal.computation().map(str::to_string),
            ranges: Vec::new(),
            precision: signal.precision(),
            format: signal.format(),
            mode: signal.mode(),
            source: signal.source().clone(),
            entry: signal.entry(),
        }
    }

    /// Start building a signal carrying this descriptor's identity.
    ///
    /// Format and mode are applied after the build with
    /// [`ChannelDescriptor::apply_to`].
    pub fn to_builder(&self, samples: impl Into<Samples>, timestamps: Vec<f64>) -> Result<SignalBuilder> {
        let mut builder = SignalBuilder::new(self.name.clone(), samples, timestamps)
            .with_unit(self.unit.clone())
            .with_color(self.parsed_color()?)
            .with_precision(self.precision)
            .with_source(self.source.clone());
        if let Some((group, channel)) = self.entry {
            builder = builder.with_entry(group, channel);
        }
        if let Some(computation) = &self.computation {
            builder = builder.computed(computation.clone());
        }
        Ok(builder)
    }

    /// Restore color, precision, format and mode onto a signal
    pub fn apply_to(&self, signal: &mut Signal) -> Result<()> {
        signal.set_color(self.parsed_color()?);
        signal.set_precision(self.precision);
        signal.set_format(self.format);
        signal.set_mode(self.mode);
        Ok(())
    }

    fn parsed_color(&self) -> Result<[u8; 4]> {
        color_from_hex(&self.color).ok_or_else(|| {
            SigViewError::Descriptor(format!(
                "Invalid color '{}' for channel '{}'",
                self.color, self.name
            ))
        })
    }

    /// True when this descriptor addresses `signal`: same source and entry
    /// when both carry one, otherwise the same name
    pub fn matches(&self, signal: &Signal) -> bool {
        match (self.entry, signal.entry()) {
            (Some(a), Some(b)) => a == b && &self.source == signal.source(),
            _ => self.name == signal.name(),
        }
    }
}

// ==================== View Config ====================

/// Everything needed to restore a plot view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_view_version")]
    pub version: u32,

    /// Channels in display order
    #[serde(default)]
    pub channels: Vec<ChannelDescriptor>,

    /// Channel search pattern, kept opaque
    #[serde(default)]
    pub pattern: Option<serde_json::Value>,

    #[serde(default)]
    pub x_range: Option<(f64, f64)>,

    #[serde(default)]
    pub cursor: Option<f64>,

    #[serde(default)]
    pub region: Option<(f64, f64)>,

    #[serde(default)]
    pub axis_format: AxisFormat,
}

fn default_view_version() -> u32 {
    VIEW_CONFIG_VERSION
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            version: VIEW_CONFIG_VERSION,
            channels: Vec::new(),
            pattern: None,
            x_range: None,
            cursor: None,
            region: None,
            axis_format: AxisFormat::default(),
        }
    }
}

impl ViewConfig {
    /// Load a view file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SigViewError::Config(format!("Failed to read view file {:?}: {}", path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            SigViewError::Config(format!("Failed to parse view file {:?}: {}", path, e))
        })
    }

    /// Load a view file, returning defaults if any error occurs
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load view file, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the view as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SigViewError::Config(format!("Failed to create view directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SigViewError::Serialization(format!("Failed to serialize view: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            SigViewError::Config(format!("Failed to write view file {:?}: {}", path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal() -> Signal {
        SignalBuilder::new("engine_speed", vec![1i64, 2, 3], vec![0.0, 1.0, 2.0])
            .with_unit("rpm")
            .with_color([0x10, 0x20, 0x30, 255])
            .with_source(SourceId::new("file-a"))
            .with_entry(2, 7)
            .build()
            .unwrap()
    }

    #[test]
    fn test_descriptor_from_signal() {
        let d = ChannelDescriptor::from_signal(&signal());
        assert_eq!(d.name, "engine_speed");
        assert_eq!(d.unit, "rpm");
        assert_eq!(d.color, "#102030");
        assert_eq!(d.entry, Some((2, 7)));
        assert!(!d.computed);
    }

    #[test]
    fn test_descriptor_json_keys() {
        let mut d = ChannelDescriptor::from_signal(&signal());
        d.format = DisplayFormat::Hex;
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["fmt"], "hex");
        assert_eq!(json["mode"], "phys");
        assert_eq!(json["source"], "file-a");
        assert!(json.get("computation").is_none());
    }

    #[test]
    fn test_descriptor_defaults_on_missing_fields() {
        let d: ChannelDescriptor =
            serde_json::from_str(r##"{"name": "x", "color": "#FF0000"}"##).unwrap();
        assert!(d.enabled);
        assert_eq!(d.precision, crate::signal::DEFAULT_PRECISION);
        assert_eq!(d.format, DisplayFormat::Physical);
        assert_eq!(d.mode, SampleMode::Physical);
    }

    #[test]
    fn test_descriptor_round_trip_through_signal() {
        let mut original = signal();
        original.set_format(DisplayFormat::Binary);
        original.set_mode(SampleMode::Raw);
        original.set_precision(2);
        let d = ChannelDescriptor::from_signal(&original);

        let mut rebuilt = d
            .to_builder(vec![1i64, 2, 3], vec![0.0, 1.0, 2.0])
            .unwrap()
            .build()
            .unwrap();
        d.apply_to(&mut rebuilt).unwrap();

        assert_eq!(ChannelDescriptor::from_signal(&rebuilt), d);
        assert!(d.matches(&rebuilt));
    }

    #[test]
    fn test_format_is_not_applied_to_float_signals() {
        let mut d = ChannelDescriptor::from_signal(&signal());
        d.format = DisplayFormat::Hex;

        let mut float = SignalBuilder::new("engine_speed", vec![1.5, 2.5], vec![0.0, 1.0])
            .build()
            .unwrap();
        d.apply_to(&mut float).unwrap();
        assert_eq!(float.format(), DisplayFormat::Physical);

        let mut int = signal();
        d.apply_to(&mut int).unwrap();
        assert_eq!(int.format(), DisplayFormat::Hex);

        // Integer raw counts behind a float physical view keep the format
        let mut scaled = SignalBuilder::new("engine_speed", vec![1i64, 2], vec![0.0, 1.0])
            .with_conversion(std::sync::Arc::new(crate::conversion::LinearConversion::new(0.5, 0.0)))
            .build()
            .unwrap();
        d.apply_to(&mut scaled).unwrap();
        assert_eq!(scaled.mode(), SampleMode::Physical);
        assert_eq!(scaled.format(), DisplayFormat::Hex);
    }

    #[test]
    fn test_invalid_color_is_descriptor_error() {
        let mut d = ChannelDescriptor::from_signal(&signal());
        d.color = "red".to_string();
        let err = d.to_builder(vec![1.0], vec![0.0]).err().unwrap();
        assert!(matches!(err, SigViewError::Descriptor(_)));
    }

    #[test]
    fn test_matches_by_name_without_entry() {
        let s = SignalBuilder::new("a", vec![1.0], vec![0.0]).build().unwrap();
        let d: ChannelDescriptor =
            serde_json::from_str(r##"{"name": "a", "color": "#000000"}"##).unwrap();
        assert!(d.matches(&s));
        assert!(!d.matches(&signal()));
    }

    #[test]
    fn test_highlight_range() {
        let r = HighlightRange::new(1.0, 2.0, "#00FF00");
        assert!(r.contains(1.0));
        assert!(r.contains(2.0));
        assert!(!r.contains(2.1));
    }

    #[test]
    fn test_view_config_default() {
        let config = ViewConfig::default();
        assert_eq!(config.version, VIEW_CONFIG_VERSION);
        assert!(config.channels.is_empty());

        let parsed: ViewConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, config);
    }
}
