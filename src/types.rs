//! Core data types for sigview-rs
//!
//! This module contains the small value types shared by every other module:
//! identities, the sample-kind tag, display format and mode selectors, and
//! the scalar values that statistics and cursor lookups hand back.
//!
//! # Main Types
//!
//! - [`SignalId`] - Process-unique signal identity
//! - [`TimebaseId`] - Identity of a timestamp array shared by several signals
//! - [`SourceId`] - Identity of the dataset a signal was extracted from
//! - [`SampleKind`] - Tag for the numeric domain of a sample view
//! - [`DisplayFormat`] / [`SampleMode`] - Per-signal presentation selectors
//! - [`Scalar`] / [`SampleValue`] - Typed results of reductions and lookups

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// RGBA color
pub type Color = [u8; 4];

/// Placeholder shown for byte-string samples that decode to nothing
pub const EMPTY_STRING_PLACEHOLDER: &str = "<empty string>";

/// Sentinel rendered when a statistic has no finite samples to reduce
pub const NOT_AVAILABLE: &str = "n.a.";

/// Global counter for generating unique signal IDs
static NEXT_SIGNAL_ID: AtomicU64 = AtomicU64::new(1);

/// Global counter for generating timebase group IDs
static NEXT_TIMEBASE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a signal
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub u64);

impl SignalId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        SignalId(NEXT_SIGNAL_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Debug for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalId({:012x})", self.0)
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:012x}", self.0)
    }
}

/// Identity of a timestamp array.
///
/// Every signal extracted from the same acquisition carries the same id, so
/// the registry can tell which signals share a timebase without comparing
/// arrays. A time shift always allocates a new id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TimebaseId(pub u64);

impl TimebaseId {
    /// Allocate a fresh, never-before-used group id
    pub fn next() -> Self {
        TimebaseId(NEXT_TIMEBASE_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for TimebaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tb{}", self.0)
    }
}

/// Identifier of the dataset (measurement file) a signal belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        SourceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric domain of a sample view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleKind {
    /// Byte strings (no numeric reduction)
    Text,
    /// Signed or unsigned integers
    Integer,
    /// Floating point
    Float,
}

impl SampleKind {
    pub fn is_numeric(self) -> bool {
        !matches!(self, SampleKind::Text)
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleKind::Text => write!(f, "text"),
            SampleKind::Integer => write!(f, "integer"),
            SampleKind::Float => write!(f, "float"),
        }
    }
}

/// How integer values are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DisplayFormat {
    /// Plain decimal value
    #[default]
    #[serde(rename = "phys")]
    Physical,
    /// `0x` prefixed upper-case hexadecimal
    #[serde(rename = "hex")]
    Hex,
    /// `0b` prefixed binary
    #[serde(rename = "bin")]
    Binary,
}

impl DisplayFormat {
    pub fn all() -> &'static [DisplayFormat] {
        &[DisplayFormat::Physical, DisplayFormat::Hex, DisplayFormat::Binary]
    }
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFormat::Physical => write!(f, "phys"),
            DisplayFormat::Hex => write!(f, "hex"),
            DisplayFormat::Binary => write!(f, "bin"),
        }
    }
}

/// Which sample view is active for plotting and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SampleMode {
    #[serde(rename = "raw")]
    Raw,
    #[default]
    #[serde(rename = "phys")]
    Physical,
}

impl fmt::Display for SampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleMode::Raw => write!(f, "raw"),
            SampleMode::Physical => write!(f, "phys"),
        }
    }
}

/// A numeric value that remembers whether it came from an integer view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
}

impl Scalar {
    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::Integer(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }

    pub fn kind(self) -> SampleKind {
        match self {
            Scalar::Integer(_) => SampleKind::Integer,
            Scalar::Float(_) => SampleKind::Float,
        }
    }
}

/// One sample read back from a signal
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Integer(i64),
    Float(f64),
    /// Decoded byte string
    Text(String),
    /// No sample exists at or before the requested point
    NotAvailable,
}

impl SampleValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SampleValue::Integer(v) => Some(*v as f64),
            SampleValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, SampleValue::NotAvailable)
    }
}

impl From<Scalar> for SampleValue {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Integer(v) => SampleValue::Integer(v),
            Scalar::Float(v) => SampleValue::Float(v),
        }
    }
}

/// Generate a distinct color based on an index
/// Uses the golden ratio to spread hues evenly across the color wheel
pub fn generate_color(index: usize) -> Color {
    const GOLDEN_RATIO: f32 = 0.618033988749895;

    let hue = ((index as f32 * GOLDEN_RATIO) % 1.0) * 360.0;

    // Medium saturation and value stay readable on light and dark backgrounds
    let (r, g, b) = hsv_to_rgb(hue, 0.7, 0.85);
    [r, g, b, 255]
}

/// Render a color as `#RRGGBB` (alpha is dropped)
pub fn color_to_hex(color: Color) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}

/// Parse `#RRGGBB` or `#RRGGBBAA`
pub fn color_from_hex(text: &str) -> Option<Color> {
    let hex = text.strip_prefix('#')?;
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

/// Convert HSV (hue 0-360, saturation 0-1, value 0-1) to RGB (u8, u8, u8)
fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> (u8, u8, u8) {
    let c = value * saturation;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = value - c;

    let (r, g, b) = match (hue / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}
