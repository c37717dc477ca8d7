//! Rhai scripting for user-defined conversions
//!
//! A conversion script turns one raw sample into one physical value. Scripts
//! run once per sample, in time order, when a signal is built with a
//! [`crate::conversion::ScriptConversion`].
//!
//! ## Dynamic Variables
//!
//! - `value` / `raw` - The raw sample being converted
//! - `prev()` - Previous converted value (NaN for the first sample)
//! - `prev_raw()` - Previous raw value (NaN for the first sample)
//! - `has_prev()` - Returns true once a previous sample exists
//!
//! ## Helper Functions
//!
//! - `smooth(value, alpha)` - Exponential smoothing against `prev()`
//! - `delta(value)` - Difference to the previous raw sample (0 for the first)
//! - `scale(x, x0, x1, y0, y1)` - Two-point calibration
//! - `poly(x, c0, c1, c2)` - Quadratic calibration
//! - `bits(raw, shift, width)` - Unsigned bit field of a raw count
//! - `signed(raw, width)` - Two's complement reinterpretation
//! - math: `abs`, `sqrt`, `pow`, `exp`, `ln`, `log10`, trig, rounding,
//!   `min`, `max`, `clamp`, `pi()`
//!
//! ## Example Scripts
//!
//! Scaling a 12-bit ADC count to volts:
//! ```rhai
//! fn convert(raw) {
//!     raw * 3.3 / 4095.0
//! }
//! ```
//!
//! Expression form, using the `value` variable:
//! ```rhai
//! (value - 32.0) * 5.0 / 9.0
//! ```

mod engine;

pub use engine::{SampleContext, ScriptEngine, SharedSampleContext};

use crate::error::{Result, SigViewError};
use rhai::{Engine, AST};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A compiled conversion script
#[derive(Clone)]
pub struct CompiledScript {
    ast: AST,
    source: String,
    name: String,
}

impl CompiledScript {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn ast(&self) -> &AST {
        &self.ast
    }

    /// True when the script defines `fn convert(raw)`
    pub fn has_convert_fn(&self) -> bool {
        self.ast
            .iter_functions()
            .any(|f| f.name == "convert" && f.params.len() == 1)
    }
}

impl std::fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScript")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

/// Compiled scripts keyed by source text
#[derive(Default)]
pub struct ScriptCache {
    cache: HashMap<String, CompiledScript>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached script or compile and cache it
    pub fn get_or_compile(
        &mut self,
        engine: &Engine,
        name: &str,
        source: &str,
    ) -> Result<CompiledScript> {
        if let Some(script) = self.cache.get(source) {
            tracing::trace!(name, "script cache hit");
            return Ok(script.clone());
        }

        let ast = engine
            .compile(source)
            .map_err(|e| SigViewError::Script(format!("Compilation error in '{}': {}", name, e)))?;

        let script = CompiledScript {
            ast,
            source: source.to_string(),
            name: name.to_string(),
        };

        self.cache.insert(source.to_string(), script.clone());
        Ok(script)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Thread-safe script cache wrapper
pub type SharedScriptCache = Arc<RwLock<ScriptCache>>;

pub fn create_shared_cache() -> SharedScriptCache {
    Arc::new(RwLock::new(ScriptCache::new()))
}

/// Stock conversion scripts
pub mod builtins {
    pub const IDENTITY: &str = r#"
fn convert(raw) {
    raw
}
"#;

    pub const FAHRENHEIT_TO_CELSIUS: &str = r#"
fn convert(raw) {
    (raw - 32.0) * 5.0 / 9.0
}
"#;

    pub const RAD_TO_DEG: &str = r#"
fn convert(raw) {
    raw * 180.0 / pi()
}
"#;

    /// Unsigned 16-bit count read as two's complement
    pub const INT16: &str = r#"
signed(value, 16)
"#;

    /// Q1.15 fixed point
    pub const Q15: &str = r#"
signed(value, 16) / 32768.0
"#;

    /// 4-20 mA loop current to percent of span
    pub const LOOP_PERCENT: &str = r#"
clamp(scale(value, 4.0, 20.0, 0.0, 100.0), 0.0, 100.0)
"#;

    /// Low nibble of a status word
    pub const LOW_NIBBLE: &str = r#"
bits(value, 0, 4)
"#;

    pub const SAMPLE_DELTA: &str = r#"
delta(value)
"#;

    pub const SMOOTH_80: &str = r#"
smooth(value, 0.8)
"#;

    pub fn all() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Identity", IDENTITY),
            ("Fahrenheit to Celsius", FAHRENHEIT_TO_CELSIUS),
            ("Radians to Degrees", RAD_TO_DEG),
            ("Int16", INT16),
            ("Q15", Q15),
            ("4-20 mA to %", LOOP_PERCENT),
            ("Low Nibble", LOW_NIBBLE),
        ]
    }

    /// Scripts that depend on the previous sample
    pub fn stateful() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Sample Delta", SAMPLE_DELTA),
            ("Smooth (80%)", SMOOTH_80),
        ]
    }
}
