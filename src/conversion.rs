//! Raw-to-physical conversions
//!
//! A [`Conversion`] is supplied by the data-source layer when a signal is
//! built and is applied exactly once, to produce the physical sample view.
//!
//! # Main Types
//!
//! - [`Conversion`] - The conversion interface
//! - [`LinearConversion`] - `a * raw + b`
//! - [`TextTableConversion`] - Discrete value to label lookup
//! - [`ScriptConversion`] - User-defined Rhai script

use crate::error::{Result, ResultExt};
use crate::scripting::{CompiledScript, ScriptEngine};
use crate::signal::Samples;
use std::sync::Arc;

/// Turns a raw sample view into a physical one
#[cfg_attr(test, mockall::automock)]
pub trait Conversion: Send + Sync {
    /// Convert a whole sample view. The output must have the same length.
    fn convert(&self, samples: &Samples) -> Samples;

    /// Label for a single raw value, for conversions backed by a text table
    fn text_at(&self, _raw: f64) -> Option<String> {
        None
    }

    /// True when [`Conversion::text_at`] yields labels
    fn has_text_table(&self) -> bool {
        false
    }

    /// Source expression, for conversions that can be persisted as one
    fn expression(&self) -> Option<String> {
        None
    }
}

/// `phys = factor * raw + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearConversion {
    pub factor: f64,
    pub offset: f64,
}

impl LinearConversion {
    pub fn new(factor: f64, offset: f64) -> Self {
        Self { factor, offset }
    }

    fn apply(&self, raw: f64) -> f64 {
        self.factor * raw + self.offset
    }
}

impl Conversion for LinearConversion {
    fn convert(&self, samples: &Samples) -> Samples {
        match samples {
            Samples::Float(v) => Samples::Float(v.iter().map(|&x| self.apply(x)).collect()),
            Samples::Integer(v) => {
                Samples::Float(v.iter().map(|&x| self.apply(x as f64)).collect())
            }
            Samples::Text(_) => samples.clone(),
        }
    }
}

/// Maps discrete raw values to labels
#[derive(Debug, Clone, PartialEq)]
pub struct TextTableConversion {
    entries: Vec<(f64, String)>,
    default: String,
}

impl TextTableConversion {
    pub fn new(entries: impl IntoIterator<Item = (f64, impl Into<String>)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            default: String::new(),
        }
    }

    /// Label used for raw values without an entry
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    fn lookup(&self, raw: f64) -> &str {
        self.entries
            .iter()
            .find(|(k, _)| *k == raw)
            .map(|(_, v)| v.as_str())
            .unwrap_or(&self.default)
    }
}

impl Conversion for TextTableConversion {
    fn convert(&self, samples: &Samples) -> Samples {
        match samples.to_f64_vec() {
            Some(raw) => Samples::Text(
                raw.iter()
                    .map(|&x| self.lookup(x).as_bytes().to_vec())
                    .collect(),
            ),
            None => samples.clone(),
        }
    }

    fn text_at(&self, raw: f64) -> Option<String> {
        Some(self.lookup(raw).to_string())
    }

    fn has_text_table(&self) -> bool {
        true
    }
}

/// Conversion defined by a Rhai script.
///
/// The script runs once per sample, in time order, and may use `prev()`.
/// Samples the script fails on become NaN and are later dropped from the
/// signal.
pub struct ScriptConversion {
    engine: Arc<ScriptEngine>,
    script: CompiledScript,
}

impl ScriptConversion {
    /// Compile `source` on a private engine
    pub fn new(name: &str, source: &str) -> Result<Self> {
        Self::with_engine(Arc::new(ScriptEngine::new()), name, source)
    }

    /// Compile `source` on a shared engine (and its compile cache)
    pub fn with_engine(engine: Arc<ScriptEngine>, name: &str, source: &str) -> Result<Self> {
        let script = engine
            .compile(name, source)
            .with_context(|| format!("Invalid conversion for '{}'", name))?;
        Ok(Self { engine, script })
    }

    pub fn source(&self) -> &str {
        self.script.source()
    }
}

impl std::fmt::Debug for ScriptConversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptConversion")
            .field("script", &self.script)
            .finish()
    }
}

impl Conversion for ScriptConversion {
    fn convert(&self, samples: &Samples) -> Samples {
        match samples.to_f64_vec() {
            Some(raw) => Samples::Float(self.engine.convert_series(&self.script, &raw).into()),
            None => samples.clone(),
        }
    }

    fn expression(&self) -> Option<String> {
        Some(self.script.source().to_string())
    }
}
