//! Rhai script engine
//!
//! Hosts conversion scripts with safety limits and a per-series sample
//! context, so a script can refer to the previous raw and converted values.

use crate::error::{Result, ResultExt, SigViewError};
use crate::scripting::{CompiledScript, SharedScriptCache};
use rhai::{Dynamic, Engine, Scope};
use std::sync::{Arc, RwLock};

/// Previous-sample state visible to scripts through `prev()` and friends
#[derive(Debug, Clone, Copy)]
pub struct SampleContext {
    pub prev_raw: f64,
    pub prev_converted: f64,
}

impl Default for SampleContext {
    fn default() -> Self {
        Self::first_sample()
    }
}

impl SampleContext {
    pub fn new(prev_raw: f64, prev_converted: f64) -> Self {
        Self {
            prev_raw,
            prev_converted,
        }
    }

    /// Context for the first sample of a series
    pub fn first_sample() -> Self {
        Self {
            prev_raw: f64::NAN,
            prev_converted: f64::NAN,
        }
    }
}

pub type SharedSampleContext = Arc<RwLock<SampleContext>>;

/// Executes conversion scripts
pub struct ScriptEngine {
    engine: Engine,
    cache: SharedScriptCache,
    context: SharedSampleContext,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::with_cache(crate::scripting::create_shared_cache())
    }

    /// Create an engine that shares its compile cache with others
    pub fn with_cache(cache: SharedScriptCache) -> Self {
        let context = Arc::new(RwLock::new(SampleContext::first_sample()));
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, context.clone());

        Self {
            engine,
            cache,
            context,
        }
    }

    fn configure_engine(engine: &mut Engine, context: SharedSampleContext) {
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(10_000);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(1_000);
        engine.set_max_map_size(1_000);

        // Previous-sample accessors read the shared context, which is
        // updated before every evaluation
        {
            let ctx = context.clone();
            engine.register_fn("prev", move || -> f64 {
                ctx.read().map(|c| c.prev_converted).unwrap_or(f64::NAN)
            });
        }
        {
            let ctx = context.clone();
            engine.register_fn("prev_raw", move || -> f64 {
                ctx.read().map(|c| c.prev_raw).unwrap_or(f64::NAN)
            });
        }
        {
            let ctx = context.clone();
            engine.register_fn("has_prev", move || -> bool {
                ctx.read()
                    .map(|c| !c.prev_converted.is_nan())
                    .unwrap_or(false)
            });
        }
        {
            let ctx = context.clone();
            engine.register_fn("delta", move |current: f64| -> f64 {
                let prev = ctx.read().map(|c| c.prev_raw).unwrap_or(f64::NAN);
                if prev.is_nan() {
                    0.0
                } else {
                    current - prev
                }
            });
        }

        {
            let ctx = context;
            engine.register_fn("smooth", move |current: f64, alpha: f64| -> f64 {
                let alpha = alpha.clamp(0.0, 1.0);
                match ctx.read().map(|c| c.prev_converted) {
                    Ok(prev) if !prev.is_nan() => alpha * prev + (1.0 - alpha) * current,
                    _ => current,
                }
            });
        }

        Self::register_math(engine);
        Self::register_decoding(engine);
    }

    fn register_math(engine: &mut Engine) {
        const UNARY: [(&str, fn(f64) -> f64); 12] = [
            ("abs", f64::abs),
            ("sqrt", f64::sqrt),
            ("exp", f64::exp),
            ("ln", f64::ln),
            ("log10", f64::log10),
            ("sin", f64::sin),
            ("cos", f64::cos),
            ("tan", f64::tan),
            ("floor", f64::floor),
            ("ceil", f64::ceil),
            ("round", f64::round),
            ("trunc", f64::trunc),
        ];
        for (name, f) in UNARY {
            engine.register_fn(name, f);
        }

        engine.register_fn("pow", f64::powf);
        engine.register_fn("min", f64::min);
        engine.register_fn("max", f64::max);
        engine.register_fn("clamp", |x: f64, lo: f64, hi: f64| x.max(lo).min(hi));
        engine.register_fn("pi", || std::f64::consts::PI);

        // Two-point calibration
        engine.register_fn("scale", |x: f64, x0: f64, x1: f64, y0: f64, y1: f64| -> f64 {
            if x1 == x0 {
                y0
            } else {
                y0 + (x - x0) * (y1 - y0) / (x1 - x0)
            }
        });
        // Quadratic calibration c0 + c1*x + c2*x^2
        engine.register_fn("poly", |x: f64, c0: f64, c1: f64, c2: f64| -> f64 {
            (c2 * x + c1) * x + c0
        });
    }

    /// Helpers for unpacking raw integer counts
    fn register_decoding(engine: &mut Engine) {
        engine.register_fn("bits", |raw: f64, shift: i64, width: i64| -> i64 {
            let width = width.clamp(0, 62) as u32;
            let shift = shift.clamp(0, 63) as u32;
            ((raw as i64) >> shift) & ((1i64 << width) - 1)
        });
        engine.register_fn("signed", |raw: f64, width: i64| -> f64 {
            let width = width.clamp(1, 62) as u32;
            let value = (raw as i64) & ((1i64 << width) - 1);
            if (value >> (width - 1)) & 1 == 1 {
                (value - (1i64 << width)) as f64
            } else {
                value as f64
            }
        });
        engine.register_fn("to_int", |x: f64| x as i64);
        engine.register_fn("to_float", |x: i64| x as f64);
        engine.register_fn("is_nan", |x: f64| x.is_nan());
    }

    /// Compile a script and cache it
    pub fn compile(&self, name: &str, source: &str) -> Result<CompiledScript> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| SigViewError::Script(format!("Failed to acquire cache lock: {}", e)))?;

        cache.get_or_compile(&self.engine, name, source)
    }

    /// Convert one raw sample
    pub fn execute(&self, script: &CompiledScript, raw: f64, ctx: SampleContext) -> Result<f64> {
        {
            let mut context = self.context.write().map_err(|e| {
                SigViewError::Script(format!("Failed to acquire context lock: {}", e))
            })?;
            *context = ctx;
        }

        let mut scope = Scope::new();
        scope.push("value", raw);
        scope.push("raw", raw);

        let result = if script.has_convert_fn() {
            self.engine
                .call_fn::<Dynamic>(&mut scope, script.ast(), "convert", (raw,))
        } else {
            self.engine
                .eval_ast_with_scope::<Dynamic>(&mut scope, script.ast())
        };

        let value = result.context("Execution error")?;
        if let Ok(f) = value.as_float() {
            Ok(f)
        } else if let Ok(i) = value.as_int() {
            Ok(i as f64)
        } else {
            Err(SigViewError::Script(format!(
                "Script must return a numeric value, got {}",
                value.type_name()
            )))
        }
    }

    /// Convert a whole series in time order.
    ///
    /// Samples whose evaluation fails become NaN; the failures are logged
    /// once per series.
    pub fn convert_series(&self, script: &CompiledScript, raw: &[f64]) -> Vec<f64> {
        let mut ctx = SampleContext::first_sample();
        let mut failures = 0usize;
        let mut first_error = None;

        let converted = raw
            .iter()
            .map(|&x| {
                let value = match self.execute(script, x, ctx) {
                    Ok(v) => v,
                    Err(e) => {
                        failures += 1;
                        first_error.get_or_insert(e);
                        f64::NAN
                    }
                };
                ctx = SampleContext::new(x, value);
                value
            })
            .collect();

        if let Some(err) = first_error {
            tracing::warn!(
                script = script.name(),
                failures,
                samples = raw.len(),
                "conversion script failed on some samples: {}",
                err
            );
        }
        converted
    }

    /// Compile and run on a single value
    pub fn eval(&self, source: &str, raw: f64) -> Result<f64> {
        let script = self.compile("inline", source)?;
        self.execute(&script, raw, SampleContext::first_sample())
    }

    /// Validate a script without executing it
    pub fn validate(&self, source: &str) -> Result<()> {
        self.engine
            .compile(source)
            .map(|_| ())
            .map_err(|e| SigViewError::Script(format!("Validation error: {}", e)))
    }

    pub fn clear_cache(&self) -> Result<()> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| SigViewError::Script(format!("Failed to acquire cache lock: {}", e)))?;
        cache.clear();
        Ok(())
    }

    pub fn cache(&self) -> &SharedScriptCache {
        &self.cache
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("cache_size", &self.cache.read().map(|c| c.len()).ok())
            .finish()
    }
}
