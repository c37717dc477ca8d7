//! Error handling for sigview-rs
//!
//! The numeric core (decimation, statistics, union timebase, cursor lookup)
//! never fails: empty or degenerate inputs are reported through sentinels.
//! The types here cover the fallible edges: building a signal from
//! mismatched arrays, compiling conversion scripts, configuration I/O and
//! view operations that address a signal the view does not own.

use crate::types::SignalId;
use thiserror::Error;

/// Main error type for sigview-rs operations
#[derive(Error, Debug)]
pub enum SigViewError {
    /// Errors related to Rhai conversion scripts
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// A channel descriptor that cannot be applied
    #[error("Descriptor error: {0}")]
    Descriptor(String),

    /// The view does not own a signal with this id
    #[error("Unknown signal {0}")]
    UnknownSignal(SignalId),

    /// Timestamps and samples must be aligned 1:1
    #[error("Length mismatch: {timestamps} timestamps for {samples} samples")]
    LengthMismatch { timestamps: usize, samples: usize },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SigViewError>,
    },
}

impl SigViewError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SigViewError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        SigViewError::Script(err.to_string())
    }
}

/// Result type alias for sigview-rs operations
pub type Result<T> = std::result::Result<T, SigViewError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SigViewError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| SigViewError::from_rhai_error(e).with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SigViewError::Descriptor("missing name".to_string());
        assert_eq!(err.to_string(), "Descriptor error: missing name");
    }

    #[test]
    fn test_error_with_context() {
        let err = SigViewError::Config("bad toml".to_string());
        let with_ctx = err.with_context("Failed to load settings");
        assert!(with_ctx.to_string().contains("Failed to load settings"));
        assert!(with_ctx.to_string().contains("bad toml"));
    }

    #[test]
    fn test_length_mismatch() {
        let err = SigViewError::LengthMismatch {
            timestamps: 3,
            samples: 4,
        };
        assert_eq!(
            err.to_string(),
            "Length mismatch: 3 timestamps for 4 samples"
        );
    }

    #[test]
    fn test_result_ext_context() {
        let res: Result<()> = Err(SigViewError::UnknownSignal(SignalId(7)));
        let err = res.context("set_enabled").unwrap_err();
        assert!(err.to_string().starts_with("set_enabled: "));
    }
}
