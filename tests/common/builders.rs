//! Test data builders for creating test signals

use sigview_rs::signal::{Samples, Signal, SignalBuilder};
use sigview_rs::types::SourceId;

/// Builder for creating test Signals
pub struct TestSignal {
    name: String,
    samples: Samples,
    timestamps: Vec<f64>,
    unit: String,
    entry: Option<(usize, usize)>,
    source: Option<SourceId>,
}

impl TestSignal {
    /// Float ramp `0, 1, 2, ...` on the given timestamps
    pub fn ramp(name: &str, timestamps: Vec<f64>) -> Self {
        let samples: Vec<f64> = (0..timestamps.len()).map(|i| i as f64).collect();
        Self::new(name, samples, timestamps)
    }

    /// Sine of the timestamp
    pub fn sine(name: &str, timestamps: Vec<f64>) -> Self {
        let samples: Vec<f64> = timestamps.iter().map(|t| t.sin()).collect();
        Self::new(name, samples, timestamps)
    }

    pub fn integers(name: &str, values: Vec<i64>, timestamps: Vec<f64>) -> Self {
        Self::new(name, values, timestamps)
    }

    pub fn new(name: &str, samples: impl Into<Samples>, timestamps: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            samples: samples.into(),
            timestamps,
            unit: String::new(),
            entry: None,
            source: None,
        }
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn entry(mut self, source: &str, group: usize, channel: usize) -> Self {
        self.source = Some(SourceId::new(source));
        self.entry = Some((group, channel));
        self
    }

    pub fn builder(self) -> SignalBuilder {
        let mut builder =
            SignalBuilder::new(self.name, self.samples, self.timestamps).with_unit(self.unit);
        if let Some(source) = self.source {
            builder = builder.with_source(source);
        }
        if let Some((group, channel)) = self.entry {
            builder = builder.with_entry(group, channel);
        }
        builder
    }

    pub fn build(self) -> Signal {
        self.builder().build().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_builder() {
        let signal = TestSignal::ramp("ramp", vec![0.0, 1.0, 2.0]).unit("V").build();
        assert_eq!(signal.name(), "ramp");
        assert_eq!(signal.unit(), "V");
        assert_eq!(signal.len(), 3);
    }
}
