//! Signals: named time series with raw and physical sample views
//!
//! A [`Signal`] owns one timestamp array and two aligned sample views. The
//! raw view is what the data source delivered; the physical view is the raw
//! view passed once through the signal's [`Conversion`]. Without a conversion
//! both views share the same buffer. The active [`SampleMode`] decides which
//! view decimation and statistics look at.
//!
//! # Main Types
//!
//! - [`Signal`] - The time series itself
//! - [`SignalBuilder`] - Validating constructor
//! - [`Samples`] - Tagged sample storage
//! - [`CursorValue`] - Result of a point lookup

pub mod samples;
pub mod text;

pub use samples::{Reduction, Samples, Summary};

use crate::analysis::decimate::{Decimator, PlotView};
use crate::conversion::Conversion;
use crate::error::{Result, SigViewError};
use crate::types::{
    generate_color, Color, DisplayFormat, SampleKind, SampleMode, SampleValue, Scalar, SignalId,
    SourceId, TimebaseId,
};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global counter for sample revisions, shared by every signal so that no
/// two sample states ever carry the same revision
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::SeqCst)
}

/// Decimal digits used when no precision is given
pub const DEFAULT_PRECISION: usize = 6;

/// Value active at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct CursorValue {
    pub value: SampleValue,
    pub kind: SampleKind,
    pub format: DisplayFormat,
}

/// Builds a [`Signal`] from arrays delivered by a data source
pub struct SignalBuilder {
    name: String,
    samples: Samples,
    timestamps: Vec<f64>,
    unit: String,
    conversion: Option<Arc<dyn Conversion>>,
    raw: bool,
    source: SourceId,
    entry: Option<(usize, usize)>,
    timebase: Option<TimebaseId>,
    color: Option<Color>,
    precision: Option<usize>,
    index: usize,
    computation: Option<String>,
}

impl SignalBuilder {
    pub fn new(name: impl Into<String>, samples: impl Into<Samples>, timestamps: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            samples: samples.into(),
            timestamps,
            unit: String::new(),
            conversion: None,
            raw: true,
            source: SourceId::default(),
            entry: None,
            timebase: None,
            color: None,
            precision: None,
            index: 0,
            computation: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_conversion(mut self, conversion: Arc<dyn Conversion>) -> Self {
        self.conversion = Some(conversion);
        self
    }

    /// Whether the samples are raw (to be converted) or already physical
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = source;
        self
    }

    /// Group and channel index inside the source dataset
    pub fn with_entry(mut self, group: usize, channel: usize) -> Self {
        self.entry = Some((group, channel));
        self
    }

    /// Timebase group shared with other signals of the same acquisition.
    ///
    /// Signals built without one get a group of their own.
    pub fn with_timebase(mut self, timebase: TimebaseId) -> Self {
        self.timebase = Some(timebase);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Position in the view, used to pick a default color
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Mark the signal as computed from an expression
    pub fn computed(mut self, expression: impl Into<String>) -> Self {
        self.computation = Some(expression.into());
        self
    }

    pub fn build(self) -> Result<Signal> {
        if self.timestamps.len() != self.samples.len() {
            return Err(SigViewError::LengthMismatch {
                timestamps: self.timestamps.len(),
                samples: self.samples.len(),
            });
        }

        let mut timestamps = self.timestamps;
        let mut raw = self.samples;

        if let Some(keep) = raw.nan_mask() {
            raw = raw.retain(&keep);
            timestamps = retain(&timestamps, &keep);
        }

        let mut phys = match (&self.conversion, self.raw) {
            (Some(conversion), true) => {
                let phys = conversion.convert(&raw);
                if phys.len() != raw.len() {
                    return Err(SigViewError::LengthMismatch {
                        timestamps: timestamps.len(),
                        samples: phys.len(),
                    });
                }
                phys
            }
            _ => raw.clone(),
        };

        if let Some(keep) = phys.nan_mask() {
            let dropped = keep.iter().filter(|k| !**k).count();
            tracing::debug!(name = %self.name, dropped, "conversion produced NaN samples");
            phys = phys.retain(&keep);
            raw = raw.retain(&keep);
            timestamps = retain(&timestamps, &keep);
        }

        let raw_summary = raw.summary();
        let phys_summary = if phys.ptr_eq(&raw) {
            raw_summary
        } else {
            phys.summary()
        };

        let computation = self
            .computation
            .or_else(|| self.conversion.as_ref().and_then(|c| c.expression()));

        Ok(Signal {
            id: SignalId::next(),
            name: self.name,
            unit: self.unit,
            source: self.source,
            entry: self.entry,
            timebase: self.timebase.unwrap_or_else(TimebaseId::next),
            timestamps: timestamps.into(),
            raw,
            phys,
            raw_summary,
            phys_summary,
            conversion: self.conversion,
            color: self.color.unwrap_or_else(|| generate_color(self.index)),
            precision: self.precision,
            format: DisplayFormat::default(),
            mode: SampleMode::default(),
            computation,
            revision: next_revision(),
            decimator: Decimator::new(),
        })
    }
}

fn retain(values: &[f64], keep: &[bool]) -> Vec<f64> {
    values
        .iter()
        .zip(keep)
        .filter(|(_, &k)| k)
        .map(|(&v, _)| v)
        .collect()
}

/// One named time series
pub struct Signal {
    id: SignalId,
    name: String,
    unit: String,
    source: SourceId,
    entry: Option<(usize, usize)>,
    timebase: TimebaseId,
    timestamps: Arc<[f64]>,
    raw: Samples,
    phys: Samples,
    raw_summary: Summary,
    phys_summary: Summary,
    conversion: Option<Arc<dyn Conversion>>,
    color: Color,
    precision: Option<usize>,
    format: DisplayFormat,
    mode: SampleMode,
    computation: Option<String>,
    revision: u64,
    decimator: Decimator,
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("unit", &self.unit)
            .field("timebase", &self.timebase)
            .field("len", &self.len())
            .field("kind", &self.kind())
            .field("mode", &self.mode)
            .field("format", &self.format)
            .field("converted", &self.conversion.is_some())
            .finish()
    }
}

impl Signal {
    pub fn id(&self) -> SignalId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn entry(&self) -> Option<(usize, usize)> {
        self.entry
    }

    pub fn timebase(&self) -> TimebaseId {
        self.timebase
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn timestamps_arc(&self) -> Arc<[f64]> {
        self.timestamps.clone()
    }

    pub fn raw_samples(&self) -> &Samples {
        &self.raw
    }

    pub fn phys_samples(&self) -> &Samples {
        &self.phys
    }

    /// Sample view selected by the current mode
    pub fn active_samples(&self) -> &Samples {
        match self.mode {
            SampleMode::Raw => &self.raw,
            SampleMode::Physical => &self.phys,
        }
    }

    /// Reductions of the active view, computed at construction
    pub fn summary(&self) -> &Summary {
        match self.mode {
            SampleMode::Raw => &self.raw_summary,
            SampleMode::Physical => &self.phys_summary,
        }
    }

    /// Smallest finite value of the active view
    pub fn min(&self) -> Option<Scalar> {
        self.summary().min()
    }

    pub fn max(&self) -> Option<Scalar> {
        self.summary().max()
    }

    pub fn avg(&self) -> Option<f64> {
        self.summary().avg()
    }

    pub fn rms(&self) -> Option<f64> {
        self.summary().rms()
    }

    pub fn kind(&self) -> SampleKind {
        self.active_samples().kind()
    }

    pub fn is_string(&self) -> bool {
        self.kind() == SampleKind::Text
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn conversion(&self) -> Option<&Arc<dyn Conversion>> {
        self.conversion.as_ref()
    }

    /// Expression the signal was computed from, if any
    pub fn computation(&self) -> Option<&str> {
        self.computation.as_deref()
    }

    pub fn is_computed(&self) -> bool {
        self.computation.is_some()
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn precision(&self) -> usize {
        self.precision.unwrap_or(DEFAULT_PRECISION)
    }

    /// False while the signal still falls back to [`DEFAULT_PRECISION`]
    pub fn has_own_precision(&self) -> bool {
        self.precision.is_some()
    }

    pub fn format(&self) -> DisplayFormat {
        self.format
    }

    pub fn mode(&self) -> SampleMode {
        self.mode
    }

    /// Changes whenever the active samples or their rendering change.
    ///
    /// Revisions are process-unique: a cut or a freshly built signal never
    /// reuses a revision of another signal.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision = next_revision();
    }

    /// Select the raw or physical view. Returns false when unchanged.
    pub fn set_mode(&mut self, mode: SampleMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.bump();
        self.decimator.invalidate();
        true
    }

    /// Set the display format. Only integer views honour it, so a signal
    /// without one keeps its format and false is returned.
    pub fn set_format(&mut self, format: DisplayFormat) -> bool {
        let has_integer_view = [&self.raw, &self.phys]
            .iter()
            .any(|samples| samples.kind() == SampleKind::Integer);
        if !has_integer_view || self.format == format {
            return false;
        }
        self.format = format;
        self.bump();
        true
    }

    pub fn set_precision(&mut self, precision: usize) -> bool {
        if self.precision == Some(precision) {
            return false;
        }
        self.precision = Some(precision);
        self.bump();
        true
    }

    /// Index range of the samples inside `[start, stop]`.
    ///
    /// Open ends extend to the first or last sample; with `include_ends`
    /// false the bounds are exclusive.
    pub fn range(&self, start: Option<f64>, stop: Option<f64>, include_ends: bool) -> Range<usize> {
        let ts = &self.timestamps[..];
        let lo = match start {
            None => 0,
            Some(s) if include_ends => ts.partition_point(|&t| t < s),
            Some(s) => ts.partition_point(|&t| t <= s),
        };
        let hi = match stop {
            None => ts.len(),
            Some(s) if include_ends => ts.partition_point(|&t| t <= s),
            Some(s) => ts.partition_point(|&t| t < s),
        };
        lo..hi.max(lo)
    }

    /// Index of the sample active at `t` (the last one at or before it)
    pub fn index_at(&self, t: f64) -> Option<usize> {
        self.timestamps.partition_point(|&x| x <= t).checked_sub(1)
    }

    /// Restrict the signal to a time window.
    ///
    /// `start == stop` is a point lookup returning the single sample active
    /// at that time. The result carries the same identity and display
    /// settings but its own timebase group.
    pub fn cut(&self, start: Option<f64>, stop: Option<f64>, include_ends: bool) -> Signal {
        let range = match (start, stop) {
            (Some(a), Some(b)) if a == b => match self.index_at(a) {
                Some(i) => i..i + 1,
                None => 0..0,
            },
            _ => self.range(start, stop, include_ends),
        };
        self.slice(range)
    }

    fn slice(&self, range: Range<usize>) -> Signal {
        let raw = self.raw.slice(range.clone());
        let phys = if self.phys.ptr_eq(&self.raw) {
            raw.clone()
        } else {
            self.phys.slice(range.clone())
        };
        let raw_summary = raw.summary();
        let phys_summary = if phys.ptr_eq(&raw) {
            raw_summary
        } else {
            phys.summary()
        };

        Signal {
            id: self.id,
            name: self.name.clone(),
            unit: self.unit.clone(),
            source: self.source.clone(),
            entry: self.entry,
            timebase: TimebaseId::next(),
            timestamps: self.timestamps[range].into(),
            raw,
            phys,
            raw_summary,
            phys_summary,
            conversion: self.conversion.clone(),
            color: self.color,
            precision: self.precision,
            format: self.format,
            mode: self.mode,
            computation: self.computation.clone(),
            revision: next_revision(),
            decimator: Decimator::new(),
        }
    }

    /// Value active at `t`: the last sample at or before it.
    ///
    /// Before the first sample the value is [`SampleValue::NotAvailable`];
    /// past the last sample the last value holds.
    pub fn value_at(&self, t: f64) -> CursorValue {
        let value = self
            .index_at(t)
            .and_then(|i| self.active_samples().value(i))
            .unwrap_or(SampleValue::NotAvailable);

        CursorValue {
            value,
            kind: self.kind(),
            format: self.format,
        }
    }

    /// Shift the time axis.
    ///
    /// Relative shifts add `offset` to every timestamp; absolute shifts move
    /// the first sample to `offset`. The signal moves to a fresh timebase
    /// group. Empty signals are left alone and false is returned.
    pub fn shift_time(&mut self, absolute: bool, offset: f64) -> bool {
        let Some(&first) = self.timestamps.first() else {
            return false;
        };
        let delta = if absolute { offset - first } else { offset };
        self.timestamps = self.timestamps.iter().map(|&t| t + delta).collect();
        self.timebase = TimebaseId::next();
        self.bump();
        self.decimator.invalidate();
        true
    }

    /// Decimate the active view for the window `[start, stop]`
    pub fn trim(&mut self, start: f64, stop: f64, width: usize) -> &PlotView {
        let samples = match self.mode {
            SampleMode::Raw => &self.raw,
            SampleMode::Physical => &self.phys,
        };
        self.decimator
            .trim(&self.timestamps, samples, self.revision, start, stop, width)
    }

    /// Last decimated view
    pub fn plot_view(&self) -> &PlotView {
        self.decimator.view()
    }

    /// Decimation passes computed so far
    pub fn trim_reductions(&self) -> u64 {
        self.decimator.reductions()
    }

    /// `[t, value]` pairs of the last decimated view. Empty for text.
    pub fn plot_points(&self) -> Vec<[f64; 2]> {
        let samples = self.active_samples();
        self.decimator
            .view()
            .indices
            .iter()
            .filter_map(|&i| Some([self.timestamps[i], samples.value_f64(i)?]))
            .collect()
    }

    /// Timestamps of the last decimated view
    pub fn plot_timestamps(&self) -> Vec<f64> {
        self.decimator
            .view()
            .indices
            .iter()
            .map(|&i| self.timestamps[i])
            .collect()
    }

    /// Label for a raw value, when the conversion has a text table
    pub fn text_at(&self, raw: f64) -> Option<String> {
        self.conversion.as_ref().and_then(|c| c.text_at(raw))
    }

    pub fn has_text_table(&self) -> bool {
        self.conversion
            .as_ref()
            .is_some_and(|c| c.has_text_table())
    }
}
