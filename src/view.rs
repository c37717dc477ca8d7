//! Plot view orchestration
//!
//! [`SignalView`] is the single owner of everything one plot shows: the
//! signals in display order, the timebase registry of the enabled ones, the
//! statistics caches, the visible x range and the cursor and region. UI
//! collaborators drive it through these methods and read back decimated
//! points, statistics records and info text.
//!
//! Signals are addressed by [`SignalId`]; addressing a signal the view does
//! not own fails with [`SigViewError::UnknownSignal`].

use crate::analysis::{StatisticsEngine, StatisticsRecord, StepDirection, TimebaseRegistry};
use crate::config::{ChannelDescriptor, EngineSettings, HighlightRange, ViewConfig};
use crate::error::{Result, SigViewError};
use crate::format::{self, AxisFormat};
use crate::signal::Signal;
use crate::types::{DisplayFormat, SampleMode, SignalId};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Fraction of the visible span added or removed per side by one zoom step
const ZOOM_STEP: f64 = 0.05;

/// Distance the cursor moves when there is no timebase to step along
const EMPTY_STEP: f64 = 1.0;

/// Display flags of one channel that are not part of the signal itself
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    pub enabled: bool,
    pub individual_axis: bool,
    pub common_axis: bool,
    pub ranges: Vec<HighlightRange>,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            enabled: true,
            individual_axis: false,
            common_axis: false,
            ranges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Visible value range of a y axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YRange {
    pub min: f64,
    pub max: f64,
}

impl YRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug)]
struct Channel {
    signal: Signal,
    state: ChannelState,
}

/// Signals, cursor, region and visible range of one plot
#[derive(Debug)]
pub struct SignalView {
    channels: Vec<Channel>,
    registry: TimebaseRegistry,
    stats: StatisticsEngine,
    settings: EngineSettings,
    x_range: (f64, f64),
    width: usize,
    cursor: Option<f64>,
    region: Option<(f64, f64)>,
    region_lock: Option<f64>,
    axis_format: AxisFormat,
    origin: Option<DateTime<Utc>>,
}

impl Default for SignalView {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl SignalView {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            channels: Vec::new(),
            registry: TimebaseRegistry::with_concat_limit(settings.union_concat_limit),
            stats: StatisticsEngine::new(),
            width: settings.default_trim_width.max(1),
            settings,
            x_range: (0.0, 1.0),
            cursor: None,
            region: None,
            region_lock: None,
            axis_format: AxisFormat::default(),
            origin: None,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ==================== Signals ====================

    /// Append one signal. The first signal of an empty view fits the
    /// visible range to its extent.
    pub fn add_signal(&mut self, signal: Signal) -> SignalId {
        let id = signal.id();
        self.add_signals([signal]);
        id
    }

    /// Append signals in display order and return their ids
    pub fn add_signals(&mut self, signals: impl IntoIterator<Item = Signal>) -> Vec<SignalId> {
        let was_empty = self.channels.is_empty();
        let mut ids = Vec::new();

        for mut signal in signals {
            if !signal.has_own_precision() {
                signal.set_precision(self.settings.default_precision);
            }
            self.registry.register(&signal);
            ids.push(signal.id());
            self.channels.push(Channel {
                signal,
                state: ChannelState::default(),
            });
        }

        tracing::info!(added = ids.len(), total = self.channels.len(), "signals added");

        if was_empty && !ids.is_empty() {
            self.home();
        } else {
            self.trim_all();
        }
        ids
    }

    /// Remove signals; returns how many the view owned
    pub fn remove_signals(&mut self, ids: &[SignalId]) -> usize {
        let before = self.channels.len();
        self.channels.retain(|c| !ids.contains(&c.signal.id()));
        for &id in ids {
            self.registry.unregister(id);
            self.stats.forget(id);
        }
        let removed = before - self.channels.len();
        tracing::info!(removed, total = self.channels.len(), "signals removed");
        removed
    }

    pub fn signal(&self, id: SignalId) -> Option<&Signal> {
        self.channels
            .iter()
            .find(|c| c.signal.id() == id)
            .map(|c| &c.signal)
    }

    /// Mutable access to a signal.
    ///
    /// Changes to its timestamps must go through
    /// [`SignalView::set_time_offset`] so the registry stays consistent.
    pub fn signal_mut(&mut self, id: SignalId) -> Option<&mut Signal> {
        self.channels
            .iter_mut()
            .find(|c| c.signal.id() == id)
            .map(|c| &mut c.signal)
    }

    /// Signals in display order
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.channels.iter().map(|c| &c.signal)
    }

    pub fn ids(&self) -> Vec<SignalId> {
        self.channels.iter().map(|c| c.signal.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_state(&self, id: SignalId) -> Option<&ChannelState> {
        self.channels
            .iter()
            .find(|c| c.signal.id() == id)
            .map(|c| &c.state)
    }

    fn channel_index(&self, id: SignalId) -> Result<usize> {
        self.channels
            .iter()
            .position(|c| c.signal.id() == id)
            .ok_or(SigViewError::UnknownSignal(id))
    }

    fn channel_mut(&mut self, id: SignalId) -> Result<&mut Channel> {
        let index = self.channel_index(id)?;
        Ok(&mut self.channels[index])
    }

    /// Show or hide a signal. Hidden signals leave the union timebase.
    pub fn set_enabled(&mut self, id: SignalId, enabled: bool) -> Result<()> {
        let index = self.channel_index(id)?;
        let (x0, x1) = self.x_range;
        let width = self.width;
        let channel = &mut self.channels[index];
        if channel.state.enabled == enabled {
            return Ok(());
        }
        channel.state.enabled = enabled;

        if enabled {
            self.registry.register(&channel.signal);
            channel.signal.trim(x0, x1, width);
        } else {
            self.registry.unregister(id);
        }
        Ok(())
    }

    pub fn set_individual_axis(&mut self, id: SignalId, individual: bool) -> Result<()> {
        self.channel_mut(id)?.state.individual_axis = individual;
        Ok(())
    }

    pub fn set_common_axis(&mut self, id: SignalId, common: bool) -> Result<()> {
        self.channel_mut(id)?.state.common_axis = common;
        Ok(())
    }

    pub fn set_ranges(&mut self, id: SignalId, ranges: Vec<HighlightRange>) -> Result<()> {
        self.channel_mut(id)?.state.ranges = ranges;
        Ok(())
    }

    // ==================== Per-signal settings ====================

    /// Shift the time axis of several signals.
    ///
    /// See [`Signal::shift_time`]. Returns how many signals moved; empty
    /// signals are skipped.
    pub fn set_time_offset(&mut self, absolute: bool, offset: f64, ids: &[SignalId]) -> Result<usize> {
        let indices = ids
            .iter()
            .map(|&id| self.channel_index(id))
            .collect::<Result<Vec<_>>>()?;

        let mut shifted = 0;
        for index in indices {
            let channel = &mut self.channels[index];
            if !channel.signal.shift_time(absolute, offset) {
                continue;
            }
            shifted += 1;
            if channel.state.enabled {
                self.registry.register(&channel.signal);
            }
        }

        tracing::debug!(shifted, absolute, offset, "time offset applied");
        self.trim_all();
        Ok(shifted)
    }

    /// Switch a signal between raw and physical samples.
    ///
    /// When the signal's y axis currently shows `y_range`, the returned range
    /// keeps the same relative position against the new domain's min and
    /// max. Returns `None` when the mode was already `mode` or no range was
    /// given.
    pub fn set_mode(&mut self, id: SignalId, mode: SampleMode, y_range: Option<YRange>) -> Result<Option<YRange>> {
        let (x0, x1) = self.x_range;
        let width = self.width;
        let channel = self.channel_mut(id)?;
        let signal = &mut channel.signal;

        let (old_min, old_max) = domain(signal);
        if !signal.set_mode(mode) {
            return Ok(None);
        }
        if channel.state.enabled {
            signal.trim(x0, x1, width);
        }

        let Some(view) = y_range else {
            return Ok(None);
        };

        let (factor, offset) = if old_max != old_min && view.span() != 0.0 {
            (view.span() / (old_max - old_min), (view.min - old_min) / view.span())
        } else {
            (1.0, 0.0)
        };

        let (min, max) = domain(signal);
        let rescaled = if max != min {
            let span = (max - min) * factor;
            let bottom = min + offset * span;
            YRange::new(bottom, bottom + span)
        } else {
            YRange::new(max - 1.0, max + 1.0)
        };
        Ok(Some(rescaled))
    }

    /// Set the display format. Only integer signals honour it; returns
    /// whether the signal changed.
    pub fn set_format(&mut self, id: SignalId, format: DisplayFormat) -> Result<bool> {
        Ok(self.channel_mut(id)?.signal.set_format(format))
    }

    pub fn set_precision(&mut self, id: SignalId, precision: usize) -> Result<bool> {
        Ok(self.channel_mut(id)?.signal.set_precision(precision))
    }

    // ==================== Plot range ====================

    pub fn x_range(&self) -> (f64, f64) {
        self.x_range
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Pixel width of the plot area
    pub fn set_width(&mut self, width: usize) {
        let width = width.max(1);
        if width != self.width {
            self.width = width;
            self.trim_all();
        }
    }

    pub fn set_x_range(&mut self, start: f64, stop: f64) {
        self.x_range = if start <= stop { (start, stop) } else { (stop, start) };
        self.trim_all();
    }

    /// Re-decimate every enabled signal for the current range and width
    pub fn trim_all(&mut self) {
        let (x0, x1) = self.x_range;
        let width = self.width;
        for channel in self.channels.iter_mut().filter(|c| c.state.enabled) {
            channel.signal.trim(x0, x1, width);
        }
    }

    /// `[t, value]` pairs to draw for a signal
    pub fn plot_points(&self, id: SignalId) -> Result<Vec<[f64; 2]>> {
        self.signal(id)
            .map(Signal::plot_points)
            .ok_or(SigViewError::UnknownSignal(id))
    }

    /// Sorted union of every enabled signal's timestamps
    pub fn union_timebase(&mut self) -> Arc<[f64]> {
        self.registry.union_timebase()
    }

    pub fn registry(&self) -> &TimebaseRegistry {
        &self.registry
    }

    // ==================== Cursor and region ====================

    pub fn cursor(&self) -> Option<f64> {
        self.cursor
    }

    /// Place the cursor on the union timestamp nearest to `pos`
    pub fn place_cursor(&mut self, pos: f64) -> f64 {
        let snapped = self.registry.snap(pos).unwrap_or(pos);
        self.cursor = Some(snapped);
        snapped
    }

    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    /// Move the cursor to the next or previous union timestamp.
    ///
    /// The visible range follows when the cursor leaves it. Returns the new
    /// position, or `None` when no cursor is placed.
    pub fn step_cursor(&mut self, direction: StepDirection) -> Option<f64> {
        let pos = self.cursor?;
        let next = self.registry.step(pos, direction).unwrap_or(match direction {
            StepDirection::Forward => pos + EMPTY_STEP,
            StepDirection::Backward => pos - EMPTY_STEP,
        });
        self.cursor = Some(next);

        let (x0, x1) = self.x_range;
        if next < x0 || next > x1 {
            let moved = next - pos;
            self.set_x_range(x0 + moved, x1 + moved);
        }
        Some(next)
    }

    pub fn region(&self) -> Option<(f64, f64)> {
        self.region
    }

    /// Select `[start, stop]`, both ends snapped to the union timebase.
    ///
    /// While the region is locked its locked edge stays put and only `stop`
    /// moves.
    pub fn set_region(&mut self, start: f64, stop: f64) -> (f64, f64) {
        let start = match self.region_lock {
            Some(locked) => locked,
            None => self.registry.snap(start).unwrap_or(start),
        };
        let stop = self.registry.snap(stop).unwrap_or(stop);
        let region = if start <= stop { (start, stop) } else { (stop, start) };
        self.region = Some(region);
        region
    }

    /// Remove the region, releasing any lock
    pub fn clear_region(&mut self) {
        self.region = None;
        self.region_lock = None;
    }

    /// Toggle the region lock on the region's start edge.
    ///
    /// Returns whether the region is now locked; without a region nothing is
    /// locked.
    pub fn toggle_region_lock(&mut self) -> bool {
        self.region_lock = match (self.region, self.region_lock) {
            (Some(_), Some(_)) | (None, _) => None,
            (Some((start, _)), None) => Some(start),
        };
        self.region_lock.is_some()
    }

    pub fn is_region_locked(&self) -> bool {
        self.region_lock.is_some()
    }

    // ==================== Navigation ====================

    /// Fit the visible range to the registered signals
    pub fn home(&mut self) {
        match self.registry.extent() {
            Some((start, stop)) => self.set_x_range(start, stop),
            None => self.trim_all(),
        }
    }

    /// Narrow or widen the visible range by a fixed fraction per side,
    /// centred on the cursor when one is placed
    pub fn zoom(&mut self, direction: ZoomDirection) {
        let (mut x0, mut x1) = self.x_range;
        let span = x1 - x0;
        let step = match direction {
            ZoomDirection::In => -span * ZOOM_STEP,
            ZoomDirection::Out => span * ZOOM_STEP,
        };
        if let Some(pos) = self.cursor {
            x0 = pos - span / 2.0;
            x1 = pos + span / 2.0;
        }
        self.set_x_range(x0 - step, x1 + step);
    }

    /// Show exactly the selected region. Returns false without a region.
    pub fn zoom_to_region(&mut self) -> bool {
        match self.region {
            Some((start, stop)) => {
                self.set_x_range(start, stop);
                true
            }
            None => false,
        }
    }

    // ==================== Output ====================

    /// Statistics of one signal for the current cursor, region and range
    pub fn stats(&mut self, id: SignalId) -> Result<StatisticsRecord> {
        let index = self.channel_index(id)?;
        Ok(self.stats.get_stats(
            &self.channels[index].signal,
            self.cursor,
            self.region,
            self.x_range,
        ))
    }

    /// Statistics of every enabled signal in display order
    pub fn all_stats(&mut self) -> Vec<StatisticsRecord> {
        let (cursor, region, x_range) = (self.cursor, self.region, self.x_range);
        self.channels
            .iter()
            .filter(|c| c.state.enabled)
            .map(|c| self.stats.get_stats(&c.signal, cursor, region, x_range))
            .collect()
    }

    pub fn statistics_engine(&self) -> &StatisticsEngine {
        &self.stats
    }

    pub fn axis_format(&self) -> AxisFormat {
        self.axis_format
    }

    pub fn set_axis_format(&mut self, axis_format: AxisFormat) {
        self.axis_format = axis_format;
    }

    /// Wall-clock time of `t = 0`, used by the date axis
    pub fn set_origin(&mut self, origin: Option<DateTime<Utc>>) {
        self.origin = origin;
    }

    pub fn cursor_info(&self) -> Option<String> {
        self.cursor
            .map(|pos| format::cursor_info(pos, self.axis_format, self.origin))
    }

    pub fn region_info(&self) -> Option<String> {
        self.region
            .map(|(start, stop)| format::region_info(start, stop, self.axis_format))
    }

    // ==================== Persistence ====================

    /// Describe the view for saving
    pub fn to_config(&self) -> ViewConfig {
        let channels = self
            .channels
            .iter()
            .map(|c| ChannelDescriptor {
                enabled: c.state.enabled,
                individual_axis: c.state.individual_axis,
                common_axis: c.state.common_axis,
                ranges: c.state.ranges.clone(),
                ..ChannelDescriptor::from_signal(&c.signal)
            })
            .collect();

        ViewConfig {
            channels,
            x_range: Some(self.x_range),
            cursor: self.cursor,
            region: self.region,
            axis_format: self.axis_format,
            ..ViewConfig::default()
        }
    }

    /// Restore display state onto the signals the descriptors address.
    ///
    /// Each descriptor is applied to the first signal it matches that no
    /// earlier descriptor claimed. Returns the number of signals restored.
    pub fn apply_config(&mut self, config: &ViewConfig) -> Result<usize> {
        let mut claimed = vec![false; self.channels.len()];

        for descriptor in &config.channels {
            let Some(index) = self
                .channels
                .iter()
                .enumerate()
                .position(|(i, c)| !claimed[i] && descriptor.matches(&c.signal))
            else {
                tracing::debug!(name = %descriptor.name, "no signal matches descriptor");
                continue;
            };
            claimed[index] = true;

            let channel = &mut self.channels[index];
            descriptor.apply_to(&mut channel.signal)?;
            channel.state.individual_axis = descriptor.individual_axis;
            channel.state.common_axis = descriptor.common_axis;
            channel.state.ranges = descriptor.ranges.clone();

            let id = channel.signal.id();
            self.set_enabled(id, descriptor.enabled)?;
        }

        self.axis_format = config.axis_format;
        self.cursor = config.cursor;
        self.region = config.region;
        self.region_lock = None;
        match config.x_range {
            Some((start, stop)) => self.set_x_range(start, stop),
            None => self.trim_all(),
        }

        let restored = claimed.iter().filter(|c| **c).count();
        tracing::info!(restored, descriptors = config.channels.len(), "view configuration applied");
        Ok(restored)
    }
}

/// Min and max of the active view, `(0, 1)` when there is nothing numeric
fn domain(signal: &Signal) -> (f64, f64) {
    match (signal.min(), signal.max()) {
        (Some(min), Some(max)) => (min.as_f64(), max.as_f64()),
        _ => (0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::LinearConversion;
    use crate::signal::SignalBuilder;

    fn ramp(name: &str, timestamps: Vec<f64>) -> Signal {
        let samples: Vec<f64> = (0..timestamps.len()).map(|i| i as f64).collect();
        SignalBuilder::new(name, samples, timestamps).build().unwrap()
    }

    fn view_with_two() -> (SignalView, SignalId, SignalId) {
        let mut view = SignalView::default();
        let a = view.add_signal(ramp("a", vec![0.0, 1.0, 2.0]));
        let b = view.add_signal(ramp("b", vec![0.5, 1.5]));
        (view, a, b)
    }

    #[test]
    fn test_first_signal_homes() {
        let mut view = SignalView::default();
        view.add_signal(ramp("a", vec![2.0, 3.0, 7.0]));
        assert_eq!(view.x_range(), (2.0, 7.0));

        view.add_signal(ramp("b", vec![0.0, 10.0]));
        assert_eq!(view.x_range(), (2.0, 7.0));
        view.home();
        assert_eq!(view.x_range(), (0.0, 10.0));
    }

    #[test]
    fn test_union_and_snap() {
        let (mut view, _, _) = view_with_two();
        assert_eq!(&view.union_timebase()[..], &[0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(view.place_cursor(0.7), 0.5);
        assert_eq!(view.place_cursor(0.75), 0.5);
        assert_eq!(view.place_cursor(0.8), 1.0);
    }

    #[test]
    fn test_disable_leaves_union() {
        let (mut view, _, b) = view_with_two();
        view.set_enabled(b, false).unwrap();
        assert_eq!(&view.union_timebase()[..], &[0.0, 1.0, 2.0]);
        view.set_enabled(b, true).unwrap();
        assert_eq!(view.union_timebase().len(), 5);
    }

    #[test]
    fn test_unknown_signal() {
        let (mut view, _, _) = view_with_two();
        let stranger = ramp("c", vec![0.0]).id();
        assert!(matches!(
            view.set_enabled(stranger, false),
            Err(SigViewError::UnknownSignal(id)) if id == stranger
        ));
        assert!(view.stats(stranger).is_err());
        assert!(view.set_time_offset(false, 1.0, &[stranger]).is_err());
    }

    #[test]
    fn test_step_without_cursor() {
        let (mut view, _, _) = view_with_two();
        assert_eq!(view.step_cursor(StepDirection::Forward), None);
    }

    #[test]
    fn test_step_on_empty_union() {
        let mut view = SignalView::default();
        view.place_cursor(0.25);
        assert_eq!(view.step_cursor(StepDirection::Forward), Some(1.25));
        assert_eq!(view.step_cursor(StepDirection::Backward), Some(0.25));
    }

    #[test]
    fn test_step_scrolls_range() {
        let (mut view, _, _) = view_with_two();
        view.set_x_range(0.0, 1.0);
        view.place_cursor(1.0);
        assert_eq!(view.step_cursor(StepDirection::Forward), Some(1.5));
        assert_eq!(view.x_range(), (0.5, 1.5));
    }

    #[test]
    fn test_zoom_around_cursor() {
        let (mut view, _, _) = view_with_two();
        view.set_x_range(0.0, 2.0);
        view.zoom(ZoomDirection::In);
        let (x0, x1) = view.x_range();
        assert!((x0 - 0.1).abs() < 1e-12 && (x1 - 1.9).abs() < 1e-12);

        view.set_x_range(0.0, 2.0);
        view.place_cursor(1.5);
        view.zoom(ZoomDirection::Out);
        let (x0, x1) = view.x_range();
        assert!((x0 - 0.4).abs() < 1e-12 && (x1 - 2.6).abs() < 1e-12);
    }

    #[test]
    fn test_region_lock() {
        let (mut view, _, _) = view_with_two();
        assert!(!view.toggle_region_lock());

        assert_eq!(view.set_region(0.4, 1.1), (0.5, 1.0));
        assert!(view.toggle_region_lock());
        assert_eq!(view.set_region(0.0, 2.0), (0.5, 2.0));
        assert_eq!(view.set_region(1.9, 0.0), (0.0, 0.5));

        view.clear_region();
        assert!(!view.is_region_locked());
        assert!(view.region().is_none());
    }

    #[test]
    fn test_zoom_to_region() {
        let (mut view, _, _) = view_with_two();
        assert!(!view.zoom_to_region());
        view.set_region(0.5, 1.5);
        assert!(view.zoom_to_region());
        assert_eq!(view.x_range(), (0.5, 1.5));
    }

    #[test]
    fn test_set_format_integer_only() {
        let mut view = SignalView::default();
        let float = view.add_signal(ramp("f", vec![0.0, 1.0]));
        let int = view.add_signal(
            SignalBuilder::new("i", vec![1i64, 2], vec![0.0, 1.0])
                .build()
                .unwrap(),
        );
        assert!(!view.set_format(float, DisplayFormat::Hex).unwrap());
        assert!(view.set_format(int, DisplayFormat::Hex).unwrap());
        assert_eq!(view.signal(int).unwrap().format(), DisplayFormat::Hex);
    }

    #[test]
    fn test_mode_switch_rescales_y_range() {
        let mut view = SignalView::default();
        let id = view.add_signal(
            SignalBuilder::new("scaled", vec![0.0, 10.0], vec![0.0, 1.0])
                .with_conversion(Arc::new(LinearConversion::new(2.0, 0.0)))
                .build()
                .unwrap(),
        );

        // Physical domain is [0, 20]; the axis shows its upper half.
        let rescaled = view
            .set_mode(id, SampleMode::Raw, Some(YRange::new(10.0, 20.0)))
            .unwrap()
            .unwrap();
        assert!((rescaled.min - 5.0).abs() < 1e-12);
        assert!((rescaled.max - 10.0).abs() < 1e-12);

        assert_eq!(view.set_mode(id, SampleMode::Raw, Some(rescaled)).unwrap(), None);
    }

    #[test]
    fn test_time_offset_moves_group() {
        let (mut view, a, _) = view_with_two();
        let shifted = view.set_time_offset(true, 10.0, &[a]).unwrap();
        assert_eq!(shifted, 1);
        assert_eq!(view.signal(a).unwrap().timestamps(), &[10.0, 11.0, 12.0]);
        assert_eq!(&view.union_timebase()[..], &[0.5, 1.5, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_remove_signals() {
        let (mut view, a, b) = view_with_two();
        view.stats(a).unwrap();
        assert_eq!(view.remove_signals(&[a]), 1);
        assert_eq!(view.ids(), vec![b]);
        assert!(!view.registry().contains(a));
        assert_eq!(&view.union_timebase()[..], &[0.5, 1.5]);
        assert_eq!(view.remove_signals(&[a]), 0);
    }

    #[test]
    fn test_info_text() {
        let (mut view, _, _) = view_with_two();
        assert!(view.cursor_info().is_none());
        view.place_cursor(1.0);
        assert_eq!(view.cursor_info().unwrap(), "t = 1.000000s");
        view.set_region(0.5, 1.5);
        view.set_axis_format(AxisFormat::Time);
        assert_eq!(view.region_info().unwrap(), "Δt = 0:00:01");
    }

    #[test]
    fn test_default_precision_from_settings() {
        let settings = EngineSettings {
            default_precision: 2,
            ..EngineSettings::default()
        };
        let mut view = SignalView::new(settings);
        let ids = view.add_signals([
            SignalBuilder::new("plain", vec![1.0, 2.0], vec![0.0, 1.0]).build().unwrap(),
            SignalBuilder::new("own", vec![1.0, 2.0], vec![0.0, 1.0])
                .with_precision(4)
                .build()
                .unwrap(),
        ]);
        assert_eq!(view.signal(ids[0]).unwrap().precision(), 2);
        assert_eq!(view.signal(ids[1]).unwrap().precision(), 4);
        assert_eq!(view.stats(ids[0]).unwrap().overall_max.to_string(), "2.00");
    }

    #[test]
    fn test_date_label_far_from_origin() {
        use chrono::TimeZone;
        let mut view = SignalView::default();
        view.set_origin(Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        view.set_axis_format(AxisFormat::Date);
        view.place_cursor(f64::INFINITY);
        assert_eq!(view.cursor_info().unwrap(), "t = n.a.");
        view.place_cursor(1e13);
        assert_eq!(view.cursor_info().unwrap(), "t = n.a.");
    }

    #[test]
    fn test_config_round_trip() {
        let (mut view, a, b) = view_with_two();
        view.set_enabled(b, false).unwrap();
        view.set_common_axis(a, true).unwrap();
        view.set_ranges(a, vec![HighlightRange::new(0.0, 1.0, "#FF0000")]).unwrap();
        view.set_precision(a, 2).unwrap();
        view.place_cursor(1.0);
        let config = view.to_config();

        let mut other = SignalView::default();
        let a2 = other.add_signal(ramp("a", vec![0.0, 1.0, 2.0]));
        let b2 = other.add_signal(ramp("b", vec![0.5, 1.5]));
        assert_eq!(other.apply_config(&config).unwrap(), 2);

        assert!(other.channel_state(a2).unwrap().common_axis);
        assert_eq!(other.channel_state(a2).unwrap().ranges.len(), 1);
        assert!(!other.channel_state(b2).unwrap().enabled);
        assert_eq!(other.signal(a2).unwrap().precision(), 2);
        assert_eq!(other.cursor(), Some(1.0));
        assert_eq!(other.to_config().channels, config.channels);
    }
}
