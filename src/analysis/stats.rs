//! Live statistics for the status panel
//!
//! [`StatisticsEngine::get_stats`] assembles a [`StatisticsRecord`] from
//! four sources: the reductions a signal computed at construction, the value
//! under the cursor, the selected region and the visible range. Region and
//! visible-range reductions are the only ones that scan samples, so each is
//! cached per signal and recomputed only when its range (or the signal's
//! revision) changes.
//!
//! # Main Types
//!
//! - [`StatisticsEngine`] - Per-signal two-entry cache
//! - [`StatisticsRecord`] - One snapshot
//! - [`RangeStats`] - Reductions over a time range
//! - [`StatValue`] - A rendered field or its sentinel

use crate::format::{format_float, format_scalar, format_value};
use crate::signal::{Signal, Summary};
use crate::types::{color_to_hex, SampleValue, SignalId, NOT_AVAILABLE};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One field of a statistics record
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    /// Field does not apply (no cursor, no region, text signal)
    Empty,
    /// Nothing finite to reduce
    NotAvailable,
    /// A point in time or a duration, in seconds
    Time(f64),
    /// A rendered value
    Text(String),
}

impl StatValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, StatValue::Empty)
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Empty => Ok(()),
            StatValue::NotAvailable => f.write_str(NOT_AVAILABLE),
            StatValue::Time(t) => write!(f, "{}", t),
            StatValue::Text(text) => f.write_str(text),
        }
    }
}

/// Reductions over one time range
#[derive(Debug, Clone, PartialEq)]
pub struct RangeStats {
    pub start: StatValue,
    pub stop: StatValue,
    pub delta_t: StatValue,
    pub min: StatValue,
    pub max: StatValue,
    pub average: StatValue,
    pub rms: StatValue,
    /// Last minus first sample in the range
    pub delta: StatValue,
}

impl RangeStats {
    /// Record for a range that does not exist
    pub fn empty() -> Self {
        Self {
            start: StatValue::Empty,
            stop: StatValue::Empty,
            delta_t: StatValue::Empty,
            min: StatValue::Empty,
            max: StatValue::Empty,
            average: StatValue::Empty,
            rms: StatValue::Empty,
            delta: StatValue::Empty,
        }
    }

    fn bounds(start: f64, stop: f64, fill: StatValue) -> Self {
        Self {
            start: StatValue::Time(start),
            stop: StatValue::Time(stop),
            delta_t: StatValue::Time(stop - start),
            min: fill.clone(),
            max: fill.clone(),
            average: fill.clone(),
            rms: fill.clone(),
            delta: fill,
        }
    }

    fn fields(&self) -> [(&'static str, &StatValue); 8] {
        [
            ("start", &self.start),
            ("stop", &self.stop),
            ("delta_t", &self.delta_t),
            ("min", &self.min),
            ("max", &self.max),
            ("average", &self.average),
            ("rms", &self.rms),
            ("delta", &self.delta),
        ]
    }
}

/// Snapshot of everything the status panel shows for one signal
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRecord {
    pub name: String,
    pub unit: String,
    /// `#RRGGBB`
    pub color: String,
    pub overall_min: StatValue,
    pub overall_max: StatValue,
    pub overall_average: StatValue,
    pub overall_rms: StatValue,
    pub overall_start: StatValue,
    pub overall_stop: StatValue,
    pub cursor_t: StatValue,
    pub cursor_value: StatValue,
    pub selected: RangeStats,
    pub visible: RangeStats,
}

impl StatisticsRecord {
    /// Flatten to `overall_min`, `selected_delta_t`, `visible_rms`, ...
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), self.name.clone());
        map.insert("unit".to_string(), self.unit.clone());
        map.insert("color".to_string(), self.color.clone());

        let overall = [
            ("overall_min", &self.overall_min),
            ("overall_max", &self.overall_max),
            ("overall_average", &self.overall_average),
            ("overall_rms", &self.overall_rms),
            ("overall_start", &self.overall_start),
            ("overall_stop", &self.overall_stop),
            ("cursor_t", &self.cursor_t),
            ("cursor_value", &self.cursor_value),
        ];
        for (key, value) in overall {
            map.insert(key.to_string(), value.to_string());
        }

        for (prefix, range) in [("selected", &self.selected), ("visible", &self.visible)] {
            for (key, value) in range.fields() {
                map.insert(format!("{}_{}", prefix, key), value.to_string());
            }
        }
        map
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RangeKey {
    start: u64,
    stop: u64,
    revision: u64,
}

impl RangeKey {
    fn new(start: f64, stop: f64, revision: u64) -> Self {
        Self {
            start: start.to_bits(),
            stop: stop.to_bits(),
            revision,
        }
    }
}

#[derive(Debug, Default)]
struct StatsCache {
    selected: Option<(RangeKey, RangeStats)>,
    visible: Option<(RangeKey, RangeStats)>,
}

/// Computes statistics records with per-signal range caching
#[derive(Debug, Default)]
pub struct StatisticsEngine {
    caches: HashMap<SignalId, StatsCache>,
    range_reductions: u64,
}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the record for `signal`.
    ///
    /// `region` and `view_region` are `(start, stop)` in seconds, inclusive.
    pub fn get_stats(
        &mut self,
        signal: &Signal,
        cursor: Option<f64>,
        region: Option<(f64, f64)>,
        view_region: (f64, f64),
    ) -> StatisticsRecord {
        let is_text = signal.is_string();
        let precision = signal.precision();
        let format = signal.format();

        let (overall_min, overall_max, overall_average, overall_rms) = if is_text {
            (StatValue::Empty, StatValue::Empty, StatValue::Empty, StatValue::Empty)
        } else {
            match signal.summary() {
                Summary::Numeric(r) => (
                    StatValue::Text(format_scalar(r.min, format, precision)),
                    StatValue::Text(format_scalar(r.max, format, precision)),
                    StatValue::Text(format_float(r.avg, precision)),
                    StatValue::Text(format_float(r.rms, precision)),
                ),
                _ => (
                    StatValue::NotAvailable,
                    StatValue::NotAvailable,
                    StatValue::NotAvailable,
                    StatValue::NotAvailable,
                ),
            }
        };

        let (overall_start, overall_stop) = match (signal.timestamps().first(), signal.timestamps().last()) {
            (Some(&first), Some(&last)) => (StatValue::Time(first), StatValue::Time(last)),
            _ => (StatValue::NotAvailable, StatValue::NotAvailable),
        };

        let (cursor_t, cursor_value) = match cursor {
            Some(t) => {
                let value = match signal.value_at(t).value {
                    SampleValue::NotAvailable => StatValue::NotAvailable,
                    value => StatValue::Text(format_value(&value, format, precision)),
                };
                (StatValue::Time(t), value)
            }
            None => (StatValue::Empty, StatValue::Empty),
        };

        let selected = match region {
            Some(range) => self.range_stats(signal, ordered(range), RangeSlot::Selected),
            None => RangeStats::empty(),
        };
        let visible = self.range_stats(signal, ordered(view_region), RangeSlot::Visible);

        StatisticsRecord {
            name: signal.name().to_string(),
            unit: if is_text { String::new() } else { signal.unit().to_string() },
            color: color_to_hex(signal.color()),
            overall_min,
            overall_max,
            overall_average,
            overall_rms,
            overall_start,
            overall_stop,
            cursor_t,
            cursor_value,
            selected,
            visible,
        }
    }

    fn range_stats(&mut self, signal: &Signal, (start, stop): (f64, f64), slot: RangeSlot) -> RangeStats {
        let key = RangeKey::new(start, stop, signal.revision());
        let cache = self.caches.entry(signal.id()).or_default();
        let entry = match slot {
            RangeSlot::Selected => &mut cache.selected,
            RangeSlot::Visible => &mut cache.visible,
        };

        if let Some((cached_key, stats)) = entry {
            if *cached_key == key {
                tracing::trace!(signal = %signal.id(), ?slot, "range statistics cache hit");
                return stats.clone();
            }
        }

        self.range_reductions += 1;
        let stats = reduce_range(signal, start, stop);
        *entry = Some((key, stats.clone()));
        stats
    }

    /// Drop cached ranges of a removed signal
    pub fn forget(&mut self, id: SignalId) {
        self.caches.remove(&id);
    }

    pub fn clear(&mut self) {
        self.caches.clear();
    }

    /// Number of range reductions that actually scanned samples
    pub fn range_reductions(&self) -> u64 {
        self.range_reductions
    }
}

#[derive(Debug, Clone, Copy)]
enum RangeSlot {
    Selected,
    Visible,
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn reduce_range(signal: &Signal, start: f64, stop: f64) -> RangeStats {
    if signal.is_string() {
        return RangeStats::bounds(start, stop, StatValue::Empty);
    }

    let range = signal.range(Some(start), Some(stop), true);
    let precision = signal.precision();
    let format = signal.format();

    match signal.active_samples().summary_of(range) {
        Summary::Numeric(r) => RangeStats {
            min: StatValue::Text(format_scalar(r.min, format, precision)),
            max: StatValue::Text(format_scalar(r.max, format, precision)),
            average: StatValue::Text(format_float(r.avg, precision)),
            rms: StatValue::Text(format_float(r.rms, precision)),
            delta: StatValue::Text(format_scalar(r.delta(), format, precision)),
            ..RangeStats::bounds(start, stop, StatValue::Empty)
        },
        _ => RangeStats::bounds(start, stop, StatValue::NotAvailable),
    }
}
