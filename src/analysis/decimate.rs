//! Viewport-sized min/max decimation
//!
//! A signal may hold millions of samples while the plot only has a couple of
//! thousand pixel columns. [`Decimator::trim`] splits the samples inside the
//! requested window into equally sized buckets and keeps, per bucket, the
//! first minimum and the first maximum, so every visible peak survives.
//! When the window is narrow enough that each column holds at most one
//! sample, the samples are returned verbatim, padded by two on each side so
//! the curve continues past the plot edges.
//!
//! Timestamps are assumed sorted. Unsorted input does not panic but produces
//! meaningless buckets.

use crate::signal::Samples;
use std::ops::Range;

/// Samples reduced to one viewport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotView {
    /// Indices into the signal arrays, in time order
    pub indices: Vec<usize>,
    /// Samples inside the clipped window
    pub range: Range<usize>,
    /// Window clipped to the signal extent, `None` when they do not intersect
    pub span: Option<(f64, f64)>,
    /// Bucket size used; 0 or 1 means samples were returned verbatim
    pub raster: usize,
    /// Columns the clipped window occupies
    pub visible: usize,
}

impl PlotView {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when buckets were reduced rather than copied
    pub fn is_decimated(&self) -> bool {
        self.raster > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrimKey {
    start: u64,
    stop: u64,
    width: usize,
    revision: u64,
}

/// Memoized decimation for one signal
#[derive(Debug, Default)]
pub struct Decimator {
    last: Option<TrimKey>,
    view: PlotView,
    reductions: u64,
}

impl Decimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce `samples` to the window `[start, stop]` drawn over `width`
    /// columns.
    ///
    /// `revision` identifies the content of the sample arrays; a call with
    /// the same window, width and revision as the previous one returns the
    /// cached view without touching the samples.
    pub fn trim(
        &mut self,
        timestamps: &[f64],
        samples: &Samples,
        revision: u64,
        start: f64,
        stop: f64,
        width: usize,
    ) -> &PlotView {
        let key = TrimKey {
            start: start.to_bits(),
            stop: stop.to_bits(),
            width,
            revision,
        };

        if self.last == Some(key) {
            tracing::trace!(start, stop, width, "trim memo hit");
            return &self.view;
        }

        self.reductions += 1;
        self.view = decimate(timestamps, samples, start, stop, width);
        self.last = Some(key);

        tracing::debug!(
            samples = timestamps.len(),
            visible = self.view.visible,
            raster = self.view.raster,
            points = self.view.len(),
            "decimation pass"
        );
        &self.view
    }

    /// Last computed view
    pub fn view(&self) -> &PlotView {
        &self.view
    }

    /// Number of decimation passes actually computed
    pub fn reductions(&self) -> u64 {
        self.reductions
    }

    /// Forget the memo so the next trim recomputes
    pub fn invalidate(&mut self) {
        self.last = None;
        self.view = PlotView::default();
    }
}

/// Stateless decimation pass
pub fn decimate(
    timestamps: &[f64],
    samples: &Samples,
    start: f64,
    stop: f64,
    width: usize,
) -> PlotView {
    debug_assert_eq!(timestamps.len(), samples.len());
    let n = timestamps.len().min(samples.len());
    let (start, stop) = if start <= stop { (start, stop) } else { (stop, start) };

    if n == 0 || width == 0 || !start.is_finite() || !stop.is_finite() {
        return PlotView::default();
    }

    let first = timestamps[0];
    let last = timestamps[n - 1];
    if stop < first || start > last {
        return PlotView::default();
    }

    let clip_start = start.max(first);
    let clip_stop = stop.min(last);
    let span = stop - start;
    let visible = if span > 0.0 {
        ((clip_stop - clip_start) / span * width as f64).round().abs() as usize
    } else {
        1
    }
    .max(1);

    let lo = timestamps[..n].partition_point(|&t| t < clip_start);
    let hi = timestamps[..n].partition_point(|&t| t <= clip_stop);
    let count = hi.saturating_sub(lo);

    let mut view = PlotView {
        indices: Vec::new(),
        range: lo..hi.max(lo),
        span: Some((clip_start, clip_stop)),
        raster: 0,
        visible,
    };

    if count > 0 && samples.finite_count(lo..hi) == 0 {
        return view;
    }

    let mut raster = count.div_ceil(visible);
    while raster > 1 {
        match bucket_extrema(samples, lo, count, raster, visible) {
            Bucketing::Done(indices) => {
                view.indices = indices;
                view.raster = raster;
                return view;
            }
            Bucketing::Shrink => raster -= 1,
        }
    }

    view.raster = raster;
    view.indices = (lo.saturating_sub(2)..(hi + 2).min(n)).collect();
    view
}

enum Bucketing {
    Done(Vec<usize>),
    Shrink,
}

fn bucket_extrema(
    samples: &Samples,
    lo: usize,
    count: usize,
    raster: usize,
    visible: usize,
) -> Bucketing {
    let rows = count / raster;
    // Shrinking adds rows, only allowed while the point bound still holds
    let may_shrink = raster > 1 && count / (raster - 1) <= visible;

    let mut indices = Vec::with_capacity(2 * rows + 2);
    for row in 0..rows {
        let offset = lo + row * raster;
        match samples.argminmax(offset..offset + raster) {
            Some((min, max)) => push_pair(&mut indices, offset, min, max),
            None if may_shrink => return Bucketing::Shrink,
            None => {}
        }
    }

    let tail = lo + rows * raster;
    if tail < lo + count {
        if let Some((min, max)) = samples.argminmax(tail..lo + count) {
            push_pair(&mut indices, tail, min, max);
        }
    }

    Bucketing::Done(indices)
}

fn push_pair(indices: &mut Vec<usize>, offset: usize, a: usize, b: usize) {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    indices.push(offset + first);
    if second != first {
        indices.push(offset + second);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> (Vec<f64>, Samples) {
        let ts: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let values = Samples::from(ts.clone());
        (ts, values)
    }

    #[test]
    fn test_empty_signal() {
        let view = decimate(&[], &Samples::default(), 0.0, 10.0, 100);
        assert!(view.is_empty());
        assert_eq!(view.span, None);
    }

    #[test]
    fn test_window_outside_extent_is_empty() {
        let (ts, s) = ramp(10);
        assert!(decimate(&ts, &s, 20.0, 30.0, 100).is_empty());
        assert!(decimate(&ts, &s, -5.0, -1.0, 100).is_empty());
    }

    #[test]
    fn test_short_range_returned_verbatim_with_padding() {
        let (ts, s) = ramp(100);
        let view = decimate(&ts, &s, 10.0, 20.0, 1000);
        assert!(!view.is_decimated());
        assert_eq!(view.indices, (8..23).collect::<Vec<_>>());
    }

    #[test]
    fn test_padding_clipped_at_ends() {
        let (ts, s) = ramp(5);
        let view = decimate(&ts, &s, 0.0, 4.0, 100);
        assert_eq!(view.indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_buckets_keep_extrema() {
        let ts: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let s = Samples::from(vec![1.0, 9.0, 0.0, 3.0, 5.0, 5.0, -2.0, 4.0]);
        let view = decimate(&ts, &s, 0.0, 7.0, 2);
        assert_eq!(view.raster, 4);
        assert_eq!(view.indices, vec![1, 2, 4, 6]);
    }

    #[test]
    fn test_remainder_is_kept() {
        let ts: Vec<f64> = (0..7).map(|i| i as f64).collect();
        let s = Samples::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        // raster = ceil(7 / 3) = 3, two full rows, one leftover sample
        let view = decimate(&ts, &s, 0.0, 6.0, 3);
        assert_eq!(view.raster, 3);
        assert_eq!(view.indices, vec![0, 2, 3, 5, 6]);
    }

    #[test]
    fn test_all_nan_bucket_is_skipped_when_shrinking_would_overflow() {
        let ts: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let mut values = vec![1.0; 12];
        values[0..4].fill(f64::NAN);
        let s = Samples::from(values);
        // visible = 4, raster = 3; a raster of 2 would need 6 rows
        let view = decimate(&ts, &s, 0.0, 11.0, 4);
        assert_eq!(view.raster, 3);
        assert_eq!(view.indices, vec![4, 6, 9]);
    }

    #[test]
    fn test_all_nan_bucket_shrinks_raster() {
        let ts: Vec<f64> = (0..9).map(|i| i as f64).collect();
        let s = Samples::from(vec![f64::NAN, f64::NAN, f64::NAN, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        // visible = 4, raster = 3 hits an all-NaN first bucket and drops to 2
        let view = decimate(&ts, &s, 0.0, 8.0, 4);
        assert_eq!(view.raster, 2);
        assert_eq!(view.indices, vec![3, 4, 5, 6, 7, 8]);
        assert!(view.len() <= 2 * view.visible + 4);
    }

    #[test]
    fn test_all_nan_clip_is_empty() {
        let ts: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let s = Samples::from(vec![f64::NAN; 50]);
        assert!(decimate(&ts, &s, 0.0, 49.0, 5).is_empty());
    }

    #[test]
    fn test_partial_window_gets_proportional_columns() {
        let (ts, s) = ramp(1000);
        // signal covers half the requested window
        let view = decimate(&ts, &s, -999.0, 999.0, 100);
        assert_eq!(view.visible, 50);
        assert_eq!(view.span, Some((0.0, 999.0)));
        assert!(view.len() <= 2 * 50 + 4);
    }

    #[test]
    fn test_text_samples_bucket_lexicographically() {
        let ts: Vec<f64> = (0..4).map(|i| i as f64).collect();
        let s = Samples::from_strs(&["b", "a", "d", "c"]);
        let view = decimate(&ts, &s, 0.0, 3.0, 1);
        assert_eq!(view.raster, 4);
        assert_eq!(view.indices, vec![1, 2]);
    }

    #[test]
    fn test_memo_skips_recomputation() {
        let (ts, s) = ramp(10_000);
        let mut decimator = Decimator::new();
        let first = decimator.trim(&ts, &s, 0, 0.0, 9999.0, 100).clone();
        let second = decimator.trim(&ts, &s, 0, 0.0, 9999.0, 100).clone();
        assert_eq!(first, second);
        assert_eq!(decimator.reductions(), 1);

        decimator.trim(&ts, &s, 1, 0.0, 9999.0, 100);
        assert_eq!(decimator.reductions(), 2);
        decimator.trim(&ts, &s, 1, 0.0, 9999.0, 200);
        assert_eq!(decimator.reductions(), 3);

        decimator.invalidate();
        decimator.trim(&ts, &s, 1, 0.0, 9999.0, 200);
        assert_eq!(decimator.reductions(), 4);
    }

    use proptest::prelude::*;

    fn signal_strategy() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        prop::collection::vec(
            (0.001f64..2.0, prop_oneof![9 => -1e6f64..1e6, 1 => Just(f64::NAN)]),
            1..600,
        )
        .prop_map(|pairs| {
            let mut t = 0.0;
            pairs
                .into_iter()
                .map(|(dt, v)| {
                    t += dt;
                    (t, v)
                })
                .unzip()
        })
    }

    proptest! {
        #[test]
        fn test_output_is_bounded_and_ordered(
            (ts, values) in signal_strategy(),
            a in -100.0f64..1300.0,
            len in 0.0f64..1300.0,
            width in 1usize..400,
        ) {
            let s = Samples::from(values);
            let view = decimate(&ts, &s, a, a + len, width);

            prop_assert!(view.len() <= 2 * view.visible + 4,
                "{} points for {} columns", view.len(), view.visible);
            for pair in view.indices.windows(2) {
                prop_assert!(pair[0] < pair[1]);
                prop_assert!(ts[pair[0]] <= ts[pair[1]]);
            }
        }

        #[test]
        fn test_every_bucket_keeps_its_extrema(
            (ts, values) in signal_strategy(),
            a in -100.0f64..1300.0,
            len in 0.0f64..1300.0,
            width in 1usize..100,
        ) {
            let s = Samples::from(values.clone());
            let view = decimate(&ts, &s, a, a + len, width);

            let lo = view.range.start;
            let count = view.range.len();
            let finite_in = |from: usize, to: usize| -> Vec<f64> {
                values[from..to].iter().copied().filter(|v| v.is_finite()).collect()
            };

            // Window-wide extrema survive whether or not the clip was reduced
            let window = finite_in(lo, lo + count);
            if window.is_empty() {
                return Ok(());
            }
            let kept: Vec<f64> = view.indices.iter().map(|&i| values[i]).collect();
            prop_assert!(kept.contains(&window.iter().copied().fold(f64::MIN, f64::max)));
            prop_assert!(kept.contains(&window.iter().copied().fold(f64::MAX, f64::min)));

            if !view.is_decimated() {
                for i in lo..lo + count {
                    prop_assert!(view.indices.contains(&i));
                }
                return Ok(());
            }

            let raster = view.raster;
            let mut bucket_starts: Vec<usize> = (0..count / raster).map(|r| lo + r * raster).collect();
            if count % raster != 0 {
                bucket_starts.push(lo + (count / raster) * raster);
            }

            for &b in &bucket_starts {
                let end = (b + raster).min(lo + count);
                let finite = finite_in(b, end);
                if finite.is_empty() {
                    continue;
                }
                let max = finite.iter().copied().fold(f64::MIN, f64::max);
                let min = finite.iter().copied().fold(f64::MAX, f64::min);
                let kept: Vec<f64> = view.indices.iter().filter(|&&i| i >= b && i < end).map(|&i| values[i]).collect();
                prop_assert!(kept.contains(&max));
                prop_assert!(kept.contains(&min));
                prop_assert!(kept.iter().all(|v| *v >= min && *v <= max));
            }
        }
    }
}
