//! Sample buffers and their reductions
//!
//! [`Samples`] is the tagged storage behind every signal view. Buffers are
//! reference counted so that a signal without a conversion can hand the same
//! allocation to its raw and physical views, and a cut or a shift only copies
//! what actually changes.

use super::text::decode_bytes;
use crate::types::{SampleKind, SampleValue, Scalar};
use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;

/// One sample view of a signal
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Float(Arc<[f64]>),
    Integer(Arc<[i64]>),
    Text(Arc<[Vec<u8>]>),
}

impl Default for Samples {
    fn default() -> Self {
        Samples::Float(Arc::from(Vec::new()))
    }
}

impl From<Vec<f64>> for Samples {
    fn from(values: Vec<f64>) -> Self {
        Samples::Float(values.into())
    }
}

impl From<Vec<i64>> for Samples {
    fn from(values: Vec<i64>) -> Self {
        Samples::Integer(values.into())
    }
}

impl From<Vec<Vec<u8>>> for Samples {
    fn from(values: Vec<Vec<u8>>) -> Self {
        Samples::Text(values.into())
    }
}

impl Samples {
    /// Build a text view from string slices
    pub fn from_strs(values: &[&str]) -> Self {
        Samples::Text(values.iter().map(|s| s.as_bytes().to_vec()).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::Float(v) => v.len(),
            Samples::Integer(v) => v.len(),
            Samples::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> SampleKind {
        match self {
            Samples::Float(_) => SampleKind::Float,
            Samples::Integer(_) => SampleKind::Integer,
            Samples::Text(_) => SampleKind::Text,
        }
    }

    /// True when both views share one allocation
    pub fn ptr_eq(&self, other: &Samples) -> bool {
        match (self, other) {
            (Samples::Float(a), Samples::Float(b)) => Arc::ptr_eq(a, b),
            (Samples::Integer(a), Samples::Integer(b)) => Arc::ptr_eq(a, b),
            (Samples::Text(a), Samples::Text(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Copy out a contiguous sub-range
    pub fn slice(&self, range: Range<usize>) -> Samples {
        match self {
            Samples::Float(v) => Samples::Float(v[range].into()),
            Samples::Integer(v) => Samples::Integer(v[range].into()),
            Samples::Text(v) => Samples::Text(v[range].to_vec().into()),
        }
    }

    /// Keep the samples whose mask entry is true
    pub fn retain(&self, keep: &[bool]) -> Samples {
        debug_assert_eq!(keep.len(), self.len());
        fn filter<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(keep)
                .filter(|(_, &k)| k)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            Samples::Float(v) => Samples::Float(filter(v, keep).into()),
            Samples::Integer(v) => Samples::Integer(filter(v, keep).into()),
            Samples::Text(v) => Samples::Text(filter(v, keep).into()),
        }
    }

    /// Keep-mask for NaN removal, or `None` when nothing has to go.
    ///
    /// Only float views can hold NaN; integer and text views always return
    /// `None`.
    pub fn nan_mask(&self) -> Option<Vec<bool>> {
        match self {
            Samples::Float(v) if v.iter().any(|x| x.is_nan()) => {
                Some(v.iter().map(|x| !x.is_nan()).collect())
            }
            _ => None,
        }
    }

    /// Numeric value at `index` widened to f64 (None for text)
    pub fn value_f64(&self, index: usize) -> Option<f64> {
        match self {
            Samples::Float(v) => v.get(index).copied(),
            Samples::Integer(v) => v.get(index).map(|&x| x as f64),
            Samples::Text(_) => None,
        }
    }

    /// Typed value at `index`, decoding byte strings
    pub fn value(&self, index: usize) -> Option<SampleValue> {
        match self {
            Samples::Float(v) => v.get(index).map(|&x| SampleValue::Float(x)),
            Samples::Integer(v) => v.get(index).map(|&x| SampleValue::Integer(x)),
            Samples::Text(v) => v.get(index).map(|b| SampleValue::Text(decode_bytes(b))),
        }
    }

    /// Numeric view widened to f64 (None for text)
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Samples::Float(v) => Some(v.to_vec()),
            Samples::Integer(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Samples::Text(_) => None,
        }
    }

    /// Number of samples in `range` that take part in reductions
    pub fn finite_count(&self, range: Range<usize>) -> usize {
        match self {
            Samples::Float(v) => v[range].iter().filter(|x| x.is_finite()).count(),
            Samples::Integer(_) | Samples::Text(_) => range.len(),
        }
    }

    /// Positions (relative to `range.start`) of the first minimum and first
    /// maximum in `range`, ignoring non-finite floats.
    ///
    /// Text compares byte-wise. Returns `None` when the range holds nothing
    /// comparable.
    pub fn argminmax(&self, range: Range<usize>) -> Option<(usize, usize)> {
        match self {
            Samples::Float(v) => argminmax_by(&v[range], |x| x.is_finite(), |a, b| {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }),
            Samples::Integer(v) => argminmax_by(&v[range], |_| true, Ord::cmp),
            Samples::Text(v) => argminmax_by(&v[range], |_| true, Ord::cmp),
        }
    }

    /// Reduce the whole view
    pub fn summary(&self) -> Summary {
        self.summary_of(0..self.len())
    }

    /// Reduce `range` over finite values only
    pub fn summary_of(&self, range: Range<usize>) -> Summary {
        match self {
            Samples::Text(_) => Summary::Text,
            Samples::Float(v) => {
                let mut acc = Accumulator::default();
                for &x in v[range].iter().filter(|x| x.is_finite()) {
                    acc.push(Scalar::Float(x), x);
                }
                acc.finish()
            }
            Samples::Integer(v) => {
                let mut acc = Accumulator::default();
                for &x in &v[range] {
                    acc.push(Scalar::Integer(x), x as f64);
                }
                acc.finish()
            }
        }
    }
}

/// Scalar reductions of a sample view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reduction {
    pub min: Scalar,
    pub max: Scalar,
    pub avg: f64,
    pub rms: f64,
    /// First finite sample, in time order
    pub first: Scalar,
    /// Last finite sample, in time order
    pub last: Scalar,
    pub count: usize,
}

impl Reduction {
    /// `last - first`, exact for integer views.
    ///
    /// An integer difference that does not fit in `i64` is reported as a
    /// float computed in `i128`.
    pub fn delta(&self) -> Scalar {
        match (self.first, self.last) {
            (Scalar::Integer(a), Scalar::Integer(b)) => match b.checked_sub(a) {
                Some(d) => Scalar::Integer(d),
                None => Scalar::Float((b as i128 - a as i128) as f64),
            },
            (a, b) => Scalar::Float(b.as_f64() - a.as_f64()),
        }
    }
}

/// Outcome of reducing a sample view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Summary {
    Numeric(Reduction),
    /// Numeric view with no finite samples
    NotAvailable,
    /// Text views are never reduced
    Text,
}

impl Summary {
    pub fn reduction(&self) -> Option<&Reduction> {
        match self {
            Summary::Numeric(r) => Some(r),
            _ => None,
        }
    }

    pub fn min(&self) -> Option<Scalar> {
        self.reduction().map(|r| r.min)
    }

    pub fn max(&self) -> Option<Scalar> {
        self.reduction().map(|r| r.max)
    }

    pub fn avg(&self) -> Option<f64> {
        self.reduction().map(|r| r.avg)
    }

    pub fn rms(&self) -> Option<f64> {
        self.reduction().map(|r| r.rms)
    }
}

#[derive(Default)]
struct Accumulator {
    min: Option<Scalar>,
    max: Option<Scalar>,
    first: Option<Scalar>,
    last: Option<Scalar>,
    sum: f64,
    sum_sq: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: Scalar, as_f64: f64) {
        let below = |cur: Scalar| scalar_cmp(value, cur) == Ordering::Less;
        let above = |cur: Scalar| scalar_cmp(value, cur) == Ordering::Greater;
        if self.min.map_or(true, below) {
            self.min = Some(value);
        }
        if self.max.map_or(true, above) {
            self.max = Some(value);
        }
        if self.first.is_none() {
            self.first = Some(value);
        }
        self.last = Some(value);
        self.sum += as_f64;
        self.sum_sq += as_f64 * as_f64;
        self.count += 1;
    }

    fn finish(self) -> Summary {
        match (self.min, self.max, self.first, self.last) {
            (Some(min), Some(max), Some(first), Some(last)) => {
                let n = self.count as f64;
                Summary::Numeric(Reduction {
                    min,
                    max,
                    avg: self.sum / n,
                    rms: (self.sum_sq / n).sqrt(),
                    first,
                    last,
                    count: self.count,
                })
            }
            _ => Summary::NotAvailable,
        }
    }
}

fn scalar_cmp(a: Scalar, b: Scalar) -> Ordering {
    match (a, b) {
        (Scalar::Integer(a), Scalar::Integer(b)) => a.cmp(&b),
        (a, b) => a.as_f64().partial_cmp(&b.as_f64()).unwrap_or(Ordering::Equal),
    }
}

fn argminmax_by<T>(
    values: &[T],
    valid: impl Fn(&T) -> bool,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for (i, value) in values.iter().enumerate() {
        if !valid(value) {
            continue;
        }
        best = Some(match best {
            None => (i, i),
            Some((lo, hi)) => (
                if cmp(value, &values[lo]) == Ordering::Less { i } else { lo },
                if cmp(value, &values[hi]) == Ordering::Greater { i } else { hi },
            ),
        });
    }
    best
}
