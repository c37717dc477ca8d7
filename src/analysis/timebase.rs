//! Shared time axis across enabled signals
//!
//! Signals extracted from the same acquisition share one timestamp array and
//! carry the same [`TimebaseId`]. The registry keeps one entry per id with
//! the set of enabled signals using it, and builds the sorted, deduplicated
//! union of all registered arrays on demand. The union is rebuilt only after
//! a group appears or disappears.

use crate::signal::Signal;
use crate::types::{SignalId, TimebaseId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Default element count above which the union is built pairwise
pub const DEFAULT_CONCAT_LIMIT: usize = 50_000_000;

/// Direction for cursor stepping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Forward,
    Backward,
}

#[derive(Debug)]
struct TimebaseGroup {
    timestamps: Arc<[f64]>,
    members: BTreeSet<SignalId>,
}

/// Tracks which timestamp arrays are in use and their union
#[derive(Debug)]
pub struct TimebaseRegistry {
    groups: BTreeMap<TimebaseId, TimebaseGroup>,
    membership: HashMap<SignalId, TimebaseId>,
    union: Arc<[f64]>,
    dirty: bool,
    rebuilds: u64,
    concat_limit: usize,
}

impl Default for TimebaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TimebaseRegistry {
    pub fn new() -> Self {
        Self::with_concat_limit(DEFAULT_CONCAT_LIMIT)
    }

    /// Registry whose union switches to the pairwise strategy once the
    /// registered arrays hold more than `limit` timestamps in total
    pub fn with_concat_limit(limit: usize) -> Self {
        Self {
            groups: BTreeMap::new(),
            membership: HashMap::new(),
            union: Arc::from(Vec::new()),
            dirty: false,
            rebuilds: 0,
            concat_limit: limit,
        }
    }

    pub fn set_concat_limit(&mut self, limit: usize) {
        self.concat_limit = limit;
    }

    /// Add a signal under its timebase group.
    ///
    /// A signal already registered under another group is moved.
    pub fn register(&mut self, signal: &Signal) {
        self.insert(signal.id(), signal.timebase(), signal.timestamps_arc());
    }

    pub fn insert(&mut self, id: SignalId, timebase: TimebaseId, timestamps: Arc<[f64]>) {
        match self.membership.get(&id) {
            Some(&current) if current == timebase => return,
            Some(_) => {
                self.unregister(id);
            }
            None => {}
        }

        let group = self.groups.entry(timebase).or_insert_with(|| {
            self.dirty = true;
            TimebaseGroup {
                timestamps,
                members: BTreeSet::new(),
            }
        });
        group.members.insert(id);
        self.membership.insert(id, timebase);
    }

    /// Remove a signal. Returns false when it was not registered.
    pub fn unregister(&mut self, id: SignalId) -> bool {
        let Some(timebase) = self.membership.remove(&id) else {
            return false;
        };

        if let Some(group) = self.groups.get_mut(&timebase) {
            group.members.remove(&id);
            if group.members.is_empty() {
                self.groups.remove(&timebase);
                self.dirty = true;
            }
        }
        true
    }

    pub fn contains(&self, id: SignalId) -> bool {
        self.membership.contains_key(&id)
    }

    /// Group a registered signal belongs to
    pub fn group_of(&self, id: SignalId) -> Option<TimebaseId> {
        self.membership.get(&id).copied()
    }

    /// Signals registered under `timebase`
    pub fn members(&self, timebase: TimebaseId) -> impl Iterator<Item = SignalId> + '_ {
        self.groups
            .get(&timebase)
            .into_iter()
            .flat_map(|g| g.members.iter().copied())
    }

    /// Number of distinct timestamp arrays in use
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// True when the next union request will rebuild
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of union rebuilds performed
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Sorted, deduplicated union of every registered timestamp array
    pub fn union_timebase(&mut self) -> Arc<[f64]> {
        if self.dirty {
            self.rebuild();
        }
        self.union.clone()
    }

    fn rebuild(&mut self) {
        let total: usize = self.groups.values().map(|g| g.timestamps.len()).sum();
        let arrays = self.groups.values().map(|g| &g.timestamps[..]);

        let union = if total > self.concat_limit {
            tracing::debug!(total, groups = self.groups.len(), "pairwise timebase union");
            pairwise_union(arrays)
        } else {
            concat_union(arrays, total)
        };

        tracing::debug!(groups = self.groups.len(), len = union.len(), "union timebase rebuilt");
        self.union = union.into();
        self.dirty = false;
        self.rebuilds += 1;
    }

    /// Earliest and latest registered timestamp
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.groups
            .values()
            .filter_map(|g| Some((*g.timestamps.first()?, *g.timestamps.last()?)))
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
    }

    /// Nearest union entry to `pos`, ties going to the earlier entry
    pub fn snap(&mut self, pos: f64) -> Option<f64> {
        let union = self.union_timebase();
        nearest(&union, pos)
    }

    /// Next (or previous) union entry strictly after (or before) `pos`,
    /// clamped to the ends of the union
    pub fn step(&mut self, pos: f64, direction: StepDirection) -> Option<f64> {
        let union = self.union_timebase();
        if union.is_empty() {
            return None;
        }
        let idx = match direction {
            StepDirection::Forward => union
                .partition_point(|&t| t <= pos)
                .min(union.len() - 1),
            StepDirection::Backward => union.partition_point(|&t| t < pos).saturating_sub(1),
        };
        Some(union[idx])
    }
}

/// Nearest entry of a sorted slice, ties going to the earlier entry
pub fn nearest(sorted: &[f64], pos: f64) -> Option<f64> {
    if sorted.is_empty() || pos.is_nan() {
        return None;
    }
    let idx = sorted.partition_point(|&t| t < pos);
    let after = sorted.get(idx).copied();
    let before = idx.checked_sub(1).map(|i| sorted[i]);
    match (before, after) {
        (Some(b), Some(a)) => Some(if pos - b <= a - pos { b } else { a }),
        (b, a) => b.or(a),
    }
}

fn concat_union<'a>(arrays: impl Iterator<Item = &'a [f64]>, total: usize) -> Vec<f64> {
    let mut all = Vec::with_capacity(total);
    for array in arrays {
        all.extend_from_slice(array);
    }
    all.sort_unstable_by(f64::total_cmp);
    all.dedup_by(|a, b| same_instant(*a, *b));
    all
}

/// Equality of two timestamps for the union: numerically equal values
/// (including `-0.0` and `0.0`) or identical bit patterns.
fn same_instant(a: f64, b: f64) -> bool {
    a == b || a.total_cmp(&b).is_eq()
}

/// Union built one operand at a time, so peak memory stays near twice the
/// largest intermediate result instead of the sum of all operands.
fn pairwise_union<'a>(arrays: impl Iterator<Item = &'a [f64]>) -> Vec<f64> {
    arrays.fold(Vec::new(), |acc, array| {
        let mut operand = array.to_vec();
        operand.sort_unstable_by(f64::total_cmp);
        operand.dedup_by(|a, b| same_instant(*a, *b));
        merge_unique(&acc, &operand)
    })
}

fn merge_unique(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if same_instant(a[i], b[j]) {
            // Keep the entry that sorts first, as the concatenated sort does
            out.push(if a[i].total_cmp(&b[j]).is_le() { a[i] } else { b[j] });
            i += 1;
            j += 1;
            continue;
        }
        match a[i].total_cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater | std::cmp::Ordering::Equal => {
                out.push(b[j]);
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(values: &[f64]) -> Arc<[f64]> {
        Arc::from(values.to_vec())
    }

    #[test]
    fn test_union_of_two_timebases() {
        let mut registry = TimebaseRegistry::new();
        registry.insert(SignalId(1), TimebaseId(100), arc(&[0.0, 1.0, 2.0]));
        registry.insert(SignalId(2), TimebaseId(101), arc(&[0.5, 1.5]));
        assert_eq!(&registry.union_timebase()[..], &[0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_shared_group_does_not_rebuild() {
        let mut registry = TimebaseRegistry::new();
        registry.insert(SignalId(1), TimebaseId(100), arc(&[0.0, 1.0]));
        registry.union_timebase();
        assert_eq!(registry.rebuilds(), 1);

        registry.insert(SignalId(2), TimebaseId(100), arc(&[0.0, 1.0]));
        assert!(!registry.is_dirty());
        registry.union_timebase();
        assert_eq!(registry.rebuilds(), 1);

        // group survives while one member remains
        registry.unregister(SignalId(1));
        assert!(!registry.is_dirty());

        registry.unregister(SignalId(2));
        assert!(registry.is_dirty());
        assert!(registry.union_timebase().is_empty());
        assert_eq!(registry.rebuilds(), 2);
    }

    #[test]
    fn test_repeated_union_is_cached() {
        let mut registry = TimebaseRegistry::new();
        registry.insert(SignalId(1), TimebaseId(1), arc(&[0.0, 1.0]));
        let a = registry.union_timebase();
        let b = registry.union_timebase();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.rebuilds(), 1);
    }

    #[test]
    fn test_signal_moves_between_groups() {
        let mut registry = TimebaseRegistry::new();
        registry.insert(SignalId(1), TimebaseId(1), arc(&[0.0, 1.0]));
        registry.insert(SignalId(1), TimebaseId(2), arc(&[10.0, 11.0]));

        assert_eq!(registry.group_of(SignalId(1)), Some(TimebaseId(2)));
        assert_eq!(registry.group_count(), 1);
        assert_eq!(registry.members(TimebaseId(1)).count(), 0);
        assert_eq!(&registry.union_timebase()[..], &[10.0, 11.0]);
    }

    #[test]
    fn test_unregister_unknown() {
        let mut registry = TimebaseRegistry::new();
        assert!(!registry.unregister(SignalId(9)));
        assert!(!registry.contains(SignalId(9)));
    }

    #[test]
    fn test_pairwise_matches_concat() {
        let mut small = TimebaseRegistry::with_concat_limit(0);
        let mut large = TimebaseRegistry::new();
        for (i, ts) in [[0.0, 2.0, 4.0], [1.0, 2.0, 3.0], [4.0, 5.0, 0.0]].iter().enumerate() {
            small.insert(SignalId(i as u64), TimebaseId(i as u64), arc(ts));
            large.insert(SignalId(i as u64), TimebaseId(i as u64), arc(ts));
        }
        assert_eq!(small.union_timebase(), large.union_timebase());
        assert_eq!(&small.union_timebase()[..], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_signed_zero_is_one_instant() {
        let mut small = TimebaseRegistry::with_concat_limit(0);
        let mut large = TimebaseRegistry::new();
        for (i, ts) in [[-0.0, 1.0], [0.0, 2.0]].iter().enumerate() {
            small.insert(SignalId(i as u64), TimebaseId(i as u64), arc(ts));
            large.insert(SignalId(i as u64), TimebaseId(i as u64), arc(ts));
        }
        let pairwise = small.union_timebase();
        let concat = large.union_timebase();
        assert_eq!(pairwise.len(), 3);
        assert_eq!(concat.len(), 3);
        assert!(pairwise.iter().zip(concat.iter()).all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn test_snap_ties_go_to_earlier() {
        let mut registry = TimebaseRegistry::new();
        registry.insert(SignalId(1), TimebaseId(1), arc(&[0.0, 1.0, 2.0]));
        assert_eq!(registry.snap(0.5), Some(0.0));
        assert_eq!(registry.snap(0.51), Some(1.0));
        assert_eq!(registry.snap(-3.0), Some(0.0));
        assert_eq!(registry.snap(9.0), Some(2.0));
        assert_eq!(registry.snap(f64::NAN), None);
    }

    #[test]
    fn test_step() {
        let mut registry = TimebaseRegistry::new();
        assert_eq!(registry.step(0.0, StepDirection::Forward), None);

        registry.insert(SignalId(1), TimebaseId(1), arc(&[0.0, 1.0, 2.0]));
        assert_eq!(registry.step(1.0, StepDirection::Forward), Some(2.0));
        assert_eq!(registry.step(1.0, StepDirection::Backward), Some(0.0));
        assert_eq!(registry.step(0.4, StepDirection::Forward), Some(1.0));
        assert_eq!(registry.step(0.4, StepDirection::Backward), Some(0.0));
        assert_eq!(registry.step(2.0, StepDirection::Forward), Some(2.0));
        assert_eq!(registry.step(0.0, StepDirection::Backward), Some(0.0));
    }

    #[test]
    fn test_extent() {
        let mut registry = TimebaseRegistry::new();
        assert_eq!(registry.extent(), None);
        registry.insert(SignalId(1), TimebaseId(1), arc(&[1.0, 3.0]));
        registry.insert(SignalId(2), TimebaseId(2), arc(&[-1.0, 2.0]));
        registry.insert(SignalId(3), TimebaseId(3), arc(&[]));
        assert_eq!(registry.extent(), Some((-1.0, 3.0)));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_union_is_sorted_unique_superset(
            arrays in prop::collection::vec(
                prop::collection::vec(-1000i32..1000, 0..60), 1..6),
            limit in 0usize..200,
        ) {
            let mut registry = TimebaseRegistry::with_concat_limit(limit);
            for (i, values) in arrays.iter().enumerate() {
                let mut ts: Vec<f64> = values.iter().map(|&v| v as f64 / 4.0).collect();
                ts.sort_by(f64::total_cmp);
                registry.insert(SignalId(i as u64), TimebaseId(i as u64), ts.into());
            }
            let union = registry.union_timebase();

            for pair in union.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for values in &arrays {
                for &v in values {
                    prop_assert!(union.contains(&(v as f64 / 4.0)));
                }
            }
            let total: usize = arrays.iter().map(|a| a.len()).sum();
            prop_assert!(union.len() <= total);
        }

        #[test]
        fn test_pairwise_union_matches_concat(
            arrays in prop::collection::vec(
                prop::collection::vec(
                    prop_oneof![
                        Just(-0.0f64),
                        Just(0.0f64),
                        (-1000i32..1000).prop_map(|v| v as f64 / 4.0),
                    ],
                    0..40,
                ),
                1..6,
            ),
        ) {
            let sorted: Vec<Vec<f64>> = arrays
                .iter()
                .map(|values| {
                    let mut ts = values.clone();
                    ts.sort_by(f64::total_cmp);
                    ts
                })
                .collect();
            let total = sorted.iter().map(|a| a.len()).sum();
            let concat = concat_union(sorted.iter().map(|a| a.as_slice()), total);
            let pairwise = pairwise_union(sorted.iter().map(|a| a.as_slice()));

            let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
            prop_assert_eq!(bits(&concat), bits(&pairwise));
        }
    }
}
