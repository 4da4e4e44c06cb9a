//! Worst-iteration reduction and bit/word aggregation
//!
//! Disturbance outcomes are probabilistic, so every configuration is run
//! several times. Instead of averaging, the pipeline keeps the worst trial:
//! the iteration with the most flips, or per row the smallest hammer count
//! that flipped anything. Both are one [`ReductionPolicy`] with different
//! objectives and tie-breaks.

use crate::record::BitFlipRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

/// Direction in which the metric is "worse"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Minimize,
    Maximize,
}

/// What to keep when several items in a group share the best metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Keep only the first in input order
    First,
    /// Keep every tied item
    KeepAll,
}

/// Group-wise selection of the worst observation(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReductionPolicy {
    pub objective: Objective,
    pub tie_break: TieBreak,
}

impl ReductionPolicy {
    /// Largest yield wins; earliest item breaks ties
    pub const MAX_YIELD: Self = Self {
        objective: Objective::Maximize,
        tie_break: TieBreak::First,
    };

    /// Smallest hammer count wins; every tied flip is kept
    pub const MIN_HAMMER_COUNT: Self = Self {
        objective: Objective::Minimize,
        tie_break: TieBreak::KeepAll,
    };

    /// Smallest hammer count wins; earliest item breaks ties
    pub const MIN_HAMMER_COUNT_FIRST: Self = Self {
        objective: Objective::Minimize,
        tie_break: TieBreak::First,
    };

    fn better<V: Ord>(&self, candidate: &V, best: &V) -> bool {
        match self.objective {
            Objective::Minimize => candidate < best,
            Objective::Maximize => candidate > best,
        }
    }

    /// Keep the best item(s) of every group, preserving input order
    pub fn reduce<T, K, V, G, M>(&self, items: Vec<T>, group: G, metric: M) -> Vec<T>
    where
        K: Eq + Hash + Clone,
        V: Ord + Clone,
        G: Fn(&T) -> K,
        M: Fn(&T) -> V,
    {
        let mut best: HashMap<K, V> = HashMap::new();
        for item in &items {
            let value = metric(item);
            match best.get_mut(&group(item)) {
                Some(current) => {
                    if self.better(&value, current) {
                        *current = value;
                    }
                }
                None => {
                    best.insert(group(item), value);
                }
            }
        }

        let mut emitted: HashSet<K> = HashSet::new();
        items
            .into_iter()
            .filter(|item| {
                let key = group(item);
                if best.get(&key) != Some(&metric(item)) {
                    return false;
                }
                match self.tie_break {
                    TieBreak::KeepAll => true,
                    TieBreak::First => emitted.insert(key),
                }
            })
            .collect()
    }
}

/// Iteration with the largest count; the lowest index wins ties.
/// `None` when no iteration is available.
pub fn select_worst_iteration(counts: &[(u32, usize)]) -> Option<u32> {
    let mut ordered = counts.to_vec();
    ordered.sort_by_key(|(itr, _)| *itr);
    ReductionPolicy::MAX_YIELD
        .reduce(ordered, |_| (), |(_, count)| *count)
        .first()
        .map(|(itr, _)| *itr)
}

/// Which count decides the worst iteration of a bit-location table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionBasis {
    /// Number of table rows as written by the test bench
    #[default]
    RawRows,
    /// Number of distinct (victim row, ECC word) pairs
    DistinctWords,
}

impl SelectionBasis {
    pub fn count(self, records: &[BitFlipRecord]) -> usize {
        match self {
            SelectionBasis::RawRows => records.len(),
            SelectionBasis::DistinctWords => records
                .iter()
                .map(|r| (r.victim_row(), r.location.ecc_word_index()))
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

/// Distinct flipped bits per (victim row, ECC word)
pub fn flips_per_word(records: &[BitFlipRecord]) -> BTreeMap<(i64, u64), u64> {
    let bits: HashSet<(i64, u64)> = records
        .iter()
        .map(|r| (r.victim_row(), r.location.linear_bit_index()))
        .collect();

    let mut per_word = BTreeMap::new();
    for (row, bit) in bits {
        *per_word.entry((row, bit / crate::record::BITS_PER_WORD)).or_insert(0) += 1;
    }
    per_word
}

/// Histogram: flips-per-word -> number of (row, word) groups with that many flips
pub fn word_flip_histogram(records: &[BitFlipRecord]) -> BTreeMap<u64, u64> {
    let mut histogram = BTreeMap::new();
    for flips in flips_per_word(records).into_values() {
        *histogram.entry(flips).or_insert(0) += 1;
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BitLocation;

    fn flip(pivot_row: u64, row_offset: i64, word: u64, bit: u64) -> BitFlipRecord {
        BitFlipRecord {
            location: BitLocation {
                cacheline: 0,
                word,
                byte: 0,
                bit,
            },
            dir: Some(0),
            hammer_count: None,
            bank: Some(0),
            row_offset,
            pivot_row,
        }
    }

    #[test]
    fn test_worst_iteration_picks_max() {
        assert_eq!(select_worst_iteration(&[(0, 3), (1, 7), (2, 5)]), Some(1));
    }

    #[test]
    fn test_worst_iteration_tie_picks_lowest() {
        assert_eq!(select_worst_iteration(&[(0, 5), (1, 5)]), Some(0));
        assert_eq!(select_worst_iteration(&[(3, 5), (1, 5)]), Some(1));
    }

    #[test]
    fn test_worst_iteration_empty() {
        assert_eq!(select_worst_iteration(&[]), None);
    }

    #[test]
    fn test_min_keep_all_retains_ties() {
        // (group, hammer count, tag)
        let items = vec![(1, 300, 'a'), (1, 200, 'b'), (1, 200, 'c'), (2, 50, 'd')];
        let kept = ReductionPolicy::MIN_HAMMER_COUNT.reduce(items, |i| i.0, |i| i.1);
        let tags: Vec<char> = kept.iter().map(|i| i.2).collect();
        assert_eq!(tags, vec!['b', 'c', 'd']);
    }

    #[test]
    fn test_min_first_keeps_one_per_group() {
        let items = vec![(1, 200, 'a'), (1, 200, 'b'), (2, 70, 'c'), (2, 60, 'd')];
        let kept = ReductionPolicy::MIN_HAMMER_COUNT_FIRST.reduce(items, |i| i.0, |i| i.1);
        let tags: Vec<char> = kept.iter().map(|i| i.2).collect();
        assert_eq!(tags, vec!['a', 'd']);
    }

    #[test]
    fn test_word_histogram_dedups_bits() {
        let records = vec![
            // row 100, word 0: bits 0, 1 (bit 1 reported twice)
            flip(100, 0, 0, 0),
            flip(100, 0, 0, 1),
            flip(100, 0, 0, 1),
            // row 100, word 1: one bit
            flip(100, 0, 1, 3),
            // row 101 (pivot 100 + 1), word 0: one bit
            flip(100, 1, 0, 0),
        ];
        let histogram = word_flip_histogram(&records);
        assert_eq!(histogram.get(&1), Some(&2));
        assert_eq!(histogram.get(&2), Some(&1));
        assert_eq!(histogram.len(), 2);
    }

    #[test]
    fn test_selection_basis_counts() {
        let records = vec![flip(1, 0, 0, 0), flip(1, 0, 0, 1), flip(1, 0, 1, 0)];
        assert_eq!(SelectionBasis::RawRows.count(&records), 3);
        assert_eq!(SelectionBasis::DistinctWords.count(&records), 2);
    }
}
