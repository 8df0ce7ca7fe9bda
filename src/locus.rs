//! A single small directed graph of breakend nodes — one SV signal.

use crate::interval::{EvidenceRange, GenomeInterval};
use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies a node within one `SVLocus`. Stable only between public
/// operations on the owning `SVLocusSet` — a merge or clean may renumber it.
pub type NodeIndex = usize;

/// Identifies a locus within one `SVLocusSet`. Stable only between public
/// operations, same caveat as `NodeIndex`.
pub type LocusIndex = usize;

/// A region plus its outgoing edges, each carrying an independent
/// observation count. Edge presence is symmetric (invariant I2): if this
/// node has an entry for target `t`, node `t` has an entry pointing back
/// here, though either count may be zero.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SVLocusNode {
    pub interval: GenomeInterval,
    pub evidence_range: EvidenceRange,
    out_edges: FxHashMap<NodeIndex, u32>,
}

impl SVLocusNode {
    fn new(interval: GenomeInterval) -> Self {
        Self {
            interval,
            evidence_range: EvidenceRange::new(interval.begin, interval.end),
            out_edges: FxHashMap::default(),
        }
    }

    /// Sum of counts over all outgoing edges, including a self-edge.
    #[inline]
    pub fn out_count(&self) -> u32 {
        self.out_edges.values().sum()
    }

    /// Number of distinct edge targets (a self-edge counts as one).
    #[inline]
    pub fn size(&self) -> usize {
        self.out_edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.out_edges.is_empty()
    }

    /// Count of the edge to `target`, or `None` if no edge exists there.
    #[inline]
    pub fn edge_count(&self, target: NodeIndex) -> Option<u32> {
        self.out_edges.get(&target).copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, u32)> + '_ {
        self.out_edges.iter().map(|(&k, &v)| (k, v))
    }
}

/// A small directed graph representing one observed SV signal — typically
/// two nodes (local breakend, remote breakend) linked by a single edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SVLocus {
    nodes: Vec<SVLocusNode>,
}

impl SVLocus {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Append a node with empty evidence range equal to `interval` and no
    /// edges. Returns the new node's index.
    pub fn add_node(&mut self, interval: GenomeInterval) -> NodeIndex {
        self.nodes.push(SVLocusNode::new(interval));
        self.nodes.len() - 1
    }

    pub fn get_node(&self, i: NodeIndex) -> &SVLocusNode {
        &self.nodes[i]
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SVLocusNode> {
        self.nodes.iter()
    }

    pub fn node_indices(&self) -> std::ops::Range<NodeIndex> {
        0..self.nodes.len()
    }

    /// Replace `n`'s evidence range outright (used on first insertion, when
    /// the scanner has more precise evidence than the padded breakend
    /// interval itself).
    pub fn set_node_evidence(&mut self, n: NodeIndex, range: EvidenceRange) {
        self.nodes[n].evidence_range = range;
    }

    /// Add to (or create) the undirected edge between `a` and `b`: `a`'s
    /// entry for `b` gains `count_ab`, `b`'s entry for `a` gains
    /// `count_ba`. Both directional entries are created even if a count is
    /// zero, preserving edge-presence symmetry (I2). `a == b` creates or
    /// increments a self-edge, with both counts folding into the one entry.
    pub fn link_nodes(&mut self, a: NodeIndex, b: NodeIndex, count_ab: u32, count_ba: u32) {
        assert!(
            a < self.nodes.len() && b < self.nodes.len(),
            "link_nodes: index out of range"
        );
        if a == b {
            *self.nodes[a].out_edges.entry(a).or_insert(0) += count_ab + count_ba;
            return;
        }
        *self.nodes[a].out_edges.entry(b).or_insert(0) += count_ab;
        *self.nodes[b].out_edges.entry(a).or_insert(0) += count_ba;
    }

    /// Collapse any two nodes with overlapping intervals into one, folding
    /// their cross-edge into a self-edge and summing edges to any common
    /// neighbor, until no two nodes of this locus overlap (fixed point).
    /// Idempotent; O(n²) scans are acceptable for the tiny node sets this
    /// crate deals with.
    pub fn merge_self_overlap(&mut self) {
        loop {
            let mut found = None;
            'outer: for i in 0..self.nodes.len() {
                for j in (i + 1)..self.nodes.len() {
                    if self.nodes[i].interval.overlaps(&self.nodes[j].interval) {
                        found = Some((i, j));
                        break 'outer;
                    }
                }
            }
            match found {
                Some((i, j)) => {
                    self.merge_nodes(i, j);
                }
                None => break,
            }
        }
    }

    /// Merge nodes `i` and `j` (in either order) into one, at the lower of
    /// the two indices; the higher index is removed and every node index
    /// above it shifts down by one. Returns the surviving node's (new,
    /// stable-until-next-merge) index.
    pub fn merge_nodes(&mut self, i: NodeIndex, j: NodeIndex) -> NodeIndex {
        assert_ne!(i, j, "merge_nodes: cannot merge a node with itself");
        let (keep, remove) = if i < j { (i, j) } else { (j, i) };

        let keep_node = self.nodes[keep].clone();
        let remove_node = self.nodes[remove].clone();

        let merged_interval = keep_node.interval.merge(&remove_node.interval);
        let merged_evidence = keep_node.evidence_range.merge(&remove_node.evidence_range);

        // Cross edges between the pair, plus any pre-existing self-edges on
        // either, all fold into the merged node's self-edge (I5: nothing is
        // created or destroyed, just re-attributed).
        let self_count = keep_node.edge_count(remove).unwrap_or(0)
            + remove_node.edge_count(keep).unwrap_or(0)
            + keep_node.edge_count(keep).unwrap_or(0)
            + remove_node.edge_count(remove).unwrap_or(0);

        let mut merged_edges: FxHashMap<NodeIndex, u32> = FxHashMap::default();
        for (target, count) in keep_node.edges() {
            if target == keep || target == remove {
                continue;
            }
            *merged_edges.entry(target).or_insert(0) += count;
        }
        for (target, count) in remove_node.edges() {
            if target == keep || target == remove {
                continue;
            }
            *merged_edges.entry(target).or_insert(0) += count;
        }
        if self_count > 0 {
            merged_edges.insert(keep, self_count);
        }

        // Redirect every other node's edge to `remove` onto `keep`.
        for (idx, node) in self.nodes.iter_mut().enumerate() {
            if idx == keep || idx == remove {
                continue;
            }
            if let Some(count) = node.out_edges.remove(&remove) {
                *node.out_edges.entry(keep).or_insert(0) += count;
            }
        }

        self.nodes[keep] = SVLocusNode {
            interval: merged_interval,
            evidence_range: merged_evidence,
            out_edges: merged_edges,
        };
        self.nodes.remove(remove);

        // Shift every edge key above `remove` down by one to track the
        // removed node's slot closing up.
        for node in self.nodes.iter_mut() {
            if node.out_edges.keys().any(|&k| k > remove) {
                let shifted: FxHashMap<NodeIndex, u32> = node
                    .out_edges
                    .drain()
                    .map(|(k, v)| (if k > remove { k - 1 } else { k }, v))
                    .collect();
                node.out_edges = shifted;
            }
        }

        keep
    }

    /// Append `other`'s nodes onto the end of this locus, offsetting edge
    /// targets so they still point within the combined node list. Used by
    /// `SVLocusSet::merge` to fold donor loci and the input locus into the
    /// absorber before running `merge_self_overlap`.
    pub fn append(&mut self, other: &SVLocus) {
        let offset = self.nodes.len();
        for node in &other.nodes {
            let shifted_edges = node
                .out_edges
                .iter()
                .map(|(&k, &v)| (k + offset, v))
                .collect();
            self.nodes.push(SVLocusNode {
                interval: node.interval,
                evidence_range: node.evidence_range,
                out_edges: shifted_edges,
            });
        }
    }

    /// Drop the undirected edge between `i` and `j` entirely (both
    /// directional entries, or the one self-edge entry if `i == j`).
    /// Used by `clean`/`clean_region`, which evaluate an edge as a unit to
    /// keep presence symmetric (I2) after removal.
    pub fn remove_edge_pair(&mut self, i: NodeIndex, j: NodeIndex) {
        if i == j {
            self.nodes[i].out_edges.remove(&i);
        } else {
            self.nodes[i].out_edges.remove(&j);
            self.nodes[j].out_edges.remove(&i);
        }
    }

    /// Remove node `idx` outright: drop every other node's edge into it,
    /// then delete the node and shift every higher edge target down by one
    /// to track the closed slot.
    pub fn remove_node(&mut self, idx: NodeIndex) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if i == idx {
                continue;
            }
            node.out_edges.remove(&idx);
        }
        self.nodes.remove(idx);
        for node in self.nodes.iter_mut() {
            if node.out_edges.keys().any(|&k| k > idx) {
                let shifted: FxHashMap<NodeIndex, u32> = node
                    .out_edges
                    .drain()
                    .map(|(k, v)| (if k > idx { k - 1 } else { k }, v))
                    .collect();
                node.out_edges = shifted;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(tid: u32, b: i64, e: i64) -> GenomeInterval {
        GenomeInterval::new(tid, b, e)
    }

    #[test]
    fn test_add_node_and_link() {
        let mut locus = SVLocus::new();
        let a = locus.add_node(iv(1, 10, 20));
        let b = locus.add_node(iv(2, 30, 40));
        locus.link_nodes(a, b, 1, 0);

        assert_eq!(locus.get_node(a).edge_count(b), Some(1));
        assert_eq!(locus.get_node(b).edge_count(a), Some(0));
    }

    #[test]
    fn test_self_edge_link() {
        let mut locus = SVLocus::new();
        let a = locus.add_node(iv(1, 10, 60));
        locus.link_nodes(a, a, 1, 0);
        assert_eq!(locus.get_node(a).edge_count(a), Some(1));
        locus.link_nodes(a, a, 1, 0);
        assert_eq!(locus.get_node(a).edge_count(a), Some(2));
    }

    #[test]
    fn test_merge_self_overlap_collapses() {
        let mut locus = SVLocus::new();
        let a = locus.add_node(iv(1, 10, 40));
        let b = locus.add_node(iv(1, 20, 70));
        let c = locus.add_node(iv(2, 1, 5));
        locus.link_nodes(a, c, 3, 0);
        locus.link_nodes(b, c, 4, 0);

        locus.merge_self_overlap();

        assert_eq!(locus.size(), 2);
        let merged = locus
            .nodes()
            .find(|n| n.interval.tid == 1)
            .expect("merged node present");
        assert_eq!(merged.interval, iv(1, 10, 70));
        assert_eq!(merged.out_count(), 7);
    }

    #[test]
    fn test_merge_creates_self_edge_from_cross_edge() {
        let mut locus = SVLocus::new();
        let a = locus.add_node(iv(1, 10, 20));
        let b = locus.add_node(iv(1, 15, 25));
        locus.link_nodes(a, b, 2, 1);

        locus.merge_self_overlap();

        assert_eq!(locus.size(), 1);
        assert_eq!(locus.get_node(0).edge_count(0), Some(3));
    }

    #[test]
    fn test_remove_edge_pair_drops_both_directions() {
        let mut locus = SVLocus::new();
        let a = locus.add_node(iv(1, 10, 20));
        let b = locus.add_node(iv(2, 30, 40));
        locus.link_nodes(a, b, 3, 1);
        locus.remove_edge_pair(a, b);
        assert_eq!(locus.get_node(a).edge_count(b), None);
        assert_eq!(locus.get_node(b).edge_count(a), None);
    }

    #[test]
    fn test_remove_node_shifts_higher_indices() {
        let mut locus = SVLocus::new();
        let a = locus.add_node(iv(1, 10, 20));
        let b = locus.add_node(iv(2, 30, 40));
        let c = locus.add_node(iv(3, 50, 60));
        locus.link_nodes(a, c, 2, 0);
        locus.remove_node(b);
        assert_eq!(locus.size(), 2);
        assert_eq!(locus.get_node(0).edge_count(1), Some(2));
    }
}
