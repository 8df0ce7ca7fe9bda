//! The accumulated evidence graph: owns every locus, the spatial index over
//! their nodes, and the merge/clean algorithms that keep both consistent.

use crate::index::IntervalIndex;
use crate::interval::GenomeInterval;
use crate::locus::{LocusIndex, NodeIndex, SVLocus};
use tracing::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables consumed by `SVLocusSet::clean`/`clean_region`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SetOptions {
    /// Minimum observation count an edge needs to survive `clean`.
    pub min_merge_edge_observations: u32,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            min_merge_edge_observations: 2,
        }
    }
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_merge_edge_observations(mut self, n: u32) -> Self {
        self.min_merge_edge_observations = n;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
enum SetState {
    Accumulating,
    Finalized,
}

/// The accumulated graph. `merge` is the heart of this crate: it folds a
/// freshly scanned `SVLocus` into the set, transitively fusing any existing
/// loci the input's nodes overlap, and keeps `index` in lockstep throughout.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SVLocusSet {
    loci: Vec<SVLocus>,
    #[cfg_attr(feature = "serde", serde(skip))]
    index: IntervalIndex,
    options: SetOptions,
    state: SetState,
}

impl SVLocusSet {
    pub fn new(options: SetOptions) -> Self {
        Self {
            loci: Vec::new(),
            index: IntervalIndex::new(),
            options,
            state: SetState::Accumulating,
        }
    }

    pub fn options(&self) -> &SetOptions {
        &self.options
    }

    pub fn is_finalized(&self) -> bool {
        self.state == SetState::Finalized
    }

    /// Total locus slots, including empty ones awaiting reuse.
    pub fn locus_count(&self) -> usize {
        self.loci.len()
    }

    pub fn non_empty_size(&self) -> usize {
        self.loci.iter().filter(|l| !l.is_empty()).count()
    }

    pub fn get_locus(&self, i: LocusIndex) -> &SVLocus {
        &self.loci[i]
    }

    /// Rebuild the spatial index from scratch. Required after deserializing
    /// (the index itself is never serialized, per the persistence contract).
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for locus_id in 0..self.loci.len() {
            if !self.loci[locus_id].is_empty() {
                self.index_locus_nodes(locus_id);
            }
        }
    }

    fn index_locus_nodes(&mut self, locus_id: LocusIndex) {
        let entries: Vec<(NodeIndex, GenomeInterval)> = self.loci[locus_id]
            .node_indices()
            .map(|n| (n, self.loci[locus_id].get_node(n).interval))
            .collect();
        for (n, iv) in entries {
            self.index.insert(iv, locus_id, n);
        }
    }

    fn deindex_locus_nodes(&mut self, locus_id: LocusIndex) {
        let entries: Vec<(NodeIndex, GenomeInterval)> = self.loci[locus_id]
            .node_indices()
            .map(|n| (n, self.loci[locus_id].get_node(n).interval))
            .collect();
        for (n, iv) in entries {
            self.index.remove(iv, locus_id, n);
        }
    }

    fn allocate_locus_slot(&mut self) -> LocusIndex {
        if let Some(pos) = self.loci.iter().position(|l| l.is_empty()) {
            pos
        } else {
            self.loci.push(SVLocus::new());
            self.loci.len() - 1
        }
    }

    /// Fold `input` (typically a fresh two-node locus from the scanner) into
    /// the set, transitively fusing any existing loci whose nodes overlap
    /// it. Returns the surviving locus's index. The input is consumed: its
    /// contents move into the set, and the caller must not reuse it.
    ///
    /// `input` must already be self-overlap-collapsed (the scanner runs
    /// `SVLocus::merge_self_overlap` before handing a locus to the set).
    pub fn merge(&mut self, input: SVLocus) -> LocusIndex {
        assert_eq!(
            self.state,
            SetState::Accumulating,
            "merge: set is finalized, no further mutation is permitted"
        );
        trace!(nodes = input.size(), "merging input locus");

        let mut touched: Vec<LocusIndex> = Vec::new();
        for n in input.node_indices() {
            let iv = input.get_node(n).interval;
            for (locus_id, _) in self.index.find_overlapping(&iv) {
                if !touched.contains(&locus_id) {
                    touched.push(locus_id);
                }
            }
        }

        if touched.is_empty() {
            let locus_id = self.allocate_locus_slot();
            self.loci[locus_id] = input;
            self.index_locus_nodes(locus_id);
            debug!(locus_id, "new locus, no existing overlap");
            return locus_id;
        }

        touched.sort_unstable();
        let absorber = touched[0];
        let donor_count = touched.len() - 1;
        if donor_count > 0 {
            debug!(absorber, donor_count, "fusing overlapping loci");
        }

        for &locus_id in &touched {
            self.deindex_locus_nodes(locus_id);
        }

        for &donor in &touched[1..] {
            let donor_locus = std::mem::replace(&mut self.loci[donor], SVLocus::new());
            self.loci[absorber].append(&donor_locus);
        }
        self.loci[absorber].append(&input);

        self.loci[absorber].merge_self_overlap();

        // The absorber's nodes may have grown (via interval union) to
        // overlap loci that were untouched by the original input. Sweep
        // until a full pass finds nothing new to pull in — the transitive
        // closure step (spec step 7 / MANTA257-style regressions).
        let mut absorbed = touched;
        loop {
            let intervals: Vec<GenomeInterval> =
                self.loci[absorber].nodes().map(|n| n.interval).collect();
            let mut newly_touched: Vec<LocusIndex> = Vec::new();
            for iv in &intervals {
                for (locus_id, _) in self.index.find_overlapping(iv) {
                    if locus_id != absorber
                        && !absorbed.contains(&locus_id)
                        && !newly_touched.contains(&locus_id)
                    {
                        newly_touched.push(locus_id);
                    }
                }
            }
            if newly_touched.is_empty() {
                break;
            }
            warn!(
                count = newly_touched.len(),
                "absorber grew into additional loci after self-overlap sweep"
            );
            for &donor in &newly_touched {
                self.deindex_locus_nodes(donor);
                let donor_locus = std::mem::replace(&mut self.loci[donor], SVLocus::new());
                self.loci[absorber].append(&donor_locus);
                absorbed.push(donor);
            }
            self.loci[absorber].merge_self_overlap();
        }

        self.index_locus_nodes(absorber);
        absorber
    }

    /// Remove every edge below threshold, then every node left with no
    /// edges, then every locus left with no nodes.
    pub fn clean(&mut self) {
        self.clean_impl(None);
    }

    /// Same policy as `clean`, but only edges/nodes touching `query` are
    /// candidates for removal.
    pub fn clean_region(&mut self, query: &GenomeInterval) {
        self.clean_impl(Some(query));
    }

    fn clean_impl(&mut self, query: Option<&GenomeInterval>) {
        let threshold = self.options.min_merge_edge_observations;
        for locus_id in 0..self.loci.len() {
            if !self.loci[locus_id].is_empty() {
                self.clean_locus(locus_id, threshold, query);
            }
        }
    }

    fn clean_locus(
        &mut self,
        locus_id: LocusIndex,
        threshold: u32,
        query: Option<&GenomeInterval>,
    ) {
        self.deindex_locus_nodes(locus_id);

        loop {
            let to_remove = {
                let locus = &self.loci[locus_id];
                let n = locus.size();
                let mut found = None;
                'scan: for i in 0..n {
                    let edges_i: Vec<(NodeIndex, u32)> = locus.get_node(i).edges().collect();
                    for (j, count_ij) in edges_i {
                        if j < i {
                            continue;
                        }
                        let i_in_region =
                            query.map_or(true, |q| locus.get_node(i).interval.overlaps(q));
                        let j_in_region =
                            query.map_or(true, |q| locus.get_node(j).interval.overlaps(q));
                        if !i_in_region && !j_in_region {
                            continue;
                        }
                        let total = if i == j {
                            count_ij
                        } else {
                            count_ij + locus.get_node(j).edge_count(i).unwrap_or(0)
                        };
                        let below = total < threshold;
                        if below {
                            found = Some((i, j));
                            break 'scan;
                        }
                    }
                }
                found
            };
            match to_remove {
                Some((i, j)) => self.loci[locus_id].remove_edge_pair(i, j),
                None => break,
            }
        }

        loop {
            let target = {
                let locus = &self.loci[locus_id];
                (0..locus.size()).find(|&i| {
                    locus.get_node(i).is_empty()
                        && query.map_or(true, |q| locus.get_node(i).interval.overlaps(q))
                })
            };
            match target {
                Some(i) => self.loci[locus_id].remove_node(i),
                None => break,
            }
        }

        if self.loci[locus_id].is_empty() {
            self.loci[locus_id] = SVLocus::new();
        } else {
            self.index_locus_nodes(locus_id);
        }
    }

    /// Final full `clean()`, then transition to `Finalized`. Further `merge`
    /// calls panic.
    pub fn finalize(&mut self) {
        assert_eq!(
            self.state,
            SetState::Accumulating,
            "finalize: set is already finalized"
        );
        self.clean();
        self.state = SetState::Finalized;
        self.check_state(true, true);
    }

    /// Validate I1-I5 (when `check_invariants`) and per-locus well-formedness
    /// (when `check_loci`). Any failure panics with a diagnostic; this is a
    /// debugging/test aid, not a recoverable check.
    pub fn check_state(&self, check_invariants: bool, check_loci: bool) {
        if check_loci {
            for (locus_id, locus) in self.loci.iter().enumerate() {
                let n = locus.size();
                for i in locus.node_indices() {
                    for (j, _) in locus.get_node(i).edges() {
                        assert!(
                            j < n,
                            "check_state: locus {locus_id} node {i} edge target {j} out of range"
                        );
                    }
                }
                for i in locus.node_indices() {
                    for j in (i + 1)..n {
                        assert!(
                            !locus.get_node(i).interval.overlaps(&locus.get_node(j).interval),
                            "check_state: locus {locus_id} nodes {i},{j} have overlapping intervals"
                        );
                    }
                }
            }
        }

        if check_invariants {
            for (locus_id, locus) in self.loci.iter().enumerate() {
                for i in locus.node_indices() {
                    for (j, _) in locus.get_node(i).edges() {
                        assert!(
                            locus.get_node(j).edge_count(i).is_some(),
                            "check_state: asymmetric edge presence at locus {locus_id} {i}->{j}"
                        );
                    }
                }
            }

            let mut indexed_nodes = 0usize;
            for (locus_id, locus) in self.loci.iter().enumerate() {
                for i in locus.node_indices() {
                    let iv = locus.get_node(i).interval;
                    let hits = self.index.find_overlapping(&iv);
                    assert!(
                        hits.iter().any(|&(l, n)| l == locus_id && n == i),
                        "check_state: node {locus_id}:{i} missing from index"
                    );
                    indexed_nodes += 1;
                }
            }
            assert_eq!(
                indexed_nodes,
                self.index.len(),
                "check_state: index has entries with no corresponding node"
            );
        }
    }
}
