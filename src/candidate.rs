//! Walks a finalized set and emits its edges as SV candidates for
//! downstream assembly/scoring — out of scope here, but the filter
//! predicates that gate what's emitted are part of the pipeline contract
//! and are documented (and tested) as plain data + pure functions.

use crate::locus::{LocusIndex, NodeIndex};
use crate::locus_set::SVLocusSet;

/// One breakend-pair candidate: a single edge of the evidence graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvJunction {
    pub locus_id: LocusIndex,
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub count: u32,
}

/// One or more junctions sharing a source node — a complex candidate when
/// more than one neighbour crosses the emission threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvCandidateGroup {
    pub junctions: Vec<SvJunction>,
}

impl SvCandidateGroup {
    pub fn is_complex(&self) -> bool {
        self.junctions.len() > 1
    }
}

/// Walks every non-empty locus of a finalized set and groups its
/// above-threshold edges into candidates.
#[derive(Debug, Clone, Copy)]
pub struct CandidateEnumerator {
    pub min_edge_observations: u32,
}

impl CandidateEnumerator {
    pub fn new(min_edge_observations: u32) -> Self {
        Self {
            min_edge_observations,
        }
    }

    /// Emit one `SvCandidateGroup` per source node with at least one
    /// qualifying outgoing edge (including self-edges).
    pub fn enumerate(&self, set: &SVLocusSet) -> Vec<SvCandidateGroup> {
        assert!(set.is_finalized(), "enumerate: set must be finalized first");

        let mut groups = Vec::new();
        for locus_id in 0..set.locus_count() {
            let locus = set.get_locus(locus_id);
            if locus.is_empty() {
                continue;
            }
            for source in locus.node_indices() {
                let junctions: Vec<SvJunction> = locus
                    .get_node(source)
                    .edges()
                    .filter(|&(_, count)| count >= self.min_edge_observations)
                    .map(|(target, count)| SvJunction {
                        locus_id,
                        source,
                        target,
                        count,
                    })
                    .collect();
                if !junctions.is_empty() {
                    groups.push(SvCandidateGroup { junctions });
                }
            }
        }
        groups
    }
}

/// Caller-supplied metrics about a candidate, produced by the assembler and
/// scorer this crate doesn't implement. Exists so the downstream filter
/// predicates below have something concrete to operate on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMetrics {
    pub spanning_count: u32,
    pub has_assembly_contig: bool,
    pub variant_size: u32,
    pub alt_score: f64,
    pub somatic_score: f64,
}

/// Named thresholds from the downstream filter contract (spec.md §6):
/// this crate doesn't run the assembler or scorer, but documents and tests
/// the predicates a caller applies to their output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownstreamFilterOptions {
    pub min_candidate_spanning_count: u32,
    pub min_candidate_variant_size: u32,
    pub min_scored_variant_size: u32,
    pub min_output_alt_score: f64,
    pub min_output_somatic_score: f64,
}

impl Default for DownstreamFilterOptions {
    fn default() -> Self {
        Self {
            min_candidate_spanning_count: 3,
            min_candidate_variant_size: 0,
            min_scored_variant_size: 0,
            min_output_alt_score: 0.0,
            min_output_somatic_score: 0.0,
        }
    }
}

impl DownstreamFilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spanning candidates require `min_candidate_spanning_count` local
    /// breakend observations.
    pub fn passes_spanning_count(&self, metrics: &CandidateMetrics) -> bool {
        metrics.spanning_count >= self.min_candidate_spanning_count
    }

    /// Imprecise non-spanning candidates (no assembly contig) are dropped.
    pub fn is_imprecise_and_unassembled(&self, metrics: &CandidateMetrics) -> bool {
        !metrics.has_assembly_contig && metrics.spanning_count < self.min_candidate_spanning_count
    }

    pub fn passes_candidate_variant_size(&self, metrics: &CandidateMetrics) -> bool {
        metrics.variant_size >= self.min_candidate_variant_size
    }

    pub fn passes_scored_variant_size(&self, metrics: &CandidateMetrics) -> bool {
        metrics.variant_size >= self.min_scored_variant_size
    }

    pub fn passes_diploid_output(&self, metrics: &CandidateMetrics) -> bool {
        metrics.alt_score >= self.min_output_alt_score
    }

    pub fn passes_somatic_output(&self, metrics: &CandidateMetrics) -> bool {
        metrics.somatic_score > self.min_output_somatic_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::GenomeInterval;
    use crate::locus::SVLocus;
    use crate::locus_set::{SVLocusSet, SetOptions};

    fn iv(tid: u32, b: i64, e: i64) -> GenomeInterval {
        GenomeInterval::new(tid, b, e)
    }

    #[test]
    fn test_enumerate_emits_above_threshold_edges() {
        let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(1));
        let mut locus = SVLocus::new();
        let a = locus.add_node(iv(1, 10, 20));
        let b = locus.add_node(iv(2, 30, 40));
        locus.link_nodes(a, b, 5, 0);
        set.merge(locus);
        set.finalize();

        let enumerator = CandidateEnumerator::new(3);
        let groups = enumerator.enumerate(&set);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].junctions[0].count, 5);
    }

    #[test]
    fn test_enumerate_drops_below_threshold_edges() {
        let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(1));
        let mut locus = SVLocus::new();
        let a = locus.add_node(iv(1, 10, 20));
        let b = locus.add_node(iv(2, 30, 40));
        locus.link_nodes(a, b, 1, 0);
        set.merge(locus);
        set.finalize();

        let enumerator = CandidateEnumerator::new(3);
        assert!(enumerator.enumerate(&set).is_empty());
    }

    #[test]
    #[should_panic]
    fn test_enumerate_requires_finalized_set() {
        let set = SVLocusSet::new(SetOptions::new());
        let enumerator = CandidateEnumerator::new(1);
        enumerator.enumerate(&set);
    }

    #[test]
    fn test_downstream_filter_predicates() {
        let opt = DownstreamFilterOptions::new();
        let precise = CandidateMetrics {
            spanning_count: 3,
            has_assembly_contig: false,
            variant_size: 100,
            alt_score: 5.0,
            somatic_score: 1.0,
        };
        assert!(opt.passes_spanning_count(&precise));
        assert!(!opt.is_imprecise_and_unassembled(&precise));

        let imprecise = CandidateMetrics {
            spanning_count: 1,
            has_assembly_contig: false,
            ..precise
        };
        assert!(opt.is_imprecise_and_unassembled(&imprecise));
    }
}
