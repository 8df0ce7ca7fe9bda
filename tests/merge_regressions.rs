//! End-to-end regression scenarios against the public `SVLocusSet` API,
//! abstracted from the original scanner's test suite (`SVLocusSetTest.cpp`):
//! each one pins down a distinct merge-algorithm edge case not otherwise
//! covered by the inline unit tests in `src/locus_set.rs`.

use svgraph::interval::GenomeInterval;
use svgraph::locus::SVLocus;
use svgraph::locus_set::{SVLocusSet, SetOptions};

fn iv(tid: u32, b: i64, e: i64) -> GenomeInterval {
    GenomeInterval::new(tid, b, e)
}

fn two_node_locus(tid_a: u32, a: (i64, i64), tid_b: u32, b: (i64, i64), count: u32) -> SVLocus {
    let mut locus = SVLocus::new();
    let n0 = locus.add_node(iv(tid_a, a.0, a.1));
    let n1 = locus.add_node(iv(tid_b, b.0, b.1));
    locus.link_nodes(n0, n1, count, 0);
    locus.merge_self_overlap();
    locus
}

fn self_edge_locus(tid: u32, span: (i64, i64), count: u32) -> SVLocus {
    let mut locus = SVLocus::new();
    let n0 = locus.add_node(iv(tid, span.0, span.1));
    locus.link_nodes(n0, n0, count, 0);
    locus
}

fn non_empty_locus_id(set: &SVLocusSet) -> usize {
    (0..set.locus_count())
        .find(|&i| !set.get_locus(i).is_empty())
        .unwrap()
}

/// `test_SVLocusNoiseCleanRemote`: cleaning on the remote-breakend side
/// alone must still drop the whole below-threshold edge and both its nodes.
#[test]
fn clean_region_on_remote_side_removes_whole_edge() {
    let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(2));
    set.merge(two_node_locus(1, (100, 110), 1, (10, 20), 1));
    assert_eq!(set.non_empty_size(), 1);

    set.clean_region(&iv(1, 0, 120));
    assert_eq!(set.non_empty_size(), 0);
}

/// `test_SVLocusNodeOverlapEdge`: one locus's edge region fully encloses
/// both nodes of a second, unrelated edge, so the two fuse into a single
/// locus at merge time (the spec's transitive-closure step 7); both
/// observations are below threshold, so the fused locus is cleaned away
/// entirely by `finalize`, regardless of which order they were merged in.
#[test]
fn node_overlap_edge_cleans_both_orders() {
    for first in [true, false] {
        let locus1 = two_node_locus(1, (10, 60), 2, (20, 70), 1);
        let locus2 = two_node_locus(1, (10, 20), 1, (30, 40), 1);

        let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(2));
        if first {
            set.merge(locus1);
            set.merge(locus2);
        } else {
            set.merge(locus2);
            set.merge(locus1);
        }
        assert_eq!(set.non_empty_size(), 1);

        set.finalize();
        set.check_state(true, true);
        assert_eq!(set.non_empty_size(), 0);
    }
}

/// `test_SVLocusNodeOverlapSelfEdge`: same shape, but the enclosed locus is
/// itself a self-edge rather than a two-node pair.
#[test]
fn node_overlap_self_edge_cleans_both_orders() {
    for reversed in [false, true] {
        let locus1 = two_node_locus(1, (10, 60), 2, (20, 70), 1);
        let locus2 = self_edge_locus(1, (10, 20), 1);

        let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(2));
        if reversed {
            set.merge(locus2);
            set.merge(locus1);
        } else {
            set.merge(locus1);
            set.merge(locus2);
        }
        assert_eq!(set.non_empty_size(), 1);

        set.finalize();
        set.check_state(true, true);
        assert_eq!(set.non_empty_size(), 0);
    }
}

/// `test_SVLocusMergeToSelfEdge`: two edges that don't individually
/// self-overlap still fuse into a single self-edge node once merged,
/// because their union spans both endpoints.
#[test]
fn merge_to_self_edge_from_two_non_self_overlapping_pairs() {
    let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(2));
    set.merge(two_node_locus(1, (10, 20), 1, (25, 40), 1));
    set.merge(two_node_locus(1, (15, 30), 1, (35, 40), 1));

    set.finalize();
    set.check_state(true, true);
    assert_eq!(set.non_empty_size(), 1);
}

/// `test_SVLocusMergeToSelfEdge3`: a self-edge locus merged with a second,
/// identical self-edge locus, then with a connecting pair, ends up as one
/// node whose self-edge count has accumulated from all three observations.
#[test]
fn merge_to_self_edge_accumulates_across_three_loci() {
    let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(2));
    set.merge(self_edge_locus(1, (10, 40), 1));
    set.merge(self_edge_locus(1, (10, 40), 1));
    set.merge(two_node_locus(1, (10, 20), 1, (30, 40), 1));

    set.finalize();
    set.check_state(true, true);
    assert_eq!(set.non_empty_size(), 1);
    let locus_id = non_empty_locus_id(&set);
    let locus = set.get_locus(locus_id);
    assert_eq!(locus.size(), 1);
    assert_eq!(locus.get_node(0).out_count(), 3);
}

/// `test_SVLocusTransitiveOverlap2`: a chain of five loci that only
/// becomes one connected component once earlier merges grow the absorber's
/// intervals enough to reach a locus untouched by any individual input.
/// This is also the one regression complex enough to be worth running with
/// logging enabled, to confirm the `debug!`/`warn!` call sites in
/// `SVLocusSet::merge` fire without panicking mid-fusion.
#[test]
fn transitive_overlap_chain_of_five_loci_collapses_to_one() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(6));
    set.merge(two_node_locus(1, (30, 40), 1, (50, 60), 6));
    set.merge(self_edge_locus(1, (10, 40), 3));
    set.merge(two_node_locus(1, (10, 20), 1, (30, 60), 1));
    set.merge(two_node_locus(1, (30, 40), 1, (10, 20), 1));
    set.merge(two_node_locus(1, (30, 40), 1, (10, 20), 1));

    assert_eq!(set.non_empty_size(), 1);
    set.finalize();
    set.check_state(true, true);
    assert_eq!(set.non_empty_size(), 1);
}

#[cfg(feature = "serde")]
#[test]
fn finalized_set_round_trips_through_json() {
    let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(1));
    set.merge(two_node_locus(1, (10, 20), 2, (30, 40), 3));
    set.merge(two_node_locus(5, (10, 20), 6, (30, 40), 1));
    set.finalize();

    let json = serde_json::to_string(&set).expect("serialize");
    let mut restored: SVLocusSet = serde_json::from_str(&json).expect("deserialize");
    restored.rebuild_index();

    assert_eq!(restored.non_empty_size(), set.non_empty_size());
    assert_eq!(restored.locus_count(), set.locus_count());
    restored.check_state(true, true);

    let total_before: u32 = (0..set.locus_count())
        .flat_map(|i| set.get_locus(i).nodes().map(|n| n.out_count()))
        .sum();
    let total_after: u32 = (0..restored.locus_count())
        .flat_map(|i| restored.get_locus(i).nodes().map(|n| n.out_count()))
        .sum();
    assert_eq!(total_before, total_after);
}
