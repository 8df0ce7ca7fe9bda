//! Chromosome-shard parallelism for the outer pipeline.
//!
//! Per spec.md §5, a single `SVLocusSet` is never accessed concurrently —
//! the pipeline instead parallelizes one level up, by sharding the genome
//! into edge-bins where each bin owns its own scanner and its own locus
//! set. This module provides that sharding/fan-out glue: group a batch of
//! freshly-scanned loci by the chromosome of their first node, then build
//! one independent `SVLocusSet` per shard concurrently with Rayon. Each
//! `SVLocusSet::merge` call still runs single-threaded within its shard;
//! only the shards themselves run in parallel, mirroring the teacher's
//! `group_by_chromosome` + `process_chromosomes` pattern for BED intervals.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::locus::SVLocus;
use crate::locus_set::{SVLocusSet, SetOptions};

/// Group loci by the chromosome (`tid`) of their first node — the local
/// breakend, by scanner convention. A locus with no nodes is dropped (it
/// carries no evidence to shard).
pub fn group_loci_by_tid(loci: Vec<SVLocus>) -> FxHashMap<u32, Vec<SVLocus>> {
    let mut groups: FxHashMap<u32, Vec<SVLocus>> = FxHashMap::default();
    for locus in loci {
        let tid = locus.nodes().next().map(|n| n.interval.tid);
        if let Some(tid) = tid {
            groups.entry(tid).or_default().push(locus);
        }
    }
    groups
}

/// Build one finalized `SVLocusSet` per shard, merging that shard's loci
/// sequentially within the shard but running all shards concurrently.
/// Mirrors the outer pipeline's per-edge-bin locus set, one per worker.
pub fn build_sets_in_parallel(
    groups: FxHashMap<u32, Vec<SVLocus>>,
    options: SetOptions,
) -> FxHashMap<u32, SVLocusSet> {
    groups
        .into_par_iter()
        .map(|(tid, loci)| {
            let mut set = SVLocusSet::new(options);
            for locus in loci {
                set.merge(locus);
            }
            set.finalize();
            (tid, set)
        })
        .collect()
}
