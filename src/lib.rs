#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! svgraph: the evidence-graph core of a structural-variant discovery
//! pipeline for paired short-read sequencing data.
//!
//! A [`scanner`] converts aligned read pairs into single-locus evidence
//! ([`SVLocus`]); [`SVLocusSet::merge`] accumulates and transitively fuses
//! that evidence, conserving edge-observation counts across arbitrarily
//! complex merges; [`candidate::CandidateEnumerator`] walks a finalized set
//! to emit breakend-pair candidates for downstream assembly and scoring.
//!
//! # Example
//!
//! ```
//! use svgraph::interval::GenomeInterval;
//! use svgraph::locus::SVLocus;
//! use svgraph::locus_set::{SetOptions, SVLocusSet};
//!
//! let mut set = SVLocusSet::new(SetOptions::new().with_min_merge_edge_observations(2));
//!
//! let mut locus = SVLocus::new();
//! let a = locus.add_node(GenomeInterval::new(1, 10, 20));
//! let b = locus.add_node(GenomeInterval::new(2, 30, 40));
//! locus.link_nodes(a, b, 1, 0);
//! set.merge(locus);
//!
//! set.finalize();
//! assert_eq!(set.non_empty_size(), 0); // below threshold, cleaned away
//! ```

pub mod candidate;
pub mod error;
pub mod index;
pub mod interval;
pub mod locus;
pub mod locus_set;
pub mod parallel;
pub mod scanner;

pub use candidate::{
    CandidateEnumerator, CandidateMetrics, DownstreamFilterOptions, SvCandidateGroup, SvJunction,
};
pub use error::{Result, SvGraphError};
pub use index::IntervalIndex;
pub use interval::{EvidenceRange, GenomeInterval};
pub use locus::{LocusIndex, NodeIndex, SVLocus, SVLocusNode};
pub use locus_set::{SVLocusSet, SetOptions};
pub use parallel::{build_sets_in_parallel, group_loci_by_tid};
pub use scanner::{
    is_read_filtered, AlignedReadRecord, BreakendState, CachedReadGroupStats, CigarOp,
    ReadGroupStatsCache, ReadScannerOptions,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::candidate::{CandidateEnumerator, DownstreamFilterOptions};
    pub use crate::interval::{EvidenceRange, GenomeInterval};
    pub use crate::locus::SVLocus;
    pub use crate::locus_set::{SVLocusSet, SetOptions};
    pub use crate::scanner::{get_chimeric_locus, ReadScannerOptions};
}
