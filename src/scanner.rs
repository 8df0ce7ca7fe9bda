//! Converts aligned read pairs into single-locus evidence.
//!
//! This is the "scanner" collaborator described by the evidence-graph
//! contract: it owns no state in the set itself and produces one
//! [`SVLocus`] per qualifying chimeric read, which the caller then passes to
//! `SVLocusSet::merge`.

use crate::interval::{EvidenceRange, GenomeInterval};
use crate::locus::SVLocus;
use rustc_hash::FxHashMap;

/// One CIGAR operation, e.g. `50M` or `3S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match(u32),
    Ins(u32),
    Del(u32),
    SoftClip(u32),
    HardClip(u32),
    Skip(u32),
    Eq(u32),
    Diff(u32),
}

impl CigarOp {
    fn read_len(&self) -> u32 {
        match self {
            CigarOp::Match(n)
            | CigarOp::Ins(n)
            | CigarOp::SoftClip(n)
            | CigarOp::Eq(n)
            | CigarOp::Diff(n) => *n,
            CigarOp::Del(_) | CigarOp::HardClip(_) | CigarOp::Skip(_) => 0,
        }
    }

    fn ref_len(&self) -> u32 {
        match self {
            CigarOp::Match(n)
            | CigarOp::Del(n)
            | CigarOp::Skip(n)
            | CigarOp::Eq(n)
            | CigarOp::Diff(n) => *n,
            CigarOp::Ins(_) | CigarOp::SoftClip(_) | CigarOp::HardClip(_) => 0,
        }
    }
}

/// Length of the read consumed by the alignment path (sum of read-consuming ops).
pub fn apath_read_length(apath: &[CigarOp]) -> u32 {
    apath.iter().map(CigarOp::read_len).sum()
}

/// Length of reference consumed by the alignment path.
pub fn apath_ref_length(apath: &[CigarOp]) -> u32 {
    apath.iter().map(CigarOp::ref_len).sum()
}

/// Read-consuming bases in a leading soft clip, i.e. size of a run of
/// `SoftClip`/`HardClip` ops at the start of the path.
pub fn apath_read_lead_size(apath: &[CigarOp]) -> u32 {
    apath
        .iter()
        .take_while(|op| matches!(op, CigarOp::SoftClip(_) | CigarOp::HardClip(_)))
        .map(CigarOp::read_len)
        .sum()
}

/// Read-consuming bases in a trailing soft clip.
pub fn apath_read_trail_size(apath: &[CigarOp]) -> u32 {
    apath
        .iter()
        .rev()
        .take_while(|op| matches!(op, CigarOp::SoftClip(_) | CigarOp::HardClip(_)))
        .map(CigarOp::read_len)
        .sum()
}

/// Orientation of an inferred breakend: which side of the interval is open
/// (uncertain), matching the alignment strand that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakendState {
    LeftOpen,
    RightOpen,
}

/// Per-read-group fragment-size quantile window used to size breakend
/// padding, pre-computed from `breakend_edge_trim_prob`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedReadGroupStats {
    pub min: i64,
    pub max: i64,
}

/// Maps a read-group name to its cached fragment-size quantiles.
#[derive(Debug, Clone, Default)]
pub struct ReadGroupStatsCache {
    by_read_group: FxHashMap<String, CachedReadGroupStats>,
}

impl ReadGroupStatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, read_group: impl Into<String>, stats: CachedReadGroupStats) {
        self.by_read_group.insert(read_group.into(), stats);
    }

    pub fn get(&self, read_group: &str) -> Option<&CachedReadGroupStats> {
        self.by_read_group.get(read_group)
    }
}

/// Options consumed by the scanner, per the external configuration contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadScannerOptions {
    pub min_mapq: u8,
    /// Quantile probability used to trim the fragment-length distribution
    /// tail when sizing breakend padding; must lie in `(0, 0.5)`.
    pub breakend_edge_trim_prob: f64,
}

impl Default for ReadScannerOptions {
    fn default() -> Self {
        Self {
            min_mapq: 15,
            breakend_edge_trim_prob: 0.05,
        }
    }
}

impl ReadScannerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_mapq(mut self, mapq: u8) -> Self {
        self.min_mapq = mapq;
        self
    }

    pub fn with_breakend_edge_trim_prob(mut self, p: f64) -> Self {
        assert!(
            p > 0.0 && p < 0.5,
            "breakend_edge_trim_prob must be in (0, 0.5)"
        );
        self.breakend_edge_trim_prob = p;
        self
    }
}

/// The subset of an aligned read record the scanner needs. A real pipeline
/// would derive this from a BAM reader; it is an external collaborator here.
#[derive(Debug, Clone)]
pub struct AlignedReadRecord {
    pub tid: u32,
    /// 1-based leftmost mapping position, as in a BAM record.
    pub pos: i64,
    pub cigar: Vec<CigarOp>,
    pub is_forward: bool,
    pub mate_tid: u32,
    pub mate_pos: i64,
    pub mate_is_forward: bool,
    pub mate_cigar: Option<Vec<CigarOp>>,
    pub is_chimeric: bool,
    pub map_qual: u8,
    pub is_duplicate: bool,
    pub is_secondary: bool,
    pub is_proper_pair: bool,
    pub is_filter: bool,
}

/// True if `read` should be dropped before contributing any evidence.
pub fn is_read_filtered(read: &AlignedReadRecord, opt: &ReadScannerOptions) -> bool {
    read.is_filter
        || read.is_duplicate
        || read.is_secondary
        || read.is_proper_pair
        || read.map_qual < opt.min_mapq
}

struct Breakend {
    tid: u32,
    begin: i64,
    end: i64,
    #[allow(dead_code)]
    state: BreakendState,
}

/// Estimate the local and remote breakend intervals for one chimeric read,
/// plus the evidence range covering the read's own alignment.
fn get_read_breakends(
    rstats: &CachedReadGroupStats,
    read: &AlignedReadRecord,
) -> (Breakend, Breakend, EvidenceRange) {
    let read_size = apath_read_length(&read.cigar);
    let local_ref_length = apath_ref_length(&read.cigar) as i64;

    let this_read_noninsert_size = if read.is_forward {
        read_size - apath_read_trail_size(&read.cigar)
    } else {
        read_size - apath_read_lead_size(&read.cigar)
    };

    // If the mate record is unavailable, estimate its non-insert size and
    // reference length as equal to this read's own (source quirk: matches
    // the scanner's stated fallback rather than dropping the read).
    let (remote_noninsert_size, remote_ref_length) = match &read.mate_cigar {
        Some(mate_cigar) => {
            let mate_read_size = apath_read_length(mate_cigar);
            let mate_ref_length = apath_ref_length(mate_cigar) as i64;
            let mate_noninsert = if read.mate_is_forward {
                mate_read_size - apath_read_trail_size(mate_cigar)
            } else {
                mate_read_size - apath_read_lead_size(mate_cigar)
            };
            (mate_noninsert, mate_ref_length)
        }
        None => (this_read_noninsert_size, local_ref_length),
    };

    let total_noninsert_size = (this_read_noninsert_size + remote_noninsert_size) as i64;
    let pad = rstats.max - total_noninsert_size;

    let start_ref_pos = read.pos - 1;
    let end_ref_pos = start_ref_pos + local_ref_length;
    let local = if read.is_forward {
        Breakend {
            tid: read.tid,
            begin: end_ref_pos,
            end: end_ref_pos + pad,
            state: BreakendState::RightOpen,
        }
    } else {
        Breakend {
            tid: read.tid,
            begin: start_ref_pos - pad,
            end: start_ref_pos,
            state: BreakendState::LeftOpen,
        }
    };

    let mate_start_ref_pos = read.mate_pos - 1;
    let mate_end_ref_pos = mate_start_ref_pos + remote_ref_length;
    let remote = if read.mate_is_forward {
        Breakend {
            tid: read.mate_tid,
            begin: mate_end_ref_pos,
            end: mate_end_ref_pos + pad,
            state: BreakendState::RightOpen,
        }
    } else {
        Breakend {
            tid: read.mate_tid,
            begin: mate_start_ref_pos - pad,
            end: mate_start_ref_pos,
            state: BreakendState::LeftOpen,
        }
    };

    let evidence_range = EvidenceRange::new(
        start_ref_pos.min(end_ref_pos),
        start_ref_pos.max(end_ref_pos),
    );
    (local, remote, evidence_range)
}

/// Build the (local breakend, remote breakend) locus for one chimeric read,
/// or `None` if the read doesn't qualify. The returned locus is already
/// self-overlap-collapsed and ready for `SVLocusSet::merge`.
pub fn get_chimeric_locus(
    read: &AlignedReadRecord,
    rstats: &CachedReadGroupStats,
    opt: &ReadScannerOptions,
) -> Option<SVLocus> {
    if is_read_filtered(read, opt) {
        return None;
    }
    if !read.is_chimeric {
        return None;
    }

    let (local, remote, evidence_range) = get_read_breakends(rstats, read);

    let mut locus = SVLocus::new();
    let local_interval = GenomeInterval::new(local.tid, local.begin, local.end);
    let remote_interval = GenomeInterval::new(remote.tid, remote.begin, remote.end);

    let local_node = locus.add_node(local_interval);
    locus.set_node_evidence(local_node, evidence_range);
    let remote_node = locus.add_node(remote_interval);
    locus.link_nodes(local_node, remote_node, 1, 0);

    locus.merge_self_overlap();
    Some(locus)
}
