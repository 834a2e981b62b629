//! Outlier boundary detection.
//!
//! A boundary finder turns a read's CIGAR into the number of bases to treat as adapter
//! ("outlier") at each end of the read. Two strategies are provided:
//!
//! - [`ClipBasedFinder`] trusts the aligner's leading/trailing clip operations.
//! - [`SlidingWindowFinder`] looks for the first window of dense alignment from each end.
//!
//! Finders report lengths in alignment (reference) orientation; [`find_outliers`] swaps them
//! for reverse-strand alignments so that `left` is always the read's 5' end, and clamps them
//! to the sequence length.

pub mod clip_based;
pub mod sliding_window;

pub use clip_based::{ClipBasedConfig, ClipBasedFinder};
pub use sliding_window::{SlidingWindowConfig, SlidingWindowFinder};

use clap::ValueEnum;
use enum_dispatch::enum_dispatch;
use log::{debug, info};
use rayon::prelude::*;

use crate::errors::Result;
use crate::read_store::{ReadRecord, ReadStore, clamp_outliers};

/// Outlier lengths at the two ends of a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlierBoundary {
    /// Bases at the left end.
    pub left: usize,
    /// Bases at the right end.
    pub right: usize,
}

impl OutlierBoundary {
    /// Creates a boundary.
    #[must_use]
    pub const fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }

    /// The same boundary with the two ends exchanged.
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self { left: self.right, right: self.left }
    }
}

/// Computes outlier lengths from a CIGAR string, in alignment orientation.
#[enum_dispatch]
pub trait FindBoundary {
    /// Outlier lengths for a mapped read's CIGAR.
    ///
    /// # Errors
    ///
    /// Returns an error if the finder needs to decode the CIGAR and cannot.
    fn genomic_outliers(&self, cigar: &str) -> Result<OutlierBoundary>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// The configured boundary finder for a run.
#[enum_dispatch(FindBoundary)]
#[derive(Debug, Clone)]
pub enum BoundaryFinder {
    /// Clip-annotation based.
    ClipBased(ClipBasedFinder),
    /// Sliding-window alignment density.
    SlidingWindow(SlidingWindowFinder),
}

/// Boundary finder choices on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BoundaryMethod {
    /// Use the leading/trailing soft or hard clips of the alignment.
    #[default]
    #[value(name = "clip")]
    Clip,
    /// Use a sliding window over the alignment's per-base coverage.
    #[value(name = "window")]
    Window,
}

impl std::fmt::Display for BoundaryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clip => write!(f, "clip"),
            Self::Window => write!(f, "window"),
        }
    }
}

/// What happened when computing the outliers of one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOutcome {
    /// The read is unmapped; no boundary was computed.
    Unmapped,
    /// The read has no merged sequence; no boundary was computed.
    NoSequence,
    /// The CIGAR could not be decoded; outliers left at zero.
    InvalidCigar,
    /// Outliers were computed and stored.
    Found {
        /// The stored (strand-corrected, clamped) boundary.
        boundary: OutlierBoundary,
        /// Whether the alignment was on the reverse strand.
        reversed: bool,
        /// Whether clamping reduced the boundary.
        clamped: bool,
    },
}

/// Computes the outliers of one read and stores them on the read.
///
/// Unmapped reads and reads without a sequence are left untouched.
pub fn find_outliers<F: FindBoundary + ?Sized>(finder: &F, read: &mut ReadRecord) -> BoundaryOutcome {
    if read.is_unmapped() {
        return BoundaryOutcome::Unmapped;
    }
    if !read.merged {
        return BoundaryOutcome::NoSequence;
    }

    let genomic = match finder.genomic_outliers(&read.cigar) {
        Ok(boundary) => boundary,
        Err(e) => {
            debug!("Read '{}': {e}", read.id);
            read.set_outliers(0, 0);
            return BoundaryOutcome::InvalidCigar;
        }
    };

    let reversed = read.strand.is_reverse();
    let oriented = if reversed { genomic.swapped() } else { genomic };
    let (left, right) = clamp_outliers(oriented.left, oriented.right, read.sequence.len());
    read.set_outliers(left, right);

    BoundaryOutcome::Found {
        boundary: OutlierBoundary::new(left, right),
        reversed,
        clamped: (left, right) != (oriented.left, oriented.right),
    }
}

/// Counters collected while computing boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryStats {
    /// Reads with a computed boundary.
    pub computed: u64,
    /// Unmapped reads skipped.
    pub unmapped: u64,
    /// Aligned reads skipped because they had no sequence.
    pub no_sequence: u64,
    /// Reads whose CIGAR could not be decoded.
    pub invalid_cigar: u64,
    /// Computed boundaries that were swapped for a reverse-strand alignment.
    pub reversed: u64,
    /// Computed boundaries reduced by clamping.
    pub clamped: u64,
    /// Computed boundaries with a non-zero left outlier.
    pub with_left: u64,
    /// Computed boundaries with a non-zero right outlier.
    pub with_right: u64,
}

impl BoundaryStats {
    fn from_outcome(outcome: BoundaryOutcome) -> Self {
        let mut stats = Self::default();
        match outcome {
            BoundaryOutcome::Unmapped => stats.unmapped = 1,
            BoundaryOutcome::NoSequence => stats.no_sequence = 1,
            BoundaryOutcome::InvalidCigar => stats.invalid_cigar = 1,
            BoundaryOutcome::Found { boundary, reversed, clamped } => {
                stats.computed = 1;
                stats.reversed = u64::from(reversed);
                stats.clamped = u64::from(clamped);
                stats.with_left = u64::from(boundary.left > 0);
                stats.with_right = u64::from(boundary.right > 0);
            }
        }
        stats
    }

    fn merge(self, other: Self) -> Self {
        Self {
            computed: self.computed + other.computed,
            unmapped: self.unmapped + other.unmapped,
            no_sequence: self.no_sequence + other.no_sequence,
            invalid_cigar: self.invalid_cigar + other.invalid_cigar,
            reversed: self.reversed + other.reversed,
            clamped: self.clamped + other.clamped,
            with_left: self.with_left + other.with_left,
            with_right: self.with_right + other.with_right,
        }
    }
}

/// Computes and stores outliers for every read in the store.
///
/// With `threads > 1` the reads are processed on a bounded rayon pool; reads are independent
/// so the result is identical to the sequential pass.
///
/// # Errors
///
/// Returns an error if the thread pool cannot be created.
pub fn compute_boundaries(
    store: &mut ReadStore,
    finder: &BoundaryFinder,
    threads: usize,
) -> anyhow::Result<BoundaryStats> {
    info!("Computing outlier boundaries with the {} finder", finder.name());

    let stats = if threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        pool.install(|| {
            store
                .reads_mut()
                .par_iter_mut()
                .map(|read| BoundaryStats::from_outcome(find_outliers(finder, read)))
                .reduce(BoundaryStats::default, BoundaryStats::merge)
        })
    } else {
        store
            .reads_mut()
            .iter_mut()
            .map(|read| BoundaryStats::from_outcome(find_outliers(finder, read)))
            .fold(BoundaryStats::default(), BoundaryStats::merge)
    };

    info!(
        "Computed boundaries for {} reads ({} with a left outlier, {} with a right outlier)",
        stats.computed, stats.with_left, stats.with_right
    );
    Ok(stats)
}
