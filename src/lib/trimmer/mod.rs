//! Trimming back-ends.
//!
//! A trimmer receives every read once its outlier lengths are known and decides what to keep
//! of each outlier. All three back-ends keep the read body (the bases between the two
//! outliers) untouched:
//!
//! - [`ExternalAdapterTrimmer`] stages the outliers, runs `cutadapt` on them in one batch and
//!   keeps whatever residual `cutadapt` leaves next to the body.
//! - [`LibraryClipTrimmer`] searches the outliers for adapters in-process and writes each
//!   read immediately.
//! - [`PassthroughTrimmer`] drops both outliers.

pub mod external;
pub mod illumina_clip;
pub mod library_clip;
pub mod passthrough;

pub use external::{CutadaptConfig, ExternalAdapterTrimmer};
pub use illumina_clip::{IlluminaClipConfig, IlluminaClipper};
pub use library_clip::LibraryClipTrimmer;
pub use passthrough::PassthroughTrimmer;

use anyhow::Result;
use clap::ValueEnum;
use enum_dispatch::enum_dispatch;

use crate::dna::{complement, is_dna, reverse, reverse_complement};
use crate::errors::LrtrimError;
use crate::output::OutputWriter;
use crate::read_store::{ReadRecord, ReadStore};

/// Counters kept by a trimmer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimmerStats {
    /// Reads handed to the trimmer.
    pub processed: u64,
    /// Reads where part of the left outlier was kept.
    pub left_kept: u64,
    /// Reads where part of the right outlier was kept.
    pub right_kept: u64,
    /// Left outliers staged for an external tool.
    pub staged_left: u64,
    /// Right outliers staged for an external tool.
    pub staged_right: u64,
    /// Sides whose external tool run failed.
    pub failed_sides: u64,
    /// Reads whose external residuals did not line up with the staged outliers.
    pub inconsistent: u64,
}

/// A trimming back-end.
#[enum_dispatch]
pub trait OutlierTrimmer {
    /// Handles one read whose outliers have been computed.
    ///
    /// `index` is the read's position in the [`ReadStore`]. Zero-length outliers are normal.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or writing fails.
    fn pre_process(&mut self, index: usize, read: &ReadRecord, out: &mut OutputWriter) -> Result<()>;

    /// Runs any batch step and writes remaining output. Called once, after every read.
    ///
    /// # Errors
    ///
    /// Returns an error if output cannot be written. Failures of an external tool are not
    /// errors.
    fn finish(&mut self, store: &ReadStore, out: &mut OutputWriter) -> Result<()>;

    /// Counters so far.
    fn stats(&self) -> TrimmerStats;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// The configured trimmer for a run.
#[enum_dispatch(OutlierTrimmer)]
#[derive(Debug)]
pub enum Trimmer {
    /// `cutadapt` on staged outliers.
    External(ExternalAdapterTrimmer),
    /// In-process adapter clipping.
    LibraryClip(LibraryClipTrimmer),
    /// Outliers removed outright.
    Passthrough(PassthroughTrimmer),
}

/// Trimmer choices on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TrimmerKind {
    /// Run `cutadapt` on the outliers.
    #[default]
    #[value(name = "cutadapt")]
    Cutadapt,
    /// Clip adapters from the outliers in-process.
    #[value(name = "clip")]
    Clip,
    /// Remove the outliers without searching for adapters.
    #[value(name = "passthrough")]
    Passthrough,
}

impl TrimmerKind {
    /// Whether this trimmer needs adapter sequences.
    #[must_use]
    pub const fn needs_adapters(self) -> bool {
        !matches!(self, Self::Passthrough)
    }
}

impl std::fmt::Display for TrimmerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cutadapt => write!(f, "cutadapt"),
            Self::Clip => write!(f, "clip"),
            Self::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// The four forms in which each adapter is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// As given.
    Original,
    /// Reversed, not complemented.
    Reverse,
    /// Complemented, not reversed.
    Complement,
    /// Reverse complemented.
    ReverseComplement,
}

impl Orientation {
    /// All orientations, in search order.
    pub const ALL: [Self; 4] = [Self::Original, Self::Reverse, Self::Complement, Self::ReverseComplement];

    /// Whether this orientation reverses the adapter.
    #[must_use]
    pub const fn is_reversed(self) -> bool {
        matches!(self, Self::Reverse | Self::ReverseComplement)
    }

    /// Suffix appended to the adapter name.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Original => "",
            Self::Reverse => "_rev",
            Self::Complement => "_comp",
            Self::ReverseComplement => "_rc",
        }
    }

    fn apply(self, seq: &[u8]) -> Vec<u8> {
        match self {
            Self::Original => seq.to_ascii_uppercase(),
            Self::Reverse => reverse(&seq.to_ascii_uppercase()),
            Self::Complement => complement(seq),
            Self::ReverseComplement => reverse_complement(seq),
        }
    }
}

/// One adapter in one orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConstruct {
    /// Name, e.g. `rt_rc`.
    pub name: String,
    /// Orientation relative to the configured adapter.
    pub orientation: Orientation,
    /// Bases, uppercase.
    pub sequence: Vec<u8>,
}

/// The two library adapters: reverse-transcription and strand-switching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapters {
    /// Reverse-transcription adapter.
    pub rt: Vec<u8>,
    /// Strand-switching adapter.
    pub ss: Vec<u8>,
}

impl Adapters {
    /// Creates a validated adapter pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either adapter is empty or contains a non-DNA character.
    pub fn new(rt: &str, ss: &str) -> crate::errors::Result<Self> {
        for (name, seq) in [("rt-adapter", rt), ("ss-adapter", ss)] {
            if seq.is_empty() {
                return Err(LrtrimError::InvalidParameter {
                    parameter: name.to_string(),
                    reason: "adapter sequence is empty".to_string(),
                });
            }
            if !is_dna(seq.as_bytes()) {
                return Err(LrtrimError::InvalidParameter {
                    parameter: name.to_string(),
                    reason: format!("'{seq}' is not a DNA sequence (expected only A, C, G, T, N)"),
                });
            }
        }
        Ok(Self { rt: rt.as_bytes().to_ascii_uppercase(), ss: ss.as_bytes().to_ascii_uppercase() })
    }

    /// The eight constructs searched for: each adapter in each [`Orientation`].
    #[must_use]
    pub fn constructs(&self) -> Vec<AdapterConstruct> {
        [("rt", &self.rt), ("ss", &self.ss)]
            .into_iter()
            .flat_map(|(name, seq)| {
                Orientation::ALL.into_iter().map(move |orientation| AdapterConstruct {
                    name: format!("{name}{}", orientation.suffix()),
                    orientation,
                    sequence: orientation.apply(seq),
                })
            })
            .collect()
    }
}

/// Hands every read with a sequence to `trimmer`, then lets it finish.
///
/// Reads that never received a sequence are skipped.
///
/// # Errors
///
/// Returns an error if the trimmer fails to stage or write.
pub fn trim_reads(store: &ReadStore, trimmer: &mut Trimmer, out: &mut OutputWriter) -> Result<TrimmerStats> {
    for (index, read) in store.reads().iter().enumerate() {
        if read.merged {
            trimmer.pre_process(index, read, out)?;
        }
    }
    trimmer.finish(store, out)?;
    Ok(trimmer.stats())
}
