//! Summary metrics for the `trim` command.

use serde::{Deserialize, Serialize};

use super::Metric;
use crate::alignment::IngestStats;
use crate::boundary::BoundaryStats;
use crate::output::OutputStats;
use crate::read_store::MergeStats;
use crate::trimmer::TrimmerStats;

/// One row summarising every stage of a trimming run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrimMetrics {
    /// Boundary method used (`clip` or `window`).
    pub boundary_method: String,
    /// Trimmer used (`cutadapt`, `clip` or `passthrough`).
    pub trimmer: String,

    /// Alignment records read.
    pub alignment_records: u64,
    /// Distinct read ids among the alignments.
    pub distinct_reads: u64,
    /// Alignment records on the forward strand, counted as read (discarded multi-maps included).
    pub forward_alignments: u64,
    /// Alignment records on the reverse strand, counted as read.
    pub reverse_alignments: u64,
    /// Unmapped alignment records, counted as read.
    pub unmapped_alignments: u64,
    /// Alignment records with any other flag, counted as read.
    pub other_alignments: u64,
    /// Alignments that replaced an earlier one for the same id.
    pub replaced_alignments: u64,
    /// Alignments discarded in favour of a longer earlier one.
    pub discarded_alignments: u64,

    /// FASTQ records read.
    pub sequence_records: u64,
    /// Reads that received a sequence.
    pub merged_reads: u64,
    /// FASTQ records with no alignment.
    pub missing_alignment: u64,
    /// Aligned reads with no FASTQ record.
    pub missing_sequence: u64,
    /// FASTQ records whose sequence and quality lengths differ.
    pub malformed_sequences: u64,
    /// FASTQ records repeating an id already merged.
    pub duplicate_sequences: u64,

    /// Reads whose outliers were computed.
    pub boundaries_computed: u64,
    /// Reads skipped because they are unmapped.
    pub boundaries_unmapped: u64,
    /// Reads skipped because they have no sequence.
    pub boundaries_no_sequence: u64,
    /// Reads whose CIGAR could not be decoded.
    pub invalid_cigars: u64,
    /// Reads whose outliers were swapped for the reverse strand.
    pub reversed_reads: u64,
    /// Reads whose outliers were clamped to the sequence length.
    pub clamped_reads: u64,
    /// Reads with a non-empty left outlier.
    pub reads_with_left_outlier: u64,
    /// Reads with a non-empty right outlier.
    pub reads_with_right_outlier: u64,

    /// Reads handed to the trimmer.
    pub trimmed_reads: u64,
    /// Reads where part of the left outlier was kept.
    pub left_residuals_kept: u64,
    /// Reads where part of the right outlier was kept.
    pub right_residuals_kept: u64,
    /// External tool runs that failed.
    pub failed_tool_runs: u64,
    /// Reads whose external residuals did not line up.
    pub inconsistent_merges: u64,

    /// Reads written to the output.
    pub reads_written: u64,
    /// Reads dropped for being shorter than the minimum length.
    pub reads_dropped: u64,
    /// Bases written to the output.
    pub bases_written: u64,
    /// Shortest written read, 0 when nothing was written.
    pub shortest_read: u64,
    /// Longest written read, 0 when nothing was written.
    pub longest_read: u64,
    /// Mean written read length.
    #[serde(serialize_with = "super::serialize_float")]
    pub mean_read_length: f64,
}

impl TrimMetrics {
    /// Creates empty metrics for a run with the given boundary method and trimmer.
    #[must_use]
    pub fn new(boundary_method: impl Into<String>, trimmer: impl Into<String>) -> Self {
        Self { boundary_method: boundary_method.into(), trimmer: trimmer.into(), ..Self::default() }
    }

    /// Records alignment ingestion counts.
    pub fn record_ingest(&mut self, stats: &IngestStats) {
        self.alignment_records = stats.records;
        self.distinct_reads = stats.distinct_ids;
        self.forward_alignments = stats.forward;
        self.reverse_alignments = stats.reverse;
        self.unmapped_alignments = stats.unmapped;
        self.other_alignments = stats.other;
        self.replaced_alignments = stats.replaced;
        self.discarded_alignments = stats.discarded;
    }

    /// Records sequence merging counts.
    pub fn record_merge(&mut self, stats: &MergeStats) {
        self.sequence_records = stats.sequences;
        self.merged_reads = stats.merged;
        self.missing_alignment = stats.missing_alignment;
        self.missing_sequence = stats.missing_sequence;
        self.malformed_sequences = stats.malformed;
        self.duplicate_sequences = stats.duplicates;
    }

    /// Records boundary detection counts.
    pub fn record_boundaries(&mut self, stats: &BoundaryStats) {
        self.boundaries_computed = stats.computed;
        self.boundaries_unmapped = stats.unmapped;
        self.boundaries_no_sequence = stats.no_sequence;
        self.invalid_cigars = stats.invalid_cigar;
        self.reversed_reads = stats.reversed;
        self.clamped_reads = stats.clamped;
        self.reads_with_left_outlier = stats.with_left;
        self.reads_with_right_outlier = stats.with_right;
    }

    /// Records trimmer counts.
    pub fn record_trimming(&mut self, stats: &TrimmerStats) {
        self.trimmed_reads = stats.processed;
        self.left_residuals_kept = stats.left_kept;
        self.right_residuals_kept = stats.right_kept;
        self.failed_tool_runs = stats.failed_sides;
        self.inconsistent_merges = stats.inconsistent;
    }

    /// Records output counts and derives the mean read length.
    pub fn record_output(&mut self, stats: &OutputStats) {
        self.reads_written = stats.written;
        self.reads_dropped = stats.dropped;
        self.bases_written = stats.bases_written;
        self.shortest_read = stats.shortest.map_or(0, |n| n as u64);
        self.longest_read = stats.longest.map_or(0, |n| n as u64);
        self.mean_read_length = if stats.written == 0 {
            0.0
        } else {
            #[expect(clippy::cast_precision_loss, reason = "base counts never exceed 2^53")]
            let mean = stats.bases_written as f64 / stats.written as f64;
            mean
        };
    }
}

impl Metric for TrimMetrics {
    fn metric_name() -> &'static str {
        "trim"
    }
}
