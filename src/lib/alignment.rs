//! Alignment record ingestion.
//!
//! Alignments are read from SAM or BAM through noodles and reduced to the handful of fields
//! boundary detection needs ([`AlignmentRecord`]). The [`AlignmentIngestor`] folds the record
//! stream into a [`ReadStore`], keeping one alignment per read id.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use noodles::sam::alignment::RecordBuf;
use serde::{Deserialize, Serialize};

use crate::cigar::{UNMAPPED_CIGAR, ops_to_string, query_alignment_length};
use crate::progress::ProgressTracker;
use crate::read_store::{ReadStore, Upsert};

const SAM_FLAG_UNMAPPED: u16 = 0x4;
const SAM_FLAG_REVERSE: u16 = 0x10;

/// Strand/mapping state of an alignment, derived from the SAM flag.
///
/// Primary forward (`0`), primary reverse (`16`) and unmapped (`4`) records get their own
/// variants; every other flag value (secondary, supplementary, paired...) is kept raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StrandFlag {
    /// Flag 0.
    #[default]
    Forward,
    /// Flag 16.
    Reverse,
    /// Flag 4.
    Unmapped,
    /// Any other flag value.
    Other(u16),
}

impl StrandFlag {
    /// Classifies a raw SAM flag.
    #[must_use]
    pub const fn from_flag(flag: u16) -> Self {
        match flag {
            0 => Self::Forward,
            SAM_FLAG_REVERSE => Self::Reverse,
            SAM_FLAG_UNMAPPED => Self::Unmapped,
            other => Self::Other(other),
        }
    }

    /// Whether the read did not align.
    #[must_use]
    pub const fn is_unmapped(self) -> bool {
        match self {
            Self::Unmapped => true,
            Self::Other(flag) => flag & SAM_FLAG_UNMAPPED != 0,
            Self::Forward | Self::Reverse => false,
        }
    }

    /// Whether the read aligned to the reverse strand.
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        match self {
            Self::Reverse => true,
            Self::Other(flag) => flag & SAM_FLAG_REVERSE != 0 && flag & SAM_FLAG_UNMAPPED == 0,
            Self::Forward | Self::Unmapped => false,
        }
    }

    /// Short label used in reports.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Forward => "+".to_string(),
            Self::Reverse => "-".to_string(),
            Self::Unmapped => "unmapped".to_string(),
            Self::Other(flag) => format!("flag:{flag}"),
        }
    }
}

/// The fields of one alignment that boundary detection uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    /// Read id.
    pub id: String,
    /// SAM CIGAR string, `*` when unmapped.
    pub cigar: String,
    /// Strand/mapping state.
    pub strand: StrandFlag,
    /// Read bases covered by aligned operations; used to choose between multi-mappings.
    pub alignment_length: usize,
}

impl AlignmentRecord {
    /// Builds a record from its raw parts.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        cigar: impl Into<String>,
        flag: u16,
        alignment_length: usize,
    ) -> Self {
        Self {
            id: id.into(),
            cigar: cigar.into(),
            strand: StrandFlag::from_flag(flag),
            alignment_length,
        }
    }

    /// Converts a noodles record, returning `None` for records without a name.
    #[must_use]
    pub fn from_record_buf(record: &RecordBuf) -> Option<Self> {
        let id = record.name()?.to_string();
        let ops = record.cigar().as_ref();
        Some(Self {
            id,
            cigar: ops_to_string(ops),
            strand: StrandFlag::from_flag(record.flags().bits()),
            alignment_length: query_alignment_length(ops),
        })
    }

    /// Whether this record carries no alignment.
    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        self.cigar == UNMAPPED_CIGAR || self.strand.is_unmapped()
    }
}

/// Counters collected while ingesting alignments. Diagnostic only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Alignment records seen.
    pub records: u64,
    /// Distinct read ids.
    pub distinct_ids: u64,
    /// Records with flag 0.
    pub forward: u64,
    /// Records with flag 16.
    pub reverse: u64,
    /// Records with flag 4.
    pub unmapped: u64,
    /// Records with any other flag.
    pub other: u64,
    /// Records that replaced an earlier alignment of the same read.
    pub replaced: u64,
    /// Records that lost to an earlier, longer alignment of the same read.
    pub discarded: u64,
}

/// Folds alignment records into a [`ReadStore`], resolving multi-mapped reads.
///
/// For each id the alignment with the greatest alignment length wins; on a tie the most
/// recently seen record wins.
pub struct AlignmentIngestor<'a> {
    store: &'a mut ReadStore,
    stats: IngestStats,
    progress: ProgressTracker,
}

impl<'a> AlignmentIngestor<'a> {
    /// Creates an ingestor that adds to `store`.
    pub fn new(store: &'a mut ReadStore) -> Self {
        Self {
            store,
            stats: IngestStats::default(),
            progress: ProgressTracker::new("Read alignment records"),
        }
    }

    /// Ingests one record.
    pub fn ingest(&mut self, record: AlignmentRecord) {
        self.stats.records += 1;
        match record.strand {
            StrandFlag::Forward => self.stats.forward += 1,
            StrandFlag::Reverse => self.stats.reverse += 1,
            StrandFlag::Unmapped => self.stats.unmapped += 1,
            StrandFlag::Other(_) => self.stats.other += 1,
        }

        match self.store.upsert_alignment(record) {
            Upsert::Inserted => self.stats.distinct_ids += 1,
            Upsert::Replaced => self.stats.replaced += 1,
            Upsert::Kept => self.stats.discarded += 1,
        }
        self.progress.record(1);
    }

    /// Finishes ingestion and returns the collected counters.
    #[must_use]
    pub fn finish(self) -> IngestStats {
        self.progress.finish();
        self.stats
    }
}

/// Alignment file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentFormat {
    /// Text SAM.
    Sam,
    /// Binary BAM.
    Bam,
}

impl AlignmentFormat {
    /// Chooses the format from a path's extension: `.bam` is BAM, anything else SAM.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bam") => Self::Bam,
            _ => Self::Sam,
        }
    }
}

/// Returns true if the path refers to standard input.
#[must_use]
pub fn is_stdin_path<P: AsRef<Path>>(path: P) -> bool {
    let path_str = path.as_ref().to_string_lossy();
    path_str == "-" || path_str == "/dev/stdin"
}

/// Calls `f` for every named record of a SAM/BAM file, in file order.
///
/// A path of `-` reads SAM from standard input.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, its header cannot be read, or a record is
/// malformed.
pub fn for_each_alignment<P, F>(path: P, mut f: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(AlignmentRecord),
{
    let path = path.as_ref();
    let mut unnamed = 0u64;
    let mut visit = |record: RecordBuf| match AlignmentRecord::from_record_buf(&record) {
        Some(alignment) => f(alignment),
        None => unnamed += 1,
    };

    if is_stdin_path(path) {
        let input: Box<dyn Read> = Box::new(std::io::stdin().lock());
        read_sam(BufReader::new(input), path, &mut visit)?;
    } else {
        let file = File::open(path)
            .with_context(|| format!("Failed to open alignment file: {}", path.display()))?;
        match AlignmentFormat::from_path(path) {
            AlignmentFormat::Bam => {
                let mut reader = noodles::bam::io::Reader::new(file);
                let header = reader
                    .read_header()
                    .with_context(|| format!("Failed to read BAM header: {}", path.display()))?;
                for result in reader.record_bufs(&header) {
                    let record = result
                        .with_context(|| format!("Malformed BAM record in {}", path.display()))?;
                    visit(record);
                }
            }
            AlignmentFormat::Sam => read_sam(BufReader::new(file), path, &mut visit)?,
        }
    }

    if unnamed > 0 {
        debug!("Ignored {unnamed} alignment records without a read name");
    }
    Ok(())
}

fn read_sam<R, F>(input: R, path: &Path, visit: &mut F) -> Result<()>
where
    R: std::io::BufRead,
    F: FnMut(RecordBuf),
{
    let mut reader = noodles::sam::io::Reader::new(input);
    let header = reader
        .read_header()
        .with_context(|| format!("Failed to read SAM header: {}", path.display()))?;
    for result in reader.record_bufs(&header) {
        let record =
            result.with_context(|| format!("Malformed SAM record in {}", path.display()))?;
        visit(record);
    }
    Ok(())
}

/// Ingests every record of an alignment file into `store`.
///
/// # Errors
///
/// Returns an error if the alignment file cannot be read.
pub fn ingest_alignments<P: AsRef<Path>>(path: P, store: &mut ReadStore) -> Result<IngestStats> {
    let path = path.as_ref();
    info!("Reading alignments from {}", path.display());
    let mut ingestor = AlignmentIngestor::new(store);
    for_each_alignment(path, |record| ingestor.ingest(record))?;
    let stats = ingestor.finish();
    info!(
        "Ingested {} alignment records for {} reads ({} forward, {} reverse, {} unmapped, {} other)",
        stats.records, stats.distinct_ids, stats.forward, stats.reverse, stats.unmapped, stats.other
    );
    Ok(stats)
}
