//! Per-run arena of reads.
//!
//! Every distinct read id gets one [`ReadRecord`] holding its retained alignment, its
//! sequence and quality, and the outlier lengths computed for it. Records live in a flat
//! vector addressed through an id → index map so that boundary detection can walk them as a
//! slice and trimmers can refer to them by index.

use ahash::AHashMap;
use clap::ValueEnum;
use log::warn;

use crate::alignment::{AlignmentRecord, StrandFlag};
use crate::errors::{LrtrimError, Result};

/// One read: its retained alignment plus sequence, quality and outlier lengths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadRecord {
    /// Read id.
    pub id: String,
    /// Bases; empty until merged.
    pub sequence: Vec<u8>,
    /// Phred+33 qualities, same length as `sequence`.
    pub quality: Vec<u8>,
    /// CIGAR of the retained alignment.
    pub cigar: String,
    /// Bases to remove from the 5' end of the read.
    pub left_outlier: usize,
    /// Bases to remove from the 3' end of the read.
    pub right_outlier: usize,
    /// Strand/mapping state of the retained alignment.
    pub strand: StrandFlag,
    /// Aligned length of the retained alignment.
    pub alignment_length: usize,
    /// Whether a sequence has been merged into this record.
    pub merged: bool,
}

impl ReadRecord {
    /// Creates a record from an alignment, without sequence.
    #[must_use]
    pub fn from_alignment(alignment: AlignmentRecord) -> Self {
        Self {
            id: alignment.id,
            cigar: alignment.cigar,
            strand: alignment.strand,
            alignment_length: alignment.alignment_length,
            ..Self::default()
        }
    }

    /// Whether the retained alignment is unmapped.
    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        self.cigar == crate::cigar::UNMAPPED_CIGAR || self.strand.is_unmapped()
    }

    /// Sets the outlier lengths, clamped so that `left + right <= sequence.len()`.
    pub fn set_outliers(&mut self, left: usize, right: usize) {
        let (left, right) = clamp_outliers(left, right, self.sequence.len());
        self.left_outlier = left;
        self.right_outlier = right;
    }

    /// The read with both outliers removed.
    #[must_use]
    pub fn body(&self) -> (&[u8], &[u8]) {
        let (start, end) = self.body_range();
        (&self.sequence[start..end], &self.quality[start..end])
    }

    /// Start and end of the body within the sequence, always a valid range.
    #[must_use]
    pub fn body_range(&self) -> (usize, usize) {
        let len = self.sequence.len();
        let (left, right) = clamp_outliers(self.left_outlier, self.right_outlier, len);
        (left, len - right)
    }
}

/// Clamps outlier lengths against a sequence length.
///
/// The left outlier is capped at `len`, then the right outlier at whatever remains, so the
/// result always satisfies `left + right <= len`.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::read_store::clamp_outliers;
///
/// assert_eq!(clamp_outliers(10, 5, 100), (10, 5));
/// assert_eq!(clamp_outliers(80, 50, 100), (80, 20));
/// assert_eq!(clamp_outliers(150, 5, 100), (100, 0));
/// ```
#[must_use]
pub const fn clamp_outliers(left: usize, right: usize, len: usize) -> (usize, usize) {
    let left = if left > len { len } else { left };
    let remaining = len - left;
    let right = if right > remaining { remaining } else { right };
    (left, right)
}

/// What happened to an alignment offered to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// First alignment for this id.
    Inserted,
    /// Replaced an earlier alignment that was not longer.
    Replaced,
    /// An earlier, longer alignment was kept.
    Kept,
}

/// Arena of [`ReadRecord`]s keyed by read id.
#[derive(Debug, Default)]
pub struct ReadStore {
    index: AHashMap<String, usize>,
    reads: Vec<ReadRecord>,
}

impl ReadStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers an alignment for its read id.
    ///
    /// The stored alignment is replaced when the new one's alignment length is greater than
    /// or equal to the stored one's, so the last of several equally long alignments wins.
    pub fn upsert_alignment(&mut self, alignment: AlignmentRecord) -> Upsert {
        if let Some(&i) = self.index.get(&alignment.id) {
            let read = &mut self.reads[i];
            if alignment.alignment_length >= read.alignment_length {
                read.cigar = alignment.cigar;
                read.strand = alignment.strand;
                read.alignment_length = alignment.alignment_length;
                Upsert::Replaced
            } else {
                Upsert::Kept
            }
        } else {
            self.index.insert(alignment.id.clone(), self.reads.len());
            self.reads.push(ReadRecord::from_alignment(alignment));
            Upsert::Inserted
        }
    }

    /// Index of a read id.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Looks up a read by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ReadRecord> {
        self.index_of(id).map(|i| &self.reads[i])
    }

    /// Looks up a read by id, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ReadRecord> {
        self.index_of(id).map(|i| &mut self.reads[i])
    }

    /// Read at an arena index.
    #[must_use]
    pub fn read(&self, index: usize) -> Option<&ReadRecord> {
        self.reads.get(index)
    }

    /// All reads in insertion order.
    #[must_use]
    pub fn reads(&self) -> &[ReadRecord] {
        &self.reads
    }

    /// All reads in insertion order, mutably.
    pub fn reads_mut(&mut self) -> &mut [ReadRecord] {
        &mut self.reads
    }

    /// Number of distinct read ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

/// How to treat reads present in only one of the two inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MismatchPolicy {
    /// Skip the read and count it.
    #[default]
    Skip,
    /// Abort the run on the first such read.
    Fail,
}

/// Counters collected while merging sequences into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Sequence records seen.
    pub sequences: u64,
    /// Sequence records merged into an aligned read.
    pub merged: u64,
    /// Sequence records whose id had no alignment.
    pub missing_alignment: u64,
    /// Aligned reads that never received a sequence.
    pub missing_sequence: u64,
    /// Sequence records whose quality length differed from the sequence length.
    pub malformed: u64,
    /// Sequence records for an id that had already been merged.
    pub duplicates: u64,
}

/// Joins sequence records onto the aligned reads of a [`ReadStore`].
#[derive(Debug, Default)]
pub struct ReadMerger {
    policy: MismatchPolicy,
    stats: MergeStats,
}

impl ReadMerger {
    /// Creates a merger with the given id-mismatch policy.
    #[must_use]
    pub fn new(policy: MismatchPolicy) -> Self {
        Self { policy, stats: MergeStats::default() }
    }

    /// Merges one sequence record.
    ///
    /// # Errors
    ///
    /// With [`MismatchPolicy::Fail`], returns [`LrtrimError::IdMismatch`] if the id has no
    /// alignment.
    pub fn merge(
        &mut self,
        store: &mut ReadStore,
        id: &str,
        sequence: &[u8],
        quality: &[u8],
    ) -> Result<()> {
        self.stats.sequences += 1;

        if sequence.len() != quality.len() {
            warn!(
                "Skipping read '{id}': sequence length {} differs from quality length {}",
                sequence.len(),
                quality.len()
            );
            self.stats.malformed += 1;
            return Ok(());
        }

        let Some(read) = store.get_mut(id) else {
            self.stats.missing_alignment += 1;
            return match self.policy {
                MismatchPolicy::Skip => Ok(()),
                MismatchPolicy::Fail => Err(LrtrimError::IdMismatch {
                    id: id.to_string(),
                    present_in: "sequence",
                    missing_from: "alignment",
                }),
            };
        };

        if read.merged {
            self.stats.duplicates += 1;
        } else {
            self.stats.merged += 1;
        }
        read.sequence.clear();
        read.sequence.extend_from_slice(sequence);
        read.quality.clear();
        read.quality.extend_from_slice(quality);
        read.merged = true;
        Ok(())
    }

    /// Counts aligned reads that never received a sequence and returns the final counters.
    ///
    /// # Errors
    ///
    /// With [`MismatchPolicy::Fail`], returns [`LrtrimError::IdMismatch`] naming the first
    /// aligned read that has no sequence.
    pub fn finish(mut self, store: &ReadStore) -> Result<MergeStats> {
        let mut unmerged = store.reads().iter().filter(|r| !r.merged);
        if self.policy == MismatchPolicy::Fail {
            if let Some(read) = unmerged.next() {
                return Err(LrtrimError::IdMismatch {
                    id: read.id.clone(),
                    present_in: "alignment",
                    missing_from: "sequence",
                });
            }
        }
        self.stats.missing_sequence = unmerged.count() as u64;
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn store_with(ids: &[&str]) -> ReadStore {
        let mut store = ReadStore::new();
        for id in ids {
            store.upsert_alignment(AlignmentRecord::new(*id, "10M", 0, 10));
        }
        store
    }

    #[rstest]
    #[case(0, 0, 10, (0, 0))]
    #[case(3, 4, 10, (3, 4))]
    #[case(6, 6, 10, (6, 4))]
    #[case(12, 1, 10, (10, 0))]
    #[case(0, 12, 10, (0, 10))]
    #[case(5, 5, 0, (0, 0))]
    fn test_clamp_outliers(
        #[case] left: usize,
        #[case] right: usize,
        #[case] len: usize,
        #[case] expected: (usize, usize),
    ) {
        let (l, r) = clamp_outliers(left, right, len);
        assert_eq!((l, r), expected);
        assert!(l + r <= len);
    }

    #[test]
    fn test_upsert_outcomes() {
        let mut store = ReadStore::new();
        assert_eq!(store.upsert_alignment(AlignmentRecord::new("r", "50M", 0, 50)), Upsert::Inserted);
        assert_eq!(store.upsert_alignment(AlignmentRecord::new("r", "80M", 0, 80)), Upsert::Replaced);
        assert_eq!(store.upsert_alignment(AlignmentRecord::new("r", "20M", 0, 20)), Upsert::Kept);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("r").unwrap().alignment_length, 80);
    }

    #[test]
    fn test_index_is_stable() {
        let store = store_with(&["a", "b", "c"]);
        assert_eq!(store.index_of("b"), Some(1));
        assert_eq!(store.read(2).unwrap().id, "c");
        assert!(store.index_of("z").is_none());
    }

    #[test]
    fn test_merge_sets_sequence() {
        let mut store = store_with(&["a", "b"]);
        let mut merger = ReadMerger::new(MismatchPolicy::Skip);
        merger.merge(&mut store, "a", b"ACGT", b"IIII").unwrap();
        let stats = merger.finish(&store).unwrap();

        let read = store.get("a").unwrap();
        assert_eq!(read.sequence, b"ACGT");
        assert_eq!(read.quality, b"IIII");
        assert!(read.merged);
        assert_eq!(stats.merged, 1);
        assert_eq!(stats.missing_sequence, 1);
    }

    #[test]
    fn test_merge_skips_unknown_ids() {
        let mut store = store_with(&["a"]);
        let mut merger = ReadMerger::new(MismatchPolicy::Skip);
        merger.merge(&mut store, "zzz", b"ACGT", b"IIII").unwrap();
        merger.merge(&mut store, "a", b"ACGT", b"IIII").unwrap();
        let stats = merger.finish(&store).unwrap();
        assert_eq!(stats.missing_alignment, 1);
        assert_eq!(stats.missing_sequence, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_fail_policy_on_unknown_id() {
        let mut store = store_with(&["a"]);
        let mut merger = ReadMerger::new(MismatchPolicy::Fail);
        let err = merger.merge(&mut store, "zzz", b"ACGT", b"IIII").unwrap_err();
        assert!(err.to_string().contains("'zzz'"));
    }

    #[test]
    fn test_merge_fail_policy_on_missing_sequence() {
        let mut store = store_with(&["a", "b"]);
        let mut merger = ReadMerger::new(MismatchPolicy::Fail);
        merger.merge(&mut store, "a", b"ACGT", b"IIII").unwrap();
        let err = merger.finish(&store).unwrap_err();
        assert!(err.to_string().contains("'b'"));
        assert!(err.to_string().contains("missing from the sequence input"));
    }

    #[test]
    fn test_merge_rejects_length_mismatch() {
        let mut store = store_with(&["a"]);
        let mut merger = ReadMerger::new(MismatchPolicy::Fail);
        merger.merge(&mut store, "a", b"ACGT", b"II").unwrap();
        assert!(!store.get("a").unwrap().merged);
        assert_eq!(merger.stats.malformed, 1);
    }

    #[test]
    fn test_merge_counts_duplicates() {
        let mut store = store_with(&["a"]);
        let mut merger = ReadMerger::new(MismatchPolicy::Skip);
        merger.merge(&mut store, "a", b"ACGT", b"IIII").unwrap();
        merger.merge(&mut store, "a", b"GG", b"II").unwrap();
        let stats = merger.finish(&store).unwrap();
        assert_eq!(stats.duplicates, 1);
        assert_eq!(store.get("a").unwrap().sequence, b"GG");
    }

    #[test]
    fn test_body_after_set_outliers() {
        let mut read = ReadRecord {
            sequence: b"AAACCCCGG".to_vec(),
            quality: b"123456789".to_vec(),
            ..ReadRecord::default()
        };
        read.set_outliers(3, 2);
        assert_eq!(read.body(), (&b"CCCC"[..], &b"4567"[..]));

        read.set_outliers(20, 20);
        assert_eq!((read.left_outlier, read.right_outlier), (9, 0));
        assert!(read.body().0.is_empty());
    }
}
