//! In-process Illumina-style adapter clipping.
//!
//! Each adapter construct is located in the fragment with a seeded banded alignment: exact
//! k-mer matches between fragment and construct are found with `bio`'s sparse index and
//! extended along their diagonals, and the banded aligner then aligns the construct around
//! them. Two alignments are tried per construct: the whole construct anywhere in the
//! fragment, and a prefix of the construct running off the fragment's 3' end. The construct
//! must be aligned from its first base, the first [`SEED_LENGTH`] construct bases may hold at
//! most `seed_mismatches` errors, and the alignment score must reach the construct's
//! threshold. The fragment is clipped at the earliest accepted alignment start.
//!
//! Scores are in tenths: a match scores [`MATCH_SCORE`] (`10 * log10(4)`, rounded) and a
//! threshold of `t` means a score of at least `10 * t`. Mismatches and gap bases cost
//! [`mismatch_penalty`], which is derived from the seed-mismatch limit: a seed holding one
//! more error than allowed scores below zero.
//!
//! Constructs that read in the adapter's own direction relative to the read (as given,
//! complemented) use the simple-clip threshold; constructs that read backwards relative to the
//! read (reversed, reverse complemented) use the stricter palindrome threshold. A fragment
//! that was reversed before clipping flips which constructs are which.

use bio::alignment::pairwise::banded::Aligner;
use bio::alignment::pairwise::{MIN_SCORE, MatchParams, Scoring};
use bio::alignment::sparse::{expand_kmer_matches, find_kmer_matches_seq2_hashed, hash_kmers};
use bio::alignment::{Alignment, AlignmentOperation};

use crate::errors::{LrtrimError, Result};

use super::Adapters;

/// Number of leading construct bases checked against the seed-mismatch limit.
pub const SEED_LENGTH: usize = 16;

/// Default maximum errors in the seed.
pub const DEFAULT_SEED_MISMATCHES: usize = 2;

/// Default score threshold for constructs reversed relative to the read.
pub const DEFAULT_PALINDROME_THRESHOLD: u32 = 30;

/// Default score threshold for constructs in the adapter's own direction.
pub const DEFAULT_SIMPLE_THRESHOLD: u32 = 10;

/// Score of one matching base, in tenths.
pub const MATCH_SCORE: i32 = 6;

/// Thresholds are given in whole units; alignment scores are in tenths.
const SCORE_SCALE: i32 = 10;

/// Length of the exact k-mers used to seed alignments.
const KMER_LEN: usize = 6;

/// Half-width of the alignment band around the seeds.
const BAND_WIDTH: usize = 10;

/// Penalty for one mismatch or gap base: the seed's full match score split over one more
/// error than the seed may hold.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::trimmer::illumina_clip::mismatch_penalty;
///
/// assert_eq!(mismatch_penalty(2), 32);
/// assert_eq!(mismatch_penalty(0), 96);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const fn mismatch_penalty(seed_mismatches: usize) -> i32 {
    let allowed = if seed_mismatches >= SEED_LENGTH { SEED_LENGTH } else { seed_mismatches };
    (SEED_LENGTH as i32 * MATCH_SCORE) / (allowed as i32 + 1)
}

/// Configuration for [`IlluminaClipper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IlluminaClipConfig {
    /// Maximum errors allowed in the seed.
    pub seed_mismatches: usize,
    /// Score threshold for constructs reversed relative to the read.
    pub palindrome_threshold: u32,
    /// Score threshold for constructs in the adapter's own direction.
    pub simple_threshold: u32,
}

impl Default for IlluminaClipConfig {
    fn default() -> Self {
        Self {
            seed_mismatches: DEFAULT_SEED_MISMATCHES,
            palindrome_threshold: DEFAULT_PALINDROME_THRESHOLD,
            simple_threshold: DEFAULT_SIMPLE_THRESHOLD,
        }
    }
}

impl IlluminaClipConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold is zero or the seed mismatches are not below
    /// [`SEED_LENGTH`].
    pub fn validate(&self) -> Result<()> {
        if self.seed_mismatches >= SEED_LENGTH {
            return Err(LrtrimError::InvalidParameter {
                parameter: "seed-mismatches".to_string(),
                reason: format!("must be less than the seed length ({SEED_LENGTH})"),
            });
        }
        for (name, value) in [
            ("palindrome-threshold", self.palindrome_threshold),
            ("simple-threshold", self.simple_threshold),
        ] {
            if value == 0 {
                return Err(LrtrimError::InvalidParameter {
                    parameter: name.to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn min_score(threshold: u32) -> i32 {
    i32::try_from(threshold).unwrap_or(i32::MAX).saturating_mul(SCORE_SCALE)
}

#[derive(Debug, Clone)]
struct ScoredConstruct {
    sequence: Vec<u8>,
    reversed: bool,
}

/// Clips adapters from the 3' end of fragments.
#[derive(Debug, Clone)]
pub struct IlluminaClipper {
    seed_mismatches: usize,
    mismatch_penalty: i32,
    palindrome_score: i32,
    simple_score: i32,
    constructs: Vec<ScoredConstruct>,
}

impl IlluminaClipper {
    /// Creates a clipper searching for all eight constructs of `adapters`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: IlluminaClipConfig, adapters: &Adapters) -> Result<Self> {
        config.validate()?;
        let constructs = adapters
            .constructs()
            .into_iter()
            .map(|c| ScoredConstruct { reversed: c.orientation.is_reversed(), sequence: c.sequence })
            .collect();
        Ok(Self {
            seed_mismatches: config.seed_mismatches,
            mismatch_penalty: mismatch_penalty(config.seed_mismatches),
            palindrome_score: min_score(config.palindrome_threshold),
            simple_score: min_score(config.simple_threshold),
            constructs,
        })
    }

    /// Number of leading bases of `seq` to keep: the earliest adapter start over all
    /// constructs, or the whole fragment when no construct matches.
    #[must_use]
    pub fn clip(&self, seq: &[u8]) -> usize {
        self.clip_oriented(seq, false)
    }

    /// As [`clip`](Self::clip), for a fragment that is the reverse of the read's bases.
    #[must_use]
    pub fn clip_reversed(&self, seq: &[u8]) -> usize {
        self.clip_oriented(seq, true)
    }

    fn clip_oriented(&self, seq: &[u8], fragment_reversed: bool) -> usize {
        let seq = seq.to_ascii_uppercase();
        self.constructs
            .iter()
            .filter_map(|c| {
                let min_score =
                    if c.reversed == fragment_reversed { self.simple_score } else { self.palindrome_score };
                self.adapter_start(&c.sequence, min_score, &seq)
            })
            .min()
            .unwrap_or(seq.len())
    }

    /// Start of the earliest accepted alignment of `adapter` in `seq`, if any.
    fn adapter_start(&self, adapter: &[u8], min_score: i32, seq: &[u8]) -> Option<usize> {
        let kmers = hash_kmers(adapter, KMER_LEN);
        let seeds = find_kmer_matches_seq2_hashed(seq, &kmers, KMER_LEN);
        if seeds.is_empty() {
            return None;
        }
        let seeds = expand_kmer_matches(seq, adapter, KMER_LEN, &seeds, self.seed_mismatches);

        [true, false]
            .into_iter()
            .filter_map(|whole_adapter| {
                let mut aligner = Aligner::with_capacity_and_scoring(
                    seq.len(),
                    adapter.len(),
                    self.scoring(whole_adapter),
                    KMER_LEN,
                    BAND_WIDTH,
                );
                let alignment = aligner.custom_with_matches(seq, adapter, &seeds);
                let accepted =
                    alignment.score >= min_score && seed_errors(&alignment) <= self.seed_mismatches;
                accepted.then_some(alignment.xstart)
            })
            .min()
    }

    /// Scoring with the fragment (`x`) free to extend past the construct on its 5' side.
    ///
    /// With `whole_adapter` the construct (`y`) must align completely and the fragment may
    /// continue after it; otherwise the alignment must reach the fragment's end and the
    /// construct may stop early.
    fn scoring(&self, whole_adapter: bool) -> Scoring<MatchParams> {
        let penalty = -self.mismatch_penalty;
        let scoring = Scoring::from_scores(penalty, penalty, MATCH_SCORE, penalty)
            .xclip_prefix(0)
            .yclip_prefix(MIN_SCORE);
        if whole_adapter {
            scoring.xclip_suffix(0).yclip_suffix(MIN_SCORE)
        } else {
            scoring.xclip_suffix(MIN_SCORE).yclip_suffix(0)
        }
    }
}

/// Mismatches and gaps within the first [`SEED_LENGTH`] construct bases of an alignment.
fn seed_errors(alignment: &Alignment) -> usize {
    let mut adapter_pos = 0;
    let mut errors = 0;
    for op in &alignment.operations {
        if adapter_pos >= SEED_LENGTH {
            break;
        }
        match op {
            AlignmentOperation::Match => adapter_pos += 1,
            AlignmentOperation::Subst | AlignmentOperation::Del => {
                errors += 1;
                adapter_pos += 1;
            }
            AlignmentOperation::Ins => errors += 1,
            AlignmentOperation::Yclip(len) => adapter_pos += len,
            AlignmentOperation::Xclip(_) => {}
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::{reverse, reverse_complement};
    use rstest::rstest;

    const RT: &str = "ACGTTGCAAGGCTTAAGCCT";
    const SS: &str = "TTTCTGTTGGTGCTGATATTGC";
    const LONG_RT: &str = "ACGTTGCAAGGCTTAAGCCTGATCCTAGGTCAATGCCATG";

    fn clipper(config: IlluminaClipConfig) -> IlluminaClipper {
        IlluminaClipper::new(config, &Adapters::new(RT, SS).unwrap()).unwrap()
    }

    fn long_clipper(seed_mismatches: usize) -> IlluminaClipper {
        let config = IlluminaClipConfig { seed_mismatches, ..IlluminaClipConfig::default() };
        IlluminaClipper::new(config, &Adapters::new(LONG_RT, SS).unwrap()).unwrap()
    }

    /// `GGGGG` followed by the long adapter with a mismatch at each of `positions`.
    fn with_mismatches(positions: &[usize]) -> Vec<u8> {
        let mut adapter = LONG_RT.as_bytes().to_vec();
        for &i in positions {
            adapter[i] = if adapter[i] == b'A' { b'C' } else { b'A' };
        }
        let mut seq = b"GGGGG".to_vec();
        seq.extend_from_slice(&adapter);
        seq
    }

    #[test]
    fn test_match_score_is_tenths_of_log10_4() {
        assert!((f64::from(MATCH_SCORE) - 10.0 * 4f64.log10()).abs() < 0.5);
    }

    #[rstest]
    #[case(0, 96)]
    #[case(1, 48)]
    #[case(2, 32)]
    #[case(3, 24)]
    fn test_mismatch_penalty(#[case] seed_mismatches: usize, #[case] expected: i32) {
        assert_eq!(mismatch_penalty(seed_mismatches), expected);
    }

    #[test]
    fn test_clips_full_adapter() {
        let seq = format!("GGGGG{RT}CCC");
        assert_eq!(clipper(IlluminaClipConfig::default()).clip(seq.as_bytes()), 5);
    }

    #[test]
    fn test_clips_lowercase_fragment() {
        let seq = format!("ggggg{}ccc", RT.to_ascii_lowercase());
        assert_eq!(clipper(IlluminaClipConfig::default()).clip(seq.as_bytes()), 5);
    }

    #[test]
    fn test_clips_partial_adapter_at_end() {
        // 18 bases score 108 >= 100
        let seq = format!("CAGCAGCAG{}", &SS[..18]);
        assert_eq!(clipper(IlluminaClipConfig::default()).clip(seq.as_bytes()), 9);
    }

    #[test]
    fn test_short_partial_adapter_is_kept() {
        // 10 bases score 60 < 100
        let seq = format!("CAGCAGCAG{}", &SS[..10]);
        assert_eq!(clipper(IlluminaClipConfig::default()).clip(seq.as_bytes()), seq.len());
    }

    #[test]
    fn test_adapter_free_fragment_is_kept() {
        let seq = b"GAGAGAGAGAGAGAGAGAGAGAGAGA";
        assert_eq!(clipper(IlluminaClipConfig::default()).clip(seq), seq.len());
    }

    #[test]
    fn test_seed_mismatch_limit() {
        let seq = with_mismatches(&[1, 3]);
        assert_eq!(long_clipper(2).clip(&seq), 5);
        assert_eq!(long_clipper(1).clip(&seq), seq.len());
    }

    #[test]
    fn test_mismatch_penalty_follows_seed_limit() {
        // Two mismatches past the seed: 38 * 6 - 2 * 32 = 164 passes, 38 * 6 - 2 * 96 = 36 does not.
        let seq = with_mismatches(&[20, 27]);
        assert_eq!(long_clipper(2).clip(&seq), 5);
        assert_eq!(long_clipper(0).clip(&seq), seq.len());
    }

    #[test]
    fn test_reversed_constructs_use_palindrome_threshold() {
        let rev = String::from_utf8(reverse(RT.as_bytes())).unwrap();
        let seq = format!("GGGGG{rev}");

        // 20 bases score 120: enough for 100, not for 300.
        assert_eq!(clipper(IlluminaClipConfig::default()).clip(seq.as_bytes()), seq.len());

        let config = IlluminaClipConfig { palindrome_threshold: 10, ..IlluminaClipConfig::default() };
        assert_eq!(clipper(config).clip(seq.as_bytes()), 5);
    }

    #[test]
    fn test_reversed_fragment_flips_thresholds() {
        // An adapter as given in the read appears reversed once the fragment is reversed.
        let rev = String::from_utf8(reverse(RT.as_bytes())).unwrap();
        let seq = format!("GGGGG{rev}");
        assert_eq!(clipper(IlluminaClipConfig::default()).clip_reversed(seq.as_bytes()), 5);

        let fwd = format!("GGGGG{RT}");
        assert_eq!(clipper(IlluminaClipConfig::default()).clip_reversed(fwd.as_bytes()), fwd.len());
    }

    #[test]
    fn test_earliest_construct_wins() {
        let rc = String::from_utf8(reverse_complement(SS.as_bytes())).unwrap();
        let seq = format!("AAAAA{RT}{rc}");
        let config = IlluminaClipConfig { palindrome_threshold: 10, ..IlluminaClipConfig::default() };
        assert_eq!(clipper(config).clip(seq.as_bytes()), 5);
    }

    #[test]
    fn test_empty_fragment() {
        assert_eq!(clipper(IlluminaClipConfig::default()).clip(b""), 0);
    }

    #[rstest]
    #[case(IlluminaClipConfig { seed_mismatches: 16, ..IlluminaClipConfig::default() })]
    #[case(IlluminaClipConfig { palindrome_threshold: 0, ..IlluminaClipConfig::default() })]
    #[case(IlluminaClipConfig { simple_threshold: 0, ..IlluminaClipConfig::default() })]
    fn test_invalid_config(#[case] config: IlluminaClipConfig) {
        assert!(config.validate().is_err());
    }
}
