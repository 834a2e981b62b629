//! CIGAR string utilities.
//!
//! Boundary detection works on the textual CIGAR (the clip guards are defined in terms of
//! character positions), so this module parses CIGAR strings into `(Kind, len)` pairs, pulls
//! out the leading/trailing tokens, and decodes a CIGAR into a per-read-base coverage mask.
//! Operation kinds are the noodles [`Kind`] values so records read through noodles and
//! CIGARs parsed from text share one vocabulary.

use std::fmt::Write;

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::errors::{LrtrimError, Result};

/// The CIGAR string used by SAM for reads without an alignment.
pub const UNMAPPED_CIGAR: &str = "*";

/// Converts a CIGAR operation kind to its SAM character.
#[must_use]
pub const fn kind_to_char(kind: Kind) -> char {
    match kind {
        Kind::Match => 'M',
        Kind::Insertion => 'I',
        Kind::Deletion => 'D',
        Kind::Skip => 'N',
        Kind::SoftClip => 'S',
        Kind::HardClip => 'H',
        Kind::Pad => 'P',
        Kind::SequenceMatch => '=',
        Kind::SequenceMismatch => 'X',
    }
}

/// Converts a SAM CIGAR character to an operation kind.
#[must_use]
pub const fn kind_from_char(c: u8) -> Option<Kind> {
    match c {
        b'M' => Some(Kind::Match),
        b'I' => Some(Kind::Insertion),
        b'D' => Some(Kind::Deletion),
        b'N' => Some(Kind::Skip),
        b'S' => Some(Kind::SoftClip),
        b'H' => Some(Kind::HardClip),
        b'P' => Some(Kind::Pad),
        b'=' => Some(Kind::SequenceMatch),
        b'X' => Some(Kind::SequenceMismatch),
        _ => None,
    }
}

/// Returns true for clip operations (`S` or `H`).
#[inline]
#[must_use]
pub const fn is_clip(kind: Kind) -> bool {
    matches!(kind, Kind::SoftClip | Kind::HardClip)
}

/// Renders noodles CIGAR operations as a SAM CIGAR string (`*` when empty).
#[must_use]
pub fn ops_to_string(ops: &[Op]) -> String {
    if ops.is_empty() {
        return String::from(UNMAPPED_CIGAR);
    }

    let mut result = String::with_capacity(ops.len() * 4);
    for op in ops {
        let _ = write!(result, "{}{}", op.len(), kind_to_char(op.kind()));
    }
    result
}

/// Number of read bases covered by the aligned portion of a CIGAR (`M`, `I`, `=`, `X`).
///
/// This is the length used to pick between multiple alignments of the same read.
#[must_use]
pub fn query_alignment_length(ops: &[Op]) -> usize {
    ops.iter()
        .filter(|op| {
            matches!(
                op.kind(),
                Kind::Match | Kind::Insertion | Kind::SequenceMatch | Kind::SequenceMismatch
            )
        })
        .map(|op| op.len())
        .sum()
}

/// Parses a SAM CIGAR string into `(kind, length)` pairs.
///
/// The unmapped sentinel `*` parses to an empty vector.
///
/// # Errors
///
/// Returns [`LrtrimError::InvalidCigar`] if the string contains an unknown operation, an
/// operation with no length, or trailing digits with no operation.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::cigar::parse_cigar;
/// use noodles::sam::alignment::record::cigar::op::Kind;
///
/// let ops = parse_cigar("5S10M2D3M").unwrap();
/// assert_eq!(ops[0], (Kind::SoftClip, 5));
/// assert_eq!(ops.len(), 4);
/// assert!(parse_cigar("*").unwrap().is_empty());
/// ```
pub fn parse_cigar(cigar: &str) -> Result<Vec<(Kind, usize)>> {
    if cigar == UNMAPPED_CIGAR {
        return Ok(Vec::new());
    }

    let invalid = |reason: String| LrtrimError::InvalidCigar { cigar: cigar.to_string(), reason };

    let mut ops = Vec::new();
    let mut len: Option<usize> = None;
    for (i, &c) in cigar.as_bytes().iter().enumerate() {
        if c.is_ascii_digit() {
            let digit = usize::from(c - b'0');
            let next = len
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| invalid(format!("operation length overflows at offset {i}")))?;
            len = Some(next);
        } else {
            let kind = kind_from_char(c)
                .ok_or_else(|| invalid(format!("unknown operation '{}'", c as char)))?;
            let n = len.take().ok_or_else(|| {
                invalid(format!("operation '{}' at offset {i} has no length", c as char))
            })?;
            ops.push((kind, n));
        }
    }

    if len.is_some() {
        return Err(invalid("trailing length with no operation".to_string()));
    }
    Ok(ops)
}

/// A single run-length token at one end of a CIGAR string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarToken {
    /// The operation kind.
    pub kind: Kind,
    /// The operation length.
    pub len: usize,
    /// Number of characters in the numeric prefix.
    pub digits: usize,
    /// Byte offset of the token's first character within the CIGAR string.
    pub start: usize,
}

/// Returns the first token of a CIGAR string, or `None` if it does not start with a valid
/// `<digits><op>` token.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::cigar::leading_token;
/// use noodles::sam::alignment::record::cigar::op::Kind;
///
/// let token = leading_token("15S100M10S").unwrap();
/// assert_eq!((token.kind, token.len, token.digits), (Kind::SoftClip, 15, 2));
/// ```
#[must_use]
pub fn leading_token(cigar: &str) -> Option<CigarToken> {
    let bytes = cigar.as_bytes();
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits >= bytes.len() {
        return None;
    }
    let kind = kind_from_char(bytes[digits])?;
    let len = cigar[..digits].parse().ok()?;
    Some(CigarToken { kind, len, digits, start: 0 })
}

/// Returns the last token of a CIGAR string, or `None` if it does not end with a valid
/// `<digits><op>` token.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::cigar::trailing_token;
/// use noodles::sam::alignment::record::cigar::op::Kind;
///
/// let token = trailing_token("15S100M10S").unwrap();
/// assert_eq!((token.kind, token.len, token.start), (Kind::SoftClip, 10, 7));
/// ```
#[must_use]
pub fn trailing_token(cigar: &str) -> Option<CigarToken> {
    let bytes = cigar.as_bytes();
    let (&last, head) = bytes.split_last()?;
    let kind = kind_from_char(last)?;
    let digits = head.iter().rev().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let start = head.len() - digits;
    let len = cigar[start..head.len()].parse().ok()?;
    Some(CigarToken { kind, len, digits, start })
}

/// Decodes a CIGAR string into a per-base coverage mask in read coordinates.
///
/// Every base of an aligned operation (`M`, `=`, `X`) becomes `1`. Reference-only operations
/// (`D`, `N`) contribute nothing because they have no read bases. Every other operation
/// (`I`, `S`, `H`, `P`) contributes `0` per unit.
///
/// # Errors
///
/// Returns an error if the CIGAR cannot be parsed.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::cigar::coverage_mask;
///
/// let mask = coverage_mask("2S3M1D1I").unwrap();
/// assert_eq!(mask, vec![0, 0, 1, 1, 1, 0]);
/// ```
pub fn coverage_mask(cigar: &str) -> Result<Vec<u8>> {
    let ops = parse_cigar(cigar)?;
    let capacity = ops
        .iter()
        .filter(|(kind, _)| !matches!(kind, Kind::Deletion | Kind::Skip))
        .map(|(_, len)| len)
        .sum();

    let mut mask = Vec::with_capacity(capacity);
    for (kind, len) in ops {
        match kind {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                mask.resize(mask.len() + len, 1);
            }
            Kind::Deletion | Kind::Skip => {}
            Kind::Insertion | Kind::SoftClip | Kind::HardClip | Kind::Pad => {
                mask.resize(mask.len() + len, 0);
            }
        }
    }
    Ok(mask)
}
