//! DNA sequence utilities.
//!
//! Adapter constructs are searched in four orientations (original, reverse, complement and
//! reverse complement), so all four transforms are provided here for byte sequences.

/// Complements a single DNA base, normalizing to uppercase.
///
/// Returns the Watson-Crick complement: A<->T, C<->G. `N`, IUPAC ambiguity codes and other
/// bytes are returned unchanged.
#[inline]
#[must_use]
pub const fn complement_base(base: u8) -> u8 {
    match base {
        b'A' | b'a' => b'T',
        b'T' | b't' => b'A',
        b'C' | b'c' => b'G',
        b'G' | b'g' => b'C',
        _ => base,
    }
}

/// Complements a DNA sequence without reversing it.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::dna::complement;
///
/// assert_eq!(complement(b"AACG"), b"TTGC".to_vec());
/// ```
#[must_use]
pub fn complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&base| complement_base(base)).collect()
}

/// Reverses a sequence (or a quality string) without complementing it.
#[must_use]
pub fn reverse(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().copied().collect()
}

/// Reverse complements a DNA sequence.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::dna::reverse_complement;
///
/// assert_eq!(reverse_complement(b"ACGT"), b"ACGT".to_vec());
/// assert_eq!(reverse_complement(b"AACGN"), b"NCGTT".to_vec());
/// ```
#[must_use]
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&base| complement_base(base)).collect()
}

/// Whether every byte is one of `ACGTN` in either case.
#[must_use]
pub fn is_dna(seq: &[u8]) -> bool {
    seq.iter().all(|b| matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'N'))
}
