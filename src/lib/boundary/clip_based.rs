//! Clip-annotation boundary finder.
//!
//! Uses the aligner's own soft/hard clips at each end of the CIGAR as the outlier, padded by a
//! fixed number of bases. A clip token whose length field is implausibly long for an end clip
//! is ignored, which errs toward under-trimming.

use crate::cigar::{is_clip, leading_token, trailing_token};
use crate::errors::Result;

use super::{FindBoundary, OutlierBoundary};

/// Maximum number of digits in the length of a leading clip.
pub const MAX_LEADING_CLIP_DIGITS: usize = 6;

/// A trailing clip token must start within this many characters of the end of the CIGAR.
pub const TRAILING_CLIP_WINDOW: usize = 5;

/// Default bases added to each non-zero clip.
pub const DEFAULT_PADDING: usize = 5;

/// Configuration for [`ClipBasedFinder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipBasedConfig {
    /// Bases added to each non-zero clip length.
    pub padding: usize,
}

impl Default for ClipBasedConfig {
    fn default() -> Self {
        Self { padding: DEFAULT_PADDING }
    }
}

impl ClipBasedConfig {
    /// Validates the configuration. Any padding is acceptable.
    ///
    /// # Errors
    ///
    /// Never returns an error.
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Boundary finder that reads outliers from end clips.
#[derive(Debug, Clone, Default)]
pub struct ClipBasedFinder {
    config: ClipBasedConfig,
}

impl ClipBasedFinder {
    /// Creates a finder.
    #[must_use]
    pub fn new(config: ClipBasedConfig) -> Self {
        Self { config }
    }

    /// Creates a finder after validating its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn try_new(config: ClipBasedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Raw clip length at the start of the CIGAR, 0 if there is no acceptable clip.
    #[must_use]
    pub fn leading_clip(cigar: &str) -> usize {
        match leading_token(cigar) {
            Some(t) if is_clip(t.kind) && t.digits <= MAX_LEADING_CLIP_DIGITS => t.len,
            _ => 0,
        }
    }

    /// Raw clip length at the end of the CIGAR, 0 if there is no acceptable clip.
    #[must_use]
    pub fn trailing_clip(cigar: &str) -> usize {
        match trailing_token(cigar) {
            Some(t) if is_clip(t.kind) && cigar.len() - t.start <= TRAILING_CLIP_WINDOW => t.len,
            _ => 0,
        }
    }

    fn pad(&self, raw: usize) -> usize {
        if raw == 0 { 0 } else { raw + self.config.padding }
    }
}

impl FindBoundary for ClipBasedFinder {
    fn genomic_outliers(&self, cigar: &str) -> Result<OutlierBoundary> {
        let left = self.pad(Self::leading_clip(cigar));
        let right = self.pad(Self::trailing_clip(cigar));
        Ok(OutlierBoundary::new(left, right))
    }

    fn name(&self) -> &'static str {
        "clip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("15S100M10S", 5, (20, 15))]
    #[case("15S100M10S", 0, (15, 10))]
    #[case("100M", 5, (0, 0))]
    #[case("7H93M", 3, (10, 0))]
    #[case("93M2H", 3, (0, 5))]
    #[case("20I80M", 5, (0, 0))]
    #[case("*", 5, (0, 0))]
    #[case("", 5, (0, 0))]
    fn test_genomic_outliers(
        #[case] cigar: &str,
        #[case] padding: usize,
        #[case] expected: (usize, usize),
    ) {
        let finder = ClipBasedFinder::new(ClipBasedConfig { padding });
        let b = finder.genomic_outliers(cigar).unwrap();
        assert_eq!((b.left, b.right), expected);
    }

    #[rstest]
    #[case("999999S10M", 999_999)]
    #[case("1000000S10M", 0)]
    fn test_leading_guard(#[case] cigar: &str, #[case] expected: usize) {
        assert_eq!(ClipBasedFinder::leading_clip(cigar), expected);
    }

    #[rstest]
    #[case("10M9999S", 9_999)]
    #[case("10M10000S", 0)]
    #[case("10M5S", 5)]
    fn test_trailing_guard(#[case] cigar: &str, #[case] expected: usize) {
        assert_eq!(ClipBasedFinder::trailing_clip(cigar), expected);
    }

    #[test]
    fn test_default_padding() {
        assert_eq!(ClipBasedConfig::default().padding, DEFAULT_PADDING);
        assert!(ClipBasedFinder::try_new(ClipBasedConfig::default()).is_ok());
    }

    #[test]
    fn test_name() {
        assert_eq!(ClipBasedFinder::default().name(), "clip");
    }
}
