//! Alignment-density boundary finder.
//!
//! The CIGAR is decoded into a per-base coverage mask (see [`coverage_mask`]) and a window is
//! slid inward from each end; the outlier ends where the first window reaches the configured
//! fraction of aligned bases. This tolerates alignments whose end clips are missing or
//! unreliable.

use crate::cigar::coverage_mask;
use crate::errors::Result;
use crate::validation::{validate_fraction, validate_positive};

use super::{FindBoundary, OutlierBoundary};

/// Default window length in bases.
pub const DEFAULT_WINDOW: usize = 20;

/// Default fraction of aligned bases a window must reach.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Configuration for [`SlidingWindowFinder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlidingWindowConfig {
    /// Window length in bases; must be positive.
    pub window: usize,
    /// Minimum fraction of aligned bases in a window, in `(0, 1]`.
    pub threshold: f64,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self { window: DEFAULT_WINDOW, threshold: DEFAULT_THRESHOLD }
    }
}

impl SlidingWindowConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the window is zero or the threshold is outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.window, "window")?;
        validate_fraction(self.threshold, "threshold")
    }
}

/// Boundary finder that scans a coverage mask for the first dense window from each end.
#[derive(Debug, Clone, Default)]
pub struct SlidingWindowFinder {
    config: SlidingWindowConfig,
}

impl SlidingWindowFinder {
    /// Creates a finder.
    #[must_use]
    pub fn new(config: SlidingWindowConfig) -> Self {
        Self { config }
    }

    /// Creates a finder after validating its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn try_new(config: SlidingWindowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Outlier length from the start of `mask`.
    #[must_use]
    pub fn scan_left(&self, mask: &[u8]) -> usize {
        self.first_dense_window(mask.len(), |i| mask[i])
    }

    /// Outlier length from the end of `mask`.
    #[must_use]
    pub fn scan_right(&self, mask: &[u8]) -> usize {
        let len = mask.len();
        self.first_dense_window(len, |i| mask[len - 1 - i])
    }

    /// Returns `p + W` for the first window start `p` whose density reaches the threshold.
    ///
    /// Window starts run from 0 to `len - W - 2` inclusive; a mask shorter than `W + 2` or a
    /// scan with no qualifying window yields 0. `at(i)` is only called with `i < len`.
    #[allow(clippy::cast_precision_loss)]
    fn first_dense_window<F: Fn(usize) -> u8>(&self, len: usize, at: F) -> usize {
        let window = self.config.window;
        if window == 0 || len < window + 2 {
            return 0;
        }
        let last_start = len - window - 2;

        let mut sum: usize = (0..window).map(|i| usize::from(at(i))).sum();
        for start in 0..=last_start {
            if sum as f64 / window as f64 >= self.config.threshold {
                return start + window;
            }
            sum = sum + usize::from(at(start + window)) - usize::from(at(start));
        }
        0
    }
}

impl FindBoundary for SlidingWindowFinder {
    fn genomic_outliers(&self, cigar: &str) -> Result<OutlierBoundary> {
        let mask = coverage_mask(cigar)?;
        Ok(OutlierBoundary::new(self.scan_left(&mask), self.scan_right(&mask)))
    }

    fn name(&self) -> &'static str {
        "window"
    }
}
