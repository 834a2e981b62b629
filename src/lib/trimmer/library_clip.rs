//! Trimmer that clips adapters out of the outliers in-process.
//!
//! The left outlier is reversed before clipping so that the search starts next to the read
//! body and runs toward the 5' end, the same direction as for the right outlier. Whatever the
//! clipper keeps of each outlier stays attached to the body. Qualities are taken from the
//! original read over the same range rather than rebuilt from the clipped fragments.

use anyhow::Result;

use super::{Adapters, IlluminaClipConfig, IlluminaClipper, OutlierTrimmer, TrimmerStats};
use crate::dna::reverse;
use crate::output::OutputWriter;
use crate::read_store::{ReadRecord, ReadStore};

/// Clips each read's outliers and writes the read immediately.
#[derive(Debug)]
pub struct LibraryClipTrimmer {
    clipper: IlluminaClipper,
    stats: TrimmerStats,
}

impl LibraryClipTrimmer {
    /// Creates a trimmer.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipping configuration is invalid.
    pub fn new(config: IlluminaClipConfig, adapters: &Adapters) -> crate::errors::Result<Self> {
        Ok(Self { clipper: IlluminaClipper::new(config, adapters)?, stats: TrimmerStats::default() })
    }

    /// Range of the read to keep: the body plus the clipped remainder of each outlier.
    #[must_use]
    pub fn kept_range(&self, read: &ReadRecord) -> (usize, usize) {
        let (start, end) = read.body_range();
        let seq = &read.sequence;

        let kept_left = if start > 0 { self.clipper.clip_reversed(&reverse(&seq[..start])) } else { 0 };
        let kept_right = if end < seq.len() { self.clipper.clip(&seq[end..]) } else { 0 };

        (start - kept_left, end + kept_right)
    }
}

impl OutlierTrimmer for LibraryClipTrimmer {
    fn pre_process(&mut self, _index: usize, read: &ReadRecord, out: &mut OutputWriter) -> Result<()> {
        self.stats.processed += 1;
        let (body_start, body_end) = read.body_range();
        let (start, end) = self.kept_range(read);
        if start < body_start {
            self.stats.left_kept += 1;
        }
        if end > body_end {
            self.stats.right_kept += 1;
        }
        out.write(&read.id, &read.sequence[start..end], &read.quality[start..end])?;
        Ok(())
    }

    fn finish(&mut self, _store: &ReadStore, _out: &mut OutputWriter) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> TrimmerStats {
        self.stats
    }

    fn name(&self) -> &'static str {
        "clip"
    }
}
