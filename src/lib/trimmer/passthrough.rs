//! Trimmer that removes both outliers without looking at them.

use anyhow::Result;

use super::{OutlierTrimmer, TrimmerStats};
use crate::output::OutputWriter;
use crate::read_store::{ReadRecord, ReadStore};

/// Writes each read's body immediately.
#[derive(Debug, Default)]
pub struct PassthroughTrimmer {
    stats: TrimmerStats,
}

impl OutlierTrimmer for PassthroughTrimmer {
    fn pre_process(&mut self, _index: usize, read: &ReadRecord, out: &mut OutputWriter) -> Result<()> {
        self.stats.processed += 1;
        let (sequence, quality) = read.body();
        out.write(&read.id, sequence, quality)?;
        Ok(())
    }

    fn finish(&mut self, _store: &ReadStore, _out: &mut OutputWriter) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> TrimmerStats {
        self.stats
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}
