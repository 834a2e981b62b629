//! End-to-end orchestration of a trimming run.
//!
//! The stages run in a fixed order: alignments are ingested into a [`ReadStore`], sequences
//! are merged onto them, outlier boundaries are computed, and finally every read is handed to
//! the configured [`Trimmer`] which writes through a single [`OutputWriter`]. Each stage's
//! counters are folded into one [`TrimMetrics`] row.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::alignment::ingest_alignments;
use crate::boundary::{BoundaryFinder, FindBoundary, compute_boundaries};
use crate::fastq::merge_fastq;
use crate::logging::OperationTimer;
use crate::metrics::{OutlierRecord, TrimMetrics};
use crate::output::{OutputStats, OutputWriter};
use crate::read_store::{MismatchPolicy, ReadMerger, ReadStore};
use crate::trimmer::{
    Adapters, CutadaptConfig, ExternalAdapterTrimmer, IlluminaClipConfig, LibraryClipTrimmer,
    OutlierTrimmer, PassthroughTrimmer, Trimmer, TrimmerKind, trim_reads,
};

/// Inputs and boundary detection settings shared by every run.
#[derive(Debug, Clone)]
pub struct BoundaryPipeline {
    /// SAM or BAM alignment input.
    pub alignments: PathBuf,
    /// FASTQ sequence input, plain or gzip.
    pub sequences: PathBuf,
    /// What to do with ids present in only one input.
    pub mismatch_policy: MismatchPolicy,
    /// Finder used to compute outliers.
    pub finder: BoundaryFinder,
    /// Threads for boundary computation.
    pub threads: usize,
}

/// Reads with their outliers computed, plus the counters collected so far.
#[derive(Debug)]
pub struct PreparedReads {
    /// Every distinct read id, in first-seen order.
    pub store: ReadStore,
    /// Ingestion, merging and boundary counters.
    pub metrics: TrimMetrics,
}

impl PreparedReads {
    /// One [`OutlierRecord`] per read that received a sequence, in store order.
    #[must_use]
    pub fn outlier_records(&self) -> Vec<OutlierRecord> {
        self.store.reads().iter().filter(|r| r.merged).map(OutlierRecord::from).collect()
    }
}

impl BoundaryPipeline {
    /// Ingests both inputs and computes every read's outliers.
    ///
    /// `trimmer` is only recorded in the returned metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if an input cannot be read, the inputs disagree under
    /// [`MismatchPolicy::Fail`], or the thread pool cannot be created.
    pub fn prepare(&self, trimmer: &str) -> Result<PreparedReads> {
        let mut metrics = TrimMetrics::new(self.finder.name(), trimmer);
        let mut store = ReadStore::new();

        let timer = OperationTimer::new("Reading alignments");
        let ingest = ingest_alignments(&self.alignments, &mut store)?;
        timer.log_completion(ingest.records);
        metrics.record_ingest(&ingest);

        let timer = OperationTimer::new("Merging sequences");
        let merge = merge_fastq(&self.sequences, &mut store, ReadMerger::new(self.mismatch_policy))?;
        timer.log_completion(merge.sequences);
        metrics.record_merge(&merge);

        let timer = OperationTimer::new("Computing outliers");
        let boundaries = compute_boundaries(&mut store, &self.finder, self.threads)?;
        timer.log_completion(boundaries.computed);
        metrics.record_boundaries(&boundaries);

        Ok(PreparedReads { store, metrics })
    }
}

/// Everything needed to build one [`Trimmer`].
#[derive(Debug, Clone)]
pub enum TrimmerSettings {
    /// `cutadapt` on staged outliers.
    Cutadapt {
        /// Adapters searched for.
        adapters: Adapters,
        /// Tool configuration.
        config: CutadaptConfig,
    },
    /// In-process adapter clipping.
    Clip {
        /// Adapters searched for.
        adapters: Adapters,
        /// Clipper configuration.
        config: IlluminaClipConfig,
    },
    /// Outliers removed outright.
    Passthrough,
}

impl TrimmerSettings {
    /// The trimmer kind these settings build.
    #[must_use]
    pub const fn kind(&self) -> TrimmerKind {
        match self {
            Self::Cutadapt { .. } => TrimmerKind::Cutadapt,
            Self::Clip { .. } => TrimmerKind::Clip,
            Self::Passthrough => TrimmerKind::Passthrough,
        }
    }

    /// Builds the trimmer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the `cutadapt` staging files
    /// cannot be created.
    pub fn build(self) -> Result<Trimmer> {
        Ok(match self {
            Self::Cutadapt { adapters, config } => {
                Trimmer::from(ExternalAdapterTrimmer::new(config, &adapters)?)
            }
            Self::Clip { adapters, config } => {
                Trimmer::from(LibraryClipTrimmer::new(config, &adapters)?)
            }
            Self::Passthrough => Trimmer::from(PassthroughTrimmer::default()),
        })
    }
}

/// A full trimming run.
#[derive(Debug, Clone)]
pub struct TrimPipeline {
    /// Inputs and boundary detection.
    pub boundaries: BoundaryPipeline,
    /// Trimming back-end.
    pub trimmer: TrimmerSettings,
    /// Output FASTQ, gzip when the path ends in `.gz`.
    pub output: PathBuf,
    /// Trimmed reads shorter than this are dropped.
    pub min_length: usize,
}

impl TrimPipeline {
    /// Runs every stage and returns the run's metrics.
    ///
    /// The trimmer and the output are created before any input is read, so configuration
    /// and permission problems surface immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if an input cannot be read, the output cannot be written, or the
    /// trimmer cannot be built. A failing `cutadapt` run is not an error.
    pub fn run(self) -> Result<TrimMetrics> {
        let mut trimmer = self.trimmer.build()?;
        let mut out = OutputWriter::create(&self.output, self.min_length)?;

        let PreparedReads { store, mut metrics } = self.boundaries.prepare(trimmer.name())?;

        let timer = OperationTimer::new("Trimming reads");
        let trimming = trim_reads(&store, &mut trimmer, &mut out)?;
        timer.log_completion(trimming.processed);
        metrics.record_trimming(&trimming);

        let output = finish_output(out, &self.output)?;
        metrics.record_output(&output);
        Ok(metrics)
    }
}

fn finish_output(out: OutputWriter, path: &Path) -> Result<OutputStats> {
    let stats = out.finish().with_context(|| format!("Failed to finish output: {}", path.display()))?;
    info!("Wrote {} reads to {}", stats.written, path.display());
    Ok(stats)
}
