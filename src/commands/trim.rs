//! `Trim` command implementation.
//!
//! Finds the adapter outliers at both ends of every read from its alignment and removes
//! them with the selected trimming back-end.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use lrtrim_lib::logging::{OperationTimer, log_trim_summary};
use lrtrim_lib::metrics::writer::write_metrics_auto;
use lrtrim_lib::output::DEFAULT_MIN_LENGTH;
use lrtrim_lib::pipeline::{BoundaryPipeline, TrimPipeline, TrimmerSettings};
use lrtrim_lib::trimmer::TrimmerKind;

use super::command::Command;
use super::common::{
    AdapterOptions, BoundaryOptions, ClipperOptions, CutadaptOptions, InputOptions,
    ThreadingOptions,
};

/// Trims adapter outliers from long reads
#[derive(Parser, Debug)]
#[command(
    name = "trim",
    about = "\x1b[38;5;72m[TRIMMING]\x1b[0m \x1b[36mTrim adapter outliers from aligned long reads\x1b[0m",
    long_about = r#"
Removes synthetic adapter sequence from the ends of long cDNA reads, using each read's
alignment as a guide.

For every read the portions at the 5' and 3' ends that did not align (the "outliers") are
located with one of two boundary methods:

1. `clip` - the leading and trailing soft/hard clips of the CIGAR, plus --padding bases.
2. `window` - the first window of --window bases, scanning inward from each end, in which
   at least --window-threshold of the bases are aligned.

The outliers are then handed to one of three trimmers; the aligned body of the read is
always kept:

1. `cutadapt` - the outliers are written to staging files and cutadapt searches them for the
   RT and strand-switching adapters in all four orientations. Whatever cutadapt leaves next
   to the body is kept. If cutadapt fails on one side, that side's outliers are removed.
2. `clip` - adapters are searched for in-process with a seed-and-score clipper.
3. `passthrough` - both outliers are removed without looking at them.

The alignments may be SAM or BAM (chosen by extension). Reads that are unmapped keep their
full sequence. The output is FASTQ, gzip compressed if the path ends in `.gz`. Reads
shorter than --min-length after trimming are dropped.
"#
)]
pub struct Trim {
    /// Alignment and FASTQ inputs
    #[command(flatten)]
    pub input: InputOptions,

    /// Output FASTQ file of trimmed reads
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Boundary detection options
    #[command(flatten)]
    pub boundary: BoundaryOptions,

    /// Trimming back-end
    #[arg(short = 'T', long = "trimmer", value_enum, default_value_t = TrimmerKind::Cutadapt)]
    pub trimmer: TrimmerKind,

    /// Adapter sequences
    #[command(flatten)]
    pub adapters: AdapterOptions,

    /// Options for the cutadapt trimmer
    #[command(flatten)]
    pub cutadapt: CutadaptOptions,

    /// Options for the clip trimmer
    #[command(flatten)]
    pub clipper: ClipperOptions,

    /// Drop trimmed reads shorter than this
    #[arg(long = "min-length", default_value_t = DEFAULT_MIN_LENGTH)]
    pub min_length: usize,

    /// Optional output file for trimming metrics
    #[arg(short = 'm', long = "metrics")]
    pub metrics: Option<PathBuf>,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Trim {
    fn validate(&self) -> Result<()> {
        self.input.validate()?;
        self.boundary.validate()?;
        self.adapters.validate(self.trimmer)?;
        match self.trimmer {
            TrimmerKind::Cutadapt => self.cutadapt.validate()?,
            TrimmerKind::Clip => self.clipper.validate()?,
            TrimmerKind::Passthrough => {}
        }
        self.threading.validate()?;
        Ok(())
    }

    fn trimmer_settings(&self) -> Result<TrimmerSettings> {
        Ok(match self.trimmer {
            TrimmerKind::Cutadapt => TrimmerSettings::Cutadapt {
                adapters: self.adapters.adapters(self.trimmer)?,
                config: self.cutadapt.config(),
            },
            TrimmerKind::Clip => TrimmerSettings::Clip {
                adapters: self.adapters.adapters(self.trimmer)?,
                config: self.clipper.config(),
            },
            TrimmerKind::Passthrough => TrimmerSettings::Passthrough,
        })
    }

    fn log_parameters(&self) {
        info!("Trim");
        info!("  Alignments: {}", self.input.alignments.display());
        info!("  FASTQ: {}", self.input.fastq.display());
        info!("  Output: {}", self.output.display());
        info!("  Boundary method: {}", self.boundary.log_message());
        info!("  Trimmer: {}", self.trimmer);
        match self.trimmer {
            TrimmerKind::Cutadapt => {
                info!("  cutadapt: {}", self.cutadapt.program.display());
                info!("  Error rate: {}", self.cutadapt.error_rate);
                info!("  Timeout: {}s", self.cutadapt.timeout_secs);
            }
            TrimmerKind::Clip => {
                info!("  Seed mismatches: {}", self.clipper.seed_mismatches);
                info!(
                    "  Thresholds: palindrome {}, simple {}",
                    self.clipper.palindrome_threshold, self.clipper.simple_threshold
                );
            }
            TrimmerKind::Passthrough => {}
        }
        info!("  Mismatched ids: {:?}", self.input.on_mismatch);
        info!("  Minimum length: {}", self.min_length);
        info!("  {}", self.threading.log_message());
    }
}

impl Command for Trim {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.validate()?;
        self.log_parameters();

        let timer = OperationTimer::new("Trimming");
        let pipeline = TrimPipeline {
            boundaries: BoundaryPipeline {
                alignments: self.input.alignments.clone(),
                sequences: self.input.fastq.clone(),
                mismatch_policy: self.input.on_mismatch,
                finder: self.boundary.finder()?,
                threads: self.threading.threads,
            },
            trimmer: self.trimmer_settings()?,
            output: self.output.clone(),
            min_length: self.min_length,
        };
        let metrics = pipeline.run()?;

        log_trim_summary(&metrics);
        if let Some(path) = &self.metrics {
            write_metrics_auto(path, std::slice::from_ref(&metrics))?;
            info!("Wrote metrics to {}", path.display());
        }
        timer.log_completion(metrics.reads_written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Trim {
        let mut full = vec!["trim", "-a", "in.sam", "-q", "in.fq", "-o", "out.fq"];
        full.extend_from_slice(args);
        Trim::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cmd = parse(&[]);
        assert_eq!(cmd.trimmer, TrimmerKind::Cutadapt);
        assert_eq!(cmd.min_length, 1);
        assert!(cmd.metrics.is_none());
    }

    #[test]
    fn test_settings_follow_trimmer() {
        let cmd = parse(&["-T", "clip", "--rt-adapter", "ACGT", "--ss-adapter", "GGTT"]);
        assert!(matches!(cmd.trimmer_settings().unwrap(), TrimmerSettings::Clip { .. }));

        let cmd = parse(&["-T", "passthrough"]);
        assert!(matches!(cmd.trimmer_settings().unwrap(), TrimmerSettings::Passthrough));

        let cmd = parse(&[]);
        assert!(cmd.trimmer_settings().is_err());
    }

    #[test]
    fn test_unknown_trimmer_is_rejected() {
        let result =
            Trim::try_parse_from(["trim", "-a", "in.sam", "-q", "in.fq", "-o", "o.fq", "-T", "x"]);
        assert!(result.is_err());
    }
}
