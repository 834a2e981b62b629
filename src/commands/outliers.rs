//! `Outliers` command implementation.
//!
//! Runs boundary detection only and reports each read's outlier lengths, for tuning the
//! boundary options before trimming.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use lrtrim_lib::logging::{OperationTimer, log_outlier_summary};
use lrtrim_lib::metrics::writer::write_metrics_auto;
use lrtrim_lib::pipeline::BoundaryPipeline;

use super::command::Command;
use super::common::{BoundaryOptions, InputOptions, ThreadingOptions};

/// Reports per-read outlier lengths
#[derive(Parser, Debug)]
#[command(
    name = "outliers",
    about = "\x1b[38;5;72m[DIAGNOSTIC]\x1b[0m \x1b[36mReport the outlier lengths found for each read\x1b[0m",
    long_about = r#"
Reads the alignments and FASTQ exactly as `trim` does and computes every read's outliers
with the selected boundary method, but trims nothing. One row is written per read that
has a sequence, with its id, strand, aligned length, sequence length and the lengths of
its 5' and 3' outliers.

Useful for choosing --padding or --window/--window-threshold before running `trim`.
"#
)]
pub struct Outliers {
    /// Alignment and FASTQ inputs
    #[command(flatten)]
    pub input: InputOptions,

    /// Output TSV of per-read outlier lengths
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Boundary detection options
    #[command(flatten)]
    pub boundary: BoundaryOptions,

    /// Optional output file for summary metrics
    #[arg(short = 'm', long = "metrics")]
    pub metrics: Option<PathBuf>,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Command for Outliers {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.input.validate()?;
        self.boundary.validate()?;
        self.threading.validate()?;

        info!("Outliers");
        info!("  Alignments: {}", self.input.alignments.display());
        info!("  FASTQ: {}", self.input.fastq.display());
        info!("  Output: {}", self.output.display());
        info!("  Boundary method: {}", self.boundary.log_message());
        info!("  {}", self.threading.log_message());

        let timer = OperationTimer::new("Finding outliers");
        let pipeline = BoundaryPipeline {
            alignments: self.input.alignments.clone(),
            sequences: self.input.fastq.clone(),
            mismatch_policy: self.input.on_mismatch,
            finder: self.boundary.finder()?,
            threads: self.threading.threads,
        };
        let prepared = pipeline.prepare("none")?;

        let records = prepared.outlier_records();
        write_metrics_auto(&self.output, &records)?;
        info!("Wrote {} rows to {}", records.len(), self.output.display());

        log_outlier_summary(&prepared.metrics);
        if let Some(path) = &self.metrics {
            write_metrics_auto(path, std::slice::from_ref(&prepared.metrics))?;
        }
        timer.log_completion(records.len() as u64);
        Ok(())
    }
}
