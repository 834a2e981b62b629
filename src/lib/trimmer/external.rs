//! Trimmer that runs `cutadapt` on the outliers.
//!
//! During [`pre_process`](OutlierTrimmer::pre_process) the left and right outliers of every
//! read are appended to two FASTA staging files. [`finish`](OutlierTrimmer::finish) runs
//! `cutadapt` once per side, searching for all eight adapter constructs (5' adapters on the
//! left side, 3' adapters on the right), then joins each read's residuals back onto its body.
//!
//! A failed `cutadapt` run (cannot start, non-zero exit, timeout, unreadable output) is logged
//! and every residual of that side is treated as empty, i.e. the whole outlier is removed.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ahash::AHashMap;
use anyhow::{Context, Result};
use fgoxide::io::Io;
use log::{debug, info, warn};
use seq_io::fasta::Reader as FastaReader;
use seq_io::fasta::Record;
use tempfile::TempDir;

use super::{AdapterConstruct, Adapters, OutlierTrimmer, TrimmerStats};
use crate::errors::LrtrimError;
use crate::fastq::{BUFFER_SIZE, COMPRESSION_LEVEL, read_id, write_fasta_record};
use crate::output::OutputWriter;
use crate::process::{ToolInvocation, run_with_timeout};
use crate::read_store::{ReadRecord, ReadStore, clamp_outliers};
use crate::validation::validate_error_rate;

/// Default `cutadapt` executable.
pub const DEFAULT_CUTADAPT: &str = "cutadapt";

/// Default maximum error rate passed to `cutadapt -e`.
pub const DEFAULT_ERROR_RATE: f64 = 0.1;

/// Default timeout for one `cutadapt` run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Configuration for [`ExternalAdapterTrimmer`].
#[derive(Debug, Clone, PartialEq)]
pub struct CutadaptConfig {
    /// Executable name or path.
    pub program: PathBuf,
    /// Maximum error rate for adapter matches, in `[0, 1)`.
    pub error_rate: f64,
    /// Value for `cutadapt --cores`; not passed when `None`.
    pub cores: Option<usize>,
    /// Timeout for each run.
    pub timeout: Duration,
    /// Directory for staging files; a temporary directory when `None`.
    pub staging_dir: Option<PathBuf>,
    /// Keep a temporary staging directory instead of deleting it.
    pub keep_staging: bool,
}

impl Default for CutadaptConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_CUTADAPT),
            error_rate: DEFAULT_ERROR_RATE,
            cores: None,
            timeout: DEFAULT_TIMEOUT,
            staging_dir: None,
            keep_staging: false,
        }
    }
}

impl CutadaptConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the error rate is outside `[0, 1)` or the timeout is zero.
    pub fn validate(&self) -> crate::errors::Result<()> {
        validate_error_rate(self.error_rate, "error-rate")?;
        if self.timeout.is_zero() {
            return Err(LrtrimError::InvalidParameter {
                parameter: "cutadapt-timeout".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// One end of the reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The 5' outliers.
    Left,
    /// The 3' outliers.
    Right,
}

impl Side {
    /// Label used in file names and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// `cutadapt` option naming an adapter for this side: 5' adapters on the left, where
    /// the adapter and everything before it are removed, 3' adapters on the right.
    #[must_use]
    pub const fn adapter_option(self) -> &'static str {
        match self {
            Self::Left => "-g",
            Self::Right => "-a",
        }
    }
}

/// The `cutadapt` command line for one side.
#[must_use]
pub fn cutadapt_invocation(
    config: &CutadaptConfig,
    constructs: &[AdapterConstruct],
    side: Side,
    input: &Path,
    output: &Path,
) -> ToolInvocation {
    let mut invocation = ToolInvocation::new(&config.program).arg("-e").arg(config.error_rate.to_string());
    if let Some(cores) = config.cores {
        invocation = invocation.arg("--cores").arg(cores.to_string());
    }
    for construct in constructs {
        invocation = invocation
            .arg(side.adapter_option())
            .arg(format!("{}={}", construct.name, String::from_utf8_lossy(&construct.sequence)));
    }
    invocation.arg("-o").arg(output.display().to_string()).arg(input.display().to_string())
}

/// A read rebuilt from its residuals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRead {
    /// Bases.
    pub sequence: Vec<u8>,
    /// Qualities.
    pub quality: Vec<u8>,
    /// Whether the residuals fit inside their outliers. When they do not, the sequence is the
    /// original read over the same range as the quality.
    pub consistent: bool,
}

/// Joins residuals onto a read body.
///
/// The sequence is `residual_left + body + residual_right`. The quality is the original
/// quality from `left - len(residual_left)` to `len - right + len(residual_right)`, with both
/// cuts clamped to the read.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::trimmer::external::merge_residuals;
///
/// let seq = vec![b'A'; 100];
/// let qual = vec![b'I'; 100];
/// let merged = merge_residuals(&seq, &qual, 10, 8, b"AAA", b"AA");
/// assert_eq!(merged.sequence.len(), 87);
/// assert_eq!(merged.quality.len(), 87);
/// ```
#[must_use]
pub fn merge_residuals(
    sequence: &[u8],
    quality: &[u8],
    left: usize,
    right: usize,
    residual_left: &[u8],
    residual_right: &[u8],
) -> MergedRead {
    let len = sequence.len();
    let (left, right) = clamp_outliers(left, right, len);
    let (body_start, body_end) = (left, len - right);

    let left_cut = left.saturating_sub(residual_left.len());
    let right_cut = (body_end + residual_right.len()).min(len);

    let mut merged = Vec::with_capacity(residual_left.len() + body_end - body_start + residual_right.len());
    merged.extend_from_slice(residual_left);
    merged.extend_from_slice(&sequence[body_start..body_end]);
    merged.extend_from_slice(residual_right);

    let quality = quality[left_cut..right_cut].to_vec();
    if merged.len() == quality.len() {
        MergedRead { sequence: merged, quality, consistent: true }
    } else {
        MergedRead { sequence: sequence[left_cut..right_cut].to_vec(), quality, consistent: false }
    }
}

/// Where staging files live.
#[derive(Debug)]
enum StagingDir {
    Temp(TempDir),
    Fixed(PathBuf),
}

impl StagingDir {
    fn path(&self) -> &Path {
        match self {
            Self::Temp(dir) => dir.path(),
            Self::Fixed(path) => path,
        }
    }
}

type StagingWriter = BufWriter<Box<dyn Write + Send>>;

/// Stages outliers for `cutadapt` and merges its residuals back.
pub struct ExternalAdapterTrimmer {
    config: CutadaptConfig,
    constructs: Vec<AdapterConstruct>,
    staging: Option<StagingDir>,
    left_writer: Option<StagingWriter>,
    right_writer: Option<StagingWriter>,
    pending: Vec<usize>,
    stats: TrimmerStats,
}

impl std::fmt::Debug for ExternalAdapterTrimmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalAdapterTrimmer")
            .field("config", &self.config)
            .field("staging", &self.staging)
            .field("pending", &self.pending.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ExternalAdapterTrimmer {
    /// Creates the trimmer and its staging files.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the staging files cannot be
    /// created.
    pub fn new(config: CutadaptConfig, adapters: &Adapters) -> Result<Self> {
        config.validate()?;

        let staging = match &config.staging_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create staging directory: {}", dir.display()))?;
                StagingDir::Fixed(dir.clone())
            }
            None => StagingDir::Temp(
                tempfile::Builder::new()
                    .prefix("lrtrim.")
                    .tempdir()
                    .context("Failed to create temporary staging directory")?,
            ),
        };
        debug!("Staging outliers in {}", staging.path().display());

        let fgio = Io::new(COMPRESSION_LEVEL, BUFFER_SIZE);
        let open = |side: Side| -> Result<StagingWriter> {
            let path = Self::staged_path(staging.path(), side);
            fgio.new_writer(&path)
                .with_context(|| format!("Failed to create staging file: {}", path.display()))
        };
        let left_writer = open(Side::Left)?;
        let right_writer = open(Side::Right)?;

        Ok(Self {
            config,
            constructs: adapters.constructs(),
            staging: Some(staging),
            left_writer: Some(left_writer),
            right_writer: Some(right_writer),
            pending: Vec::new(),
            stats: TrimmerStats::default(),
        })
    }

    /// Path of the staged outliers for one side.
    fn staged_path(dir: &Path, side: Side) -> PathBuf {
        dir.join(format!("{}_outliers.fasta", side.label()))
    }

    /// Path of `cutadapt`'s output for one side.
    fn trimmed_path(dir: &Path, side: Side) -> PathBuf {
        dir.join(format!("{}_trimmed.fasta", side.label()))
    }

    fn staging_path(&self) -> Result<&Path> {
        self.staging.as_ref().map(StagingDir::path).context("Staging directory already released")
    }

    /// Runs `cutadapt` on one side's staged outliers and returns the residuals by read id.
    ///
    /// Any failure is logged and yields an empty map.
    fn run_side(&mut self, side: Side) -> Result<AHashMap<String, Vec<u8>>> {
        let dir = self.staging_path()?.to_path_buf();
        let input = Self::staged_path(&dir, side);
        let output = Self::trimmed_path(&dir, side);
        let invocation = cutadapt_invocation(&self.config, &self.constructs, side, &input, &output);

        info!("Running cutadapt on the {} outliers", side.label());
        let result = run_with_timeout(&invocation, self.config.timeout)
            .map_err(anyhow::Error::from)
            .and_then(|tool_output| {
                let log_path = dir.join(format!("{}.cutadapt.log", side.label()));
                let mut log = tool_output.stdout.clone();
                log.extend_from_slice(&tool_output.stderr);
                if let Err(e) = std::fs::write(&log_path, log) {
                    warn!("Could not write {}: {e}", log_path.display());
                }
                debug!("cutadapt ({}) stdout:\n{}", side.label(), tool_output.stdout_lossy());
                debug!("cutadapt ({}) stderr:\n{}", side.label(), tool_output.stderr_lossy());
                read_residuals(&output)
            });

        match result {
            Ok(residuals) => {
                info!("cutadapt returned {} {} residuals", residuals.len(), side.label());
                Ok(residuals)
            }
            Err(e) => {
                warn!("cutadapt failed on the {} outliers, removing them whole: {e:#}", side.label());
                self.stats.failed_sides += 1;
                Ok(AHashMap::new())
            }
        }
    }

    fn release_staging(&mut self) {
        match self.staging.take() {
            Some(StagingDir::Temp(dir)) if self.config.keep_staging => {
                let path = dir.keep();
                info!("Staging files kept in {}", path.display());
            }
            Some(StagingDir::Temp(dir)) => {
                if let Err(e) = dir.close() {
                    warn!("Failed to remove staging directory: {e}");
                }
            }
            Some(StagingDir::Fixed(path)) => info!("Staging files written to {}", path.display()),
            None => {}
        }
    }
}

/// Reads `cutadapt`'s FASTA output into a map from read id to residual.
fn read_residuals(path: &Path) -> Result<AHashMap<String, Vec<u8>>> {
    let fgio = Io::new(COMPRESSION_LEVEL, BUFFER_SIZE);
    let reader = fgio
        .new_reader(&path)
        .with_context(|| format!("Failed to open cutadapt output: {}", path.display()))?;
    let mut reader = FastaReader::new(reader);
    let mut residuals = AHashMap::new();
    while let Some(record) = reader.next() {
        let record = record.with_context(|| format!("Failed to parse cutadapt output: {}", path.display()))?;
        residuals.insert(read_id(record.head()).into_owned(), record.full_seq().into_owned());
    }
    Ok(residuals)
}

fn flush_staging(writer: Option<StagingWriter>, side: Side) -> Result<()> {
    if let Some(mut writer) = writer {
        writer.flush().with_context(|| format!("Failed to flush {} staging file", side.label()))?;
    }
    Ok(())
}

impl OutlierTrimmer for ExternalAdapterTrimmer {
    fn pre_process(&mut self, index: usize, read: &ReadRecord, _out: &mut OutputWriter) -> Result<()> {
        self.stats.processed += 1;
        self.pending.push(index);

        let (start, end) = read.body_range();
        if start > 0 {
            let writer = self.left_writer.as_mut().context("Left staging file already closed")?;
            write_fasta_record(writer, &read.id, &read.sequence[..start])?;
            self.stats.staged_left += 1;
        }
        if end < read.sequence.len() {
            let writer = self.right_writer.as_mut().context("Right staging file already closed")?;
            write_fasta_record(writer, &read.id, &read.sequence[end..])?;
            self.stats.staged_right += 1;
        }
        Ok(())
    }

    fn finish(&mut self, store: &ReadStore, out: &mut OutputWriter) -> Result<()> {
        flush_staging(self.left_writer.take(), Side::Left)?;
        flush_staging(self.right_writer.take(), Side::Right)?;

        let left = if self.stats.staged_left > 0 { self.run_side(Side::Left)? } else { AHashMap::new() };
        let right = if self.stats.staged_right > 0 { self.run_side(Side::Right)? } else { AHashMap::new() };

        for &index in &self.pending {
            let Some(read) = store.read(index) else {
                continue;
            };
            let residual_left = left.get(&read.id).map_or(&[][..], Vec::as_slice);
            let residual_right = right.get(&read.id).map_or(&[][..], Vec::as_slice);

            let merged = merge_residuals(
                &read.sequence,
                &read.quality,
                read.left_outlier,
                read.right_outlier,
                residual_left,
                residual_right,
            );
            if !merged.consistent {
                debug!("Residuals of read '{}' do not fit its outliers", read.id);
                self.stats.inconsistent += 1;
            }
            if !residual_left.is_empty() {
                self.stats.left_kept += 1;
            }
            if !residual_right.is_empty() {
                self.stats.right_kept += 1;
            }
            out.write(&read.id, &merged.sequence, &merged.quality)?;
        }
        self.pending.clear();

        self.release_staging();
        Ok(())
    }

    fn stats(&self) -> TrimmerStats {
        self.stats
    }

    fn name(&self) -> &'static str {
        "cutadapt"
    }
}
