//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`. Each group mirrors a library-side
//! configuration struct and validates through it.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use lrtrim_lib::alignment::is_stdin_path;
use lrtrim_lib::boundary::clip_based::DEFAULT_PADDING;
use lrtrim_lib::boundary::sliding_window::{DEFAULT_THRESHOLD, DEFAULT_WINDOW};
use lrtrim_lib::boundary::{
    BoundaryFinder, BoundaryMethod, ClipBasedConfig, ClipBasedFinder, SlidingWindowConfig,
    SlidingWindowFinder,
};
use lrtrim_lib::errors::{LrtrimError, Result};
use lrtrim_lib::read_store::MismatchPolicy;
use lrtrim_lib::trimmer::external::{DEFAULT_CUTADAPT, DEFAULT_ERROR_RATE, DEFAULT_TIMEOUT};
use lrtrim_lib::trimmer::illumina_clip::{
    DEFAULT_PALINDROME_THRESHOLD, DEFAULT_SEED_MISMATCHES, DEFAULT_SIMPLE_THRESHOLD,
};
use lrtrim_lib::trimmer::{Adapters, CutadaptConfig, IlluminaClipConfig, TrimmerKind};
use lrtrim_lib::validation::{validate_file_exists, validate_positive};

/// Alignment and sequence inputs.
#[derive(Debug, Clone, Args)]
pub struct InputOptions {
    /// Input SAM or BAM file of read alignments (`-` for SAM on stdin)
    #[arg(short = 'a', long = "alignments")]
    pub alignments: PathBuf,

    /// Input FASTQ file of the same reads, plain or gzip
    #[arg(short = 'q', long = "fastq")]
    pub fastq: PathBuf,

    /// What to do with reads present in only one of the two inputs
    #[arg(long = "on-mismatch", value_enum, default_value_t = MismatchPolicy::Skip)]
    pub on_mismatch: MismatchPolicy,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            alignments: PathBuf::from("-"),
            fastq: PathBuf::new(),
            on_mismatch: MismatchPolicy::Skip,
        }
    }
}

impl InputOptions {
    /// Validates that the inputs exist (the alignments are skipped for stdin).
    ///
    /// # Errors
    ///
    /// Returns an error if an input file does not exist.
    pub fn validate(&self) -> Result<()> {
        if !is_stdin_path(&self.alignments) {
            validate_file_exists(&self.alignments, "Alignment input")?;
        }
        validate_file_exists(&self.fastq, "FASTQ input")
    }
}

/// Outlier boundary detection options.
#[derive(Debug, Clone, Args)]
pub struct BoundaryOptions {
    /// Method used to find the outliers at each end of a read
    #[arg(short = 'b', long = "boundary-method", value_enum, default_value_t = BoundaryMethod::Clip)]
    pub method: BoundaryMethod,

    /// Bases added to each non-zero end clip (clip method)
    #[arg(long = "padding", default_value_t = DEFAULT_PADDING)]
    pub padding: usize,

    /// Window length in bases (window method)
    #[arg(long = "window", default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Fraction of aligned bases a window must reach, in (0, 1] (window method)
    #[arg(long = "window-threshold", default_value_t = DEFAULT_THRESHOLD)]
    pub window_threshold: f64,
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        Self {
            method: BoundaryMethod::Clip,
            padding: DEFAULT_PADDING,
            window: DEFAULT_WINDOW,
            window_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl BoundaryOptions {
    fn window_config(&self) -> SlidingWindowConfig {
        SlidingWindowConfig { window: self.window, threshold: self.window_threshold }
    }

    /// Validates the options of the selected method.
    ///
    /// # Errors
    ///
    /// Returns an error if the window options are invalid and the window method is selected.
    pub fn validate(&self) -> Result<()> {
        match self.method {
            BoundaryMethod::Clip => ClipBasedConfig { padding: self.padding }.validate(),
            BoundaryMethod::Window => self.window_config().validate(),
        }
    }

    /// Builds the selected finder.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid.
    pub fn finder(&self) -> Result<BoundaryFinder> {
        Ok(match self.method {
            BoundaryMethod::Clip => {
                ClipBasedFinder::try_new(ClipBasedConfig { padding: self.padding })?.into()
            }
            BoundaryMethod::Window => SlidingWindowFinder::try_new(self.window_config())?.into(),
        })
    }

    /// One-line description for logging.
    #[must_use]
    pub fn log_message(&self) -> String {
        match self.method {
            BoundaryMethod::Clip => format!("clip (padding {})", self.padding),
            BoundaryMethod::Window => {
                format!("window (length {}, threshold {})", self.window, self.window_threshold)
            }
        }
    }
}

/// Library adapter sequences.
#[derive(Debug, Clone, Default, Args)]
pub struct AdapterOptions {
    /// Reverse-transcription adapter sequence
    #[arg(long = "rt-adapter")]
    pub rt_adapter: Option<String>,

    /// Strand-switching adapter sequence
    #[arg(long = "ss-adapter")]
    pub ss_adapter: Option<String>,
}

impl AdapterOptions {
    /// Validates that both adapters are present and valid when `trimmer` needs them.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter is missing or not DNA.
    pub fn validate(&self, trimmer: TrimmerKind) -> Result<()> {
        if trimmer.needs_adapters() {
            self.adapters(trimmer)?;
        }
        Ok(())
    }

    /// The adapter pair.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter is missing or not DNA.
    pub fn adapters(&self, trimmer: TrimmerKind) -> Result<Adapters> {
        match (&self.rt_adapter, &self.ss_adapter) {
            (Some(rt), Some(ss)) => Adapters::new(rt, ss),
            _ => Err(LrtrimError::InvalidParameter {
                parameter: "rt-adapter/ss-adapter".to_string(),
                reason: format!("both adapters are required by the {trimmer} trimmer"),
            }),
        }
    }
}

/// Options for the `cutadapt` trimmer.
#[derive(Debug, Clone, Args)]
pub struct CutadaptOptions {
    /// The cutadapt executable
    #[arg(long = "cutadapt", default_value = DEFAULT_CUTADAPT)]
    pub program: PathBuf,

    /// Maximum error rate for adapter matches, in [0, 1)
    #[arg(short = 'e', long = "error-rate", default_value_t = DEFAULT_ERROR_RATE)]
    pub error_rate: f64,

    /// Number of cores for each cutadapt run (not passed when absent)
    #[arg(long = "cutadapt-cores")]
    pub cores: Option<usize>,

    /// Timeout in seconds for each cutadapt run
    #[arg(long = "cutadapt-timeout", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Directory for the staged outliers and cutadapt output (a temporary directory if absent)
    #[arg(long = "staging-dir")]
    pub staging_dir: Option<PathBuf>,

    /// Keep the temporary staging directory after the run
    #[arg(long = "keep-staging", default_value = "false")]
    pub keep_staging: bool,
}

impl Default for CutadaptOptions {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_CUTADAPT),
            error_rate: DEFAULT_ERROR_RATE,
            cores: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            staging_dir: None,
            keep_staging: false,
        }
    }
}

impl CutadaptOptions {
    /// The library configuration for these options.
    #[must_use]
    pub fn config(&self) -> CutadaptConfig {
        CutadaptConfig {
            program: self.program.clone(),
            error_rate: self.error_rate,
            cores: self.cores,
            timeout: Duration::from_secs(self.timeout_secs),
            staging_dir: self.staging_dir.clone(),
            keep_staging: self.keep_staging,
        }
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error if the error rate, timeout or core count is invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(cores) = self.cores {
            validate_positive(cores, "cutadapt-cores")?;
        }
        self.config().validate()
    }
}

/// Options for the in-process clipping trimmer.
#[derive(Debug, Clone, Args)]
pub struct ClipperOptions {
    /// Maximum mismatches in the 16-base seed
    #[arg(long = "seed-mismatches", default_value_t = DEFAULT_SEED_MISMATCHES)]
    pub seed_mismatches: usize,

    /// Score threshold for adapters reversed relative to the read
    #[arg(long = "palindrome-threshold", default_value_t = DEFAULT_PALINDROME_THRESHOLD)]
    pub palindrome_threshold: u32,

    /// Score threshold for adapters in their own direction
    #[arg(long = "simple-threshold", default_value_t = DEFAULT_SIMPLE_THRESHOLD)]
    pub simple_threshold: u32,
}

impl Default for ClipperOptions {
    fn default() -> Self {
        Self {
            seed_mismatches: DEFAULT_SEED_MISMATCHES,
            palindrome_threshold: DEFAULT_PALINDROME_THRESHOLD,
            simple_threshold: DEFAULT_SIMPLE_THRESHOLD,
        }
    }
}

impl ClipperOptions {
    /// The library configuration for these options.
    #[must_use]
    pub fn config(&self) -> IlluminaClipConfig {
        IlluminaClipConfig {
            seed_mismatches: self.seed_mismatches,
            palindrome_threshold: self.palindrome_threshold,
            simple_threshold: self.simple_threshold,
        }
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold is zero or the seed mismatches are too many.
    pub fn validate(&self) -> Result<()> {
        self.config().validate()
    }
}

/// Threading options.
///
/// Boundary computation runs on a bounded thread pool when `--threads` is above 1;
/// reading and writing are always single-threaded.
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Number of threads for boundary computation
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,
}

impl Default for ThreadingOptions {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

impl ThreadingOptions {
    /// Creates threading options with N threads.
    #[must_use]
    pub fn new(threads: usize) -> Self {
        Self { threads }
    }

    /// Validates that at least one thread is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if `threads` is zero.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.threads, "threads")
    }

    /// Returns a log message describing the threading configuration.
    #[must_use]
    pub fn log_message(&self) -> String {
        if self.threads > 1 {
            format!("Using {} threads", self.threads)
        } else {
            "Single-threaded mode".to_string()
        }
    }
}
