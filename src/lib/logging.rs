//! Formatting helpers for log messages and the end-of-run summaries.

use std::time::{Duration, Instant};

use crate::metrics::TrimMetrics;

/// Formats a count with comma separators for readability.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::logging::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// assert_eq!(format_count(123), "123");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a fraction in `[0, 1]` as a percentage, e.g. `0.9543` with 2 decimals is
/// `"95.43%"`.
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration with its two largest units, dropping seconds past an hour.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(45)), "45s");
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        if remaining_secs == 0 { format!("{mins}m") } else { format!("{mins}m {remaining_secs}s") }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a throughput, per minute when fewer than one item per second.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} items/s", format_count(count));
    }

    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} items/s", format_count(rate as u64))
    } else {
        let items_per_min = count as f64 / (secs / 60.0);
        format!("{items_per_min:.1} items/min")
    }
}

fn fraction(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        #[expect(clippy::cast_precision_loss, reason = "read counts never exceed 2^53")]
        let result = part as f64 / total as f64;
        result
    }
}

fn log_input_summary(metrics: &TrimMetrics) {
    log::info!("  Alignment records: {}", format_count(metrics.alignment_records));
    log::info!("  Distinct reads: {}", format_count(metrics.distinct_reads));
    log::info!(
        "  Strands: {} forward, {} reverse, {} unmapped, {} other",
        format_count(metrics.forward_alignments),
        format_count(metrics.reverse_alignments),
        format_count(metrics.unmapped_alignments),
        format_count(metrics.other_alignments)
    );
    if metrics.replaced_alignments + metrics.discarded_alignments > 0 {
        log::info!(
            "  Multi-mapped ids: {} alignments replaced, {} discarded",
            format_count(metrics.replaced_alignments),
            format_count(metrics.discarded_alignments)
        );
    }

    log::info!("  Sequence records: {}", format_count(metrics.sequence_records));
    log::info!(
        "  Reads with sequence: {} ({})",
        format_count(metrics.merged_reads),
        format_percent(fraction(metrics.merged_reads, metrics.distinct_reads), 2)
    );
    if metrics.missing_alignment > 0 {
        log::warn!("  Sequences with no alignment: {}", format_count(metrics.missing_alignment));
    }
    if metrics.missing_sequence > 0 {
        log::warn!("  Alignments with no sequence: {}", format_count(metrics.missing_sequence));
    }
    if metrics.malformed_sequences > 0 {
        log::warn!("  Malformed sequences: {}", format_count(metrics.malformed_sequences));
    }
    if metrics.duplicate_sequences > 0 {
        log::warn!("  Duplicate sequences: {}", format_count(metrics.duplicate_sequences));
    }
}

fn log_boundary_summary(metrics: &TrimMetrics) {
    log::info!(
        "  Outliers computed ({}): {}",
        metrics.boundary_method,
        format_count(metrics.boundaries_computed)
    );
    log::info!(
        "  Reads with a left outlier: {} ({})",
        format_count(metrics.reads_with_left_outlier),
        format_percent(fraction(metrics.reads_with_left_outlier, metrics.boundaries_computed), 2)
    );
    log::info!(
        "  Reads with a right outlier: {} ({})",
        format_count(metrics.reads_with_right_outlier),
        format_percent(fraction(metrics.reads_with_right_outlier, metrics.boundaries_computed), 2)
    );
    if metrics.boundaries_unmapped > 0 {
        log::info!("  Unmapped reads: {}", format_count(metrics.boundaries_unmapped));
    }
    if metrics.invalid_cigars > 0 {
        log::warn!("  Reads with an invalid CIGAR: {}", format_count(metrics.invalid_cigars));
    }
    if metrics.clamped_reads > 0 {
        log::info!("  Outliers clamped to read length: {}", format_count(metrics.clamped_reads));
    }
}

/// Logs a formatted summary of a trimming run.
///
/// # Examples
///
/// ```no_run
/// use lrtrim_lib::logging::log_trim_summary;
/// use lrtrim_lib::metrics::TrimMetrics;
///
/// let mut metrics = TrimMetrics::new("clip", "passthrough");
/// metrics.trimmed_reads = 10_000;
/// metrics.reads_written = 9_990;
///
/// log_trim_summary(&metrics);
/// ```
pub fn log_trim_summary(metrics: &TrimMetrics) {
    log::info!("Trimming Summary:");
    log_input_summary(metrics);
    log_boundary_summary(metrics);

    log::info!("  Reads trimmed ({}): {}", metrics.trimmer, format_count(metrics.trimmed_reads));
    if metrics.left_residuals_kept + metrics.right_residuals_kept > 0 {
        log::info!(
            "  Outlier residuals kept: {} left, {} right",
            format_count(metrics.left_residuals_kept),
            format_count(metrics.right_residuals_kept)
        );
    }
    if metrics.failed_tool_runs > 0 {
        log::warn!("  Failed external tool runs: {}", format_count(metrics.failed_tool_runs));
    }
    if metrics.inconsistent_merges > 0 {
        log::warn!("  Inconsistent residual merges: {}", format_count(metrics.inconsistent_merges));
    }

    log::info!(
        "  Reads written: {} ({})",
        format_count(metrics.reads_written),
        format_percent(fraction(metrics.reads_written, metrics.trimmed_reads), 2)
    );
    log::info!("  Reads dropped as too short: {}", format_count(metrics.reads_dropped));
    if metrics.reads_written > 0 {
        log::info!(
            "  Read length: min {}, mean {:.1}, max {}",
            metrics.shortest_read,
            metrics.mean_read_length,
            metrics.longest_read
        );
    }
}

/// Logs a formatted summary of an outlier-only run.
pub fn log_outlier_summary(metrics: &TrimMetrics) {
    log::info!("Outlier Summary:");
    log_input_summary(metrics);
    log_boundary_summary(metrics);
}

/// Operation timing and summary helper.
///
/// Tracks operation timing and provides formatted summary output.
///
/// # Examples
///
/// ```no_run
/// use lrtrim_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Processing reads");
///
/// // ... do work ...
///
/// timer.log_completion(10_000); // Log with item count
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Logs the completion with item count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
