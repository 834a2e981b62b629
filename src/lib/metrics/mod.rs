//! Metrics written by the `trim` and `outliers` commands.
//!
//! - [`trim`] - One-row summary of a trimming run
//! - [`outliers`] - Per-read outlier lengths
//! - [`writer`] - Metrics file I/O utilities

pub mod outliers;
pub mod trim;
pub mod writer;

use serde::{Deserialize, Serialize, Serializer};

pub use outliers::OutlierRecord;
pub use trim::TrimMetrics;
pub use writer::{write_metrics, write_metrics_auto};

/// Number of decimal places used for float metrics.
pub const FLOAT_PRECISION: usize = 6;

/// Formats a float value with the standard precision for metrics.
///
/// # Example
/// ```
/// use lrtrim_lib::metrics::format_float;
/// assert_eq!(format_float(0.9), "0.900000");
/// assert_eq!(format_float(0.0), "0.000000");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    format!("{value:.FLOAT_PRECISION$}")
}

/// Serializes a float metric with [`format_float`].
///
/// # Errors
/// Returns the serializer's error if the value cannot be written
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
pub fn serialize_float<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_float(*value))
}

/// A metric type that can be serialized to TSV files.
pub trait Metric: Serialize + for<'de> Deserialize<'de> + Clone + Default {
    /// Human-readable name for this metric type.
    ///
    /// Used in error messages when writing metrics files.
    fn metric_name() -> &'static str;
}
