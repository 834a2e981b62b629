//! Writing metrics rows to TSV files.

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::Serialize;
use std::path::Path;

use super::Metric;

/// Writes rows to a TSV file with a header line.
///
/// `description` names the rows in the error message.
///
/// # Errors
/// Returns an error if the file cannot be created or written to
///
/// # Example
/// ```no_run
/// use lrtrim_lib::metrics::writer::write_metrics;
/// use serde::Serialize;
/// use std::path::Path;
///
/// #[derive(Serialize)]
/// struct Row {
///     read_id: String,
///     left: usize,
/// }
///
/// let rows = vec![Row { read_id: "r1".to_string(), left: 12 }];
/// write_metrics(Path::new("rows.tsv"), &rows, "outlier").unwrap();
/// ```
pub fn write_metrics<P: AsRef<Path>, T: Serialize>(
    path: P,
    metrics: &[T],
    description: &str,
) -> Result<()> {
    let path_ref = path.as_ref();
    DelimFile::default()
        .write_tsv(&path_ref, metrics)
        .with_context(|| format!("Failed to write {} metrics: {}", description, path_ref.display()))
}

/// Writes [`Metric`] rows, naming them by [`Metric::metric_name`] in errors.
///
/// # Errors
/// Returns an error if the file cannot be created or written to
///
/// # Example
/// ```no_run
/// use lrtrim_lib::metrics::writer::write_metrics_auto;
/// use lrtrim_lib::metrics::TrimMetrics;
/// use std::path::Path;
///
/// let metrics = vec![TrimMetrics::new("clip", "passthrough")];
/// write_metrics_auto(Path::new("trim_metrics.tsv"), &metrics).unwrap();
/// ```
pub fn write_metrics_auto<P: AsRef<Path>, T: Metric>(path: P, metrics: &[T]) -> Result<()> {
    write_metrics(path, metrics, T::metric_name())
}
