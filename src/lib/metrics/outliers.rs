//! Per-read outlier lengths written by the `outliers` command.

use serde::{Deserialize, Serialize};

use super::Metric;
use crate::read_store::ReadRecord;

/// The outlier lengths found for one read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlierRecord {
    /// Read id.
    pub read_id: String,
    /// Strand label: `+`, `-`, `unmapped`, or `flag:<n>` for any other flag.
    pub strand: String,
    /// Read bases consumed by aligned CIGAR operations.
    pub alignment_length: usize,
    /// Length of the read sequence.
    pub sequence_length: usize,
    /// Length of the 5' outlier.
    pub left_outlier: usize,
    /// Length of the 3' outlier.
    pub right_outlier: usize,
}

impl From<&ReadRecord> for OutlierRecord {
    fn from(read: &ReadRecord) -> Self {
        Self {
            read_id: read.id.clone(),
            strand: read.strand.label(),
            alignment_length: read.alignment_length,
            sequence_length: read.sequence.len(),
            left_outlier: read.left_outlier,
            right_outlier: read.right_outlier,
        }
    }
}

impl Metric for OutlierRecord {
    fn metric_name() -> &'static str {
        "outlier"
    }
}
