//! Custom error types for lrtrim operations.

use thiserror::Error;

/// Result type alias for lrtrim operations
pub type Result<T> = std::result::Result<T, LrtrimError>;

/// Error type for lrtrim operations
#[derive(Error, Debug)]
pub enum LrtrimError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// A numeric parameter fell outside its allowed range
    #[error("Invalid {parameter}: {value} (must be in {range})")]
    OutOfRange {
        /// The parameter name
        parameter: String,
        /// The invalid value
        value: f64,
        /// Human readable description of the allowed range, e.g. "(0, 1]"
        range: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "SAM", "FASTQ")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// A read id was present in one input but not the other
    #[error("Read '{id}' is present in the {present_in} input but missing from the {missing_from} input")]
    IdMismatch {
        /// The read id
        id: String,
        /// Which input the read was seen in
        present_in: &'static str,
        /// Which input lacked the read
        missing_from: &'static str,
    },

    /// A CIGAR string could not be parsed
    #[error("Malformed CIGAR '{cigar}': {reason}")]
    InvalidCigar {
        /// The offending CIGAR string
        cigar: String,
        /// Explanation of the problem
        reason: String,
    },
}
