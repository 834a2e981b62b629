//! Input validation utilities
//!
//! Common validation functions for command-line parameters and file paths, returning the
//! structured errors of [`crate::errors`].

use crate::errors::{LrtrimError, Result};
use std::fmt::Display;
use std::path::Path;

/// Validate that a file exists
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Alignment input")
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use lrtrim_lib::validation::validate_file_exists;
/// use std::path::Path;
///
/// let result = validate_file_exists("/nonexistent/reads.sam", "Alignment input");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(LrtrimError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that an error rate is in `[0, 1)`
///
/// # Errors
/// Returns an error if the rate is negative, at least 1, or NaN
///
/// # Example
/// ```
/// use lrtrim_lib::validation::validate_error_rate;
///
/// validate_error_rate(0.1, "error-rate").unwrap();
/// assert!(validate_error_rate(1.0, "error-rate").is_err());
/// ```
pub fn validate_error_rate(rate: f64, name: &str) -> Result<()> {
    if !(0.0..1.0).contains(&rate) {
        return Err(LrtrimError::OutOfRange {
            parameter: name.to_string(),
            value: rate,
            range: "[0, 1)".to_string(),
        });
    }
    Ok(())
}

/// Validate that a fraction is in `(0, 1]`
///
/// # Errors
/// Returns an error if the fraction is not positive, above 1, or NaN
///
/// # Example
/// ```
/// use lrtrim_lib::validation::validate_fraction;
///
/// validate_fraction(1.0, "threshold").unwrap();
/// assert!(validate_fraction(0.0, "threshold").is_err());
/// ```
pub fn validate_fraction(value: f64, name: &str) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(LrtrimError::OutOfRange {
            parameter: name.to_string(),
            value,
            range: "(0, 1]".to_string(),
        });
    }
    Ok(())
}

/// Validate that a value is positive (> 0)
///
/// # Errors
/// Returns an error if the value is not positive
///
/// # Example
/// ```
/// use lrtrim_lib::validation::validate_positive;
///
/// validate_positive(20, "window").unwrap();
///
/// let result = validate_positive(0, "window");
/// assert!(result.is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_positive<T: PartialOrd + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(LrtrimError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}
