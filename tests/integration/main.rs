//! Integration tests for lrtrim.
//!
//! These tests run the compiled binary end to end on small SAM/BAM and FASTQ fixtures.

mod helpers;
mod test_outliers_command;
mod test_trim_command;
