//! CLI command implementations for lrtrim.
//!
//! Each submodule implements one subcommand:
//! - [`trim`] - Find and trim adapter outliers, writing trimmed FASTQ
//! - [`outliers`] - Find adapter outliers only, writing one TSV row per read

#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::too_many_lines
)]

pub mod command;
pub mod common;
pub mod outliers;
pub mod trim;
