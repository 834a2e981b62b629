//! Helper utilities for integration tests.

pub mod cli;
pub mod fixtures;

pub use cli::*;
pub use fixtures::*;
