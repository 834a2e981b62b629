//! Progress logging for long record streams.
//!
//! Alignment and FASTQ inputs for a single flow cell routinely hold millions of records;
//! [`ProgressTracker`] logs a line each time the running count crosses a multiple of its
//! interval so that long ingestion phases are visible in the log.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of records between progress messages.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Logs progress every `interval` records.
///
/// The count is atomic so a tracker can be shared with worker threads.
///
/// # Example
/// ```
/// use lrtrim_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Read alignment records").with_interval(100);
/// for _ in 0..250 {
///     tracker.record(1); // logs at 100 and 200
/// }
/// tracker.finish(); // logs "Read alignment records 250 (complete)"
/// assert_eq!(tracker.count(), 250);
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Creates a tracker with the default interval.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            interval: DEFAULT_PROGRESS_INTERVAL,
            message: message.into(),
            count: AtomicU64::new(0),
        }
    }

    /// Sets the logging interval. An interval of 0 is treated as 1.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Adds `n` to the count, logging once for every interval boundary crossed.
    ///
    /// Returns `true` if the new count sits exactly on an interval boundary.
    pub fn record(&self, n: u64) -> bool {
        let prev = self.count.fetch_add(n, Ordering::Relaxed);
        let now = prev + n;

        for milestone in (prev / self.interval + 1)..=(now / self.interval) {
            info!("{} {}", self.message, milestone * self.interval);
        }

        now > 0 && now.is_multiple_of(self.interval)
    }

    /// Logs the final count unless it was already logged as a milestone.
    pub fn finish(&self) {
        let count = self.count();
        if count > 0 && !count.is_multiple_of(self.interval) {
            info!("{} {} (complete)", self.message, count);
        }
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
