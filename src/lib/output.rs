//! Trimmed-read output.
//!
//! [`OutputWriter`] is the single sink every trimmer writes through. It drops reads that come
//! out shorter than the minimum length and keeps the counters reported at the end of a run.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use fgoxide::io::Io;

use crate::fastq::{BUFFER_SIZE, COMPRESSION_LEVEL, write_fastq_record};

/// Default minimum trimmed length for a read to be written.
pub const DEFAULT_MIN_LENGTH: usize = 1;

/// Counters kept by an [`OutputWriter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStats {
    /// Reads written.
    pub written: u64,
    /// Reads dropped because they were shorter than the minimum length.
    pub dropped: u64,
    /// Bases written.
    pub bases_written: u64,
    /// Shortest written read, if any was written.
    pub shortest: Option<usize>,
    /// Longest written read, if any was written.
    pub longest: Option<usize>,
}

/// FASTQ sink for trimmed reads.
pub struct OutputWriter {
    writer: Box<dyn Write + Send>,
    min_length: usize,
    stats: OutputStats,
}

impl std::fmt::Debug for OutputWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputWriter")
            .field("min_length", &self.min_length)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl OutputWriter {
    /// Wraps an arbitrary writer.
    pub fn new(writer: Box<dyn Write + Send>, min_length: usize) -> Self {
        Self { writer, min_length: min_length.max(1), stats: OutputStats::default() }
    }

    /// Opens a FASTQ file for writing; gzip-compressed if the path ends in `.gz`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path, min_length: usize) -> Result<Self> {
        let fgio = Io::new(COMPRESSION_LEVEL, BUFFER_SIZE);
        let writer = fgio
            .new_writer(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self::new(Box::new(writer), min_length))
    }

    /// Writes a trimmed read, or drops it if it is shorter than the minimum length.
    ///
    /// Returns whether the read was written.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write(&mut self, id: &str, sequence: &[u8], quality: &[u8]) -> Result<bool> {
        let len = sequence.len();
        if len < self.min_length {
            self.stats.dropped += 1;
            return Ok(false);
        }
        write_fastq_record(&mut self.writer, id, sequence, quality)
            .with_context(|| format!("Failed to write read '{id}'"))?;

        self.stats.written += 1;
        self.stats.bases_written += len as u64;
        self.stats.shortest = Some(self.stats.shortest.map_or(len, |s| s.min(len)));
        self.stats.longest = Some(self.stats.longest.map_or(len, |l| l.max(len)));
        Ok(true)
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> OutputStats {
        self.stats
    }

    /// Flushes the underlying writer and returns the final counters.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<OutputStats> {
        self.writer.flush().context("Failed to flush output")?;
        Ok(self.stats)
    }
}

/// In-memory output for unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::OutputWriter;

    /// A cloneable in-memory writer.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuf(pub(crate) Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        /// Parses the buffered FASTQ into (id, sequence, quality) triples.
        pub(crate) fn records(&self) -> Vec<(String, String, String)> {
            let text = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            let lines: Vec<&str> = text.lines().collect();
            lines
                .chunks(4)
                .map(|c| (c[0][1..].to_string(), c[1].to_string(), c[3].to_string()))
                .collect()
        }
    }

    /// A writer over a fresh buffer, plus a handle on the buffer.
    pub(crate) fn writer(min_length: usize) -> (OutputWriter, SharedBuf) {
        let buf = SharedBuf::default();
        (OutputWriter::new(Box::new(buf.clone()), min_length), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{SharedBuf, writer};
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_counts_written_and_dropped() {
        let buf = SharedBuf::default();
        let mut out = OutputWriter::new(Box::new(buf.clone()), 1);
        assert!(out.write("a", b"ACGT", b"IIII").unwrap());
        assert!(!out.write("b", b"", b"").unwrap());
        assert!(out.write("c", b"AC", b"II").unwrap());
        let stats = out.finish().unwrap();

        assert_eq!(stats.written, 2);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.bases_written, 6);
        assert_eq!(stats.shortest, Some(2));
        assert_eq!(stats.longest, Some(4));
        assert_eq!(&*buf.0.lock().unwrap(), b"@a\nACGT\n+\nIIII\n@c\nAC\n+\nII\n");
    }

    #[test]
    fn test_min_length() {
        let (mut out, buf) = writer(3);
        assert!(!out.write("a", b"AC", b"II").unwrap());
        assert!(out.write("b", b"ACG", b"III").unwrap());
        assert_eq!(out.stats().dropped, 1);
        assert_eq!(buf.records(), vec![("b".to_string(), "ACG".to_string(), "III".to_string())]);
    }

    #[test]
    fn test_zero_min_length_still_drops_empty() {
        let (mut out, _) = writer(0);
        assert!(!out.write("a", b"", b"").unwrap());
        assert_eq!(out.stats().shortest, None);
    }

    #[test]
    fn test_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.fq");
        let mut out = OutputWriter::create(&path, 1).unwrap();
        out.write("a", b"ACGT", b"IIII").unwrap();
        out.finish().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "@a\nACGT\n+\nIIII\n");
    }
}
