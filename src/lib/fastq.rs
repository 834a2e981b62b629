//! FASTQ input and output.
//!
//! Sequence input is read with `seq_io` over an `fgoxide` reader, which transparently handles
//! gzip. Read ids are the header up to the first whitespace so that they match the query
//! names of the alignment input.

use std::borrow::Cow;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fgoxide::io::Io;
use log::{info, warn};
use seq_io::fastq::Reader as FastqReader;
use seq_io::fastq::Record;

use crate::progress::ProgressTracker;
use crate::read_store::{MergeStats, ReadMerger, ReadStore};

/// Buffer size for FASTQ readers and writers.
pub const BUFFER_SIZE: usize = 1024 * 1024;

/// Compression level used for gzip output.
pub const COMPRESSION_LEVEL: u32 = 5;

/// The read id part of a FASTQ header: everything before the first whitespace.
///
/// Bytes that are not valid UTF-8 are replaced with `U+FFFD`, with a warning.
///
/// # Examples
///
/// ```
/// use lrtrim_lib::fastq::read_id;
///
/// assert_eq!(read_id(b"m64011/1/ccs extra=1"), "m64011/1/ccs");
/// assert_eq!(read_id(b"read1\tlen=100"), "read1");
/// assert_eq!(read_id(b"read1"), "read1");
/// ```
#[must_use]
pub fn read_id(head: &[u8]) -> Cow<'_, str> {
    let end = head.iter().position(u8::is_ascii_whitespace).unwrap_or(head.len());
    let id = String::from_utf8_lossy(&head[..end]);
    if let Cow::Owned(replaced) = &id {
        warn!("FASTQ read id is not valid UTF-8, matching it as {replaced:?}");
    }
    id
}

/// Opens a FASTQ file, plain or gzip.
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn open_fastq_reader(path: &Path) -> Result<FastqReader<Box<dyn BufRead + Send>>> {
    let fgio = Io::new(COMPRESSION_LEVEL, BUFFER_SIZE);
    let reader = fgio
        .new_reader(&path)
        .with_context(|| format!("Failed to open FASTQ file: {}", path.display()))?;
    Ok(FastqReader::with_capacity(reader, BUFFER_SIZE))
}

/// Calls `f` with the id, bases and qualities of every record in a FASTQ file.
///
/// Returns the number of records read.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if `f` fails.
pub fn for_each_fastq<F>(path: &Path, mut f: F) -> Result<u64>
where
    F: FnMut(&str, &[u8], &[u8]) -> Result<()>,
{
    let mut reader = open_fastq_reader(path)?;
    let mut count = 0u64;
    while let Some(record) = reader.next() {
        let record =
            record.with_context(|| format!("Failed to parse FASTQ record in {}", path.display()))?;
        let id = read_id(record.head());
        f(&id, record.seq(), record.qual())?;
        count += 1;
    }
    Ok(count)
}

/// Merges every record of a FASTQ file into the aligned reads of `store`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or if the merger's id-mismatch policy is to
/// fail and the inputs disagree.
pub fn merge_fastq(path: &Path, store: &mut ReadStore, mut merger: ReadMerger) -> Result<MergeStats> {
    info!("Reading sequences from {}", path.display());
    let progress = ProgressTracker::new("Read sequence records");
    for_each_fastq(path, |id, seq, qual| {
        merger.merge(store, id, seq, qual)?;
        progress.record(1);
        Ok(())
    })?;
    progress.finish();
    Ok(merger.finish(store)?)
}

/// Writes one FASTQ record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_fastq_record<W: Write>(
    writer: &mut W,
    id: &str,
    sequence: &[u8],
    quality: &[u8],
) -> std::io::Result<()> {
    writer.write_all(b"@")?;
    writer.write_all(id.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(sequence)?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(quality)?;
    writer.write_all(b"\n")
}

/// Writes one FASTA record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_fasta_record<W: Write>(writer: &mut W, id: &str, sequence: &[u8]) -> std::io::Result<()> {
    writer.write_all(b">")?;
    writer.write_all(id.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(sequence)?;
    writer.write_all(b"\n")
}
