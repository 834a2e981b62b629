//! Builders for SAM, BAM and FASTQ fixtures.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::io::BufReader;
use std::path::Path;

use fgoxide::io::{DelimFile, Io};
use noodles::sam::alignment::io::Write as AlignmentWrite;
use serde::de::DeserializeOwned;

const SAM_HEADER: &str = "@HD\tVN:1.6\tSO:unsorted\n@SQ\tSN:chr1\tLN:100000\n";

/// One alignment line. The SAM sequence is left as `*`; reads get their bases from the
/// FASTQ.
#[derive(Debug, Clone)]
pub struct SamRecord {
    pub name: String,
    pub flag: u16,
    pub cigar: String,
}

impl SamRecord {
    pub fn new(name: &str, flag: u16, cigar: &str) -> Self {
        Self { name: name.to_string(), flag, cigar: cigar.to_string() }
    }

    fn to_line(&self) -> String {
        if self.flag & 0x4 == 0 {
            format!("{}\t{}\tchr1\t1000\t60\t{}\t*\t0\t0\t*\t*\n", self.name, self.flag, self.cigar)
        } else {
            format!("{}\t{}\t*\t0\t0\t*\t*\t0\t0\t*\t*\n", self.name, self.flag)
        }
    }
}

/// Writes a SAM file.
pub fn write_sam(path: &Path, records: &[SamRecord]) {
    let mut text = SAM_HEADER.to_string();
    for record in records {
        text.push_str(&record.to_line());
    }
    fs::write(path, text).expect("Failed to write SAM");
}

/// Writes a BAM file with the same records as [`write_sam`].
pub fn write_bam(path: &Path, records: &[SamRecord]) {
    let sam = path.with_extension("tmp.sam");
    write_sam(&sam, records);

    let mut reader = noodles::sam::io::Reader::new(BufReader::new(
        fs::File::open(&sam).expect("Failed to open SAM"),
    ));
    let header = reader.read_header().expect("Failed to read SAM header");

    let mut writer =
        noodles::bam::io::Writer::new(fs::File::create(path).expect("Failed to create BAM"));
    writer.write_header(&header).expect("Failed to write BAM header");
    for result in reader.record_bufs(&header) {
        let record = result.expect("Failed to parse SAM record");
        writer.write_alignment_record(&header, &record).expect("Failed to write BAM record");
    }
    writer.finish(&header).expect("Failed to finish BAM");
    fs::remove_file(sam).expect("Failed to remove SAM");
}

/// Writes a FASTQ file with constant quality `I`.
pub fn write_fastq(path: &Path, reads: &[(&str, &str)]) {
    let mut text = String::new();
    for (name, seq) in reads {
        let qual = "I".repeat(seq.len());
        writeln!(text, "@{name}\n{seq}\n+\n{qual}").expect("Failed to format FASTQ");
    }
    fs::write(path, text).expect("Failed to write FASTQ");
}

/// Parses a FASTQ file, plain or gzip, into (name, sequence, quality) triples.
pub fn read_fastq(path: &Path) -> Vec<(String, String, String)> {
    let lines = Io::new(5, 64 * 1024).read_lines(&path).expect("Failed to read FASTQ");
    lines
        .chunks(4)
        .filter(|chunk| chunk.len() == 4)
        .map(|chunk| {
            (chunk[0].trim_start_matches('@').to_string(), chunk[1].clone(), chunk[3].clone())
        })
        .collect()
}

/// Reads every row of a TSV metrics file.
pub fn read_tsv<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    DelimFile::default().read_tsv(&path).expect("Failed to read TSV")
}
