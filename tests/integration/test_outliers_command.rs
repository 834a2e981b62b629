//! End-to-end tests for the `outliers` command.

use lrtrim_lib::metrics::{OutlierRecord, TrimMetrics};
use tempfile::TempDir;

use crate::helpers::{
    SamRecord, arg, assert_success, read_tsv, run_lrtrim, write_fastq, write_sam,
};

fn write_inputs(dir: &TempDir, cigar: &str) -> (std::path::PathBuf, std::path::PathBuf) {
    let alignments = dir.path().join("in.sam");
    let fastq = dir.path().join("in.fq");
    write_sam(
        &alignments,
        &[
            SamRecord::new("fwd", 0, cigar),
            SamRecord::new("rev", 16, cigar),
            SamRecord::new("unmapped", 4, "*"),
        ],
    );
    let seq = "A".repeat(120);
    write_fastq(&fastq, &[("fwd", &seq), ("rev", &seq), ("unmapped", "ACGTACGT")]);
    (alignments, fastq)
}

#[test]
fn test_clip_method_reports_padded_outliers() {
    let dir = TempDir::new().unwrap();
    let (alignments, fastq) = write_inputs(&dir, "15S95M10S");
    let output = dir.path().join("outliers.tsv");
    let metrics = dir.path().join("metrics.tsv");

    let args = [
        "outliers",
        "-a",
        arg(&alignments),
        "-q",
        arg(&fastq),
        "-o",
        arg(&output),
        "-m",
        arg(&metrics),
    ];
    assert_success(&run_lrtrim(&args));

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with(
        "read_id\tstrand\talignment_length\tsequence_length\tleft_outlier\tright_outlier\n"
    ));

    let rows: Vec<OutlierRecord> = read_tsv(&output);
    assert_eq!(rows.len(), 3);
    assert_eq!((rows[0].read_id.as_str(), rows[0].strand.as_str()), ("fwd", "+"));
    assert_eq!(rows[0].alignment_length, 95);
    assert_eq!(rows[0].sequence_length, 120);
    assert_eq!((rows[0].left_outlier, rows[0].right_outlier), (20, 15));
    assert_eq!((rows[1].read_id.as_str(), rows[1].strand.as_str()), ("rev", "-"));
    assert_eq!((rows[1].left_outlier, rows[1].right_outlier), (15, 20));
    assert_eq!((rows[2].read_id.as_str(), rows[2].strand.as_str()), ("unmapped", "unmapped"));
    assert_eq!((rows[2].left_outlier, rows[2].right_outlier), (0, 0));

    let summary: Vec<TrimMetrics> = read_tsv(&metrics);
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].trimmer, "none");
    assert_eq!(summary[0].boundaries_computed, 2);
    assert_eq!(summary[0].reads_with_left_outlier, 2);
}

#[test]
fn test_window_method() {
    let dir = TempDir::new().unwrap();
    let (alignments, fastq) = write_inputs(&dir, "10S100M10S");
    let output = dir.path().join("outliers.tsv");

    let args = [
        "outliers",
        "-a",
        arg(&alignments),
        "-q",
        arg(&fastq),
        "-o",
        arg(&output),
        "-b",
        "window",
        "--window",
        "10",
    ];
    assert_success(&run_lrtrim(&args));

    let rows: Vec<OutlierRecord> = read_tsv(&output);
    assert_eq!((rows[0].left_outlier, rows[0].right_outlier), (18, 18));
    assert_eq!((rows[1].left_outlier, rows[1].right_outlier), (18, 18));
}

#[test]
fn test_window_wider_than_read_finds_nothing() {
    let dir = TempDir::new().unwrap();
    let (alignments, fastq) = write_inputs(&dir, "10S100M10S");
    let output = dir.path().join("outliers.tsv");

    let args = [
        "outliers",
        "-a",
        arg(&alignments),
        "-q",
        arg(&fastq),
        "-o",
        arg(&output),
        "-b",
        "window",
        "--window",
        "200",
    ];
    assert_success(&run_lrtrim(&args));

    let rows: Vec<OutlierRecord> = read_tsv(&output);
    assert!(rows.iter().all(|r| r.left_outlier == 0 && r.right_outlier == 0));
}
