//! End-to-end tests for the `trim` command.

use std::path::{Path, PathBuf};

use lrtrim_lib::metrics::TrimMetrics;
use tempfile::TempDir;

use crate::helpers::{
    SamRecord, arg, assert_failure, assert_success, read_fastq, read_tsv, run_lrtrim, write_bam,
    write_fastq, write_sam,
};

const RT: &str = "ACGTTGCAAGGCTTAAGCCT";
const SS: &str = "TTTCTGTTGGTGCTGATATTGC";
const BODY: &str = "CATCATCATCATCATCATCATCATCATCAT";

/// Inputs shared by most tests.
struct Fixture {
    dir: TempDir,
    alignments: PathBuf,
    fastq: PathBuf,
}

impl Fixture {
    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Four reads:
/// - `fwd`: forward, 10 bases clipped before and 8 after a 40 base alignment
/// - `rev`: reverse, 6 bases clipped before and 12 after on the genome
/// - `unmapped`: keeps its full sequence
/// - `orphan`: only in the FASTQ
fn simple_fixture(bam: bool) -> Fixture {
    let dir = TempDir::new().unwrap();
    let alignments = dir.path().join(if bam { "in.bam" } else { "in.sam" });
    let fastq = dir.path().join("in.fq");

    let records = [
        SamRecord::new("fwd", 0, "10S40M8S"),
        SamRecord::new("rev", 16, "6S40M12S"),
        SamRecord::new("unmapped", 4, "*"),
    ];
    if bam {
        write_bam(&alignments, &records);
    } else {
        write_sam(&alignments, &records);
    }

    let body = "ACGT".repeat(10);
    write_fastq(
        &fastq,
        &[
            ("fwd", &format!("{}{body}{}", "G".repeat(10), "T".repeat(8))),
            ("rev", &format!("{}{body}{}", "C".repeat(12), "A".repeat(6))),
            ("unmapped", "GATTACAGATTACA"),
            ("orphan", "ACGTACGT"),
        ],
    );
    Fixture { dir, alignments, fastq }
}

fn passthrough_args<'a>(fx: &'a Fixture, output: &'a Path) -> Vec<&'a str> {
    vec![
        "trim",
        "-a",
        arg(&fx.alignments),
        "-q",
        arg(&fx.fastq),
        "-o",
        arg(output),
        "-T",
        "passthrough",
        "--padding",
        "0",
    ]
}

#[test]
fn test_passthrough_removes_clipped_ends() {
    let fx = simple_fixture(false);
    let output = fx.path("out.fq");
    let metrics = fx.path("metrics.tsv");

    let mut args = passthrough_args(&fx, &output);
    args.extend(["-m", arg(&metrics)]);
    assert_success(&run_lrtrim(&args));

    let reads = read_fastq(&output);
    let body = "ACGT".repeat(10);
    assert_eq!(reads.len(), 3);
    assert_eq!(reads[0].0, "fwd");
    assert_eq!(reads[0].1, body);
    assert_eq!(reads[0].2, "I".repeat(40));
    assert_eq!(reads[1].0, "rev");
    assert_eq!(reads[1].1, body);
    assert_eq!(reads[2].0, "unmapped");
    assert_eq!(reads[2].1, "GATTACAGATTACA");

    let rows: Vec<TrimMetrics> = read_tsv(&metrics);
    assert_eq!(rows.len(), 1);
    let m = &rows[0];
    assert_eq!(m.boundary_method, "clip");
    assert_eq!(m.trimmer, "passthrough");
    assert_eq!(m.alignment_records, 3);
    assert_eq!(m.sequence_records, 4);
    assert_eq!(m.merged_reads, 3);
    assert_eq!(m.missing_alignment, 1);
    assert_eq!(m.reversed_reads, 1);
    assert_eq!(m.boundaries_unmapped, 1);
    assert_eq!(m.reads_written, 3);
    assert_eq!(m.bases_written, 40 + 40 + 14);
}

#[test]
fn test_default_padding_eats_into_body() {
    let fx = simple_fixture(false);
    let output = fx.path("out.fq");
    let args = [
        "trim",
        "-a",
        arg(&fx.alignments),
        "-q",
        arg(&fx.fastq),
        "-o",
        arg(&output),
        "-T",
        "passthrough",
    ];
    assert_success(&run_lrtrim(&args));

    let reads = read_fastq(&output);
    assert_eq!(reads[0].1.len(), 40 - 10);
    assert_eq!(reads[1].1.len(), 40 - 10);
    assert_eq!(reads[2].1.len(), 14);
}

#[test]
fn test_bam_input_matches_sam_input() {
    let sam = simple_fixture(false);
    let bam = simple_fixture(true);
    let sam_out = sam.path("out.fq");
    let bam_out = bam.path("out.fq");

    assert_success(&run_lrtrim(&passthrough_args(&sam, &sam_out)));
    assert_success(&run_lrtrim(&passthrough_args(&bam, &bam_out)));
    assert_eq!(read_fastq(&sam_out), read_fastq(&bam_out));
}

#[test]
fn test_gzip_output() {
    let fx = simple_fixture(false);
    let output = fx.path("out.fq.gz");
    assert_success(&run_lrtrim(&passthrough_args(&fx, &output)));

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    assert_eq!(read_fastq(&output).len(), 3);
}

#[test]
fn test_min_length_drops_short_reads() {
    let fx = simple_fixture(false);
    let output = fx.path("out.fq");
    let metrics = fx.path("metrics.tsv");

    let mut args = passthrough_args(&fx, &output);
    args.extend(["--min-length", "20", "-m", arg(&metrics)]);
    assert_success(&run_lrtrim(&args));

    let ids: Vec<String> = read_fastq(&output).into_iter().map(|r| r.0).collect();
    assert_eq!(ids, vec!["fwd", "rev"]);

    let rows: Vec<TrimMetrics> = read_tsv(&metrics);
    assert_eq!(rows[0].reads_written, 2);
    assert_eq!(rows[0].reads_dropped, 1);
}

#[test]
fn test_fail_policy_rejects_orphan_sequence() {
    let fx = simple_fixture(false);
    let output = fx.path("out.fq");

    let mut args = passthrough_args(&fx, &output);
    args.extend(["--on-mismatch", "fail"]);
    let stderr = assert_failure(&run_lrtrim(&args));
    assert!(stderr.contains("orphan"), "stderr: {stderr}");
}

#[test]
fn test_missing_input_fails() {
    let fx = simple_fixture(false);
    let output = fx.path("out.fq");
    let missing = fx.path("missing.sam");
    let args = [
        "trim",
        "-a",
        arg(&missing),
        "-q",
        arg(&fx.fastq),
        "-o",
        arg(&output),
        "-T",
        "passthrough",
    ];
    assert_failure(&run_lrtrim(&args));
    assert!(!output.exists());
}

#[test]
fn test_adapter_trimmers_require_adapters() {
    let fx = simple_fixture(false);
    let output = fx.path("out.fq");
    for trimmer in ["cutadapt", "clip"] {
        let args = [
            "trim",
            "-a",
            arg(&fx.alignments),
            "-q",
            arg(&fx.fastq),
            "-o",
            arg(&output),
            "-T",
            trimmer,
        ];
        let stderr = assert_failure(&run_lrtrim(&args));
        assert!(stderr.contains("adapter"), "stderr: {stderr}");
    }
}

#[test]
fn test_clip_trimmer_keeps_residuals_next_to_body() {
    let dir = TempDir::new().unwrap();
    let alignments = dir.path().join("in.sam");
    let fastq = dir.path().join("in.fq");
    let output = dir.path().join("out.fq");

    let left = 3 + SS.len() + 3;
    let right = 4 + RT.len() + 2;
    let cigar = format!("{left}S{}M{right}S", BODY.len());
    write_sam(&alignments, &[SamRecord::new("r1", 0, &cigar)]);
    write_fastq(&fastq, &[("r1", &format!("GGG{SS}AAC{BODY}TTGA{RT}CC"))]);

    let args = [
        "trim",
        "-a",
        arg(&alignments),
        "-q",
        arg(&fastq),
        "-o",
        arg(&output),
        "-T",
        "clip",
        "--padding",
        "0",
        "--rt-adapter",
        RT,
        "--ss-adapter",
        SS,
    ];
    assert_success(&run_lrtrim(&args));

    let reads = read_fastq(&output);
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0].1, format!("AAC{BODY}TTGA"));
}

#[test]
fn test_unrunnable_cutadapt_removes_whole_outliers() {
    let dir = TempDir::new().unwrap();
    let alignments = dir.path().join("in.sam");
    let fastq = dir.path().join("in.fq");
    let output = dir.path().join("out.fq");
    let metrics = dir.path().join("metrics.tsv");
    let program = dir.path().join("no-such-cutadapt");

    write_sam(&alignments, &[SamRecord::new("r1", 0, "4S8M4S")]);
    write_fastq(&fastq, &[("r1", "AAAACCCCGGGGTTTT")]);

    let args = [
        "trim",
        "-a",
        arg(&alignments),
        "-q",
        arg(&fastq),
        "-o",
        arg(&output),
        "--padding",
        "0",
        "--rt-adapter",
        RT,
        "--ss-adapter",
        SS,
        "--cutadapt",
        arg(&program),
        "-m",
        arg(&metrics),
    ];
    assert_success(&run_lrtrim(&args));

    let reads = read_fastq(&output);
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0].1, "CCCCGGGG");

    let rows: Vec<TrimMetrics> = read_tsv(&metrics);
    assert_eq!(rows[0].trimmer, "cutadapt");
    assert_eq!(rows[0].failed_tool_runs, 2);
}

#[cfg(unix)]
#[test]
fn test_cutadapt_residuals_are_joined_to_body() {
    use crate::helpers::{KEEP_TWO_CUTADAPT, fake_cutadapt};

    let dir = TempDir::new().unwrap();
    let alignments = dir.path().join("in.sam");
    let fastq = dir.path().join("in.fq");
    let output = dir.path().join("out.fq");
    let staging = dir.path().join("staging");
    let program = fake_cutadapt(dir.path(), KEEP_TWO_CUTADAPT);

    write_sam(
        &alignments,
        &[SamRecord::new("fwd", 0, "4S8M4S"), SamRecord::new("rev", 16, "2S8M4S")],
    );
    write_fastq(&fastq, &[("fwd", "AAAACCCCGGGGTTTT"), ("rev", "ACGTTTTTTTTTCC")]);

    let args = [
        "trim",
        "-a",
        arg(&alignments),
        "-q",
        arg(&fastq),
        "-o",
        arg(&output),
        "--padding",
        "0",
        "--rt-adapter",
        RT,
        "--ss-adapter",
        SS,
        "--cutadapt",
        arg(&program),
        "--staging-dir",
        arg(&staging),
    ];
    assert_success(&run_lrtrim(&args));

    let reads = read_fastq(&output);
    assert_eq!(reads.len(), 2);
    assert_eq!(reads[0].1, "AACCCCGGGGTT");
    assert_eq!(reads[0].2, "I".repeat(12));
    // Reverse strand: the 4 genomic trailing bases are the read's 5' outlier.
    assert_eq!(reads[1].1, "GTTTTTTTTTCC");

    let left = std::fs::read_to_string(staging.join("left_outliers.fasta")).unwrap();
    assert_eq!(left, ">fwd\nAAAA\n>rev\nACGT\n");
    let right = std::fs::read_to_string(staging.join("right_outliers.fasta")).unwrap();
    assert_eq!(right, ">fwd\nTTTT\n>rev\nCC\n");
}
