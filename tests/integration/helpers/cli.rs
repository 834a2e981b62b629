//! Running the `lrtrim` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Runs `lrtrim` with the given arguments.
pub fn run_lrtrim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lrtrim"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to run lrtrim")
}

/// Asserts that a run succeeded, showing stderr otherwise.
pub fn assert_success(output: &Output) {
    assert!(output.status.success(), "lrtrim failed: {}", String::from_utf8_lossy(&output.stderr));
}

/// Asserts that a run failed and returns its stderr.
pub fn assert_failure(output: &Output) -> String {
    assert!(!output.status.success(), "lrtrim unexpectedly succeeded");
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Converts a path to `&str` for use as an argument.
pub fn arg(path: &Path) -> &str {
    path.to_str().expect("non-UTF-8 path")
}

/// Writes an executable shell script named `cutadapt` into `dir`.
#[cfg(unix)]
pub fn fake_cutadapt(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("cutadapt");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    path
}

/// A fake `cutadapt` that keeps two residual bases next to the read body: the last two
/// bases of 5' outliers (`-g`) and the first two of 3' outliers (`-a`).
pub const KEEP_TWO_CUTADAPT: &str = r#"
side=""
out=""
while [ $# -gt 1 ]; do
  case "$1" in
    -g) side=left ;;
    -a) side=right ;;
    -o) out="$2"; shift ;;
  esac
  shift
done
if [ "$side" = left ]; then
  awk '/^>/ {print; next} {print substr($0, length($0) - 1)}' "$1" > "$out"
else
  awk '/^>/ {print; next} {print substr($0, 1, 2)}' "$1" > "$out"
fi
"#;
