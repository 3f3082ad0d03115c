//! Integration tests running the actual crate binary against the fixtures in `tests/data/`: the full E2E path.

use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

use crate::file_names;

#[test]
fn fixture_tree_is_grouped_like_the_expected_output() {
    let output = TempDir::new().unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_log-grouper"))
        .arg("--worker-number")
        .arg("1")
        .arg("--input-dir")
        .arg(fixture_path("input"))
        .arg("--output-dir")
        .arg(output.path())
        .output()
        .expect("failed to execute binary");

    assert!(
        result.status.success(),
        "binary exited with non-zero status.\nstderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let expected_dir = fixture_path("expected");
    let expected_files = file_names(&expected_dir);
    assert_eq!(file_names(output.path()), expected_files);

    for name in expected_files {
        let expected = std::fs::read_to_string(expected_dir.join(&name))
            .expect("failed to read expected output fixture");
        let actual = std::fs::read_to_string(output.path().join(&name))
            .expect("failed to read produced output");
        assert_eq!(normalize(&actual), normalize(&expected), "content of {name}");
    }
}

#[test]
fn missing_input_directory_exits_with_failure() {
    let scratch = TempDir::new().unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_log-grouper"))
        .arg("--input-dir")
        .arg(scratch.path().join("missing"))
        .arg("--output-dir")
        .arg(scratch.path().join("out"))
        .output()
        .expect("failed to execute binary");

    assert!(!result.status.success());
    assert!(file_names(&scratch.path().join("out")).is_empty());
}

#[test]
fn zero_workers_exits_with_failure() {
    let scratch = TempDir::new().unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_log-grouper"))
        .args(["-w", "0"])
        .arg("--input-dir")
        .arg(fixture_path("input"))
        .arg("--output-dir")
        .arg(scratch.path())
        .output()
        .expect("failed to execute binary");

    assert!(!result.status.success());
}

/// Returns the absolute path to a fixture in `tests/data/`.
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Sorts the lines of an output file: records of different files arrive in no particular order.
fn normalize(raw: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = raw.lines().filter(|line| !line.is_empty()).collect();
    lines.sort_unstable();
    lines
}
