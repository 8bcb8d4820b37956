#![allow(missing_docs)]

use assert_cmd::Command;
use predicates::str;

#[test]
fn help() {
    Command::cargo_bin("ma5")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(str::contains("Usage: ma5 [OPTIONS] <COMMAND>"))
        .stdout(str::contains(
            "  cutflow  Print the cutflow of one or more signal regions",
        ))
        .stdout(str::contains("  histo    Print the bins of histograms"))
        .stdout(str::contains("  read     Summarize the content of a SAF file"))
        .stdout(str::contains(
            "  report   Print the cutflows of every dataset of a run card",
        ))
        .stdout(str::contains("--log-level <LEVEL>"))
        .stdout(str::contains("--pdf-index <INDEX>"));
}

#[test]
fn no_arguments() {
    Command::cargo_bin("ma5")
        .unwrap()
        .assert()
        .failure()
        .stderr(str::contains("Usage: ma5 [OPTIONS] <COMMAND>"));
}

#[test]
fn unknown_log_level() {
    Command::cargo_bin("ma5")
        .unwrap()
        .args(["--log-level=loud", "read", "--weights", "file.saf"])
        .assert()
        .failure()
        .stderr(str::contains("invalid value 'loud'"));
}
