#![allow(missing_docs)]

use assert_cmd::Command;
use assert_fs::{NamedTempFile, fixture::FileWriteStr};
use predicates::str;

const SAMPLE: &str = r#"<SAFheader>
</SAFheader>

<SampleGlobalInfo>
    # xsection    xsec_error    nevents     sum_weight+    sum_weight-
    2.00e+00      1.00e-02      1000        1.00e+02       0.00e+00
</SampleGlobalInfo>

<WeightNames>
  0 MUR=1.0_MUF=1.0_PDF=303200
  1 MUR=2.0_MUF=2.0_PDF=303200
  2 MUR=0.5_MUF=0.5_PDF=303200
</WeightNames>

<Selection>
  cut "MET > 100"
  histo "MET"
</Selection>

<SAFfooter>
</SAFfooter>
"#;

const BROKEN: &str = "<SAFheader>
</SAFheader>
<Counter>
  \"cut\"
  1 0
  1.0 0.0
  1.0 0.0
</Histo>
";

fn sample() -> NamedTempFile {
    let file = NamedTempFile::new("sample.saf").unwrap();
    file.write_str(SAMPLE).unwrap();
    file
}

#[test]
fn help() {
    Command::cargo_bin("ma5")
        .unwrap()
        .args(["read", "--help"])
        .assert()
        .success()
        .stdout(str::contains("Usage: ma5 read"))
        .stdout(str::contains("Path to the input SAF file"));
}

#[test]
fn sample_info() {
    let file = sample();

    Command::cargo_bin("ma5")
        .unwrap()
        .args(["read", "--sample"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(str::contains("2.0000000e0"))
        .stdout(str::contains("1000"))
        .stdout(str::contains("1.0000000e2"));
}

#[test]
fn weights() {
    let file = sample();

    Command::cargo_bin("ma5")
        .unwrap()
        .args(["read", "--weights"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(str::contains("MUR=1.0_MUF=1.0_PDF=303200"))
        .stdout(str::contains("MUR=2.0_MUF=2.0_PDF=303200"))
        .stdout(str::contains("303200"));
}

#[test]
fn selection() {
    let file = sample();

    Command::cargo_bin("ma5")
        .unwrap()
        .args(["read", "--selection"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(str::contains("MET > 100"))
        .stdout(str::contains("histo"));
}

#[test]
fn check_well_formed() {
    let file = sample();

    Command::cargo_bin("ma5")
        .unwrap()
        .args(["read", "--check"])
        .arg(file.path())
        .assert()
        .success()
        .stdout("");
}

#[test]
fn check_malformed() {
    let file = NamedTempFile::new("broken.saf").unwrap();
    file.write_str(BROKEN).unwrap();

    Command::cargo_bin("ma5")
        .unwrap()
        .args(["read", "--check"])
        .arg(file.path())
        .assert()
        .failure()
        .stdout(str::contains("error: line 8: <Histo> is closed without being opened"))
        .stdout(str::contains("<Counter> is not closed at the end of the file"))
        .stdout(str::contains("no <SAFfooter> block found"));
}

#[test]
fn missing_file() {
    Command::cargo_bin("ma5")
        .unwrap()
        .args(["read", "--cuts", "does-not-exist.saf"])
        .assert()
        .failure()
        .stderr(str::contains("unable to read 'does-not-exist.saf'"));
}

#[test]
fn exclusive_options() {
    let file = sample();

    Command::cargo_bin("ma5")
        .unwrap()
        .args(["read", "--cuts", "--weights"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(str::contains("cannot be used with"));
}
