#![allow(missing_docs)]

use assert_cmd::Command;
use assert_fs::{NamedTempFile, fixture::FileWriteStr};
use predicates::str;

const SAMPLE: &str = r#"<SAFheader>
</SAFheader>

<SampleGlobalInfo>
    2.00e+00      1.00e-02      1000        1.00e+02       0.00e+00
</SampleGlobalInfo>

<WeightNames>
  0 MUR=1.0_MUF=1.0_PDF=303200
  1 MUR=2.0_MUF=2.0_PDF=303200
  2 MUR=0.5_MUF=0.5_PDF=303200
</WeightNames>

<SAFfooter>
</SAFfooter>
"#;

const HISTOS: &str = r#"<SAFheader>
</SAFheader>

<Histo>
  <Description>
    "MET"
    # nbins xmin xmax
      2 0.0 200.0
    SR
  </Description>
  <Statistics>
    100 0 100 0 100 0
    100.0 0.0 100.0 0.0 100.0 0.0
    100 0 100 0 100 0
    100.0 0.0 100.0 0.0 100.0 0.0
    100.0 0.0 100.0 0.0 100.0 0.0
    5000.0 0.0 5000.0 0.0 5000.0 0.0
    0.0 0.0 0.0 0.0 0.0 0.0
  </Statistics>
  <Data>
    0 0 0 0 0 0
    10.0 0.0 13.0 0.0 8.0 0.0
    5.0 0.0 4.0 -1.0 6.0 0.0
    0 0 0 0 0 0
  </Data>
</Histo>

<SAFfooter>
</SAFfooter>
"#;

fn files() -> (NamedTempFile, NamedTempFile) {
    let sample = NamedTempFile::new("sample.saf").unwrap();
    sample.write_str(SAMPLE).unwrap();
    let histos = NamedTempFile::new("histos.saf").unwrap();
    histos.write_str(HISTOS).unwrap();

    (sample, histos)
}

#[test]
fn help() {
    Command::cargo_bin("ma5")
        .unwrap()
        .args(["histo", "--help"])
        .assert()
        .success()
        .stdout(str::contains("Usage: ma5 histo"))
        .stdout(str::contains("Only show the histogram with this name"));
}

#[test]
fn default() {
    let (sample, histos) = files();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("histo")
        .arg(histos.path())
        .arg("--sample")
        .arg(sample.path())
        .assert()
        .success()
        .stdout(str::contains(
            "MET [SR] integral: 3.0000000e3 mean: 5.0000000e1",
        ))
        .stdout(str::contains("2.0000000e3"))
        .stdout(str::contains("-20.00"))
        .stdout(str::contains("30.00"))
        .stdout(str::contains("200"));
}

#[test]
fn normalize_none() {
    let (sample, histos) = files();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("histo")
        .arg(histos.path())
        .arg("--sample")
        .arg(sample.path())
        .args(["--normalize=none", "--name=MET"])
        .assert()
        .success()
        .stdout(str::contains("integral: 1.5000000e1"))
        .stdout(str::contains("1.0000000e1"));
}

#[test]
fn normalize_lumi_weight() {
    let (sample, histos) = files();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("histo")
        .arg(histos.path())
        .arg("--sample")
        .arg(sample.path())
        .args(["--normalize=lumi-weight", "--weight=0.5"])
        .assert()
        .success()
        .stdout(str::contains("integral: 1.5000000e3 mean: 5.0000000e1"));
}

#[test]
fn invalid_normalization() {
    let (sample, histos) = files();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("histo")
        .arg(histos.path())
        .arg("--sample")
        .arg(sample.path())
        .arg("--normalize=weight")
        .assert()
        .failure()
        .stderr(str::contains("invalid value 'weight'"))
        .stderr(str::contains("[possible values: none, lumi, lumi-weight]"));
}

#[test]
fn unknown_name() {
    let (sample, histos) = files();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("histo")
        .arg(histos.path())
        .arg("--sample")
        .arg(sample.path())
        .arg("--name=PT")
        .assert()
        .failure()
        .stderr(str::contains("histogram 'PT' not found"));
}
