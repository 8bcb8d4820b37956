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

<SAFfooter>
</SAFfooter>
"#;

const CUTFLOW: &str = r#"<SAFheader>
</SAFheader>

<InitialCounter>
  "Initial number of events" #
  1000 0 1000 0 1000 0 # nentries
  100.0 0.0 95.0 0.0 105.0 0.0 # sum of weights
  100.0 0.0 95.0 0.0 105.0 0.0 # sum of weights^2
</InitialCounter>

<Counter>
  "MET > 100" # 1st cut
  500 0 500 0 500 0 # nentries
  50.0 0.0 48.0 0.0 53.0 0.0 # sum of weights
  50.0 0.0 48.0 0.0 53.0 0.0 # sum of weights^2
</Counter>

<SAFfooter>
</SAFfooter>
"#;

fn files() -> (NamedTempFile, NamedTempFile) {
    let sample = NamedTempFile::new("sample.saf").unwrap();
    sample.write_str(SAMPLE).unwrap();
    let cutflow = NamedTempFile::new("SR.saf").unwrap();
    cutflow.write_str(CUTFLOW).unwrap();

    (sample, cutflow)
}

#[test]
fn help() {
    Command::cargo_bin("ma5")
        .unwrap()
        .args(["cutflow", "--help"])
        .assert()
        .success()
        .stdout(str::contains("Usage: ma5 cutflow"))
        .stdout(str::contains("--sample <SAMPLE>"))
        .stdout(str::contains("[default: 10]"))
        .stdout(str::contains("[possible values: 3, 7, 9]"));
}

#[test]
fn default() {
    let (sample, cutflow) = files();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("cutflow")
        .arg(cutflow.path())
        .arg("--sample")
        .arg(sample.path())
        .assert()
        .success()
        .stdout(str::contains("SR"))
        .stdout(str::contains("Initial number of events"))
        .stdout(str::contains("2.0000000e4"))
        .stdout(str::contains("MET > 100"))
        .stdout(str::contains("1.0000000e4"))
        .stdout(str::contains("1.05"));
}

#[test]
fn xsection_and_lumi() {
    let (sample, cutflow) = files();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("cutflow")
        .arg(cutflow.path())
        .arg("--sample")
        .arg(sample.path())
        .args(["--xsection=4", "--lumi=1"])
        .assert()
        .success()
        .stdout(str::contains("4.0000000e3"))
        .stdout(str::contains("2.0000000e3"));
}

#[test]
fn weights() {
    let (sample, cutflow) = files();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("cutflow")
        .arg(cutflow.path())
        .arg("--sample")
        .arg(sample.path())
        .arg("--weights")
        .assert()
        .success()
        .stdout(str::contains("w2"))
        .stdout(str::contains("1.0105263e4"))
        .stdout(str::contains("1.0095238e4"));
}

#[test]
fn bad_scale_variation() {
    let (sample, cutflow) = files();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("cutflow")
        .arg(cutflow.path())
        .arg("--sample")
        .arg(sample.path())
        .arg("--scales=5")
        .assert()
        .failure()
        .stderr(str::contains("invalid value '5'"));
}

#[test]
fn missing_initial_counter() {
    let (sample, _) = files();
    let cutflow = NamedTempFile::new("CR.saf").unwrap();
    cutflow
        .write_str("<SAFheader>\n</SAFheader>\n<SAFfooter>\n</SAFfooter>\n")
        .unwrap();

    Command::cargo_bin("ma5")
        .unwrap()
        .arg("cutflow")
        .arg(cutflow.path())
        .arg("--sample")
        .arg(sample.path())
        .assert()
        .failure()
        .stderr(str::contains("unable to calculate the cutflow of"))
        .stderr(str::contains(
            "cutflow of region 'CR' in dataset 'sample' has no <InitialCounter> block",
        ));
}
