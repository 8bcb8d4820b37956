use super::helpers::{self, DatasetArgs};
use super::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueHint};
use ma5::histo::MultiWeightHisto;
use ma5::processor::Uncertainty;
use ma5::saf::HistoKind;
use prettytable::{Row, cell, row};
use std::path::PathBuf;
use std::process::ExitCode;

/// Show the normalized bins of histograms with their scale and PDF uncertainties.
#[derive(Parser)]
pub struct Opts {
    /// Path to the SAF file with the histograms.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Only show the histogram with this name.
    #[arg(long, short)]
    name: Option<String>,
    /// Set the number of fractional digits shown for absolute numbers.
    #[arg(default_value_t = 7, long, value_name = "ABS")]
    digits_abs: usize,
    /// Set the number of fractional digits shown for relative numbers.
    #[arg(default_value_t = 2, long, value_name = "REL")]
    digits_rel: usize,
}

impl Opts {
    fn add_band(&self, row: &mut Row, band: &Uncertainty, nominal: f64) {
        row.add_cell(cell!(r->format!("{:.*}", self.digits_rel, -100.0 * band.relative_lower(nominal))));
        row.add_cell(cell!(r->format!("{:.*}", self.digits_rel, 100.0 * band.relative_upper(nominal))));
    }

    fn print(&self, histo: &MultiWeightHisto) -> Result<()> {
        let frequency = histo.kind() == HistoKind::Frequency;
        let edges = histo.bin_edges()?;

        let mut title = row![c => "b"];

        if frequency {
            title.add_cell(cell!(c->"label"));
        } else {
            title.add_cell(cell!(c->histo.name()).with_hspan(2));
        }

        title.add_cell(cell!(c->"value"));
        title.add_cell(cell!(c->"total\n[%]").with_hspan(2));
        title.add_cell(cell!(c->"scale\n[%]").with_hspan(2));
        title.add_cell(cell!(c->"pdf\n[%]").with_hspan(2));

        let mut table = helpers::create_table();
        table.set_titles(title);

        for (bin, variations) in histo.variations().iter().enumerate() {
            let row = table.add_empty_row();
            let nominal = variations.nominal;

            row.add_cell(cell!(r->bin));

            if frequency {
                row.add_cell(cell!(l->histo.labels().get(bin).map_or("", String::as_str)));
            } else {
                for edge in [edges.get(bin), edges.get(bin + 1)] {
                    row.add_cell(cell!(r->edge.map_or_else(String::new, f64::to_string)));
                }
            }

            row.add_cell(cell!(r->format!("{:.*e}", self.digits_abs, nominal)));
            self.add_band(row, &variations.total, nominal);
            self.add_band(row, &variations.scale, nominal);
            self.add_band(row, &variations.pdf, nominal);
        }

        println!(
            "{} [{}] integral: {:.*e} mean: {:.*e}",
            histo.name(),
            histo.regions().join(","),
            self.digits_abs,
            histo.integral() * histo.scale(),
            self.digits_abs,
            histo.mean()
        );
        table.printstd();

        Ok(())
    }
}

impl Subcommand for Opts {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let dataset = self.dataset.dataset(cfg)?;
        let document = helpers::read_saf(&self.input)?;
        let histos = dataset.histos(&document).with_context(|| {
            format!(
                "unable to read the histograms of '{}' for dataset '{}'",
                self.input.display(),
                dataset.name()
            )
        })?;

        let selected: Vec<_> = histos
            .iter()
            .filter(|histo| self.name.as_deref().is_none_or(|name| histo.name() == name))
            .collect();

        if let (Some(name), true) = (&self.name, selected.is_empty()) {
            bail!("histogram '{name}' not found in '{}'", self.input.display());
        }

        for (index, histo) in selected.into_iter().enumerate() {
            if index > 0 {
                println!();
            }

            self.print(histo)?;
        }

        Ok(ExitCode::SUCCESS)
    }
}
