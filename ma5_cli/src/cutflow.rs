use super::helpers::{self, DatasetArgs};
use super::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use ma5::processor::Uncertainty;
use prettytable::{Row, cell, row};
use std::path::PathBuf;
use std::process::ExitCode;

/// Calculate the cutflows of signal regions with their scale and PDF uncertainties.
#[derive(Parser)]
pub struct Opts {
    /// Paths to the SAF files with the cutflows, one per signal region.
    #[arg(num_args = 1.., required = true, value_hint = ValueHint::FilePath)]
    input: Vec<PathBuf>,
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Show the yields of every weight slot instead of the uncertainties.
    #[arg(long)]
    weights: bool,
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
}

impl Subcommand for Opts {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let dataset = self.dataset.dataset(cfg)?;
        let cutflows = self
            .input
            .iter()
            .map(|input| -> Result<_> {
                let document = helpers::read_saf(input)?;
                let region = helpers::region_name(input);
                let cuts = dataset
                    .cutflow(&document, &region)
                    .and_then(|cutflow| cutflow.get_cutflow())
                    .with_context(|| {
                        format!(
                            "unable to calculate the cutflow of '{}' for dataset '{}'",
                            input.display(),
                            dataset.name()
                        )
                    })?;

                Ok((region, cuts))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut title = row![c => "region", "c", "name", "yield"];

        if self.weights {
            let slots = cutflows
                .iter()
                .flat_map(|(_, cuts)| cuts.iter().map(|cut| cut.yields.len()))
                .max()
                .unwrap_or(0);

            for slot in 0..slots {
                title.add_cell(cell!(c->format!("w{slot}")));
            }
        } else {
            title.add_cell(cell!(c->"total\n[%]").with_hspan(2));
            title.add_cell(cell!(c->"scale\n[%]").with_hspan(2));
            title.add_cell(cell!(c->"pdf\n[%]").with_hspan(2));
        }

        let mut table = helpers::create_table();
        table.set_titles(title);

        for (region, cuts) in &cutflows {
            for (index, cut) in cuts.iter().enumerate() {
                let nominal = cut.nominal();
                let row = table.add_empty_row();

                row.add_cell(cell!(l->region));
                row.add_cell(cell!(r->index));
                row.add_cell(cell!(l->cut.name));
                row.add_cell(cell!(r->format!("{:.*e}", self.digits_abs, nominal)));

                if self.weights {
                    for value in cut.yields.iter() {
                        row.add_cell(cell!(r->format!("{:.*e}", self.digits_abs, value)));
                    }
                } else {
                    self.add_band(row, &cut.variations.total, nominal);
                    self.add_band(row, &cut.variations.scale, nominal);
                    self.add_band(row, &cut.variations.pdf, nominal);
                }
            }
        }

        table.printstd();

        Ok(ExitCode::SUCCESS)
    }
}
