use super::helpers;
use super::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use itertools::Itertools;
use ma5::context::{DatasetContext, RunContext};
use ma5::cut::CutYield;
use ma5::dataset::Dataset;
use ma5::histo::MultiWeightHisto;
use ma5::pdf::PdfTable;
use prettytable::row;
use rayon::{ThreadPoolBuilder, prelude::*};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use tracing::info;

#[derive(Deserialize)]
struct Card {
    #[serde(flatten)]
    run: RunContext,
    pdf_index: Option<PathBuf>,
    #[serde(default)]
    datasets: Vec<CardDataset>,
}

#[derive(Deserialize)]
struct CardDataset {
    #[serde(flatten)]
    context: DatasetContext,
    sample: PathBuf,
    #[serde(default)]
    cutflows: Vec<PathBuf>,
    histos: Option<PathBuf>,
}

struct Report {
    name: String,
    cutflows: Vec<(String, Vec<CutYield>)>,
    histos: Vec<MultiWeightHisto>,
}

/// Calculate the cutflows and histograms of every dataset of a run card.
#[derive(Parser)]
pub struct Opts {
    /// Path to the YAML run card.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
    /// Number of threads to utilize.
    #[arg(default_value_t = thread::available_parallelism().map_or(1, NonZeroUsize::get), long)]
    threads: usize,
    /// Set the number of fractional digits shown for absolute numbers.
    #[arg(default_value_t = 7, long, value_name = "ABS")]
    digits_abs: usize,
    /// Set the number of fractional digits shown for relative numbers.
    #[arg(default_value_t = 2, long, value_name = "REL")]
    digits_rel: usize,
}

fn read_card(path: &Path) -> Result<Card> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("unable to open '{}'", path.display()))?,
    );

    serde_yaml::from_reader(reader)
        .with_context(|| format!("unable to parse run card '{}'", path.display()))
}

fn process(
    base: &Path,
    run: &Arc<RunContext>,
    pdfs: Option<&PdfTable>,
    card: &CardDataset,
) -> Result<Report> {
    let name = &card.context.name;
    let sample = helpers::read_saf(&base.join(&card.sample))?;
    let dataset = Dataset::new(Arc::clone(run), Arc::new(card.context.clone()), &sample, pdfs)
        .with_context(|| format!("unable to set up dataset '{name}'"))?;

    info!("processing dataset '{name}'");

    let cutflows = card
        .cutflows
        .iter()
        .map(|path| -> Result<_> {
            let path = base.join(path);
            let region = helpers::region_name(&path);
            let document = helpers::read_saf(&path)?;
            let cuts = dataset
                .cutflow(&document, &region)
                .and_then(|cutflow| cutflow.get_cutflow())
                .with_context(|| {
                    format!(
                        "unable to calculate the cutflow of '{}' for dataset '{name}'",
                        path.display()
                    )
                })?;

            Ok((region, cuts))
        })
        .collect::<Result<Vec<_>>>()?;

    let histos = match &card.histos {
        Some(path) => {
            let path = base.join(path);
            let document = helpers::read_saf(&path)?;

            dataset.histos(&document).with_context(|| {
                format!(
                    "unable to read the histograms of '{}' for dataset '{name}'",
                    path.display()
                )
            })?
        }
        None => Vec::new(),
    };

    Ok(Report {
        name: name.clone(),
        cutflows,
        histos,
    })
}

impl Opts {
    fn print(&self, report: &Report) {
        println!("{}", report.name);

        if !report.cutflows.is_empty() {
            let mut table = helpers::create_table();
            table.set_titles(row![c => "region", "c", "name", "yield", "-unc\n[%]", "+unc\n[%]"]);

            for (region, cuts) in &report.cutflows {
                for (index, cut) in cuts.iter().enumerate() {
                    let nominal = cut.nominal();
                    let total = cut.total();

                    table.add_row(row![
                        l->region,
                        r->index,
                        l->cut.name,
                        r->format!("{:.*e}", self.digits_abs, nominal),
                        r->format!("{:.*}", self.digits_rel, -100.0 * total.relative_lower(nominal)),
                        r->format!("{:.*}", self.digits_rel, 100.0 * total.relative_upper(nominal))
                    ]);
                }
            }

            table.printstd();
        }

        if !report.histos.is_empty() {
            let mut table = helpers::create_table();
            table.set_titles(row![c => "h", "name", "regions", "bins", "integral", "mean"]);

            for (index, histo) in report.histos.iter().enumerate() {
                table.add_row(row![
                    r->index,
                    l->histo.name(),
                    l->histo.regions().iter().join(","),
                    r->histo.bins().len(),
                    r->format!("{:.*e}", self.digits_abs, histo.integral() * histo.scale()),
                    r->format!("{:.*e}", self.digits_abs, histo.mean())
                ]);
            }

            table.printstd();
        }
    }
}

impl Subcommand for Opts {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let card = read_card(&self.input)?;
        let base = self.input.parent().unwrap_or_else(|| Path::new(""));
        let pdf_index = cfg
            .pdf_index
            .clone()
            .or_else(|| card.pdf_index.as_ref().map(|path| base.join(path)));
        let pdfs = helpers::read_pdf_table(pdf_index.as_deref())?;
        let run = Arc::new(card.run);

        let pool = ThreadPoolBuilder::new().num_threads(self.threads).build()?;
        let reports: Vec<_> = pool.install(|| {
            card.datasets
                .par_iter()
                .map(|dataset| process(base, &run, pdfs.as_ref(), dataset))
                .collect()
        });

        let mut code = ExitCode::SUCCESS;

        for (index, report) in reports.into_iter().enumerate() {
            if index > 0 {
                println!();
            }

            match report {
                Ok(report) => self.print(&report),
                Err(err) => {
                    eprintln!("Error: {err:?}");
                    code = ExitCode::FAILURE;
                }
            }
        }

        Ok(code)
    }
}
