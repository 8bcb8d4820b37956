use super::helpers;
use super::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::{Args, Parser, ValueHint};
use itertools::Itertools;
use ma5::saf::{HistoKind, SelectionItem};
use ma5::weight::WeightCollection;
use prettytable::row;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Args)]
#[group(multiple = false, required = true)]
struct Group {
    /// Show the global sample information.
    #[arg(long, short)]
    sample: bool,
    /// Show the names of the weights and their parameters.
    #[arg(long, short)]
    weights: bool,
    /// Show the counters with their nominal number of entries and sum of weights.
    #[arg(long, short)]
    cuts: bool,
    /// Show the histograms and their binning.
    #[arg(long)]
    histos: bool,
    /// Show the cuts and histograms listed in the selection.
    #[arg(long)]
    selection: bool,
    /// Show the problems found while reading, failing if one of them is an error.
    #[arg(long)]
    check: bool,
}

/// Read out information of a SAF file.
#[derive(Parser)]
pub struct Opts {
    /// Path to the input SAF file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
    #[command(flatten)]
    group: Group,
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(String::new, |value| value.to_string())
}

impl Subcommand for Opts {
    fn run(&self, _: &GlobalConfiguration) -> Result<ExitCode> {
        let document = helpers::read_saf(&self.input)?;

        if self.group.check {
            for diagnostic in &document.diagnostics {
                println!("{diagnostic}");
            }

            return Ok(if document.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }

        let mut table = helpers::create_table();

        if self.group.sample {
            table.set_titles(row![c => "xsec", "xsec_err", "nevents", "sumw+", "sumw-"]);

            if let Some(info) = &document.global_info {
                table.add_row(row![
                    r->format!("{:.7e}", info.xsection),
                    r->format!("{:.7e}", info.xsection_error),
                    r->info.nevents,
                    r->format!("{:.7e}", info.sumw_positive),
                    r->format!("{:.7e}", info.sumw_negative)
                ]);
            }
        } else if self.group.weights {
            table.set_titles(row![c => "w", "name", "dyn", "muf", "mur", "pdf"]);

            let mut weights = WeightCollection::new();

            for (loc, name) in &document.weight_names {
                weights.append(name, *loc);
            }

            for weight in weights.iter() {
                table.add_row(row![
                    r->weight.loc(),
                    weight.name(),
                    r->optional(weight.dynamic_scale()),
                    r->optional(weight.muf()),
                    r->optional(weight.mur()),
                    r->optional(weight.pdfset())
                ]);
            }
        } else if self.group.cuts {
            table.set_titles(row![c => "c", "name", "nentries", "sumw"]);

            for (index, cut) in document
                .initial_counter
                .iter()
                .chain(&document.counters)
                .enumerate()
            {
                table.add_row(row![
                    r->index,
                    cut.name,
                    r->optional(cut.nentries.value_at(0)),
                    r->optional(cut.sumw.value_at(0).map(|sumw| format!("{sumw:.7e}")))
                ]);
            }
        } else if self.group.histos {
            table.set_titles(row![c => "h", "name", "kind", "bins", "xmin", "xmax", "regions"]);

            for (index, histo) in document.histos.iter().enumerate() {
                let description = &histo.description;
                let kind = match histo.kind {
                    HistoKind::Linear => "linear",
                    HistoKind::LogX => "logx",
                    HistoKind::Frequency => "frequency",
                };

                if histo.kind == HistoKind::Frequency {
                    table.add_row(row![
                        r->index,
                        description.name,
                        kind,
                        r->histo.bins.len(),
                        "",
                        "",
                        description.regions.iter().join(",")
                    ]);
                } else {
                    table.add_row(row![
                        r->index,
                        description.name,
                        kind,
                        r->description.nbins,
                        r->description.xmin,
                        r->description.xmax,
                        description.regions.iter().join(",")
                    ]);
                }
            }
        } else if self.group.selection {
            table.set_titles(row![c => "s", "kind", "name"]);

            for (index, item) in document.selection.iter().enumerate() {
                let (kind, name) = match item {
                    SelectionItem::Cut(name) => ("cut", name),
                    SelectionItem::Histo(name) => ("histo", name),
                };

                table.add_row(row![r->index, kind, name]);
            }
        } else {
            unreachable!();
        }

        table.printstd();

        Ok(ExitCode::SUCCESS)
    }
}
