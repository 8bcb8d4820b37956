use super::GlobalConfiguration;
use anyhow::{Context, Result};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Args, ValueEnum, ValueHint};
use ma5::context::{DatasetContext, Normalization, RunContext};
use ma5::dataset::Dataset;
use ma5::pdf::{PdfMethod, PdfTable};
use ma5::saf::{self, SafDocument};
use ma5::weight::ScaleVariation;
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};
use prettytable::Table;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

pub fn create_table() -> Table {
    let mut table = Table::new();
    table.set_format(
        FormatBuilder::new()
            .column_separator(' ')
            .separator(LinePosition::Title, LineSeparator::new('-', '+', ' ', ' '))
            .build(),
    );
    table
}

pub fn read_saf(path: &Path) -> Result<SafDocument> {
    let document = saf::read_path(path)
        .with_context(|| format!("unable to read '{}'", path.display()))?;

    if document.has_errors() {
        warn!("'{}' is not a well-formed SAF file", path.display());
    }

    Ok(document)
}

pub fn read_pdf_table(path: Option<&Path>) -> Result<Option<PdfTable>> {
    path.map(|path| {
        PdfTable::from_path(path)
            .with_context(|| format!("unable to read PDF index '{}'", path.display()))
    })
    .transpose()
}

/// Name of a signal region, taken from the stem of its cutflow file.
pub fn region_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(
            || path.display().to_string(),
            |stem| stem.to_string_lossy().into_owned(),
        )
}

/// Normalization policy accepted by `--normalize`.
#[derive(Clone, Copy, ValueEnum)]
pub enum Normalize {
    /// Keep the raw sums of weights.
    None,
    /// Normalize to the integrated luminosity.
    Lumi,
    /// Normalize to the integrated luminosity and multiply by the dataset weight.
    LumiWeight,
}

impl From<Normalize> for Normalization {
    fn from(normalize: Normalize) -> Self {
        match normalize {
            Normalize::None => Self::None,
            Normalize::Lumi => Self::Lumi,
            Normalize::LumiWeight => Self::LumiWeight,
        }
    }
}

/// Normalization of a single dataset given on the command line.
#[derive(Args)]
pub struct DatasetArgs {
    /// Path to the SAF file with the sample information and the weight names.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub sample: PathBuf,
    /// Cross section in pb, zero selects the cross section of the sample.
    #[arg(default_value_t = 0.0, long)]
    pub xsection: f64,
    /// Integrated luminosity in inverse femtobarn.
    #[arg(default_value_t = 10.0, long)]
    pub lumi: f64,
    /// Weight of the dataset, used with `--normalize=lumi-weight`.
    #[arg(default_value_t = 1.0, long)]
    pub weight: f64,
    /// Normalization policy.
    #[arg(default_value = "lumi", long, value_enum)]
    pub normalize: Normalize,
    /// Dynamic scale choice of the nominal weight.
    #[arg(allow_negative_numbers = true, default_value_t = -1, long)]
    pub dynamic_scale: i32,
    /// Number of points of the scale variation.
    #[arg(
        default_value = "3",
        long,
        value_parser = PossibleValuesParser::new(["3", "7", "9"]).try_map(|s| s.parse::<usize>())
    )]
    pub scales: usize,
    /// LHAPDF ids accepted for the nominal weight.
    #[arg(long, value_delimiter = ',')]
    pub central_pdfs: Vec<i32>,
    /// Use Hessian eigenvectors instead of replicas for the PDF uncertainty.
    #[arg(long)]
    pub eigenvector: bool,
}

impl DatasetArgs {
    pub fn dataset(&self, cfg: &GlobalConfiguration) -> Result<Dataset> {
        let run = RunContext {
            lumi: self.lumi,
            normalize: self.normalize.into(),
            central_pdfs: self.central_pdfs.clone(),
            pdf_method: if self.eigenvector {
                PdfMethod::Eigenvector
            } else {
                PdfMethod::Replicas
            },
            regions: Vec::new(),
        };
        let context = DatasetContext {
            name: region_name(&self.sample),
            xsection: self.xsection,
            weight: self.weight,
            dynamic_scale_choice: self.dynamic_scale,
            n_point_scale_variation: ScaleVariation::try_from(self.scales)?,
        };
        let pdfs = read_pdf_table(cfg.pdf_index.as_deref())?;
        let sample = read_saf(&self.sample)?;

        Dataset::new(Arc::new(run), Arc::new(context), &sample, pdfs.as_ref())
            .with_context(|| format!("unable to set up dataset from '{}'", self.sample.display()))
    }
}
