//! Reader for the SAF format, a line-oriented text format of nested `<TAG>`/`</TAG>` blocks in
//! which MadAnalysis 5 stores sample information, cut counters and histograms.
//!
//! Every numerical line holds one `(positive, negative)` pair per weight slot, alternating from
//! left to right. Files written without weight variations are read as a single slot.

mod block;
mod reader;

pub use block::{BlockStatuses, SafBlockStatus, Tag};
pub use reader::{bin_to_line, line_to_bin, read, read_path};

use super::bin::Entries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a [`Diagnostic`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// The line was ignored or a value was defaulted.
    Warning,
    /// The file is structurally broken or a number could not be parsed.
    Error,
}

/// A problem found while reading a SAF file. Reading never stops because of it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    /// Severity of the problem.
    pub severity: Severity,
    /// Line number, starting at one, or zero for problems detected at the end of the file.
    pub line: usize,
    /// Description of the problem.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        if self.line == 0 {
            write!(f, "{severity}: {}", self.message)
        } else {
            write!(f, "{severity}: line {}: {}", self.line, self.message)
        }
    }
}

/// Cross sections obtained with the scale and PDF variations of a sample.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct CrossSectionVariations {
    /// Cross section with the upward scale variation.
    pub scale_up: f64,
    /// Cross section with the downward scale variation.
    pub scale_down: f64,
    /// Cross section with the upward PDF variation.
    pub pdf_up: f64,
    /// Cross section with the downward PDF variation.
    pub pdf_down: f64,
}

/// One row of `<SampleGlobalInfo>` or `<SampleDetailedInfo>`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SampleInfo {
    /// Measured cross section in pb.
    pub xsection: f64,
    /// Error of the measured cross section in pb.
    pub xsection_error: f64,
    /// Number of events.
    pub nevents: u64,
    /// Sum of the positive event weights.
    pub sumw_positive: f64,
    /// Sum of the absolute values of the negative event weights.
    pub sumw_negative: f64,
    /// Cross-section variations, if the row provides them.
    pub variations: Option<CrossSectionVariations>,
}

impl SampleInfo {
    /// Physical sum of weights, positive minus negative contribution.
    #[must_use]
    pub fn sumw(&self) -> f64 {
        self.sumw_positive - self.sumw_negative.abs()
    }
}

/// Raw content of an `<InitialCounter>` or `<Counter>` block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CutRecord {
    /// Name of the cut.
    pub name: String,
    /// Number of entries.
    pub nentries: Entries,
    /// Sum of weights.
    pub sumw: Entries,
    /// Sum of squared weights.
    pub sumw2: Entries,
}

/// Kind of a histogram block.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum HistoKind {
    /// Linear binning.
    #[default]
    Linear,
    /// Logarithmic binning in the observable.
    LogX,
    /// One labelled bin per distinct value.
    Frequency,
}

/// Content of a `<Description>` block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Description {
    /// Name of the histogram.
    pub name: String,
    /// Number of bins.
    pub nbins: usize,
    /// Lower limit of the first bin.
    pub xmin: f64,
    /// Upper limit of the last bin.
    pub xmax: f64,
    /// Regions in which the histogram is filled.
    pub regions: Vec<String>,
}

/// Content of a `<Statistics>` block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
    /// Number of events, line 0.
    pub nevents: Entries,
    /// Sum of event weights over entries, line 1.
    pub sumw_entries: Entries,
    /// Number of entries, line 2.
    pub nentries: Entries,
    /// Sum of event weights, line 3.
    pub sumw: Entries,
    /// Sum of squared weights.
    pub sumw2: Entries,
    /// Sum of observable times weight.
    pub sumwx: Entries,
    /// Sum of squared observable times weight.
    pub sumw2x: Entries,
}

/// Raw content of a histogram block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoRecord {
    /// Kind of the histogram.
    pub kind: HistoKind,
    /// `true` if the histogram was found within `<MergingPlots>`.
    pub merging: bool,
    /// Binning and regions.
    pub description: Description,
    /// Global statistics.
    pub statistics: Statistics,
    /// Underflow bin.
    pub underflow: Entries,
    /// Overflow bin.
    pub overflow: Entries,
    /// Regular bins.
    pub bins: Vec<Entries>,
    /// Labels of the bins of a frequency histogram.
    pub labels: Vec<String>,
}

/// One entry of a `<Selection>` block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectionItem {
    /// A cut.
    Cut(String),
    /// A histogram.
    Histo(String),
}

/// Everything read from a SAF file.
#[derive(Clone, Debug, Default)]
pub struct SafDocument {
    /// Lines of the `<SAFheader>` block.
    pub header: Vec<String>,
    /// Lines of the `<SAFfooter>` block.
    pub footer: Vec<String>,
    /// Content of `<SampleGlobalInfo>`.
    pub global_info: Option<SampleInfo>,
    /// Rows of `<SampleDetailedInfo>`.
    pub detailed_info: Vec<SampleInfo>,
    /// Slot and name of every weight listed in `<WeightNames>`.
    pub weight_names: Vec<(usize, String)>,
    /// Content of `<InitialCounter>`.
    pub initial_counter: Option<CutRecord>,
    /// Content of every `<Counter>`, in file order.
    pub counters: Vec<CutRecord>,
    /// Content of `<Selection>`.
    pub selection: Vec<SelectionItem>,
    /// Every histogram, in file order.
    pub histos: Vec<HistoRecord>,
    /// Problems found while reading.
    pub diagnostics: Vec<Diagnostic>,
}

impl SafDocument {
    /// Returns `true` if at least one problem of severity [`Severity::Error`] was found.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Returns the number of weight slots, taken from the first numerical record.
    #[must_use]
    pub fn slots(&self) -> Option<usize> {
        self.initial_counter
            .iter()
            .chain(&self.counters)
            .map(|cut| cut.nentries.len())
            .chain(
                self.histos
                    .iter()
                    .map(|histo| histo.statistics.nevents.len()),
            )
            .find(|&len| len > 0)
    }

    /// Returns the histogram called `name`.
    #[must_use]
    pub fn histo(&self, name: &str) -> Option<&HistoRecord> {
        self.histos
            .iter()
            .find(|histo| histo.description.name == name)
    }
}
