use super::block::{BlockStatuses, Tag};
use super::{
    CrossSectionVariations, CutRecord, Description, Diagnostic, HistoKind, HistoRecord,
    SafDocument, SampleInfo, SelectionItem, Severity, Statistics,
};
use crate::bin::Entries;
use crate::error::{Error, Result};
use itertools::Itertools;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use tracing::{error, warn};

/// Content lines are dispatched to the innermost open block, in this order.
const CONTENT_BLOCKS: [Tag; 11] = [
    Tag::Description,
    Tag::Statistics,
    Tag::Data,
    Tag::InitialCounter,
    Tag::Counter,
    Tag::SampleGlobalInfo,
    Tag::SampleDetailedInfo,
    Tag::WeightNames,
    Tag::Selection,
    Tag::SafHeader,
    Tag::SafFooter,
];

/// Sub-blocks every histogram block must contain.
const HISTO_BLOCKS: [Tag; 3] = [Tag::Description, Tag::Statistics, Tag::Data];

/// Splits a line of `(positive, negative)` pairs into both accumulators, reading tokens from the
/// left until the end of the line or a `#` token. Tokens at even positions are positive, those at
/// odd positions negative. Malformed numbers are replaced by zero and an odd number of tokens is
/// completed with a zero; both are reported in the returned list of problems.
#[must_use]
pub fn line_to_bin(line: &str) -> (Entries, Vec<String>) {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    let mut problems = Vec::new();

    for (index, token) in line
        .split_whitespace()
        .take_while(|&token| token != "#")
        .enumerate()
    {
        let value = token.parse::<f64>().unwrap_or_else(|err| {
            problems.push(format!("could not parse '{token}' as a number: {err}"));
            0.0
        });

        if index % 2 == 0 {
            positive.push(value);
        } else {
            negative.push(value);
        }
    }

    if positive.len() != negative.len() {
        problems.push(format!(
            "odd number of values ({}), the last negative value is set to zero",
            positive.len() + negative.len()
        ));
    }

    (Entries::padded(positive, negative), problems)
}

/// Writes `entries` as a line of alternating positive and negative values, the inverse of
/// [`line_to_bin`].
#[must_use]
pub fn bin_to_line(entries: &Entries) -> String {
    entries
        .positive()
        .iter()
        .zip(entries.negative().iter())
        .map(|(pos, neg)| format!("{pos} {neg}"))
        .join(" ")
}

/// Removes a `#` comment that is not enclosed in double quotes.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;

    for (index, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' if !quoted => return &line[..index],
            _ => {}
        }
    }

    line
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}

#[derive(Default)]
struct CutBuilder {
    name: String,
    nentries: Entries,
    sumw: Entries,
    sumw2: Entries,
}

impl CutBuilder {
    fn build(self) -> CutRecord {
        CutRecord {
            name: self.name,
            nentries: self.nentries,
            sumw: self.sumw,
            sumw2: self.sumw2,
        }
    }
}

struct HistoBuilder {
    kind: HistoKind,
    merging: bool,
    description: Description,
    statistics: Statistics,
    underflow: Option<Entries>,
    overflow: Option<Entries>,
    bins: Vec<Entries>,
    labels: Vec<String>,
    blocks: Vec<Tag>,
}

impl HistoBuilder {
    fn new(kind: HistoKind, merging: bool) -> Self {
        Self {
            kind,
            merging,
            description: Description::default(),
            statistics: Statistics::default(),
            underflow: None,
            overflow: None,
            bins: Vec::new(),
            labels: Vec::new(),
            blocks: Vec::new(),
        }
    }

    fn missing_blocks(&self) -> Vec<Tag> {
        HISTO_BLOCKS
            .into_iter()
            .filter(|tag| !self.blocks.contains(tag))
            .collect()
    }

    fn build(self) -> HistoRecord {
        // frequency histograms have neither underflow nor overflow
        let slots = self
            .bins
            .first()
            .map_or_else(|| self.statistics.nevents.len(), Entries::len);

        HistoRecord {
            kind: self.kind,
            merging: self.merging,
            description: self.description,
            statistics: self.statistics,
            underflow: self.underflow.unwrap_or_else(|| Entries::zeros(slots)),
            overflow: self.overflow.unwrap_or_else(|| Entries::zeros(slots)),
            bins: self.bins,
            labels: self.labels,
        }
    }
}

struct Reader {
    document: SafDocument,
    blocks: BlockStatuses,
    line: usize,
    histo: Option<HistoBuilder>,
    cut: Option<CutBuilder>,
}

impl Reader {
    fn new() -> Self {
        Self {
            document: SafDocument::default(),
            blocks: BlockStatuses::default(),
            line: 0,
            histo: None,
            cut: None,
        }
    }

    fn report(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Warning => warn!("SAF line {}: {message}", self.line),
            Severity::Error => error!("SAF line {}: {message}", self.line),
        }

        self.document.diagnostics.push(Diagnostic {
            severity,
            line: self.line,
            message,
        });
    }

    fn warning(&mut self, message: String) {
        self.report(Severity::Warning, message);
    }

    fn error(&mut self, message: String) {
        self.report(Severity::Error, message);
    }

    fn extra_line(&mut self, tag: Tag, line: &str) {
        self.warning(format!("Extra line is found in {tag}: '{line}'"));
    }

    fn number<T: FromStr + Default>(&mut self, token: Option<&str>, field: &str) -> T
    where
        T::Err: std::fmt::Display,
    {
        match token.map(str::parse) {
            Some(Ok(value)) => value,
            Some(Err(err)) => {
                self.error(format!(
                    "could not parse {field} '{}': {err}, using zero",
                    token.unwrap_or_default()
                ));
                T::default()
            }
            None => {
                self.error(format!("missing {field}, using zero"));
                T::default()
            }
        }
    }

    fn entries(&mut self, line: &str) -> Entries {
        let (entries, problems) = line_to_bin(line);

        for problem in problems {
            self.error(problem);
        }

        entries
    }

    fn process(&mut self, raw: &str) {
        self.line += 1;
        let line = strip_comment(raw).trim();

        if line.is_empty() {
            return;
        }

        if let Some((tag, open)) = Tag::parse_marker(line) {
            if open {
                self.open(tag);
            } else {
                self.close(tag);
            }
            return;
        }

        let Some(tag) = CONTENT_BLOCKS
            .into_iter()
            .find(|&tag| self.blocks.is_active(tag))
        else {
            self.warning(format!("Extra line is found outside of any block: '{line}'"));
            return;
        };

        let nline = self.blocks.get(tag).nlines();
        self.content(tag, nline, line);
        self.blocks.get_mut(tag).newline();
    }

    fn open(&mut self, tag: Tag) {
        if self.blocks.is_active(tag) {
            self.error(format!("{tag} is opened again before being closed"));
        }

        match tag {
            Tag::Histo | Tag::HistoLogX | Tag::HistoFrequency => {
                if self.histo.is_some() {
                    self.error(format!("{tag} is opened within another histogram"));
                }

                let kind = match tag {
                    Tag::HistoLogX => HistoKind::LogX,
                    Tag::HistoFrequency => HistoKind::Frequency,
                    _ => HistoKind::Linear,
                };
                self.histo = Some(HistoBuilder::new(
                    kind,
                    self.blocks.is_active(Tag::MergingPlots),
                ));
            }
            Tag::InitialCounter | Tag::Counter => self.cut = Some(CutBuilder::default()),
            Tag::Description | Tag::Statistics | Tag::Data => {
                if let Some(histo) = &mut self.histo {
                    histo.blocks.push(tag);
                } else {
                    self.warning(format!("{tag} is found outside of a histogram"));
                }
            }
            _ => {}
        }

        self.blocks.get_mut(tag).activate();
    }

    fn close(&mut self, tag: Tag) {
        if !self.blocks.is_active(tag) {
            self.error(format!("{tag} is closed without being opened"));
            return;
        }

        self.blocks.get_mut(tag).deactivate();

        match tag {
            Tag::Histo | Tag::HistoLogX | Tag::HistoFrequency => {
                if let Some(builder) = self.histo.take() {
                    for missing in builder.missing_blocks() {
                        self.error(format!(
                            "histogram '{}' has no {missing} block",
                            builder.description.name
                        ));
                    }

                    let histo = builder.build();

                    if histo.kind != HistoKind::Frequency
                        && histo.bins.len() != histo.description.nbins
                    {
                        self.warning(format!(
                            "histogram '{}' declares {} bins but {} were found",
                            histo.description.name,
                            histo.description.nbins,
                            histo.bins.len()
                        ));
                    }

                    self.document.histos.push(histo);
                }
            }
            Tag::InitialCounter | Tag::Counter => self.close_counter(tag),
            _ => {}
        }
    }

    fn close_counter(&mut self, tag: Tag) {
        let nlines = self.blocks.get(tag).nlines();

        if nlines < 4 {
            self.error(format!("{tag} has {nlines} of 4 lines"));
        }

        match tag {
            Tag::InitialCounter => {
                if let Some(cut) = self.cut.take() {
                    if self.document.initial_counter.is_some() {
                        self.warning("more than one initial counter, keeping the last".to_owned());
                    }
                    self.document.initial_counter = Some(cut.build());
                }
            }
            Tag::Counter => {
                if let Some(cut) = self.cut.take() {
                    self.document.counters.push(cut.build());
                }
            }
            _ => {}
        }
    }

    fn content(&mut self, tag: Tag, nline: usize, line: &str) {
        match tag {
            Tag::Description => self.description(nline, line),
            Tag::Statistics => self.statistics(nline, line),
            Tag::Data => self.data(nline, line),
            Tag::InitialCounter | Tag::Counter => self.counter(tag, nline, line),
            Tag::SampleGlobalInfo => {
                if nline == 0 {
                    let info = self.sample_info(line);
                    self.document.global_info = Some(info);
                } else {
                    self.extra_line(tag, line);
                }
            }
            Tag::SampleDetailedInfo => {
                let info = self.sample_info(line);
                self.document.detailed_info.push(info);
            }
            Tag::WeightNames => self.weight_name(line),
            Tag::Selection => self.selection(line),
            Tag::SafHeader => self.document.header.push(line.to_owned()),
            Tag::SafFooter => self.document.footer.push(line.to_owned()),
            _ => self.extra_line(tag, line),
        }
    }

    fn description(&mut self, nline: usize, line: &str) {
        let Some(kind) = self.histo.as_ref().map(|histo| histo.kind) else {
            self.extra_line(Tag::Description, line);
            return;
        };

        match nline {
            0 => {
                let name = unquote(line).to_owned();
                if let Some(histo) = &mut self.histo {
                    histo.description.name = name;
                }
            }
            1 if kind != HistoKind::Frequency => {
                let mut tokens = line.split_whitespace();
                let nbins = self.number(tokens.next(), "number of bins");
                let xmin = self.number(tokens.next(), "lower histogram limit");
                let xmax = self.number(tokens.next(), "upper histogram limit");

                if let Some(histo) = &mut self.histo {
                    histo.description.nbins = nbins;
                    histo.description.xmin = xmin;
                    histo.description.xmax = xmax;
                }
            }
            _ => {
                let region = line
                    .split_whitespace()
                    .next()
                    .map(unquote)
                    .unwrap_or_default()
                    .to_owned();
                if let Some(histo) = &mut self.histo {
                    histo.description.regions.push(region);
                }
            }
        }
    }

    fn statistics(&mut self, nline: usize, line: &str) {
        let Some(kind) = self.histo.as_ref().map(|histo| histo.kind) else {
            self.extra_line(Tag::Statistics, line);
            return;
        };

        if nline > 6 || (kind == HistoKind::Frequency && nline > 3) {
            self.extra_line(Tag::Statistics, line);
            return;
        }

        let entries = self.entries(line);

        if let Some(histo) = &mut self.histo {
            let statistics = &mut histo.statistics;
            let field = match nline {
                0 => &mut statistics.nevents,
                1 => &mut statistics.sumw_entries,
                2 => &mut statistics.nentries,
                3 => &mut statistics.sumw,
                4 => &mut statistics.sumw2,
                5 => &mut statistics.sumwx,
                _ => &mut statistics.sumw2x,
            };
            *field = entries;
        }
    }

    fn data(&mut self, nline: usize, line: &str) {
        let Some((kind, nbins)) = self
            .histo
            .as_ref()
            .map(|histo| (histo.kind, histo.description.nbins))
        else {
            self.extra_line(Tag::Data, line);
            return;
        };

        if kind == HistoKind::Frequency {
            let (label, values) = line
                .split_once(char::is_whitespace)
                .unwrap_or((line, ""));
            let label = unquote(label).to_owned();
            let entries = self.entries(values);

            if let Some(histo) = &mut self.histo {
                histo.labels.push(label);
                histo.bins.push(entries);
            }
            return;
        }

        if nline > nbins + 1 {
            self.extra_line(Tag::Data, line);
            return;
        }

        let entries = self.entries(line);

        if let Some(histo) = &mut self.histo {
            if nline == 0 {
                histo.underflow = Some(entries);
            } else if nline == nbins + 1 {
                histo.overflow = Some(entries);
            } else {
                histo.bins.push(entries);
            }
        }
    }

    fn counter(&mut self, tag: Tag, nline: usize, line: &str) {
        if nline > 3 {
            self.extra_line(tag, line);
            return;
        }

        let entries = (nline > 0).then(|| self.entries(line));

        if let Some(cut) = &mut self.cut {
            match (nline, entries) {
                (0, _) => cut.name = unquote(line).to_owned(),
                (1, Some(entries)) => cut.nentries = entries,
                (2, Some(entries)) => cut.sumw = entries,
                (_, Some(entries)) => cut.sumw2 = entries,
                (_, None) => {}
            }
        }
    }

    fn sample_info(&mut self, line: &str) -> SampleInfo {
        let tokens: Vec<_> = line.split_whitespace().collect();

        if tokens.len() < 5 {
            self.error(format!(
                "expected at least 5 columns of sample information, found {}",
                tokens.len()
            ));
        } else if (6..9).contains(&tokens.len()) {
            self.warning(format!(
                "cross-section variations need 9 columns, found {}, ignoring them",
                tokens.len()
            ));
        }

        let mut column = |index: usize, field: &str| -> f64 {
            self.number(tokens.get(index).copied(), field)
        };

        let xsection = column(0, "cross section");
        let xsection_error = column(1, "cross-section error");
        let sumw_positive = column(3, "sum of positive weights");
        let sumw_negative = column(4, "sum of negative weights");
        let variations = (tokens.len() >= 9).then(|| CrossSectionVariations {
            scale_up: column(5, "cross section with upward scale variation"),
            scale_down: column(6, "cross section with downward scale variation"),
            pdf_up: column(7, "cross section with upward PDF variation"),
            pdf_down: column(8, "cross section with downward PDF variation"),
        });
        let nevents = self.number(tokens.get(2).copied(), "number of events");

        SampleInfo {
            xsection,
            xsection_error,
            nevents,
            sumw_positive,
            sumw_negative,
            variations,
        }
    }

    fn weight_name(&mut self, line: &str) {
        let (index, name) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let name = unquote(name);

        match index.parse::<usize>() {
            Ok(loc) if !name.is_empty() => self.document.weight_names.push((loc, name.to_owned())),
            Ok(_) => self.error(format!("weight at slot {index} has no name")),
            Err(err) => self.error(format!("could not parse weight slot '{index}': {err}")),
        }
    }

    fn selection(&mut self, line: &str) {
        let (kind, name) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let name = unquote(name).to_owned();

        if kind.eq_ignore_ascii_case("cut") {
            self.document.selection.push(SelectionItem::Cut(name));
        } else if kind.eq_ignore_ascii_case("histo") {
            self.document.selection.push(SelectionItem::Histo(name));
        } else {
            self.extra_line(Tag::Selection, line);
        }
    }

    fn finish(mut self) -> SafDocument {
        self.line = 0;

        for tag in Tag::ALL {
            if self.blocks.is_active(tag) {
                self.error(format!("{tag} is not closed at the end of the file"));
            }
        }

        for tag in [Tag::SafHeader, Tag::SafFooter] {
            if self.blocks.get(tag).nactivated() == 0 {
                self.error(format!("no {tag} block found"));
            }
        }

        if self.blocks.get(Tag::Counter).nactivated() > 0
            && self.blocks.get(Tag::InitialCounter).nactivated() == 0
        {
            self.error(format!("no {} block found for the cuts", Tag::InitialCounter));
        }

        self.document
    }
}

/// Reads a SAF document from `reader`. Problems with the content of the file are collected in
/// [`SafDocument::diagnostics`] and logged, they never abort reading.
///
/// # Errors
///
/// Returns an error only if reading from `reader` fails.
pub fn read(reader: impl BufRead) -> Result<SafDocument> {
    let mut state = Reader::new();

    for line in reader.lines() {
        state.process(&line?);
    }

    Ok(state.finish())
}

/// Reads the SAF document stored at `path`, see [`read`].
///
/// # Errors
///
/// Returns an error if the file can not be opened or read.
pub fn read_path(path: &Path) -> Result<SafDocument> {
    let file = File::open(path)
        .map_err(|err| Error::General(format!("could not open '{}': {err}", path.display())))?;

    read(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::MultiWeightBin;

    const HISTOS: &str = r#"<SAFheader>
</SAFheader>

<Selection>
  cut "MET > 100"
  histo "pt_j1"
</Selection>

<Histo>
  <Description>
    "pt_j1"
    # nbins xmin xmax
       3  0.0  300.0
    # Defined regions
    SR1 # Region nr. 1
    SR2 # Region nr. 2
  </Description>
  <Statistics>
    10 0 9 1 # nevents
    9.5 0.0 9.0 -0.5 # sum of event-weights over events
    12 0 11 1 # nentries
    11.5 0.0 10.5 -0.5 # sum of event-weights over entries
    11.0 0.0 10.0 0.25 # sum weights^2
    1200.0 0.0 1100.0 -50.0 # sum value*weight
    150000.0 0.0 140000.0 5000.0 # sum value^2*weight
  </Statistics>
  <Data>
    0 0 0 0 # underflow
    5.5 0 5 -0.5
    4 0 3.5 0
    2 0 2 0
    0 0 0 0 # overflow
  </Data>
</Histo>

<MergingPlots>
<HistoFrequency>
  <Description>
    "njets"
    SR1
  </Description>
  <Statistics>
    10 0 10 0
    9.5 0 9.5 0
    10 0 10 0
    9.5 0 9.5 0
  </Statistics>
  <Data>
    0 1 0 1 0
    1 8.5 0 8.5 0
  </Data>
</HistoFrequency>
</MergingPlots>

<SAFfooter>
</SAFfooter>
"#;

    #[test]
    fn read_histograms() {
        let document = read(HISTOS.as_bytes()).unwrap();

        assert!(document.diagnostics.is_empty(), "{:?}", document.diagnostics);
        assert_eq!(document.histos.len(), 2);
        assert_eq!(
            document.selection,
            [
                SelectionItem::Cut("MET > 100".to_owned()),
                SelectionItem::Histo("pt_j1".to_owned())
            ]
        );
        assert_eq!(document.slots(), Some(2));

        let histo = document.histo("pt_j1").unwrap();
        assert_eq!(histo.kind, HistoKind::Linear);
        assert!(!histo.merging);
        assert_eq!(histo.description.nbins, 3);
        assert_eq!(histo.description.xmax, 300.0);
        assert_eq!(histo.description.regions, ["SR1", "SR2"]);
        assert_eq!(histo.statistics.nentries.positive().values(), [12.0, 11.0]);
        assert_eq!(histo.statistics.sumw2x.negative().values(), [0.0, 5000.0]);
        assert_eq!(histo.bins.len(), 3);
        assert_eq!(histo.bins[0].positive().values(), [5.5, 5.0]);
        assert_eq!(histo.bins[0].negative().values(), [0.0, -0.5]);
        assert_eq!(histo.overflow, Entries::zeros(2));

        let frequency = document.histo("njets").unwrap();
        assert_eq!(frequency.kind, HistoKind::Frequency);
        assert!(frequency.merging);
        assert_eq!(frequency.labels, ["0", "1"]);
        assert_eq!(frequency.bins[1].positive().values(), [8.5, 8.5]);
        assert_eq!(frequency.underflow.len(), 2);
    }

    #[test]
    fn data_lines_survive_a_round_trip() {
        let lines = ["5.5 0 5 -0.5 6 0", "4 0 3.5 0 4.25 -1", "2 -0.125 2 0 1 0"];
        let mut saf = String::from(
            "<SAFheader>\n</SAFheader>\n<Histo>\n<Description>\n\"x\"\n3 0 3\n</Description>\n<Data>\n0 0 0 0 0 0\n",
        );
        for line in lines {
            saf.push_str(line);
            saf.push('\n');
        }
        saf.push_str("0 0 0 0 0 0\n</Data>\n</Histo>\n<SAFfooter>\n</SAFfooter>\n");

        let document = read(saf.as_bytes()).unwrap();
        let histo = &document.histos[0];

        assert_eq!(histo.bins.len(), 3);
        for (bin, line) in histo.bins.iter().zip(lines) {
            assert_eq!(bin.len(), 3);
            assert_eq!(bin_to_line(bin), line);
        }
    }

    #[test]
    fn line_to_bin_stops_at_comment() {
        let (entries, problems) = line_to_bin("1 2 3 4 # 5 6");

        assert!(problems.is_empty());
        assert_eq!(entries.positive(), &MultiWeightBin::new(vec![1.0, 3.0]));
        assert_eq!(entries.negative(), &MultiWeightBin::new(vec![2.0, 4.0]));
    }

    #[test]
    fn line_to_bin_defaults_bad_tokens() {
        let (entries, problems) = line_to_bin("1 x 3");

        assert_eq!(problems.len(), 2);
        assert_eq!(entries.positive().values(), [1.0, 3.0]);
        assert_eq!(entries.negative().values(), [0.0, 0.0]);
    }

    #[test]
    fn read_counters_and_sample_info() {
        let saf = r#"<SAFheader>
</SAFheader>
<SampleGlobalInfo>
    # xsection    xsec_error    nevents     sum_weight+    sum_weight-
    2.0e+00      1.0e-02       1000       1.0e+02        0.0e+00
</SampleGlobalInfo>
<SampleDetailedInfo>
    2.0e+00      1.0e-02       500       5.0e+01        0.0e+00   2.1 1.9 2.05 1.95
    2.0e+00      1.0e-02       500       5.0e+01        0.0e+00
</SampleDetailedInfo>
<WeightNames>
  0 MUR=1.0_MUF=1.0_PDF=303200
  1 "MUR=2.0_MUF=2.0_PDF=303200"
</WeightNames>
<InitialCounter>
  "Initial number of events" #
  1000 0 1000 0 # nentries
  100.0 0.0 95.0 0.0 # sum of weights
  10.0 0.0 9.0 0.0 # sum of weights^2
</InitialCounter>
<Counter>
  "MET > 100" # 1st cut
  500 0 500 0 # nentries
  50.0 0.0 48.0 0.0 # sum of weights
  5.0 0.0 4.8 0.0 # sum of weights^2
</Counter>
<SAFfooter>
</SAFfooter>
"#;
        let document = read(saf.as_bytes()).unwrap();

        assert!(document.diagnostics.is_empty(), "{:?}", document.diagnostics);

        let info = document.global_info.as_ref().unwrap();
        assert_eq!(info.xsection, 2.0);
        assert_eq!(info.nevents, 1000);
        assert_eq!(info.sumw(), 100.0);
        assert_eq!(info.variations, None);
        assert_eq!(document.detailed_info.len(), 2);
        assert_eq!(
            document.detailed_info[0].variations.unwrap().scale_up,
            2.1
        );

        assert_eq!(
            document.weight_names,
            [
                (0, "MUR=1.0_MUF=1.0_PDF=303200".to_owned()),
                (1, "MUR=2.0_MUF=2.0_PDF=303200".to_owned())
            ]
        );

        let initial = document.initial_counter.as_ref().unwrap();
        assert_eq!(initial.name, "Initial number of events");
        assert_eq!(initial.sumw.positive().values(), [100.0, 95.0]);
        assert_eq!(document.counters.len(), 1);
        assert_eq!(document.counters[0].name, "MET > 100");
        assert_eq!(document.counters[0].sumw2.positive().values(), [5.0, 4.8]);
    }

    #[test]
    fn malformed_structure_is_reported() {
        let saf = "<SAFheader>\n</SAFheader>\n<Counter>\n\"cut\"\n1 0\n1 0\n1 0\n7 0\n</Histo>\nstray\n<Histo>\n";
        let document = read(saf.as_bytes()).unwrap();

        let messages: Vec<_> = document
            .diagnostics
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            messages,
            [
                "warning: line 8: Extra line is found in <Counter>: '7 0'",
                "error: line 9: <Histo> is closed without being opened",
                "warning: line 10: Extra line is found in <Counter>: 'stray'",
                "error: <Counter> is not closed at the end of the file",
                "error: <Histo> is not closed at the end of the file",
                "error: no <SAFfooter> block found",
                "error: no <InitialCounter> block found for the cuts",
            ]
        );
        assert!(document.has_errors());
        assert!(document.counters.is_empty());
        assert!(document.histos.is_empty());
    }

    #[test]
    fn incomplete_blocks_are_reported() {
        let saf = "<SAFheader>
</SAFheader>
<SampleGlobalInfo>
  2.0 0.01 1000 100.0 0.0 2.1 1.9
</SampleGlobalInfo>
<Counter>
  \"MET > 100\"
  500 0
  50.0 0.0
</Counter>
<Histo>
  <Description>
    \"MET\"
    1 0.0 100.0
  </Description>
  <Data>
    0 0
    1 0
    0 0
  </Data>
</Histo>
<Data>
  1 0
</Data>
<SAFfooter>
</SAFfooter>
";
        let document = read(saf.as_bytes()).unwrap();

        let messages: Vec<_> = document
            .diagnostics
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            messages,
            [
                "warning: line 4: cross-section variations need 9 columns, found 7, ignoring them",
                "error: line 10: <Counter> has 3 of 4 lines",
                "error: line 21: histogram 'MET' has no <Statistics> block",
                "warning: line 22: <Data> is found outside of a histogram",
                "warning: line 23: Extra line is found in <Data>: '1 0'",
                "error: no <InitialCounter> block found for the cuts",
            ]
        );
        assert_eq!(document.global_info.unwrap().variations, None);
        assert_eq!(document.counters.len(), 1);
        assert_eq!(document.histos.len(), 1);
    }

    #[test]
    fn statistics_lines() {
        let saf = "<SAFheader>
</SAFheader>
<Histo>
  <Description>
    \"x\"
    1 0.0 4.0
  </Description>
  <Statistics>
    4 0
    7.0 0.0
    5 0
    3.0 0.0
    9.0 0.0
    14.0 0.0
    40.0 0.0
  </Statistics>
  <Data>
    0 0
    7.0 0.0
    0 0
  </Data>
</Histo>
<SAFfooter>
</SAFfooter>
";
        let document = read(saf.as_bytes()).unwrap();
        let statistics = &document.histos[0].statistics;

        assert!(document.diagnostics.is_empty(), "{:?}", document.diagnostics);
        assert_eq!(statistics.nevents.positive().values(), [4.0]);
        assert_eq!(statistics.sumw_entries.positive().values(), [7.0]);
        assert_eq!(statistics.nentries.positive().values(), [5.0]);
        assert_eq!(statistics.sumw.positive().values(), [3.0]);
        assert_eq!(statistics.sumwx.positive().values(), [14.0]);
    }
}
