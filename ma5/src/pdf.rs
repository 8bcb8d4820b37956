//! Module containing the table of LHAPDF sets, used to find the members of a central PDF.

use super::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Convention used to combine the members of a PDF set into an uncertainty.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfMethod {
    /// Monte Carlo replicas, combined as the root mean square about their mean.
    #[default]
    Replicas,
    /// Hessian eigenvectors, given as consecutive (up, down) pairs and combined in quadrature.
    Eigenvector,
}

/// A PDF set with its LHAPDF id and number of members.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pdf {
    id: i32,
    name: String,
    nmembers: u32,
}

impl Pdf {
    /// Constructor.
    #[must_use]
    pub fn new(id: i32, name: &str, nmembers: u32) -> Self {
        Self {
            id,
            name: name.to_owned(),
            nmembers,
        }
    }

    /// LHAPDF id of the central member.
    #[must_use]
    pub const fn id(&self) -> i32 {
        self.id
    }

    /// Name of the set.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of members, including the central one.
    #[must_use]
    pub const fn nmembers(&self) -> u32 {
        self.nmembers
    }

    /// Returns the LHAPDF ids of all members, starting with the central one.
    #[must_use]
    pub fn members(&self) -> Range<i32> {
        self.id..self.id.saturating_add_unsigned(self.nmembers)
    }

    /// Returns `true` if `id` is one of the members of this set.
    #[must_use]
    pub fn contains(&self, id: i32) -> bool {
        self.members().contains(&id)
    }
}

impl IntoIterator for &Pdf {
    type Item = i32;
    type IntoIter = Range<i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.members()
    }
}

/// Error type returned when a PDF index could not be parsed.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("line {line}: {message}")]
pub struct ParsePdfTableError {
    line: usize,
    message: String,
}

impl ParsePdfTableError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Mapping of LHAPDF ids to PDF sets.
#[derive(Clone, Debug, Default)]
pub struct PdfTable {
    pdfs: BTreeMap<i32, Pdf>,
}

impl PdfTable {
    /// Constructor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a comma-separated index with the columns `pdfid`, `name` and `nmembers`. The first
    /// line that is not empty and not a `#` comment is the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header lacks one of the columns, if a row has too few columns or if
    /// a number can not be parsed.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut table = Self::new();
        let mut columns: Option<[usize; 3]> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = index + 1;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<_> = line.split(',').map(str::trim).collect();

            let Some([id_col, name_col, nmem_col]) = columns else {
                let position = |column: &str| {
                    fields
                        .iter()
                        .position(|field| field.eq_ignore_ascii_case(column))
                        .ok_or_else(|| {
                            ParsePdfTableError::new(
                                line_number,
                                format!("missing column '{column}' in header"),
                            )
                        })
                };
                columns = Some([position("pdfid")?, position("name")?, position("nmembers")?]);
                continue;
            };

            let field = |col: usize| {
                fields.get(col).copied().ok_or_else(|| {
                    ParsePdfTableError::new(line_number, format!("expected at least {} columns", col + 1))
                })
            };

            let id = field(id_col)?.parse().map_err(|err| {
                ParsePdfTableError::new(line_number, format!("invalid pdfid: {err}"))
            })?;
            let nmembers = field(nmem_col)?.parse().map_err(|err| {
                ParsePdfTableError::new(line_number, format!("invalid nmembers: {err}"))
            })?;

            table.insert(Pdf::new(id, field(name_col)?, nmembers));
        }

        Ok(table)
    }

    /// Reads the index stored at `path`, see [`PdfTable::from_reader`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file can not be opened or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| {
            Error::General(format!("could not open PDF index '{}': {err}", path.display()))
        })?;

        Self::from_reader(BufReader::new(file))
    }

    /// Adds `pdf`, replacing a set with the same id.
    pub fn insert(&mut self, pdf: Pdf) {
        self.pdfs.insert(pdf.id, pdf);
    }

    /// Returns the set whose central member is `id`.
    #[must_use]
    pub fn get(&self, id: i32) -> Option<&Pdf> {
        self.pdfs.get(&id)
    }

    /// Returns the set `member` belongs to.
    #[must_use]
    pub fn set_of(&self, member: i32) -> Option<&Pdf> {
        self.pdfs
            .range(..=member)
            .next_back()
            .map(|(_, pdf)| pdf)
            .filter(|pdf| pdf.contains(member))
    }

    /// Returns the number of sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pdfs.len()
    }

    /// Returns `true` if the table has no sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pdfs.is_empty()
    }
}

impl From<ParsePdfTableError> for Error {
    fn from(err: ParsePdfTableError) -> Self {
        Self::General(format!("PDF index: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "# LHAPDF index
pdfid,name,nmembers
303200,NNPDF30_nlo_as_0118,101

260000, NNPDF30_nlo_as_0118_old ,101
90400,PDF4LHC15_nlo_30_pdfas,33
";

    #[test]
    fn read_index() {
        let table = PdfTable::from_reader(INDEX.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        let pdf = table.get(260000).unwrap();
        assert_eq!(pdf.name(), "NNPDF30_nlo_as_0118_old");
        assert_eq!(pdf.nmembers(), 101);
        assert_eq!(table.get(90400).unwrap().members().collect::<Vec<_>>().len(), 33);
        assert!(table.get(303201).is_none());
    }

    #[test]
    fn members_and_lookup() {
        let table = PdfTable::from_reader(INDEX.as_bytes()).unwrap();
        let pdf = table.get(90400).unwrap();

        assert_eq!(pdf.into_iter().take(3).collect::<Vec<_>>(), [90400, 90401, 90402]);
        assert_eq!(pdf.members().last(), Some(90432));
        assert_eq!(table.set_of(303250).unwrap().id(), 303200);
        assert_eq!(table.set_of(90432).unwrap().id(), 90400);
        assert!(table.set_of(90433).is_none());
        assert!(table.set_of(10).is_none());
    }

    #[test]
    fn malformed_index() {
        let err = PdfTable::from_reader("pdfid,name\n1,a\n".as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "PDF index: line 1: missing column 'nmembers' in header"
        );

        let err = PdfTable::from_reader("pdfid,name,nmembers\nabc,a,1\n".as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "PDF index: line 2: invalid pdfid: invalid digit found in string"
        );
    }
}
