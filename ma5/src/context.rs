//! Run-level and dataset-level settings that drive the normalization of cutflows and histograms.

use super::pdf::PdfMethod;
use super::weight::{DEFAULT_DYNAMIC_SCALE, ScaleVariation};
use serde::{Deserialize, Serialize};

/// How yields are normalized.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Histograms keep the raw sums of weights.
    None,
    /// Yields are normalized to the integrated luminosity.
    #[default]
    Lumi,
    /// Yields are normalized to the integrated luminosity and multiplied by the dataset weight.
    LumiWeight,
}

/// Settings shared by every dataset of a run.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RunContext {
    /// Integrated luminosity in inverse femtobarn.
    pub lumi: f64,
    /// Normalization policy.
    pub normalize: Normalization,
    /// LHAPDF ids accepted for the nominal weight. An empty list accepts every id.
    pub central_pdfs: Vec<i32>,
    /// Combination of PDF members into an uncertainty.
    pub pdf_method: PdfMethod,
    /// Names of the signal regions.
    pub regions: Vec<String>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            lumi: 10.0,
            normalize: Normalization::default(),
            central_pdfs: Vec::new(),
            pdf_method: PdfMethod::default(),
            regions: Vec::new(),
        }
    }
}

impl RunContext {
    /// Integrated luminosity in inverse picobarn.
    #[must_use]
    pub fn lumi_pb(&self) -> f64 {
        self.lumi * 1000.0
    }
}

/// Settings of a single dataset.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct DatasetContext {
    /// Name of the dataset.
    pub name: String,
    /// Cross section in pb imposed by the user. Zero selects the measured cross section.
    pub xsection: f64,
    /// Weight multiplying the cross section when normalizing with [`Normalization::LumiWeight`].
    pub weight: f64,
    /// Dynamic scale choice of the nominal weight.
    pub dynamic_scale_choice: i32,
    /// Number of points of the scale variation.
    pub n_point_scale_variation: ScaleVariation,
}

impl Default for DatasetContext {
    fn default() -> Self {
        Self {
            name: String::new(),
            xsection: 0.0,
            weight: 1.0,
            dynamic_scale_choice: DEFAULT_DYNAMIC_SCALE,
            n_point_scale_variation: ScaleVariation::ThreePoint,
        }
    }
}

impl DatasetContext {
    /// Returns the cross section used for normalization, given the `measured` one.
    #[must_use]
    pub fn xsec(&self, measured: f64, normalize: Normalization) -> f64 {
        let xsec = if self.xsection == 0.0 {
            measured
        } else {
            self.xsection
        };

        if normalize == Normalization::LumiWeight {
            xsec * self.weight
        } else {
            xsec
        }
    }
}
