//! Module that turns a vector of values, one per weight slot, into a nominal value with scale and
//! PDF uncertainties.

use super::bin::MultiWeightBin;
use super::context::{DatasetContext, RunContext};
use super::convert::f64_from_usize;
use super::error::{Error, Result};
use super::pdf::{PdfMethod, PdfTable};
use super::weight::{Weight, WeightCollection};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// A central value with asymmetric, non-negative widths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Uncertainty {
    /// Central value.
    pub central: f64,
    /// Distance from the central value to the lower edge of the band.
    pub lower: f64,
    /// Distance from the central value to the upper edge of the band.
    pub upper: f64,
}

impl Uncertainty {
    /// Band of zero width around `central`.
    #[must_use]
    pub const fn zero(central: f64) -> Self {
        Self {
            central,
            lower: 0.0,
            upper: 0.0,
        }
    }

    /// Returns the lower width relative to `nominal`, or zero if `nominal` is not positive.
    #[must_use]
    pub fn relative_lower(&self, nominal: f64) -> f64 {
        if nominal > 0.0 { self.lower / nominal } else { 0.0 }
    }

    /// Returns the upper width relative to `nominal`, or zero if `nominal` is not positive.
    #[must_use]
    pub fn relative_upper(&self, nominal: f64) -> f64 {
        if nominal > 0.0 { self.upper / nominal } else { 0.0 }
    }
}

/// Nominal value of a [`MultiWeightBin`] together with all its uncertainties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Variations {
    /// Value at the nominal weight slot.
    pub nominal: f64,
    /// Envelope of the scale variations.
    pub scale: Uncertainty,
    /// PDF uncertainty.
    pub pdf: Uncertainty,
    /// Scale and PDF uncertainties added in quadrature.
    pub total: Uncertainty,
}

/// Selects the weight slots that enter the nominal value and the uncertainties of a dataset.
#[derive(Clone, Debug)]
pub struct HistogramProcessor {
    weights: Arc<WeightCollection>,
    nominal: usize,
    scale_locs: Vec<usize>,
    pdf_locs: Vec<usize>,
    pdf_method: PdfMethod,
}

impl HistogramProcessor {
    /// Selects the nominal weight of `weights` according to the dynamic scale choice of `dataset`
    /// and the central PDFs of `run`, the weights of the scale variation and the members of the
    /// nominal PDF. Members are looked up in `pdfs`; without an entry for the nominal PDF, the
    /// weights with consecutive ids following the nominal one are taken as members.
    ///
    /// When no weight carries a PDF id, the central PDFs are not used to select the nominal
    /// weight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingNominal`] if no weight qualifies as nominal.
    pub fn new(
        weights: Arc<WeightCollection>,
        run: &RunContext,
        dataset: &DatasetContext,
        pdfs: Option<&PdfTable>,
    ) -> Result<Self> {
        let central_pdfs: &[i32] = if weights.pdf_ids().is_empty() {
            &[]
        } else {
            &run.central_pdfs
        };
        let nominal = weights.nominal(dataset.dynamic_scale_choice, central_pdfs)?;

        let scale_locs = if weights.has_scale() {
            WeightCollection::locs(&weights.get_scale_vars(
                dataset.n_point_scale_variation,
                dataset.dynamic_scale_choice,
                nominal.pdfset(),
            ))
        } else {
            Vec::new()
        };

        let pdf_locs = nominal
            .pdfset()
            .map(|id| pdf_members(&weights, nominal, id, pdfs))
            .unwrap_or_default();

        if run.pdf_method == PdfMethod::Eigenvector && pdf_locs.len() % 2 == 1 {
            warn!(
                "odd number of eigenvector members ({}) for dataset '{}', ignoring the last one",
                pdf_locs.len(),
                dataset.name
            );
        }

        debug!(
            "dataset '{}': nominal weight {nominal}, {} scale and {} PDF weights",
            dataset.name,
            scale_locs.len(),
            pdf_locs.len()
        );

        let nominal = nominal.loc();

        Ok(Self {
            weights,
            nominal,
            scale_locs,
            pdf_locs,
            pdf_method: run.pdf_method,
        })
    }

    /// Processor for `len` unnamed weight slots. Slot 0 is the nominal one and no uncertainties
    /// are evaluated.
    #[must_use]
    pub fn anonymous(len: usize) -> Self {
        Self {
            weights: Arc::new(WeightCollection::anonymous(len)),
            nominal: 0,
            scale_locs: Vec::new(),
            pdf_locs: Vec::new(),
            pdf_method: PdfMethod::default(),
        }
    }

    /// Returns the weight collection.
    #[must_use]
    pub fn weights(&self) -> &WeightCollection {
        &self.weights
    }

    /// Returns the number of weight slots every bin must have.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns `true` if there are no weight slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Slot of the nominal weight.
    #[must_use]
    pub const fn nominal_loc(&self) -> usize {
        self.nominal
    }

    /// Slots entering the scale envelope.
    #[must_use]
    pub fn scale_locs(&self) -> &[usize] {
        &self.scale_locs
    }

    /// Slots of the PDF members, without the nominal slot.
    #[must_use]
    pub fn pdf_locs(&self) -> &[usize] {
        &self.pdf_locs
    }

    /// Combination method of the PDF members.
    #[must_use]
    pub const fn pdf_method(&self) -> PdfMethod {
        self.pdf_method
    }

    /// Returns `true` if scale uncertainties are evaluated.
    #[must_use]
    pub fn has_scale(&self) -> bool {
        !self.scale_locs.is_empty()
    }

    /// Returns `true` if PDF uncertainties are evaluated.
    #[must_use]
    pub fn has_pdf(&self) -> bool {
        !self.pdf_locs.is_empty()
    }

    /// Checks that `bin` has one value per weight slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] naming `context` otherwise.
    pub fn check(&self, bin: &MultiWeightBin, context: &str) -> Result<()> {
        if bin.len() == self.len() {
            Ok(())
        } else {
            Err(Error::dimension(self.len(), bin.len(), context))
        }
    }

    fn value(bin: &MultiWeightBin, loc: usize) -> f64 {
        bin.get(loc).unwrap_or_default()
    }

    /// Returns the value of `bin` at the nominal slot.
    #[must_use]
    pub fn central(&self, bin: &MultiWeightBin) -> f64 {
        Self::value(bin, self.nominal)
    }

    /// Envelope of the scale variations: the distances of the smallest and largest varied value
    /// from the nominal value, clipped at zero.
    #[must_use]
    pub fn scale_envelope(&self, bin: &MultiWeightBin) -> Uncertainty {
        let central = self.central(bin);

        if self.scale_locs.is_empty() {
            return Uncertainty::zero(central);
        }

        let (min, max) = self
            .scale_locs
            .iter()
            .map(|&loc| Self::value(bin, loc))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), x| {
                (min.min(x), max.max(x))
            });

        Uncertainty {
            central,
            lower: (central - min).max(0.0),
            upper: (max - central).max(0.0),
        }
    }

    /// PDF uncertainty of `bin`. Replicas give the root mean square of the members about the mean
    /// of all values, including the nominal one, which is also returned as central value.
    /// Eigenvectors are read as consecutive `(up, down)` pairs whose one-sided excursions from the
    /// nominal value are added in quadrature.
    #[must_use]
    pub fn pdf_uncertainty(&self, bin: &MultiWeightBin) -> Uncertainty {
        let nominal = self.central(bin);

        if self.pdf_locs.is_empty() {
            return Uncertainty::zero(nominal);
        }

        let members: Vec<_> = self
            .pdf_locs
            .iter()
            .map(|&loc| Self::value(bin, loc))
            .collect();

        match self.pdf_method {
            PdfMethod::Replicas => {
                let central = (nominal + members.iter().sum::<f64>())
                    / f64_from_usize(members.len() + 1);
                let width = (members
                    .iter()
                    .map(|x| (x - central).powi(2))
                    .sum::<f64>()
                    / f64_from_usize(members.len()))
                .sqrt();

                Uncertainty {
                    central,
                    lower: width,
                    upper: width,
                }
            }
            PdfMethod::Eigenvector => {
                let (lower, upper) = members.chunks_exact(2).fold(
                    (0.0_f64, 0.0_f64),
                    |(lower, upper), pair| {
                        let (up, down) = (pair[0] - nominal, pair[1] - nominal);
                        (
                            lower + (-up).max(-down).max(0.0).powi(2),
                            upper + up.max(down).max(0.0).powi(2),
                        )
                    },
                );

                Uncertainty {
                    central: nominal,
                    lower: lower.sqrt(),
                    upper: upper.sqrt(),
                }
            }
        }
    }

    /// Adds the relative scale and PDF widths in quadrature and scales them back with `nominal`.
    /// Lower widths are combined with lower widths, upper with upper. A `nominal` value that is
    /// not positive gives a band of zero width.
    #[must_use]
    pub fn combine(nominal: f64, scale: &Uncertainty, pdf: &Uncertainty) -> Uncertainty {
        if nominal <= 0.0 {
            return Uncertainty::zero(nominal);
        }

        let lower = scale
            .relative_lower(nominal)
            .hypot(pdf.relative_lower(nominal));
        let upper = scale
            .relative_upper(nominal)
            .hypot(pdf.relative_upper(nominal));

        Uncertainty {
            central: nominal,
            lower: lower * nominal,
            upper: upper * nominal,
        }
    }

    /// Evaluates the nominal value and every uncertainty of `bin`.
    #[must_use]
    pub fn evaluate(&self, bin: &MultiWeightBin) -> Variations {
        let nominal = self.central(bin);
        let scale = self.scale_envelope(bin);
        let pdf = self.pdf_uncertainty(bin);

        Variations {
            nominal,
            scale,
            pdf,
            total: Self::combine(nominal, &scale, &pdf),
        }
    }
}

/// Slots of the members of the PDF `id`, without the nominal weight.
fn pdf_members(
    weights: &WeightCollection,
    nominal: &Weight,
    id: i32,
    pdfs: Option<&PdfTable>,
) -> Vec<usize> {
    let is_member = |weight: &Weight, member: i32| {
        weight.pdfset() == Some(member)
            && !weight.is_tagged()
            && weight.has_scales(1.0, 1.0)
            && weight.dynamic_scale() == nominal.dynamic_scale()
    };
    let slot = |member: i32| {
        weights
            .iter()
            .find(|weight| is_member(weight, member))
            .map(Weight::loc)
    };

    if let Some(pdf) = pdfs.and_then(|table| table.get(id)) {
        let locs: Vec<_> = pdf.members().skip(1).filter_map(&slot).collect();

        if locs.len() + 1 != pdf.members().len() {
            warn!(
                "only {} of {} members of the PDF set '{}' found among the weights",
                locs.len() + 1,
                pdf.members().len(),
                pdf.name()
            );
        }

        locs
    } else {
        if pdfs.is_some() {
            warn!("PDF set {id} is not in the PDF index, using the weights with consecutive ids");
        }

        (1..)
            .map_while(|offset| id.checked_add(offset).and_then(&slot))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weight::ScaleVariation;
    use float_cmp::assert_approx_eq;

    fn processor(names: &[&str], run: &RunContext, dataset: &DatasetContext) -> HistogramProcessor {
        let mut weights = WeightCollection::new();

        for (loc, name) in names.iter().enumerate() {
            weights.append(name, loc);
        }

        HistogramProcessor::new(Arc::new(weights), run, dataset, None).unwrap()
    }

    fn pdf_processor(method: PdfMethod) -> HistogramProcessor {
        let run = RunContext {
            central_pdfs: vec![303200],
            pdf_method: method,
            ..RunContext::default()
        };

        processor(
            &["PDF=303200", "PDF=303201", "PDF=303202", "PDF=303203", "PDF=303204"],
            &run,
            &DatasetContext::default(),
        )
    }

    #[test]
    fn three_point_envelope() {
        let dataset = DatasetContext {
            n_point_scale_variation: ScaleVariation::ThreePoint,
            ..DatasetContext::default()
        };
        let processor = processor(
            &[
                "MUF=0.5_MUR=0.5_PDF=303200",
                "MUF=1.0_MUR=1.0_PDF=303200",
                "MUF=2.0_MUR=2.0_PDF=303200",
            ],
            &RunContext::default(),
            &dataset,
        );

        assert_eq!(processor.nominal_loc(), 1);
        assert_eq!(processor.scale_locs(), [0, 1, 2]);

        let envelope = processor.scale_envelope(&MultiWeightBin::new(vec![8.0, 10.0, 13.0]));
        assert_eq!(envelope, Uncertainty { central: 10.0, lower: 2.0, upper: 3.0 });

        let envelope = processor.scale_envelope(&MultiWeightBin::new(vec![13.0, 10.0, 8.0]));
        assert_eq!(envelope, Uncertainty { central: 10.0, lower: 2.0, upper: 3.0 });

        let envelope = processor.scale_envelope(&MultiWeightBin::new(vec![11.0, 10.0, 12.0]));
        assert_eq!(envelope.lower, 0.0);
        assert_eq!(envelope.upper, 2.0);
    }

    #[test]
    fn replica_rms() {
        let processor = pdf_processor(PdfMethod::Replicas);

        assert_eq!(processor.pdf_locs(), [1, 2, 3, 4]);
        assert!(!processor.has_scale());

        let pdf = processor.pdf_uncertainty(&MultiWeightBin::new(vec![100.0, 98.0, 102.0, 101.0, 99.0]));

        assert_approx_eq!(f64, pdf.central, 100.0, ulps = 4);
        assert_approx_eq!(f64, pdf.lower, 2.5_f64.sqrt(), ulps = 4);
        assert_approx_eq!(f64, pdf.upper, pdf.lower, ulps = 4);
    }

    #[test]
    fn eigenvector_pairs() {
        let processor = pdf_processor(PdfMethod::Eigenvector);
        let pdf = processor.pdf_uncertainty(&MultiWeightBin::new(vec![100.0, 103.0, 96.0, 101.0, 102.0]));

        assert_eq!(pdf.central, 100.0);
        // pairs (103, 96) and (101, 102)
        assert_approx_eq!(f64, pdf.upper, (9.0_f64 + 4.0).sqrt(), ulps = 4);
        assert_approx_eq!(f64, pdf.lower, 4.0, ulps = 4);
    }

    #[test]
    fn pdf_members_from_table() {
        let table = PdfTable::from_reader("pdfid,name,nmembers\n303200,NNPDF,3\n".as_bytes()).unwrap();
        let mut weights = WeightCollection::new();

        for (loc, name) in ["PDF=303200", "PDF=303201", "PDF=303202", "PDF=303203", "MUF=2_PDF=303201"]
            .iter()
            .enumerate()
        {
            weights.append(name, loc);
        }

        let run = RunContext {
            central_pdfs: vec![303200],
            ..RunContext::default()
        };
        let processor = HistogramProcessor::new(
            Arc::new(weights),
            &run,
            &DatasetContext::default(),
            Some(&table),
        )
        .unwrap();

        assert_eq!(processor.pdf_locs(), [1, 2]);
    }

    #[test]
    fn combined_band() {
        let scale = Uncertainty { central: 10.0, lower: 3.0, upper: 4.0 };
        let pdf = Uncertainty { central: 10.0, lower: 4.0, upper: 3.0 };
        let total = HistogramProcessor::combine(10.0, &scale, &pdf);

        assert_approx_eq!(f64, total.lower, 5.0, ulps = 4);
        assert_approx_eq!(f64, total.upper, 5.0, ulps = 4);

        let pdf = Uncertainty { central: 10.0, lower: 0.0, upper: 0.0 };
        let total = HistogramProcessor::combine(10.0, &scale, &pdf);

        assert_approx_eq!(f64, total.lower, 3.0, ulps = 4);
        assert_approx_eq!(f64, total.upper, 4.0, ulps = 4);

        assert_eq!(HistogramProcessor::combine(0.0, &scale, &pdf), Uncertainty::zero(0.0));
        assert_eq!(HistogramProcessor::combine(-1.0, &scale, &pdf), Uncertainty::zero(-1.0));
    }

    #[test]
    fn missing_nominal() {
        let mut weights = WeightCollection::new();
        weights.append("MUF=2.0_PDF=303200", 0);

        let run = RunContext {
            central_pdfs: vec![303200],
            ..RunContext::default()
        };
        let err =
            HistogramProcessor::new(Arc::new(weights), &run, &DatasetContext::default(), None)
                .unwrap_err();

        assert!(matches!(err, Error::MissingNominal { scale_choice: -1, .. }));
    }

    #[test]
    fn anonymous_slots() {
        let processor = HistogramProcessor::anonymous(3);
        let variations = processor.evaluate(&MultiWeightBin::new(vec![5.0, 1.0, 9.0]));

        assert_eq!(processor.len(), 3);
        assert_eq!(variations.nominal, 5.0);
        assert_eq!(variations.total, Uncertainty::zero(5.0));
        assert!(processor.check(&MultiWeightBin::zeros(2), "test").is_err());
    }
}
