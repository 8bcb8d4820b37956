//! Module containing histograms filled with every weight variation.

use super::bin::{Entries, MultiWeightBin};
use super::convert::f64_from_usize;
use super::error::{Error, Result};
use super::processor::{HistogramProcessor, Uncertainty, Variations};
use super::saf::{Description, HistoKind, HistoRecord, Statistics};
use std::sync::Arc;
use tracing::warn;

/// A histogram of one dataset with one `(positive, negative)` pair of sums per bin and weight slot.
#[derive(Clone, Debug)]
pub struct MultiWeightHisto {
    kind: HistoKind,
    merging: bool,
    description: Description,
    statistics: Statistics,
    underflow: Entries,
    overflow: Entries,
    bins: Vec<Entries>,
    labels: Vec<String>,
    processor: Arc<HistogramProcessor>,
    scale: f64,
}

impl MultiWeightHisto {
    /// Creates a histogram from a block read from a SAF file. The normalization is one.
    #[must_use]
    pub fn new(record: HistoRecord, processor: Arc<HistogramProcessor>) -> Self {
        Self {
            kind: record.kind,
            merging: record.merging,
            description: record.description,
            statistics: record.statistics,
            underflow: record.underflow,
            overflow: record.overflow,
            bins: record.bins,
            labels: record.labels,
            processor,
            scale: 1.0,
        }
    }

    /// Name of the histogram.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.description.name
    }

    /// Kind of the histogram.
    #[must_use]
    pub const fn kind(&self) -> HistoKind {
        self.kind
    }

    /// Returns `true` if the histogram belongs to the merging plots.
    #[must_use]
    pub const fn merging(&self) -> bool {
        self.merging
    }

    /// Binning and regions.
    #[must_use]
    pub const fn description(&self) -> &Description {
        &self.description
    }

    /// Regions in which the histogram is filled.
    #[must_use]
    pub fn regions(&self) -> &[String] {
        &self.description.regions
    }

    /// Global statistics.
    #[must_use]
    pub const fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Number of bins, without underflow and overflow.
    #[must_use]
    pub fn nbins(&self) -> usize {
        self.bins.len()
    }

    /// Raw sums of every bin.
    #[must_use]
    pub fn bins(&self) -> &[Entries] {
        &self.bins
    }

    /// Underflow bin.
    #[must_use]
    pub const fn underflow(&self) -> &Entries {
        &self.underflow
    }

    /// Overflow bin.
    #[must_use]
    pub const fn overflow(&self) -> &Entries {
        &self.overflow
    }

    /// Labels of the bins of a frequency histogram, empty for other kinds.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Processor evaluating the uncertainties.
    #[must_use]
    pub fn processor(&self) -> &HistogramProcessor {
        &self.processor
    }

    /// Normalization factor applied to every scaled quantity.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Sets the normalization factor to `scale`.
    pub const fn normalize(&mut self, scale: f64) {
        self.scale = scale;
    }

    /// Returns `true` if every bin, the underflow and overflow bins and the sum of weights over
    /// entries have one slot per weight.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.inconsistent_len().is_none()
    }

    fn inconsistent_len(&self) -> Option<usize> {
        let len = self.processor.len();

        self.bins
            .iter()
            .chain([&self.underflow, &self.overflow, &self.statistics.sumw_entries])
            .map(Entries::len)
            .find(|&found| found != len)
    }

    /// Checks that the histogram is consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] naming the histogram if it is not.
    pub fn check(&self) -> Result<()> {
        self.inconsistent_len().map_or(Ok(()), |found| {
            Err(Error::dimension(self.processor.len(), found, self.name()))
        })
    }

    fn nominal(&self, entries: &Entries) -> (f64, f64) {
        let loc = self.processor.nominal_loc();

        (
            entries.positive().get(loc).unwrap_or_default(),
            entries.negative().get(loc).unwrap_or_default(),
        )
    }

    /// Integral at the nominal slot, including underflow and overflow: the positive sums minus the
    /// absolute values of the negative ones.
    #[must_use]
    pub fn integral(&self) -> f64 {
        let (positive, negative) = self
            .bins
            .iter()
            .map(|bin| self.nominal(bin))
            .fold((0.0, 0.0), |(pos, neg), (p, n)| (pos + p, neg + n));
        let (under_pos, under_neg) = self.nominal(&self.underflow);
        let (over_pos, over_neg) = self.nominal(&self.overflow);

        positive + under_pos + over_pos - (negative.abs() + under_neg.abs() + over_neg.abs())
    }

    /// Physical sum of weights over entries at the nominal slot, clamped at zero.
    #[must_use]
    pub fn sumw(&self) -> f64 {
        let (positive, negative) = self.nominal(&self.statistics.sumw_entries);

        (positive - negative.abs()).max(0.0)
    }

    /// Physical value of every bin at the nominal slot. Negative values are set to zero.
    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        let weights: Vec<_> = self
            .bins
            .iter()
            .map(|bin| {
                let (positive, negative) = self.nominal(bin);
                positive - negative.abs()
            })
            .collect();
        let negative = weights.iter().filter(|&&weight| weight < 0.0).count();

        if negative > 0 {
            warn!(
                "histogram '{}': {negative} bins with negative nominal value set to zero",
                self.name()
            );
        }

        weights.into_iter().map(|weight| weight.max(0.0)).collect()
    }

    /// Normalized physical values of every bin and every weight slot. Negative values are set to
    /// zero, see [`MultiWeightHisto::negative_bins`].
    #[must_use]
    pub fn all_scaled_weights(&self) -> Vec<MultiWeightBin> {
        let mut clamped = 0;
        let weights = self
            .bins
            .iter()
            .map(|bin| {
                let (value, negative) = bin.value().clamp_negative();
                clamped += negative.len();
                value.scale(self.scale)
            })
            .collect();

        if clamped > 0 {
            warn!(
                "histogram '{}': {clamped} negative bin values set to zero",
                self.name()
            );
        }

        weights
    }

    /// Returns the `(bin, slot)` pairs whose physical value is negative.
    #[must_use]
    pub fn negative_bins(&self) -> Vec<(usize, usize)> {
        self.bins
            .iter()
            .enumerate()
            .flat_map(|(index, bin)| {
                bin.value()
                    .clamp_negative()
                    .1
                    .into_iter()
                    .map(move |slot| (index, slot))
            })
            .collect()
    }

    /// Nominal value and uncertainties of every bin.
    #[must_use]
    pub fn variations(&self) -> Vec<Variations> {
        self.all_scaled_weights()
            .iter()
            .map(|bin| self.processor.evaluate(bin))
            .collect()
    }

    /// Envelope of the scale variations for every bin. Without scale variations the bands have
    /// zero width.
    #[must_use]
    pub fn scale_uncertainties(&self) -> Vec<Uncertainty> {
        self.all_scaled_weights()
            .iter()
            .map(|bin| self.processor.scale_envelope(bin))
            .collect()
    }

    /// PDF uncertainty of every bin. Without PDF members the bands have zero width.
    #[must_use]
    pub fn pdf_uncertainties(&self) -> Vec<Uncertainty> {
        self.all_scaled_weights()
            .iter()
            .map(|bin| self.processor.pdf_uncertainty(bin))
            .collect()
    }

    /// Scale and PDF uncertainties of every bin added in quadrature.
    #[must_use]
    pub fn uncertainties(&self) -> Vec<Uncertainty> {
        self.variations()
            .into_iter()
            .map(|variations| variations.total)
            .collect()
    }

    /// Mean of the observable at the nominal slot, or zero if the sum of weights vanishes.
    #[must_use]
    pub fn mean(&self) -> f64 {
        let (positive, negative) = self.nominal(&self.statistics.sumwx);
        let sumw = self.sumw();

        if sumw == 0.0 {
            0.0
        } else {
            (positive - negative.abs()) / sumw
        }
    }

    /// Bin edges, `nbins + 1` values from `xmin` to `xmax`. Edges of [`HistoKind::LogX`]
    /// histograms are equidistant in the logarithm. Frequency histograms have no edges.
    ///
    /// # Errors
    ///
    /// Returns an error if a logarithmic histogram has a limit that is not positive.
    pub fn bin_edges(&self) -> Result<Vec<f64>> {
        let Description {
            nbins, xmin, xmax, ..
        } = self.description;
        let steps = f64_from_usize(nbins);

        match self.kind {
            HistoKind::Frequency => Ok(Vec::new()),
            HistoKind::Linear => Ok((0..=nbins)
                .map(|i| (xmax - xmin).mul_add(f64_from_usize(i) / steps, xmin))
                .collect()),
            HistoKind::LogX => {
                if xmin <= 0.0 || xmax <= 0.0 {
                    return Err(Error::General(format!(
                        "histogram '{}' has logarithmic bins with limits {xmin} and {xmax}",
                        self.name()
                    )));
                }

                let (lmin, lmax) = (xmin.log10(), xmax.log10());

                Ok((0..=nbins)
                    .map(|i| 10_f64.powf((lmax - lmin).mul_add(f64_from_usize(i) / steps, lmin)))
                    .collect())
            }
        }
    }
}
