//! Module containing the cuts of a signal region and the evaluation of the cutflow.

use super::bin::{Entries, MultiWeightBin};
use super::context::{DatasetContext, RunContext};
use super::error::{Error, Result};
use super::processor::{HistogramProcessor, Uncertainty, Variations};
use super::saf::CutRecord;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A single cut of a signal region, or the initial counter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiWeightCut {
    name: String,
    region: String,
    nentries: Entries,
    sumw: Entries,
    sumw2: Entries,
}

impl MultiWeightCut {
    /// Constructor.
    #[must_use]
    pub fn new(name: &str, region: &str, nentries: Entries, sumw: Entries, sumw2: Entries) -> Self {
        Self {
            name: name.to_owned(),
            region: region.to_owned(),
            nentries,
            sumw,
            sumw2,
        }
    }

    /// Creates a cut of `region` from a counter read from a SAF file.
    #[must_use]
    pub fn from_record(record: &CutRecord, region: &str) -> Self {
        Self::new(
            &record.name,
            region,
            record.nentries.clone(),
            record.sumw.clone(),
            record.sumw2.clone(),
        )
    }

    /// Name of the cut.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal region the cut belongs to.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Number of weight slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nentries.len()
    }

    /// Returns `true` if the cut has no weight slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nentries.is_empty()
    }

    /// Returns `true` if the entries, the sums of weights and the sums of squared weights have the
    /// same number of slots.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.sumw.len() == self.len() && self.sumw2.len() == self.len()
    }

    /// Physical number of entries per slot.
    #[must_use]
    pub fn nentries(&self) -> MultiWeightBin {
        self.nentries.value()
    }

    /// Physical sum of weights per slot.
    #[must_use]
    pub fn sumw(&self) -> MultiWeightBin {
        self.sumw.value()
    }

    /// Physical sum of squared weights per slot.
    #[must_use]
    pub fn sumw2(&self) -> MultiWeightBin {
        self.sumw2.value()
    }

    /// Returns the yields `xsec * lumi * sumw / initial_sumw` for every slot, dividing slot by
    /// slot. A cut without physical entries at slot `nominal`, and every slot whose initial sum of
    /// weights vanishes, gives zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if `initial_sumw` or `nominal` does not fit the number of slots
    /// of this cut.
    pub fn yields(
        &self,
        xsec: f64,
        lumi: f64,
        initial_sumw: &MultiWeightBin,
        nominal: usize,
    ) -> Result<MultiWeightBin> {
        let Some(nentries) = self.nentries.value_at(nominal) else {
            return Err(Error::dimension(nominal + 1, self.len(), &self.name));
        };

        if nentries == 0.0 {
            return Ok(MultiWeightBin::zeros(self.len()));
        }

        self.sumw()
            .scale(xsec * lumi)
            .try_div_or_zero(initial_sumw)
            .map_err(|_| Error::dimension(self.len(), initial_sumw.len(), &self.name))
    }
}

/// Yield of a cut with its uncertainties.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CutYield {
    /// Name of the cut.
    pub name: String,
    /// Signal region of the cut.
    pub region: String,
    /// Yields of every weight slot.
    pub yields: MultiWeightBin,
    /// Nominal yield and its uncertainties.
    pub variations: Variations,
}

impl CutYield {
    /// Nominal yield.
    #[must_use]
    pub const fn nominal(&self) -> f64 {
        self.variations.nominal
    }

    /// Combined scale and PDF uncertainty.
    #[must_use]
    pub const fn total(&self) -> Uncertainty {
        self.variations.total
    }
}

/// The cuts of one signal region of a dataset, starting with the initial counter.
#[derive(Clone, Debug)]
pub struct MultiWeightCutFlow {
    region: String,
    cuts: Vec<MultiWeightCut>,
    run: Arc<RunContext>,
    dataset: Arc<DatasetContext>,
    measured_xsec: f64,
    processor: Arc<HistogramProcessor>,
}

impl MultiWeightCutFlow {
    /// Creates an empty cutflow for `region`. `measured_xsec` is the cross section read from the
    /// sample, used unless `dataset` imposes one.
    #[must_use]
    pub fn new(
        region: &str,
        run: Arc<RunContext>,
        dataset: Arc<DatasetContext>,
        measured_xsec: f64,
        processor: Arc<HistogramProcessor>,
    ) -> Self {
        Self {
            region: region.to_owned(),
            cuts: Vec::new(),
            run,
            dataset,
            measured_xsec,
            processor,
        }
    }

    /// Name of the signal region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Stored cuts, the first one being the initial counter.
    #[must_use]
    pub fn cuts(&self) -> &[MultiWeightCut] {
        &self.cuts
    }

    /// Number of stored cuts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// Returns `true` if no cut is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    /// Appends `cut`. The first cut fixes the number of weight slots; a later cut with a single
    /// slot while the first one has more carries no weight information and is skipped, in which
    /// case `false` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if `cut` is not valid or its number of slots differs from the
    /// one of the first cut.
    pub fn append(&mut self, cut: MultiWeightCut) -> Result<bool> {
        if !cut.is_valid() {
            let found = if cut.sumw.len() == cut.len() {
                cut.sumw2.len()
            } else {
                cut.sumw.len()
            };
            return Err(Error::dimension(cut.len(), found, &cut.name));
        }

        if let Some(first) = self.cuts.first() {
            if cut.len() == 1 && first.len() > 1 {
                debug!(
                    "skipping cut '{}' of region '{}' without weight variations",
                    cut.name, self.region
                );
                return Ok(false);
            }

            if cut.len() != first.len() {
                return Err(Error::dimension(first.len(), cut.len(), &cut.name));
            }
        }

        self.cuts.push(cut);

        Ok(true)
    }

    /// Cross section used for the normalization, see [`DatasetContext::xsec`].
    #[must_use]
    pub fn xsec(&self) -> f64 {
        self.dataset.xsec(self.measured_xsec, self.run.normalize)
    }

    /// Evaluates the yield of every cut, normalized to the cross section and the luminosity of
    /// the run, with its scale and PDF uncertainties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if the cuts do not have one slot per weight of the dataset.
    pub fn get_cutflow(&self) -> Result<Vec<CutYield>> {
        let Some(initial) = self.cuts.first() else {
            return Ok(Vec::new());
        };

        let initial_sumw = initial.sumw();
        self.processor.check(&initial_sumw, initial.name())?;

        let xsec = self.xsec();
        let lumi = self.run.lumi_pb();

        self.cuts
            .iter()
            .map(|cut| {
                let yields =
                    cut.yields(xsec, lumi, &initial_sumw, self.processor.nominal_loc())?;
                let variations = self.processor.evaluate(&yields);

                Ok(CutYield {
                    name: cut.name.clone(),
                    region: cut.region.clone(),
                    yields,
                    variations,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn entries(values: &[f64]) -> Entries {
        Entries::new(
            MultiWeightBin::new(values.to_vec()),
            MultiWeightBin::zeros(values.len()),
        )
        .unwrap()
    }

    fn cut(name: &str, nentries: &[f64], sumw: &[f64]) -> MultiWeightCut {
        MultiWeightCut::new(name, "SR", entries(nentries), entries(sumw), entries(sumw))
    }

    fn cutflow(len: usize) -> MultiWeightCutFlow {
        MultiWeightCutFlow::new(
            "SR",
            Arc::new(RunContext::default()),
            Arc::new(DatasetContext::default()),
            2.0,
            Arc::new(HistogramProcessor::anonymous(len)),
        )
    }

    #[test]
    fn empty_cut_gives_zeros() {
        let cut = MultiWeightCut::new(
            "empty",
            "SR",
            Entries::new(
                MultiWeightBin::new(vec![3.0, 1.0, 0.0]),
                MultiWeightBin::new(vec![-3.0, 0.0, 0.0]),
            )
            .unwrap(),
            entries(&[5.0, 7.0, 9.0]),
            entries(&[5.0, 7.0, 9.0]),
        );
        let initial = MultiWeightBin::new(vec![0.0, 1.0, 2.0]);

        assert_eq!(
            cut.yields(2.0, 10000.0, &initial, 0).unwrap(),
            MultiWeightBin::zeros(3)
        );
        assert!(cut.yields(2.0, 10000.0, &initial, 3).is_err());
    }

    #[test]
    fn yields_divide_slot_by_slot() {
        let cut = cut("MET > 100", &[10.0, 10.0, 10.0], &[50.0, 48.0, 53.0]);
        let initial = MultiWeightBin::new(vec![100.0, 95.0, 0.0]);
        let yields = cut.yields(2.0, 10000.0, &initial, 0).unwrap();

        assert_approx_eq!(f64, yields[0], 10000.0, ulps = 4);
        assert_approx_eq!(f64, yields[1], 2.0 * 10000.0 * 48.0 / 95.0, ulps = 4);
        assert_eq!(yields[2], 0.0);
        assert!(cut.yields(2.0, 1.0, &MultiWeightBin::zeros(2), 0).is_err());
    }

    #[test]
    fn append_checks_dimensions() {
        let mut cutflow = cutflow(3);

        assert!(cutflow.append(cut("initial", &[1.0; 3], &[1.0; 3])).unwrap());
        assert!(!cutflow.append(cut("single", &[1.0], &[1.0])).unwrap());
        assert!(cutflow.append(cut("two", &[1.0; 2], &[1.0; 2])).is_err());
        assert!(cutflow.append(cut("cut", &[1.0; 3], &[1.0; 3])).unwrap());

        let invalid = MultiWeightCut::new(
            "invalid",
            "SR",
            entries(&[1.0; 3]),
            entries(&[1.0]),
            entries(&[1.0; 3]),
        );
        assert!(cutflow.append(invalid).is_err());

        assert_eq!(cutflow.len(), 2);
    }

    #[test]
    fn single_slot_cutflow() {
        let mut cutflow = cutflow(1);

        cutflow.append(cut("initial", &[1.0], &[1.0])).unwrap();
        cutflow.append(cut("cut", &[1.0], &[0.25])).unwrap();

        let yields = cutflow.get_cutflow().unwrap();

        assert_eq!(yields.len(), 2);
        assert_approx_eq!(f64, yields[0].nominal(), 20000.0, ulps = 4);
        assert_approx_eq!(f64, yields[1].nominal(), 5000.0, ulps = 4);
        assert_eq!(yields[1].total(), Uncertainty::zero(yields[1].nominal()));
    }

    #[test]
    fn mismatched_processor() {
        let mut cutflow = cutflow(2);

        cutflow.append(cut("initial", &[1.0; 3], &[1.0; 3])).unwrap();

        assert!(matches!(
            cutflow.get_cutflow(),
            Err(Error::Dimension { expected: 2, found: 3, .. })
        ));
    }
}
