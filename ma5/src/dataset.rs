//! Module connecting the SAF files of a dataset with its cutflows and histograms.

use super::context::{DatasetContext, Normalization, RunContext};
use super::cut::{MultiWeightCut, MultiWeightCutFlow};
use super::error::{Error, Result};
use super::histo::MultiWeightHisto;
use super::pdf::PdfTable;
use super::processor::HistogramProcessor;
use super::saf::{SafDocument, SampleInfo};
use super::weight::WeightCollection;
use std::sync::Arc;
use tracing::{info, warn};

/// A dataset with its sample information and the weights it was generated with.
#[derive(Clone, Debug)]
pub struct Dataset {
    run: Arc<RunContext>,
    context: Arc<DatasetContext>,
    sample: SampleInfo,
    processor: Option<Arc<HistogramProcessor>>,
}

impl Dataset {
    /// Creates a dataset from the SAF file `sample` describing its events. The weights are taken
    /// from its `<WeightNames>` block; without it, the slots of every cutflow and histogram are
    /// unnamed and slot 0 is nominal.
    ///
    /// # Errors
    ///
    /// Returns an error if `sample` has no global sample information or if no nominal weight is
    /// found.
    pub fn new(
        run: Arc<RunContext>,
        context: Arc<DatasetContext>,
        sample: &SafDocument,
        pdfs: Option<&PdfTable>,
    ) -> Result<Self> {
        let info = sample.global_info.clone().ok_or_else(|| {
            Error::General(format!(
                "sample of dataset '{}' has no <SampleGlobalInfo> block",
                context.name
            ))
        })?;

        let processor = if sample.weight_names.is_empty() {
            None
        } else {
            let mut weights = WeightCollection::new();

            for (loc, name) in &sample.weight_names {
                weights.append(name, *loc);
            }

            info!(
                "dataset '{}' has {} weights",
                context.name,
                weights.len()
            );

            Some(Arc::new(HistogramProcessor::new(
                Arc::new(weights),
                &run,
                &context,
                pdfs,
            )?))
        };

        Ok(Self {
            run,
            context,
            sample: info,
            processor,
        })
    }

    /// Name of the dataset.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.context.name
    }

    /// Settings of the run.
    #[must_use]
    pub fn run(&self) -> &RunContext {
        &self.run
    }

    /// Settings of this dataset.
    #[must_use]
    pub fn context(&self) -> &DatasetContext {
        &self.context
    }

    /// Global information of the sample.
    #[must_use]
    pub const fn sample(&self) -> &SampleInfo {
        &self.sample
    }

    /// Processor of the named weights, or `None` if the sample has no weight names.
    #[must_use]
    pub fn processor(&self) -> Option<&HistogramProcessor> {
        self.processor.as_deref()
    }

    fn processor_for(&self, document: &SafDocument) -> Arc<HistogramProcessor> {
        self.processor.clone().unwrap_or_else(|| {
            Arc::new(HistogramProcessor::anonymous(
                document.slots().unwrap_or(1),
            ))
        })
    }

    /// Cross section used for the normalization.
    #[must_use]
    pub fn xsec(&self) -> f64 {
        self.context.xsec(self.sample.xsection, self.run.normalize)
    }

    /// Factor normalizing the histograms: cross section times luminosity divided by the sum of
    /// weights of the sample, or one without normalization. A vanishing sum of weights gives zero.
    #[must_use]
    pub fn histogram_scale(&self) -> f64 {
        if self.run.normalize == Normalization::None {
            return 1.0;
        }

        let sumw = self.sample.sumw();

        if sumw == 0.0 {
            warn!("dataset '{}' has a vanishing sum of weights", self.name());
            return 0.0;
        }

        self.xsec() * self.run.lumi_pb() / sumw
    }

    /// Creates the cutflow of `region` from the counters of `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if `document` has no initial counter or if the counters have an
    /// inconsistent number of weight slots.
    pub fn cutflow(&self, document: &SafDocument, region: &str) -> Result<MultiWeightCutFlow> {
        let initial = document.initial_counter.as_ref().ok_or_else(|| {
            Error::General(format!(
                "cutflow of region '{region}' in dataset '{}' has no <InitialCounter> block",
                self.name()
            ))
        })?;

        if !self.run.regions.is_empty() && !self.run.regions.iter().any(|r| r == region) {
            warn!("region '{region}' is not one of the regions of the run");
        }

        let mut cutflow = MultiWeightCutFlow::new(
            region,
            Arc::clone(&self.run),
            Arc::clone(&self.context),
            self.sample.xsection,
            self.processor_for(document),
        );

        for record in std::iter::once(initial).chain(&document.counters) {
            cutflow.append(MultiWeightCut::from_record(record, region))?;
        }

        Ok(cutflow)
    }

    /// Creates every histogram of `document`, normalized with [`Dataset::histogram_scale`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if a histogram does not have one slot per weight.
    pub fn histos(&self, document: &SafDocument) -> Result<Vec<MultiWeightHisto>> {
        let processor = self.processor_for(document);
        let scale = self.histogram_scale();

        document
            .histos
            .iter()
            .map(|record| {
                let mut histo = MultiWeightHisto::new(record.clone(), Arc::clone(&processor));
                histo.check()?;
                histo.normalize(scale);
                Ok(histo)
            })
            .collect()
    }
}
