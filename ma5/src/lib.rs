//! `ma5` aggregates the cutflows and histograms written by MadAnalysis 5 in SAF files, for every
//! weight variation of the generator at once.
//!
//! Each quantity is stored as a [`bin::MultiWeightBin`] with one value per weight slot. The
//! [`processor::HistogramProcessor`] picks the nominal slot and derives scale and PDF
//! uncertainties from the remaining ones:
//!
//! - scale variations are combined as the envelope of the 3-, 7- or 9-point grid,
//! - PDF members either as Monte Carlo replicas or as Hessian eigenvector pairs,
//! - both are added in quadrature relative to the nominal value.

mod convert;

pub mod bin;
pub mod context;
pub mod cut;
pub mod dataset;
pub mod error;
pub mod histo;
pub mod pdf;
pub mod processor;
pub mod saf;
pub mod weight;
