//! Module containing the registry of weight variations written by the event generator.

use super::error::{Error, Result};
use float_cmp::approx_eq;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Scale factors `(muf, mur)` of all variations, ordered such that the first three entries form
/// the 3-point, the first seven the 7-point and all nine the 9-point variation.
pub const SCALES_VECTOR: [(f64, f64); 9] = [
    (1.0, 1.0),
    (2.0, 2.0),
    (0.5, 0.5),
    (2.0, 1.0),
    (1.0, 2.0),
    (0.5, 1.0),
    (1.0, 0.5),
    (2.0, 0.5),
    (0.5, 2.0),
];

/// Dynamic scale choice assumed when a weight name does not specify one.
pub const DEFAULT_DYNAMIC_SCALE: i32 = -1;

/// Error type keeping information about a single weight-name token that could not be decoded.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("{0}")]
pub struct ParseWeightError(String);

/// Number of points of a scale variation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum ScaleVariation {
    /// `(muf, mur)` varied simultaneously by factors of two.
    ThreePoint,
    /// All combinations except the two where `muf` and `mur` are varied in opposite directions.
    SevenPoint,
    /// All combinations of `muf` and `mur` from `{0.5, 1, 2}`.
    NinePoint,
}

impl ScaleVariation {
    /// Returns the number of points of this variation.
    #[must_use]
    pub const fn points(self) -> usize {
        match self {
            Self::ThreePoint => 3,
            Self::SevenPoint => 7,
            Self::NinePoint => 9,
        }
    }

    /// Returns the `(muf, mur)` pairs belonging to this variation.
    #[must_use]
    pub fn grid(self) -> &'static [(f64, f64)] {
        &SCALES_VECTOR[..self.points()]
    }
}

impl TryFrom<usize> for ScaleVariation {
    type Error = Error;

    fn try_from(points: usize) -> Result<Self> {
        match points {
            3 => Ok(Self::ThreePoint),
            7 => Ok(Self::SevenPoint),
            9 => Ok(Self::NinePoint),
            _ => Err(Error::General(format!(
                "scale variations with {points} points are not supported, use 3, 7 or 9"
            ))),
        }
    }
}

impl From<ScaleVariation> for usize {
    fn from(variation: ScaleVariation) -> Self {
        variation.points()
    }
}

/// A single weight column together with the information decoded from its name.
#[derive(Clone, Debug)]
pub struct Weight {
    name: String,
    loc: usize,
    aux: Option<String>,
    dynamic_scale: Option<i32>,
    muf: Option<f64>,
    mur: Option<f64>,
    pdfset: Option<i32>,
    merging: Option<f64>,
    alphas: Option<f64>,
}

impl PartialEq for Weight {
    fn eq(&self, other: &Self) -> bool {
        (self.name == other.name) && (self.loc == other.loc)
    }
}

impl Eq for Weight {}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ParseWeightError>
where
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|err| ParseWeightError(format!("could not parse '{key}={value}': {err}")))
}

/// Stores the parsed `value` in `field`, or unsets `field` if `value` is malformed.
fn assign<T: std::str::FromStr>(
    field: &mut Option<T>,
    key: &str,
    value: &str,
) -> Result<(), ParseWeightError>
where
    T::Err: fmt::Display,
{
    match parse_value(key, value) {
        Ok(parsed) => {
            *field = Some(parsed);
            Ok(())
        }
        Err(err) => {
            *field = None;
            Err(err)
        }
    }
}

/// Splits a weight name into `KEY=VALUE` tokens. `DYN_SCALE` is the only key that itself contains
/// the separator.
fn tokens(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending: Option<&str> = None;

    for segment in name
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|s| !s.is_empty())
    {
        if let Some(prefix) = pending.take() {
            tokens.push(format!("{prefix}_{segment}"));
        } else if segment.eq_ignore_ascii_case("dyn") {
            pending = Some(segment);
        } else {
            tokens.push(segment.to_owned());
        }
    }

    tokens.extend(pending.map(str::to_owned));
    tokens
}

impl Weight {
    /// Constructor. Tokens of `name` that can not be decoded leave the corresponding field unset
    /// and are logged as warnings.
    #[must_use]
    pub fn new(name: &str, loc: usize) -> Self {
        let mut weight = Self {
            name: name.to_owned(),
            loc,
            aux: None,
            dynamic_scale: Some(DEFAULT_DYNAMIC_SCALE),
            muf: Some(1.0),
            mur: Some(1.0),
            pdfset: None,
            merging: None,
            alphas: None,
        };

        for token in tokens(name) {
            if let Err(err) = weight.decode(&token) {
                warn!("weight '{name}' (slot {loc}): {err}");
            }
        }

        weight
    }

    fn decode(&mut self, token: &str) -> Result<(), ParseWeightError> {
        let Some((key, value)) = token.split_once('=') else {
            debug!("ignoring token '{token}' in weight name '{}'", self.name);
            return Ok(());
        };

        match key.to_ascii_uppercase().as_str() {
            "MUF" => assign(&mut self.muf, key, value),
            "MUR" => assign(&mut self.mur, key, value),
            "PDF" => assign(&mut self.pdfset, key, value),
            "DYN_SCALE" | "DYNSCALE" | "DYN" => assign(&mut self.dynamic_scale, key, value),
            "MERGING" => assign(&mut self.merging, key, value),
            "ALPS" | "ALPHAS" => assign(&mut self.alphas, key, value),
            "AUX" => {
                self.aux = Some(value.to_owned());
                Ok(())
            }
            _ => {
                debug!("ignoring unknown key '{key}' in weight name '{}'", self.name);
                Ok(())
            }
        }
    }

    /// Returns the name of this weight as written by the generator.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the slot of this weight in every [`MultiWeightBin`](super::bin::MultiWeightBin).
    #[must_use]
    pub const fn loc(&self) -> usize {
        self.loc
    }

    /// Auxiliary tag.
    #[must_use]
    pub fn aux(&self) -> Option<&str> {
        self.aux.as_deref()
    }

    /// Dynamic scale choice, or `None` if it could not be decoded.
    #[must_use]
    pub const fn dynamic_scale(&self) -> Option<i32> {
        self.dynamic_scale
    }

    /// Factor multiplying the factorization scale.
    #[must_use]
    pub const fn muf(&self) -> Option<f64> {
        self.muf
    }

    /// Factor multiplying the renormalization scale.
    #[must_use]
    pub const fn mur(&self) -> Option<f64> {
        self.mur
    }

    /// LHAPDF id of the PDF member used for this weight.
    #[must_use]
    pub const fn pdfset(&self) -> Option<i32> {
        self.pdfset
    }

    /// Merging scale.
    #[must_use]
    pub const fn merging(&self) -> Option<f64> {
        self.merging
    }

    /// Variation factor of the strong coupling.
    #[must_use]
    pub const fn alphas(&self) -> Option<f64> {
        self.alphas
    }

    /// Returns `true` if this weight carries an auxiliary or strong-coupling variation tag.
    #[must_use]
    pub const fn is_tagged(&self) -> bool {
        self.aux.is_some() || self.alphas.is_some()
    }

    /// Returns `true` if both scale factors are equal to `muf` and `mur`, respectively.
    #[must_use]
    pub fn has_scales(&self, muf: f64, mur: f64) -> bool {
        self.muf.is_some_and(|x| approx_eq!(f64, x, muf, ulps = 4))
            && self.mur.is_some_and(|x| approx_eq!(f64, x, mur, ulps = 4))
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.loc)
    }
}

/// Conjunction of field equalities used to select weights from a [`WeightCollection`]. Fields
/// that are `None` are not checked.
#[derive(Clone, Debug, Default)]
pub struct WeightFilter {
    /// Required auxiliary tag.
    pub aux: Option<String>,
    /// Required dynamic scale choice.
    pub dynamic_scale: Option<i32>,
    /// Required factorization scale factor.
    pub muf: Option<f64>,
    /// Required renormalization scale factor.
    pub mur: Option<f64>,
    /// Required LHAPDF id.
    pub pdfset: Option<i32>,
    /// Required merging scale.
    pub merging: Option<f64>,
    /// Required strong-coupling variation factor.
    pub alphas: Option<f64>,
}

impl WeightFilter {
    /// Returns `true` if `weight` satisfies every field of this filter.
    #[must_use]
    pub fn matches(&self, weight: &Weight) -> bool {
        fn same(lhs: Option<f64>, rhs: Option<f64>) -> bool {
            lhs.is_none_or(|lhs| rhs.is_some_and(|rhs| approx_eq!(f64, lhs, rhs, ulps = 4)))
        }

        self.aux.as_deref().is_none_or(|aux| weight.aux() == Some(aux))
            && self
                .dynamic_scale
                .is_none_or(|dyn_scale| weight.dynamic_scale == Some(dyn_scale))
            && self.pdfset.is_none_or(|id| weight.pdfset == Some(id))
            && same(self.muf, weight.muf)
            && same(self.mur, weight.mur)
            && same(self.merging, weight.merging)
            && same(self.alphas, weight.alphas)
    }
}

/// Ordered set of weights, deduplicated by name. The insertion order is the column order of the
/// generator.
#[derive(Clone, Debug, Default)]
pub struct WeightCollection {
    weights: Vec<Weight>,
    names: FxHashMap<String, usize>,
}

impl WeightCollection {
    /// Constructor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection of `len` weights without decodable names. Slot 0 carries the nominal
    /// weight.
    #[must_use]
    pub fn anonymous(len: usize) -> Self {
        let mut collection = Self::new();

        for loc in 0..len {
            let name = if loc == 0 {
                "nominal".to_owned()
            } else {
                format!("aux=weight{loc}")
            };
            collection.append(&name, loc);
        }

        collection
    }

    /// Adds the weight `name` stored at slot `loc`. Returns `false` and leaves the collection
    /// unchanged if either the name or the slot is already registered.
    pub fn append(&mut self, name: &str, loc: usize) -> bool {
        if self.names.contains_key(name) {
            debug!("weight '{name}' already registered");
            return false;
        }

        if let Some(other) = self.get_by_loc(loc) {
            warn!("slot {loc} is already used by weight '{}', ignoring '{name}'", other.name());
            return false;
        }

        self.names.insert(name.to_owned(), self.weights.len());
        self.weights.push(Weight::new(name, loc));

        true
    }

    /// Returns the number of registered weights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns `true` if no weight is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Returns an iterator over all weights in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Weight> {
        self.weights.iter()
    }

    /// Returns the names of all weights in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.weights.iter().map(Weight::name).collect()
    }

    /// Returns the weight called `name`.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Weight> {
        self.names.get(name).map(|&index| &self.weights[index])
    }

    /// Returns the weight stored at slot `loc`.
    #[must_use]
    pub fn get_by_loc(&self, loc: usize) -> Option<&Weight> {
        self.weights.iter().find(|weight| weight.loc == loc)
    }

    /// Returns all weights satisfying `filter`.
    #[must_use]
    pub fn get(&self, filter: &WeightFilter) -> Vec<&Weight> {
        self.weights
            .iter()
            .filter(|weight| filter.matches(weight))
            .collect()
    }

    /// Returns the nominal weight: no auxiliary or strong-coupling tag, unit scale factors, the
    /// dynamic scale choice `scale_choice` and a PDF from `central_pdfs`. An empty `central_pdfs`
    /// accepts every PDF. If more than one weight qualifies the first one is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingNominal`] if no weight qualifies.
    pub fn nominal(&self, scale_choice: i32, central_pdfs: &[i32]) -> Result<&Weight> {
        let candidates: Vec<_> = self
            .weights
            .iter()
            .filter(|weight| {
                !weight.is_tagged()
                    && weight.has_scales(1.0, 1.0)
                    && weight.dynamic_scale == Some(scale_choice)
                    && (central_pdfs.is_empty()
                        || weight.pdfset.is_some_and(|id| central_pdfs.contains(&id)))
            })
            .collect();

        match candidates.as_slice() {
            [] => Err(Error::MissingNominal {
                scale_choice,
                central_pdfs: central_pdfs.to_vec(),
            }),
            [nominal] => Ok(*nominal),
            [nominal, ..] => {
                warn!(
                    "{} weights qualify as nominal ({}), using '{}'",
                    candidates.len(),
                    candidates.iter().map(|weight| weight.name()).join(", "),
                    nominal.name()
                );
                Ok(*nominal)
            }
        }
    }

    /// Returns the weights forming the scale variation `variation` at the dynamic scale choice
    /// `dynamic`, restricted to untagged weights with the PDF `pdfset`. If the grid is not
    /// complete, all candidate weights at that dynamic scale choice are returned instead.
    #[must_use]
    pub fn get_scale_vars(
        &self,
        variation: ScaleVariation,
        dynamic: i32,
        pdfset: Option<i32>,
    ) -> Vec<&Weight> {
        let candidates: Vec<_> = self
            .weights
            .iter()
            .filter(|weight| {
                !weight.is_tagged()
                    && weight.dynamic_scale == Some(dynamic)
                    && (pdfset.is_none() || weight.pdfset == pdfset)
            })
            .collect();

        let grid: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|weight| {
                variation
                    .grid()
                    .iter()
                    .any(|&(muf, mur)| weight.has_scales(muf, mur))
            })
            .collect();

        if grid.len() == variation.points() {
            grid
        } else {
            warn!(
                "found {} instead of {} weights for the {}-point scale variation with dynamic scale \
                 choice {dynamic}, using all {} weights at this scale choice",
                grid.len(),
                variation.points(),
                variation.points(),
                candidates.len()
            );
            candidates
        }
    }

    /// Returns all weights whose PDF id is one of `ids`.
    #[must_use]
    pub fn pdfset(&self, ids: &[i32]) -> Vec<&Weight> {
        self.weights
            .iter()
            .filter(|weight| weight.pdfset.is_some_and(|id| ids.contains(&id)))
            .collect()
    }

    /// Returns the sorted list of distinct PDF ids.
    #[must_use]
    pub fn pdf_ids(&self) -> Vec<i32> {
        self.weights
            .iter()
            .filter_map(Weight::pdfset)
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Returns `true` if at least one weight varies a scale factor.
    #[must_use]
    pub fn has_scale(&self) -> bool {
        self.weights
            .iter()
            .any(|weight| !weight.is_tagged() && !weight.has_scales(1.0, 1.0))
    }

    /// Returns `true` if the weights use more than one PDF id.
    #[must_use]
    pub fn has_pdf(&self) -> bool {
        self.pdf_ids().len() > 1
    }

    /// Returns the sorted, distinct values of `muf` and of `mur`.
    #[must_use]
    pub fn scales(&self) -> (Vec<f64>, Vec<f64>) {
        let unique = |values: Vec<f64>| -> Vec<f64> {
            values
                .into_iter()
                .sorted_by(f64::total_cmp)
                .dedup_by(|a, b| approx_eq!(f64, *a, *b, ulps = 4))
                .collect()
        };

        (
            unique(self.weights.iter().filter_map(Weight::muf).collect()),
            unique(self.weights.iter().filter_map(Weight::mur).collect()),
        )
    }

    /// Returns the slots of `weights`.
    #[must_use]
    pub fn locs(weights: &[&Weight]) -> Vec<usize> {
        weights.iter().map(|weight| weight.loc).unique().collect()
    }
}

impl<'a> IntoIterator for &'a WeightCollection {
    type Item = &'a Weight;
    type IntoIter = std::slice::Iter<'a, Weight>;

    fn into_iter(self) -> Self::IntoIter {
        self.weights.iter()
    }
}
