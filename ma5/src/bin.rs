//! Module containing [`MultiWeightBin`], a quantity evaluated under every registered weight
//! variation, and [`Entries`], the positive/negative accumulator pair built from it.

use super::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Index, Mul, Neg, Sub};

/// A fixed-length vector with one value per weight slot. The index of a value is the `loc` of
/// the corresponding [`Weight`](super::weight::Weight).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MultiWeightBin(Vec<f64>);

impl MultiWeightBin {
    /// Constructor.
    #[must_use]
    pub const fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Creates a bin with `len` slots that are all zero.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Returns the number of weight slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if this bin has no weight slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value of every slot.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Returns the value at slot `loc`, or `None` if the slot does not exist.
    #[must_use]
    pub fn get(&self, loc: usize) -> Option<f64> {
        self.0.get(loc).copied()
    }

    /// Returns an iterator over the values of all slots.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// Elementwise absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        self.map(f64::abs)
    }

    /// Multiplies every slot with `factor`.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|x| x * factor)
    }

    /// Applies `f` to every slot.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        self.0.iter().copied().map(f).collect()
    }

    /// Replaces negative slots with zero and returns the clamped bin together with the indices of
    /// the slots that were clamped.
    #[must_use]
    pub fn clamp_negative(&self) -> (Self, Vec<usize>) {
        let clamped = self
            .0
            .iter()
            .enumerate()
            .filter_map(|(loc, &value)| (value < 0.0).then_some(loc))
            .collect();

        (self.map(|x| x.max(0.0)), clamped)
    }

    /// Elementwise addition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if `self` and `other` have a different number of slots.
    pub fn try_add(&self, other: &Self) -> Result<Self> {
        self.try_zip_with(other, "addition", |a, b| a + b)
    }

    /// Elementwise subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if `self` and `other` have a different number of slots.
    pub fn try_sub(&self, other: &Self) -> Result<Self> {
        self.try_zip_with(other, "subtraction", |a, b| a - b)
    }

    /// Elementwise multiplication.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if `self` and `other` have a different number of slots.
    pub fn try_mul(&self, other: &Self) -> Result<Self> {
        self.try_zip_with(other, "multiplication", |a, b| a * b)
    }

    /// Elementwise division.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if `self` and `other` have a different number of slots.
    pub fn try_div(&self, other: &Self) -> Result<Self> {
        self.try_zip_with(other, "division", |a, b| a / b)
    }

    /// Elementwise division, with every slot whose denominator is zero set to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if `self` and `other` have a different number of slots.
    pub fn try_div_or_zero(&self, other: &Self) -> Result<Self> {
        self.try_zip_with(other, "division", |a, b| if b == 0.0 { 0.0 } else { a / b })
    }

    /// Sums all `bins` slot by slot. Returns `None` if `bins` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if the bins have different numbers of slots.
    pub fn try_sum<'a>(mut bins: impl Iterator<Item = &'a Self>) -> Result<Option<Self>> {
        let Some(first) = bins.next() else {
            return Ok(None);
        };

        bins.try_fold(first.clone(), |acc, bin| acc.try_add(bin))
            .map(Some)
    }

    fn try_zip_with(&self, other: &Self, operation: &str, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        if self.len() != other.len() {
            return Err(Error::dimension(self.len(), other.len(), operation));
        }

        Ok(self
            .0
            .iter()
            .zip(&other.0)
            .map(|(&a, &b)| f(a, b))
            .collect())
    }
}

impl From<Vec<f64>> for MultiWeightBin {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl FromIterator<f64> for MultiWeightBin {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for MultiWeightBin {
    type Output = f64;

    fn index(&self, loc: usize) -> &f64 {
        &self.0[loc]
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $checked:ident) => {
        impl $trait<&MultiWeightBin> for &MultiWeightBin {
            type Output = MultiWeightBin;

            /// # Panics
            ///
            /// Panics if both operands have a different number of weight slots.
            fn $method(self, other: &MultiWeightBin) -> MultiWeightBin {
                match self.$checked(other) {
                    Ok(result) => result,
                    Err(err) => panic!("{err}"),
                }
            }
        }

        impl $trait for MultiWeightBin {
            type Output = Self;

            fn $method(self, other: Self) -> Self {
                (&self).$method(&other)
            }
        }
    };
}

impl_binary_op!(Add, add, try_add);
impl_binary_op!(Sub, sub, try_sub);
impl_binary_op!(Mul, mul, try_mul);
impl_binary_op!(Div, div, try_div);

impl Mul<f64> for &MultiWeightBin {
    type Output = MultiWeightBin;

    fn mul(self, factor: f64) -> MultiWeightBin {
        self.scale(factor)
    }
}

impl Neg for &MultiWeightBin {
    type Output = MultiWeightBin;

    fn neg(self) -> MultiWeightBin {
        self.map(|x| -x)
    }
}

impl Neg for MultiWeightBin {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}

/// A quantity accumulated separately for events with positive and with negative weights.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Entries {
    positive: MultiWeightBin,
    negative: MultiWeightBin,
}

impl Entries {
    /// Constructor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if `positive` and `negative` have a different number of
    /// slots.
    pub fn new(positive: MultiWeightBin, negative: MultiWeightBin) -> Result<Self> {
        if positive.len() != negative.len() {
            return Err(Error::dimension(
                positive.len(),
                negative.len(),
                "positive/negative pair",
            ));
        }

        Ok(Self { positive, negative })
    }

    /// Creates a pair from raw values, padding the shorter of both vectors with zeros.
    pub(crate) fn padded(mut positive: Vec<f64>, mut negative: Vec<f64>) -> Self {
        let len = positive.len().max(negative.len());
        positive.resize(len, 0.0);
        negative.resize(len, 0.0);

        Self {
            positive: positive.into(),
            negative: negative.into(),
        }
    }

    /// Creates a pair where both accumulators have `len` zero slots.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            positive: MultiWeightBin::zeros(len),
            negative: MultiWeightBin::zeros(len),
        }
    }

    /// Returns the positive-weight accumulator.
    #[must_use]
    pub const fn positive(&self) -> &MultiWeightBin {
        &self.positive
    }

    /// Returns the negative-weight accumulator.
    #[must_use]
    pub const fn negative(&self) -> &MultiWeightBin {
        &self.negative
    }

    /// Returns the number of weight slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positive.len()
    }

    /// Returns `true` if there are no weight slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty()
    }

    /// Returns the physical quantity, which is the positive contribution minus the absolute value
    /// of the negative one, for every slot.
    #[must_use]
    pub fn value(&self) -> MultiWeightBin {
        self.positive
            .iter()
            .zip(self.negative.iter())
            .map(|(pos, neg)| pos - neg.abs())
            .collect()
    }

    /// Returns the physical quantity at slot `loc`, or `None` if the slot does not exist.
    #[must_use]
    pub fn value_at(&self, loc: usize) -> Option<f64> {
        Some(self.positive.get(loc)? - self.negative.get(loc)?.abs())
    }
}
