//! Values paired with their one-standard-deviation uncertainty, and the
//! arithmetic that carries that uncertainty through every correction.
//!
//! All propagation is first order with independent errors: uncertainties of
//! sums and differences add in quadrature, relative uncertainties of products
//! and quotients add in quadrature. Subtraction never reduces uncertainty.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use approx::{AbsDiffEq, RelativeEq};
use ndarray::{
    Array, Array1, Array3, ArrayBase, ArrayViewD, Axis, Data, Dimension, Ix1, RemoveAxis, Zip,
};
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::types::{SaxsError, SaxsResult, UncertainArray};

/// A nominal value and its uncertainty.
///
/// Fields are private so the uncertainty can only be set through
/// [`Uncertain::new`], which keeps it non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawUncertain")]
pub struct Uncertain {
    nominal: f64,
    uncertainty: f64,
}

#[derive(Deserialize)]
struct RawUncertain {
    nominal: f64,
    uncertainty: f64,
}

impl From<RawUncertain> for Uncertain {
    fn from(raw: RawUncertain) -> Self {
        Uncertain::new(raw.nominal, raw.uncertainty)
    }
}

impl Uncertain {
    /// Create an uncertain value; the sign of `uncertainty` is discarded
    pub fn new(nominal: f64, uncertainty: f64) -> Self {
        Self {
            nominal,
            uncertainty: uncertainty.abs(),
        }
    }

    /// A value known exactly, such as a calibration constant
    pub fn exact(nominal: f64) -> Self {
        Self {
            nominal,
            uncertainty: 0.0,
        }
    }

    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    /// One standard deviation, never negative
    pub fn uncertainty(&self) -> f64 {
        self.uncertainty
    }

    pub fn is_finite(&self) -> bool {
        self.nominal.is_finite() && self.uncertainty.is_finite()
    }
}

impl fmt::Display for Uncertain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ± {}", self.nominal, self.uncertainty)
    }
}

impl Add for Uncertain {
    type Output = Uncertain;

    fn add(self, rhs: Uncertain) -> Uncertain {
        Uncertain {
            nominal: self.nominal + rhs.nominal,
            uncertainty: self.uncertainty.hypot(rhs.uncertainty),
        }
    }
}

impl Sub for Uncertain {
    type Output = Uncertain;

    fn sub(self, rhs: Uncertain) -> Uncertain {
        Uncertain {
            nominal: self.nominal - rhs.nominal,
            uncertainty: self.uncertainty.hypot(rhs.uncertainty),
        }
    }
}

impl Mul for Uncertain {
    type Output = Uncertain;

    fn mul(self, rhs: Uncertain) -> Uncertain {
        Uncertain {
            nominal: self.nominal * rhs.nominal,
            uncertainty: (self.uncertainty * rhs.nominal).hypot(rhs.uncertainty * self.nominal),
        }
    }
}

impl Div for Uncertain {
    type Output = Uncertain;

    /// A zero divisor yields non-finite components rather than a panic
    fn div(self, rhs: Uncertain) -> Uncertain {
        Uncertain {
            nominal: self.nominal / rhs.nominal,
            uncertainty: (self.uncertainty / rhs.nominal)
                .hypot(rhs.uncertainty * self.nominal / (rhs.nominal * rhs.nominal)),
        }
    }
}

impl Zero for Uncertain {
    fn zero() -> Self {
        Uncertain::exact(0.0)
    }

    fn is_zero(&self) -> bool {
        self.nominal == 0.0 && self.uncertainty == 0.0
    }
}

impl AbsDiffEq for Uncertain {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.nominal.abs_diff_eq(&other.nominal, epsilon)
            && self.uncertainty.abs_diff_eq(&other.uncertainty, epsilon)
    }
}

impl RelativeEq for Uncertain {
    fn default_max_relative() -> f64 {
        f64::EPSILON
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.nominal.relative_eq(&other.nominal, epsilon, max_relative)
            && self
                .uncertainty
                .relative_eq(&other.uncertainty, epsilon, max_relative)
    }
}

/// Shape produced by broadcasting two shapes against each other
pub fn broadcast_shape(left: &[usize], right: &[usize]) -> SaxsResult<Vec<usize>> {
    let ndim = left.len().max(right.len());
    let mut shape = vec![0; ndim];
    for axis in 0..ndim {
        let l = if axis < ndim - left.len() { 1 } else { left[axis - (ndim - left.len())] };
        let r = if axis < ndim - right.len() { 1 } else { right[axis - (ndim - right.len())] };
        shape[axis] = match (l, r) {
            (l, r) if l == r => l,
            (1, r) => r,
            (l, 1) => l,
            _ => {
                return Err(SaxsError::ShapeMismatch {
                    left: left.to_vec(),
                    right: right.to_vec(),
                })
            }
        };
    }
    Ok(shape)
}

fn combine<F>(
    lhs: ArrayViewD<'_, Uncertain>,
    rhs: ArrayViewD<'_, Uncertain>,
    op: F,
) -> SaxsResult<UncertainArray>
where
    F: Fn(Uncertain, Uncertain) -> Uncertain + Sync + Send,
{
    let shape = broadcast_shape(lhs.shape(), rhs.shape())?;
    let mismatch = || SaxsError::ShapeMismatch {
        left: lhs.shape().to_vec(),
        right: rhs.shape().to_vec(),
    };
    let lhs_view = lhs.broadcast(shape.as_slice()).ok_or_else(mismatch)?;
    let rhs_view = rhs.broadcast(shape.as_slice()).ok_or_else(mismatch)?;

    let zip = Zip::from(&lhs_view).and(&rhs_view);

    #[cfg(feature = "parallel")]
    let combined = zip.par_map_collect(|&a, &b| op(a, b));

    #[cfg(not(feature = "parallel"))]
    let combined = zip.map_collect(|&a, &b| op(a, b));

    Ok(combined)
}

/// Element wise sum, uncertainties added in quadrature
pub fn add<S1, S2, D1, D2>(
    augend: &ArrayBase<S1, D1>,
    addend: &ArrayBase<S2, D2>,
) -> SaxsResult<UncertainArray>
where
    S1: Data<Elem = Uncertain>,
    S2: Data<Elem = Uncertain>,
    D1: Dimension,
    D2: Dimension,
{
    combine(augend.view().into_dyn(), addend.view().into_dyn(), |a, b| a + b)
}

/// Element wise difference, uncertainties added in quadrature
pub fn subtract<S1, S2, D1, D2>(
    minuend: &ArrayBase<S1, D1>,
    subtrahend: &ArrayBase<S2, D2>,
) -> SaxsResult<UncertainArray>
where
    S1: Data<Elem = Uncertain>,
    S2: Data<Elem = Uncertain>,
    D1: Dimension,
    D2: Dimension,
{
    combine(minuend.view().into_dyn(), subtrahend.view().into_dyn(), |a, b| a - b)
}

/// Element wise product
pub fn multiply<S1, S2, D1, D2>(
    multiplier: &ArrayBase<S1, D1>,
    multiplicand: &ArrayBase<S2, D2>,
) -> SaxsResult<UncertainArray>
where
    S1: Data<Elem = Uncertain>,
    S2: Data<Elem = Uncertain>,
    D1: Dimension,
    D2: Dimension,
{
    combine(multiplier.view().into_dyn(), multiplicand.view().into_dyn(), |a, b| a * b)
}

/// Element wise quotient; zero divisors give non-finite elements
pub fn divide<S1, S2, D1, D2>(
    dividend: &ArrayBase<S1, D1>,
    divisor: &ArrayBase<S2, D2>,
) -> SaxsResult<UncertainArray>
where
    S1: Data<Elem = Uncertain>,
    S2: Data<Elem = Uncertain>,
    D1: Dimension,
    D2: Dimension,
{
    combine(dividend.view().into_dyn(), divisor.view().into_dyn(), |a, b| a / b)
}

/// Sum along `axis`: nominal values add, uncertainties add in quadrature
pub fn sum<S, D>(arr: &ArrayBase<S, D>, axis: Axis) -> SaxsResult<Array<Uncertain, D::Smaller>>
where
    S: Data<Elem = Uncertain>,
    D: RemoveAxis,
{
    if axis.index() >= arr.ndim() {
        return Err(SaxsError::InvalidParameter(format!(
            "Cannot sum along axis {} of a {}-dimensional array",
            axis.index(),
            arr.ndim()
        )));
    }

    let nominal = arr.map(|value| value.nominal).sum_axis(axis);
    let variance = arr.map(|value| value.uncertainty * value.uncertainty).sum_axis(axis);

    Ok(Zip::from(&nominal)
        .and(&variance)
        .map_collect(|&n, &v| Uncertain::new(n, v.sqrt())))
}

/// Sum of every element of an uncertain array
pub fn sum_all<S, D>(arr: &ArrayBase<S, D>) -> Uncertain
where
    S: Data<Elem = Uncertain>,
    D: Dimension,
{
    let (nominal, variance) = arr.iter().fold((0.0, 0.0), |(n, v), value| {
        (n + value.nominal, v + value.uncertainty * value.uncertainty)
    });
    Uncertain::new(nominal, variance.sqrt())
}

/// Lift exactly known values into uncertain values
pub fn exact<S, D>(values: &ArrayBase<S, D>) -> Array<Uncertain, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    values.mapv(Uncertain::exact)
}

/// Per-frame exact factors shaped (frames, 1, 1) to broadcast against a stack
pub(crate) fn per_frame<S>(values: &ArrayBase<S, Ix1>) -> Array3<Uncertain>
where
    S: Data<Elem = f64>,
{
    exact(values).insert_axis(Axis(1)).insert_axis(Axis(2))
}

/// Per-frame uncertain values shaped (frames, 1, 1)
pub(crate) fn per_frame_uncertain(values: Array1<Uncertain>) -> Array3<Uncertain> {
    values.insert_axis(Axis(1)).insert_axis(Axis(2))
}
