//! Common data types for HistoMap

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A nominal value with a one-sigma standard deviation.
///
/// Arithmetic applies first-order (linear) error propagation,
/// `σz² = (∂f/∂x)² σx² + (∂f/∂y)² σy²`, and treats every operand as statistically
/// independent of every other. No provenance is tracked, so `x - x` has a nominal value of
/// zero but a standard deviation of `√2 σx`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UFloat {
    nominal: f64,
    std_dev: f64,
}

impl UFloat {
    /// Create a value with uncertainty. The sign of `std_dev` is discarded.
    pub fn new(nominal: f64, std_dev: f64) -> Self {
        Self { nominal, std_dev: std_dev.abs() }
    }

    /// A value without uncertainty.
    pub const fn exact(nominal: f64) -> Self {
        Self { nominal, std_dev: 0.0 }
    }

    /// Nominal (central) value.
    #[inline]
    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    /// Standard deviation (always `>= 0`, or NaN if propagated through an undefined point).
    #[inline]
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Same nominal value with a different standard deviation.
    pub fn with_std_dev(self, std_dev: f64) -> Self {
        Self::new(self.nominal, std_dev)
    }

    /// `self` raised to a constant power.
    pub fn powf(self, exponent: f64) -> Self {
        let deriv =
            if exponent == 0.0 { 0.0 } else { exponent * self.nominal.powf(exponent - 1.0) };
        propagate(self.nominal.powf(exponent), &[(deriv, self.std_dev)])
    }

    /// `self` raised to an uncertain power.
    pub fn pow(self, exponent: UFloat) -> Self {
        let value = self.nominal.powf(exponent.nominal);
        let d_base = if exponent.nominal == 0.0 {
            0.0
        } else {
            exponent.nominal * self.nominal.powf(exponent.nominal - 1.0)
        };
        let d_exp = value * self.nominal.ln();
        propagate(value, &[(d_base, self.std_dev), (d_exp, exponent.std_dev)])
    }

    /// Square root.
    pub fn sqrt(self) -> Self {
        let value = self.nominal.sqrt();
        propagate(value, &[(0.5 / value, self.std_dev)])
    }

    /// Natural logarithm.
    pub fn ln(self) -> Self {
        propagate(self.nominal.ln(), &[(1.0 / self.nominal, self.std_dev)])
    }

    /// Base-10 logarithm.
    pub fn log10(self) -> Self {
        propagate(
            self.nominal.log10(),
            &[(1.0 / (self.nominal * std::f64::consts::LN_10), self.std_dev)],
        )
    }

    /// Absolute value; the standard deviation is unchanged.
    pub fn abs(self) -> Self {
        Self { nominal: self.nominal.abs(), std_dev: self.std_dev }
    }
}

/// Combine partial-derivative terms `(∂f/∂xi, σi)` in quadrature.
///
/// Terms with zero σ are skipped so that an infinite or NaN derivative at an exact input
/// does not poison the result.
fn propagate(nominal: f64, terms: &[(f64, f64)]) -> UFloat {
    let variance: f64 = terms
        .iter()
        .filter(|(_, sigma)| *sigma != 0.0)
        .map(|(deriv, sigma)| {
            let t = deriv * sigma;
            t * t
        })
        .sum();
    UFloat { nominal, std_dev: variance.sqrt() }
}

impl From<f64> for UFloat {
    fn from(value: f64) -> Self {
        Self::exact(value)
    }
}

impl fmt::Display for UFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+/-{}", self.nominal, self.std_dev)
    }
}

impl Neg for UFloat {
    type Output = UFloat;

    fn neg(self) -> UFloat {
        UFloat { nominal: -self.nominal, std_dev: self.std_dev }
    }
}

impl Add for UFloat {
    type Output = UFloat;

    fn add(self, rhs: UFloat) -> UFloat {
        propagate(self.nominal + rhs.nominal, &[(1.0, self.std_dev), (1.0, rhs.std_dev)])
    }
}

impl Sub for UFloat {
    type Output = UFloat;

    fn sub(self, rhs: UFloat) -> UFloat {
        propagate(self.nominal - rhs.nominal, &[(1.0, self.std_dev), (-1.0, rhs.std_dev)])
    }
}

impl Mul for UFloat {
    type Output = UFloat;

    fn mul(self, rhs: UFloat) -> UFloat {
        propagate(
            self.nominal * rhs.nominal,
            &[(rhs.nominal, self.std_dev), (self.nominal, rhs.std_dev)],
        )
    }
}

impl Div for UFloat {
    type Output = UFloat;

    fn div(self, rhs: UFloat) -> UFloat {
        let inv = 1.0 / rhs.nominal;
        propagate(
            self.nominal * inv,
            &[(inv, self.std_dev), (-self.nominal * inv * inv, rhs.std_dev)],
        )
    }
}

macro_rules! impl_scalar_ops {
    ($($trait:ident :: $method:ident),* $(,)?) => {
        $(
            impl $trait<f64> for UFloat {
                type Output = UFloat;

                fn $method(self, rhs: f64) -> UFloat {
                    $trait::$method(self, UFloat::exact(rhs))
                }
            }

            impl $trait<UFloat> for f64 {
                type Output = UFloat;

                fn $method(self, rhs: UFloat) -> UFloat {
                    $trait::$method(UFloat::exact(self), rhs)
                }
            }
        )*
    };
}

impl_scalar_ops!(Add::add, Sub::sub, Mul::mul, Div::div);

/// Opaque identity hash attached to a histogram.
///
/// Produced upstream (typically from the inputs that generated a histogram) and used as an
/// O(1) equality and cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentityHash {
    /// Integer hash.
    Int(i64),
    /// Textual hash (e.g. a hex digest).
    Text(String),
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityHash::Int(v) => write!(f, "{}", v),
            IdentityHash::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for IdentityHash {
    fn from(v: i64) -> Self {
        IdentityHash::Int(v)
    }
}

impl From<&str> for IdentityHash {
    fn from(s: &str) -> Self {
        IdentityHash::Text(s.to_string())
    }
}

impl From<String> for IdentityHash {
    fn from(s: String) -> Self {
        IdentityHash::Text(s)
    }
}
