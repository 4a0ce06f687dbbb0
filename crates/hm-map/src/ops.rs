//! Arithmetic on maps.
//!
//! Every operation produces a new map with no hash. Uncertainties propagate bin by bin through
//! [`UFloat`] arithmetic.

use std::ops::{Add, Div, Mul, Neg, Sub};

use hm_core::{Error, Result, UFloat};
use ndarray::{ArrayD, CowArray, IxDyn, Zip};

use crate::map::Map;

/// Right-hand side of a map operation.
#[derive(Debug, Clone)]
pub enum Operand<'a> {
    /// Applied to every bin.
    Scalar(UFloat),
    /// Combined bin by bin; the shape must equal the binning shape.
    Array(CowArray<'a, UFloat, IxDyn>),
    /// Combined bin by bin; the binnings must be compatible.
    Map(&'a Map),
}

impl From<f64> for Operand<'_> {
    fn from(v: f64) -> Self {
        Operand::Scalar(UFloat::exact(v))
    }
}

impl From<UFloat> for Operand<'_> {
    fn from(v: UFloat) -> Self {
        Operand::Scalar(v)
    }
}

impl<'a> From<&'a ArrayD<UFloat>> for Operand<'a> {
    fn from(arr: &'a ArrayD<UFloat>) -> Self {
        Operand::Array(arr.view().into())
    }
}

impl From<ArrayD<UFloat>> for Operand<'_> {
    fn from(arr: ArrayD<UFloat>) -> Self {
        Operand::Array(arr.into())
    }
}

impl From<&ArrayD<f64>> for Operand<'_> {
    fn from(arr: &ArrayD<f64>) -> Self {
        Operand::Array(arr.mapv(UFloat::exact).into())
    }
}

impl From<ArrayD<f64>> for Operand<'_> {
    fn from(arr: ArrayD<f64>) -> Self {
        Operand::Array(arr.mapv(UFloat::exact).into())
    }
}

impl<'a> From<&'a Map> for Operand<'a> {
    fn from(m: &'a Map) -> Self {
        Operand::Map(m)
    }
}

/// Binary operation between a map and an [`Operand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `a ** b`
    Pow,
    /// `a // b`; not supported for maps.
    FloorDiv,
}

impl BinaryOp {
    fn apply(self, a: UFloat, b: UFloat) -> UFloat {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.pow(b),
            BinaryOp::FloorDiv => UFloat::exact((a.nominal() / b.nominal()).floor()),
        }
    }
}

impl Map {
    /// `self op rhs`, or `rhs op self` when `reflected`.
    ///
    /// With a map operand the result compares exactly if either input does; otherwise it
    /// keeps this map's setting.
    pub fn binary<'a>(
        &self,
        op: BinaryOp,
        rhs: impl Into<Operand<'a>>,
        reflected: bool,
    ) -> Result<Map> {
        if op == BinaryOp::FloorDiv {
            return Err(Error::NotImplemented("floor division is not defined for maps".into()));
        }
        let f = |a: UFloat, b: UFloat| if reflected { op.apply(b, a) } else { op.apply(a, b) };
        let (values, exact) = match rhs.into() {
            Operand::Scalar(s) => (self.values.mapv(|v| f(v, s)), self.exact_comparison),
            Operand::Array(arr) => {
                self.binning.assert_array_fits(arr.shape())?;
                let values = Zip::from(&self.values).and(&arr).map_collect(|&a, &b| f(a, b));
                (values, self.exact_comparison)
            }
            Operand::Map(other) => {
                self.binning.assert_compat(&other.binning)?;
                let values =
                    Zip::from(&self.values).and(&other.values).map_collect(|&a, &b| f(a, b));
                (values, self.exact_comparison || other.exact_comparison)
            }
        };
        Ok(self.derived(values, exact))
    }

    fn unary(&self, f: impl Fn(UFloat) -> UFloat) -> Map {
        self.derived(self.values.mapv(f), self.exact_comparison)
    }

    /// `self ** rhs`
    pub fn pow<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Map> {
        self.binary(BinaryOp::Pow, rhs, false)
    }

    /// `lhs + self`
    pub fn radd<'a>(&self, lhs: impl Into<Operand<'a>>) -> Result<Map> {
        self.binary(BinaryOp::Add, lhs, true)
    }

    /// `lhs - self`
    pub fn rsub<'a>(&self, lhs: impl Into<Operand<'a>>) -> Result<Map> {
        self.binary(BinaryOp::Sub, lhs, true)
    }

    /// `lhs * self`
    pub fn rmul<'a>(&self, lhs: impl Into<Operand<'a>>) -> Result<Map> {
        self.binary(BinaryOp::Mul, lhs, true)
    }

    /// `lhs / self`
    pub fn rdiv<'a>(&self, lhs: impl Into<Operand<'a>>) -> Result<Map> {
        self.binary(BinaryOp::Div, lhs, true)
    }

    /// `lhs ** self`
    pub fn rpow<'a>(&self, lhs: impl Into<Operand<'a>>) -> Result<Map> {
        self.binary(BinaryOp::Pow, lhs, true)
    }

    /// `self // rhs`; always an error.
    pub fn floor_div<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Map> {
        self.binary(BinaryOp::FloorDiv, rhs, false)
    }

    /// Absolute value.
    pub fn abs(&self) -> Map {
        self.unary(UFloat::abs)
    }

    /// Square root.
    pub fn sqrt(&self) -> Map {
        self.unary(UFloat::sqrt)
    }

    /// Natural logarithm.
    pub fn ln(&self) -> Map {
        self.unary(UFloat::ln)
    }

    /// Alias of [`Map::ln`].
    pub fn log(&self) -> Map {
        self.ln()
    }

    /// Base-10 logarithm.
    pub fn log10(&self) -> Map {
        self.unary(UFloat::log10)
    }
}

impl Neg for &Map {
    type Output = Map;

    fn neg(self) -> Map {
        self.unary(|v| -v)
    }
}

macro_rules! impl_map_ops {
    ($($trait:ident::$method:ident => $op:expr),* $(,)?) => {
        $(
            impl<'a, T: Into<Operand<'a>>> $trait<T> for &Map {
                type Output = Result<Map>;

                fn $method(self, rhs: T) -> Result<Map> {
                    self.binary($op, rhs, false)
                }
            }

            impl $trait<&Map> for f64 {
                type Output = Result<Map>;

                fn $method(self, rhs: &Map) -> Result<Map> {
                    rhs.binary($op, self, true)
                }
            }

            impl $trait<&Map> for UFloat {
                type Output = Result<Map>;

                fn $method(self, rhs: &Map) -> Result<Map> {
                    rhs.binary($op, self, true)
                }
            }
        )*
    };
}

impl_map_ops!(
    Add::add => BinaryOp::Add,
    Sub::sub => BinaryOp::Sub,
    Mul::mul => BinaryOp::Mul,
    Div::div => BinaryOp::Div,
);
