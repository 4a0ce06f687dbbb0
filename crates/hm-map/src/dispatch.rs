//! Operations broadcast by a [`MapSet`](crate::MapSet) over its members.

use std::fmt;
use std::str::FromStr;

use hm_binning::BinIndex;
use hm_core::{Error, IdentityHash, Result, UFloat};
use ndarray::ArrayD;

use crate::map::Map;
use crate::mapset::MapSet;
use crate::ops::{BinaryOp, Operand};

/// Map attribute or method that a collection can apply to each member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapOp {
    /// Property: name.
    Name,
    /// Property: label.
    Label,
    /// Property: identity hash.
    Hash,
    /// Property: exact-comparison flag.
    ExactComparison,
    /// Property: nominal values.
    NominalValues,
    /// Property: standard deviations.
    StdDevs,
    /// Property: shape.
    Shape,
    /// `map + x`
    Add,
    /// `map - x`
    Sub,
    /// `map * x`
    Mul,
    /// `map / x`
    Div,
    /// `map ** x`
    Pow,
    /// `map // x` (unsupported by maps)
    FloorDiv,
    /// `x + map`
    RAdd,
    /// `x - map`
    RSub,
    /// `x * map`
    RMul,
    /// `x / map`
    RDiv,
    /// `x ** map`
    RPow,
    /// `-map`
    Neg,
    /// `|map|`
    Abs,
    /// Square root.
    Sqrt,
    /// Natural logarithm.
    Log,
    /// Base-10 logarithm.
    Log10,
    /// Random fluctuation: `(method)` or `(method, seed)`.
    Fluctuate,
    /// Sub-map by bin index.
    Index,
    /// Total Poisson log-likelihood against an expectation.
    Llh,
    /// Total chi-square against an expectation.
    Chi2,
    /// Set Poisson (`sqrt(n)`) errors in place.
    SetPoissonErrors,
    /// Rename in place.
    SetName,
    /// Relabel in place.
    SetLabel,
    /// Replace (or clear with `None`) the hash in place.
    SetHash,
    /// Set the exact-comparison flag in place.
    SetExactComparison,
}

impl MapOp {
    /// Every operation, in declaration order.
    pub const ALL: [MapOp; 32] = [
        MapOp::Name,
        MapOp::Label,
        MapOp::Hash,
        MapOp::ExactComparison,
        MapOp::NominalValues,
        MapOp::StdDevs,
        MapOp::Shape,
        MapOp::Add,
        MapOp::Sub,
        MapOp::Mul,
        MapOp::Div,
        MapOp::Pow,
        MapOp::FloorDiv,
        MapOp::RAdd,
        MapOp::RSub,
        MapOp::RMul,
        MapOp::RDiv,
        MapOp::RPow,
        MapOp::Neg,
        MapOp::Abs,
        MapOp::Sqrt,
        MapOp::Log,
        MapOp::Log10,
        MapOp::Fluctuate,
        MapOp::Index,
        MapOp::Llh,
        MapOp::Chi2,
        MapOp::SetPoissonErrors,
        MapOp::SetName,
        MapOp::SetLabel,
        MapOp::SetHash,
        MapOp::SetExactComparison,
    ];

    /// Snake-case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            MapOp::Name => "name",
            MapOp::Label => "label",
            MapOp::Hash => "hash",
            MapOp::ExactComparison => "exact_comparison",
            MapOp::NominalValues => "nominal_values",
            MapOp::StdDevs => "std_devs",
            MapOp::Shape => "shape",
            MapOp::Add => "add",
            MapOp::Sub => "sub",
            MapOp::Mul => "mul",
            MapOp::Div => "div",
            MapOp::Pow => "pow",
            MapOp::FloorDiv => "floordiv",
            MapOp::RAdd => "radd",
            MapOp::RSub => "rsub",
            MapOp::RMul => "rmul",
            MapOp::RDiv => "rdiv",
            MapOp::RPow => "rpow",
            MapOp::Neg => "neg",
            MapOp::Abs => "abs",
            MapOp::Sqrt => "sqrt",
            MapOp::Log => "log",
            MapOp::Log10 => "log10",
            MapOp::Fluctuate => "fluctuate",
            MapOp::Index => "index",
            MapOp::Llh => "llh",
            MapOp::Chi2 => "chi2",
            MapOp::SetPoissonErrors => "set_poisson_errors",
            MapOp::SetName => "set_name",
            MapOp::SetLabel => "set_label",
            MapOp::SetHash => "set_hash",
            MapOp::SetExactComparison => "set_exact_comparison",
        }
    }

    /// `true` for attribute reads.
    pub fn is_property(&self) -> bool {
        matches!(
            self,
            MapOp::Name
                | MapOp::Label
                | MapOp::Hash
                | MapOp::ExactComparison
                | MapOp::NominalValues
                | MapOp::StdDevs
                | MapOp::Shape
        )
    }

    /// `true` for operations that modify the maps in place.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            MapOp::SetPoissonErrors
                | MapOp::SetName
                | MapOp::SetLabel
                | MapOp::SetHash
                | MapOp::SetExactComparison
        )
    }

    /// Accepted number of arguments, as `(min, max)`.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            op if op.is_property() => (0, 0),
            MapOp::Neg
            | MapOp::Abs
            | MapOp::Sqrt
            | MapOp::Log
            | MapOp::Log10
            | MapOp::SetPoissonErrors => (0, 0),
            MapOp::Fluctuate => (1, 2),
            _ => (1, 1),
        }
    }

    fn check_arity(&self, n: usize) -> Result<()> {
        let (lo, hi) = self.arity();
        if n < lo || n > hi {
            let expected = if lo == hi { lo.to_string() } else { format!("{} to {}", lo, hi) };
            return Err(Error::Validation(format!(
                "{} takes {} argument(s), got {}",
                self, expected, n
            )));
        }
        Ok(())
    }

    fn binary(&self) -> Option<(BinaryOp, bool)> {
        Some(match self {
            MapOp::Add => (BinaryOp::Add, false),
            MapOp::Sub => (BinaryOp::Sub, false),
            MapOp::Mul => (BinaryOp::Mul, false),
            MapOp::Div => (BinaryOp::Div, false),
            MapOp::Pow => (BinaryOp::Pow, false),
            MapOp::FloorDiv => (BinaryOp::FloorDiv, false),
            MapOp::RAdd => (BinaryOp::Add, true),
            MapOp::RSub => (BinaryOp::Sub, true),
            MapOp::RMul => (BinaryOp::Mul, true),
            MapOp::RDiv => (BinaryOp::Div, true),
            MapOp::RPow => (BinaryOp::Pow, true),
            _ => return None,
        })
    }
}

impl fmt::Display for MapOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MapOp::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::NotFound(format!("maps have no operation {:?}", s)))
    }
}

/// Argument of a broadcast operation.
///
/// A [`Arg::MapSet`] is replaced, per member, by the aligned map of that collection. A bare
/// [`Arg::Map`] is only valid after that alignment and is rejected at the collection level.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    /// Null.
    None,
    /// Boolean.
    Bool(bool),
    /// Integer (also used for seeds, reinterpreted as `u64`).
    Int(i64),
    /// Float.
    Scalar(f64),
    /// Float with uncertainty.
    UFloat(UFloat),
    /// String.
    Str(&'a str),
    /// Array of uncertain values.
    Array(&'a ArrayD<UFloat>),
    /// Array of plain values.
    FloatArray(&'a ArrayD<f64>),
    /// Bin index.
    Index(&'a BinIndex),
    /// Identity hash.
    Hash(&'a IdentityHash),
    /// Single map.
    Map(&'a Map),
    /// Collection, aligned member by member.
    MapSet(&'a MapSet),
}

impl Arg<'_> {
    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::None => "None",
            Arg::Bool(_) => "bool",
            Arg::Int(_) => "int",
            Arg::Scalar(_) => "float",
            Arg::UFloat(_) => "UFloat",
            Arg::Str(_) => "str",
            Arg::Array(_) => "array",
            Arg::FloatArray(_) => "float array",
            Arg::Index(_) => "BinIndex",
            Arg::Hash(_) => "IdentityHash",
            Arg::Map(_) => "Map",
            Arg::MapSet(_) => "MapSet",
        }
    }
}

impl From<f64> for Arg<'_> {
    fn from(v: f64) -> Self {
        Arg::Scalar(v)
    }
}

impl From<i64> for Arg<'_> {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<bool> for Arg<'_> {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl From<UFloat> for Arg<'_> {
    fn from(v: UFloat) -> Self {
        Arg::UFloat(v)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(v: &'a str) -> Self {
        Arg::Str(v)
    }
}

impl<'a> From<&'a ArrayD<UFloat>> for Arg<'a> {
    fn from(v: &'a ArrayD<UFloat>) -> Self {
        Arg::Array(v)
    }
}

impl<'a> From<&'a ArrayD<f64>> for Arg<'a> {
    fn from(v: &'a ArrayD<f64>) -> Self {
        Arg::FloatArray(v)
    }
}

impl<'a> From<&'a BinIndex> for Arg<'a> {
    fn from(v: &'a BinIndex) -> Self {
        Arg::Index(v)
    }
}

impl<'a> From<&'a IdentityHash> for Arg<'a> {
    fn from(v: &'a IdentityHash) -> Self {
        Arg::Hash(v)
    }
}

impl<'a> From<&'a Map> for Arg<'a> {
    fn from(v: &'a Map) -> Self {
        Arg::Map(v)
    }
}

impl<'a> From<&'a MapSet> for Arg<'a> {
    fn from(v: &'a MapSet) -> Self {
        Arg::MapSet(v)
    }
}

/// Per-member result of a broadcast operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nothing (in-place operations).
    None,
    /// Boolean.
    Bool(bool),
    /// Float.
    Float(f64),
    /// String.
    Str(String),
    /// Identity hash.
    Hash(IdentityHash),
    /// Array shape.
    Shape(Vec<usize>),
    /// Array of plain values.
    Array(ArrayD<f64>),
    /// A new map.
    Map(Map),
}

impl Value {
    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Hash(_) => "IdentityHash",
            Value::Shape(_) => "shape",
            Value::Array(_) => "array",
            Value::Map(_) => "Map",
        }
    }
}

/// Combined result of a broadcast operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// Every member produced a map.
    Maps(MapSet),
    /// Member results keyed by member name, in member order.
    Collated(Vec<(String, Value)>),
    /// Every member returned nothing.
    None,
}

impl Dispatched {
    /// The collection of results, or a type error.
    pub fn into_maps(self) -> Result<MapSet> {
        match self {
            Dispatched::Maps(set) => Ok(set),
            Dispatched::Collated(_) => Err(Error::unsupported_type("expected maps", "collated")),
            Dispatched::None => Err(Error::unsupported_type("expected maps", "None")),
        }
    }

    /// Name/value pairs; an empty collection yields no pairs.
    pub fn into_collated(self) -> Result<Vec<(String, Value)>> {
        match self {
            Dispatched::Collated(pairs) => Ok(pairs),
            Dispatched::Maps(set) if set.is_empty() => Ok(Vec::new()),
            Dispatched::Maps(_) => Err(Error::unsupported_type("expected values", "MapSet")),
            Dispatched::None => Err(Error::unsupported_type("expected values", "None")),
        }
    }
}

fn operand<'a>(op: MapOp, arg: Arg<'a>) -> Result<Operand<'a>> {
    match arg {
        Arg::Scalar(v) => Ok(v.into()),
        Arg::Int(v) => Ok((v as f64).into()),
        Arg::UFloat(v) => Ok(v.into()),
        Arg::Array(a) => Ok(a.into()),
        Arg::FloatArray(a) => Ok(a.into()),
        Arg::Map(m) => Ok(m.into()),
        other => Err(Error::unsupported_type(op.as_str(), other.type_name())),
    }
}

fn str_arg<'a>(op: MapOp, arg: Arg<'a>) -> Result<&'a str> {
    match arg {
        Arg::Str(s) => Ok(s),
        other => Err(Error::unsupported_type(op.as_str(), other.type_name())),
    }
}

/// Apply a non-mutating `op` to one map. `args` must already be aligned.
pub(crate) fn apply_one(map: &Map, op: MapOp, args: &[Arg<'_>]) -> Result<Value> {
    op.check_arity(args.len())?;
    if let Some((bin_op, reflected)) = op.binary() {
        return Ok(Value::Map(map.binary(bin_op, operand(op, args[0])?, reflected)?));
    }
    let value = match op {
        MapOp::Name => Value::Str(map.name().to_string()),
        MapOp::Label => Value::Str(map.label().to_string()),
        MapOp::Hash => map.hash().cloned().map(Value::Hash).unwrap_or(Value::None),
        MapOp::ExactComparison => Value::Bool(map.exact_comparison()),
        MapOp::NominalValues => Value::Array(map.nominal_values()),
        MapOp::StdDevs => Value::Array(map.std_devs()),
        MapOp::Shape => Value::Shape(map.shape().to_vec()),
        MapOp::Neg => Value::Map(-map),
        MapOp::Abs => Value::Map(map.abs()),
        MapOp::Sqrt => Value::Map(map.sqrt()),
        MapOp::Log => Value::Map(map.ln()),
        MapOp::Log10 => Value::Map(map.log10()),
        MapOp::Fluctuate => {
            let method = str_arg(op, args[0])?;
            let seed = match args.get(1) {
                None | Some(Arg::None) => None,
                Some(Arg::Int(s)) => Some(*s as u64),
                Some(other) => return Err(Error::unsupported_type("seed", other.type_name())),
            };
            Value::Map(map.fluctuate(method, seed)?)
        }
        MapOp::Index => match args[0] {
            Arg::Index(index) => Value::Map(map.index(index)?),
            other => return Err(Error::unsupported_type(op.as_str(), other.type_name())),
        },
        MapOp::Llh => Value::Float(map.llh(operand(op, args[0])?)?),
        MapOp::Chi2 => Value::Float(map.chi2(operand(op, args[0])?)?),
        _ => {
            return Err(Error::NotImplemented(format!(
                "{} modifies maps in place; use apply_to_maps_mut",
                op
            )));
        }
    };
    Ok(value)
}

/// Apply any `op` to one map, in place where the op mutates.
pub(crate) fn apply_one_mut(map: &mut Map, op: MapOp, args: &[Arg<'_>]) -> Result<Value> {
    op.check_arity(args.len())?;
    match op {
        MapOp::SetPoissonErrors => map.apply_poisson_errors(),
        MapOp::SetName => map.set_name(str_arg(op, args[0])?)?,
        MapOp::SetLabel => map.set_label(str_arg(op, args[0])?),
        MapOp::SetHash => {
            let hash = match args[0] {
                Arg::None => None,
                Arg::Hash(h) => Some(h.clone()),
                Arg::Int(v) => Some(IdentityHash::Int(v)),
                Arg::Str(s) => Some(IdentityHash::from(s)),
                other => return Err(Error::unsupported_type(op.as_str(), other.type_name())),
            };
            map.set_hash(hash);
        }
        MapOp::SetExactComparison => match args[0] {
            Arg::Bool(b) => map.set_exact_comparison(b),
            other => return Err(Error::unsupported_type(op.as_str(), other.type_name())),
        },
        _ => return apply_one(map, op, args),
    }
    Ok(Value::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hm_binning::{MultiDimBinning, OneDimBinning};
    use ndarray::array;

    fn small() -> Map {
        let binning =
            MultiDimBinning::new(vec![OneDimBinning::linear("x", 2, 0.0, 1.0).unwrap()]).unwrap();
        Map::from_nominal("numu", array![1.0, 4.0].into_dyn(), binning).build().unwrap()
    }

    #[test]
    fn test_op_names_roundtrip() {
        for op in MapOp::ALL {
            assert_eq!(op.as_str().parse::<MapOp>().unwrap(), op);
        }
        assert!(matches!("frobnicate".parse::<MapOp>(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_arity_is_checked() {
        let m = small();
        assert!(matches!(apply_one(&m, MapOp::Add, &[]), Err(Error::Validation(_))));
        let err = apply_one(&m, MapOp::Sqrt, &[Arg::Scalar(1.0)]);
        assert!(matches!(err, Err(Error::Validation(_))));
        assert!(apply_one(&m, MapOp::Fluctuate, &[Arg::Str("poisson"), Arg::Int(3)]).is_ok());
    }

    #[test]
    fn test_unsupported_argument_types() {
        let m = small();
        let err = apply_one(&m, MapOp::Mul, &[Arg::Str("two")]).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
        assert!(err.to_string().contains("\"str\""));
        assert!(matches!(apply_one(&m, MapOp::Add, &[Arg::Bool(true)]), Err(Error::Type(_))));
    }

    #[test]
    fn test_properties_and_methods() {
        let m = small();
        assert_eq!(apply_one(&m, MapOp::Name, &[]).unwrap(), Value::Str("numu".into()));
        assert_eq!(apply_one(&m, MapOp::Hash, &[]).unwrap(), Value::None);
        assert_eq!(apply_one(&m, MapOp::Shape, &[]).unwrap(), Value::Shape(vec![2]));
        match apply_one(&m, MapOp::RSub, &[Arg::Int(10)]).unwrap() {
            Value::Map(r) => assert_eq!(r.nominal_values(), array![9.0, 6.0].into_dyn()),
            other => panic!("unexpected {:?}", other),
        }
        match apply_one(&m, MapOp::Sqrt, &[]).unwrap() {
            Value::Map(r) => assert_eq!(r.nominal_values(), array![1.0, 2.0].into_dyn()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mutation_requires_mut_entry_point() {
        let mut m = small();
        let err = apply_one(&m, MapOp::SetLabel, &[Arg::Str("x")]);
        assert!(matches!(err, Err(Error::NotImplemented(_))));
        assert_eq!(apply_one_mut(&mut m, MapOp::SetLabel, &[Arg::Str("x")]).unwrap(), Value::None);
        assert_eq!(m.label(), "x");
        apply_one_mut(&mut m, MapOp::SetHash, &[Arg::Int(4)]).unwrap();
        assert_eq!(m.hash(), Some(&IdentityHash::Int(4)));
        apply_one_mut(&mut m, MapOp::SetHash, &[Arg::None]).unwrap();
        assert!(m.hash().is_none());
        assert!(apply_one_mut(&mut m, MapOp::SetName, &[Arg::Str("bad name")]).is_err());
    }
}
