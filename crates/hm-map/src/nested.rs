//! N-dimensional `f64` arrays as nested JSON sequences.
//!
//! Use with `#[serde(with = "crate::nested")]` (or `crate::nested::option` for an optional
//! array). Non-finite numbers have no JSON number form; they are written as the strings
//! `"inf"`, `"-inf"` and `"nan"`. A `null` element is read back as NaN.

use ndarray::{ArrayD, ArrayViewD, IxDyn};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// Nested-sequence JSON value for `arr`.
pub fn to_value(arr: &ArrayD<f64>) -> Value {
    fn walk(view: ArrayViewD<'_, f64>) -> Value {
        if view.ndim() == 0 {
            let x = view.iter().next().copied().unwrap_or(f64::NAN);
            return Number::from_f64(x).map(Value::Number).unwrap_or_else(|| non_finite_tag(x));
        }
        Value::Array(view.outer_iter().map(walk).collect())
    }
    walk(arr.view())
}

fn non_finite_tag(x: f64) -> Value {
    let tag = if x.is_nan() {
        "nan"
    } else if x.is_sign_positive() {
        "inf"
    } else {
        "-inf"
    };
    Value::String(tag.to_string())
}

fn parse_non_finite_tag(tag: &str) -> Option<f64> {
    match tag {
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    }
}

/// Rebuild an array from nested sequences. Every level must be rectangular.
pub fn from_value(value: &Value) -> std::result::Result<ArrayD<f64>, String> {
    let mut shape = Vec::new();
    let mut cur = value;
    while let Value::Array(items) = cur {
        shape.push(items.len());
        match items.first() {
            Some(first) => cur = first,
            None => break,
        }
    }
    let mut flat = Vec::with_capacity(shape.iter().product());
    flatten(value, 0, &shape, &mut flat)?;
    ArrayD::from_shape_vec(IxDyn(&shape), flat).map_err(|e| e.to_string())
}

fn flatten(
    value: &Value,
    depth: usize,
    shape: &[usize],
    out: &mut Vec<f64>,
) -> std::result::Result<(), String> {
    match value {
        Value::Array(items) if depth < shape.len() && items.len() == shape[depth] => {
            items.iter().try_for_each(|item| flatten(item, depth + 1, shape, out))
        }
        Value::Number(n) if depth == shape.len() => {
            out.push(n.as_f64().unwrap_or(f64::NAN));
            Ok(())
        }
        Value::Null if depth == shape.len() => {
            out.push(f64::NAN);
            Ok(())
        }
        Value::String(tag) if depth == shape.len() => match parse_non_finite_tag(tag) {
            Some(x) => {
                out.push(x);
                Ok(())
            }
            None => Err(format!("unrecognised element {:?} at depth {}", tag, depth)),
        },
        _ => Err(format!("ragged or non-numeric nested array at depth {}", depth)),
    }
}

/// Serde `serialize_with` entry point.
pub fn serialize<S: Serializer>(arr: &ArrayD<f64>, s: S) -> Result<S::Ok, S::Error> {
    to_value(arr).serialize(s)
}

/// Serde `deserialize_with` entry point.
pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ArrayD<f64>, D::Error> {
    let value = Value::deserialize(d)?;
    from_value(&value).map_err(D::Error::custom)
}

/// The same encoding for `Option<ArrayD<f64>>`, with `None` as `null`.
pub mod option {
    use super::*;

    /// Serde `serialize_with` entry point.
    pub fn serialize<S: Serializer>(arr: &Option<ArrayD<f64>>, s: S) -> Result<S::Ok, S::Error> {
        match arr {
            Some(a) => to_value(a).serialize(s),
            None => s.serialize_none(),
        }
    }

    /// Serde `deserialize_with` entry point.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ArrayD<f64>>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => from_value(&v).map(Some).map_err(D::Error::custom),
        }
    }
}
