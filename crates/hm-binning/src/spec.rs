//! Anything a histogram accepts as its binning, normalized to a shared [`MultiDimBinning`].

use std::sync::Arc;

use hm_core::{Error, Result};
use serde_json::Value;

use crate::multi_dim::MultiDimBinning;
use crate::one_dim::OneDimBinning;

/// A built binning or a description that can be turned into one.
#[derive(Debug, Clone)]
pub enum BinningSpec {
    /// Already shared binning; reused without copying.
    Shared(Arc<MultiDimBinning>),
    /// Owned binning.
    Binning(MultiDimBinning),
    /// Ordered per-axis specifications.
    Dimensions(Vec<OneDimBinning>),
    /// JSON description: an object of constructor arguments (`{"dimensions": [...]}`) or an
    /// array of per-axis objects.
    Json(Value),
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl BinningSpec {
    /// Normalize to a concrete, shared binning.
    pub fn resolve(self) -> Result<Arc<MultiDimBinning>> {
        match self {
            BinningSpec::Shared(b) => Ok(b),
            BinningSpec::Binning(b) => Ok(Arc::new(b)),
            BinningSpec::Dimensions(dims) => Ok(Arc::new(MultiDimBinning::new(dims)?)),
            BinningSpec::Json(v @ Value::Object(_)) => Ok(Arc::new(serde_json::from_value(v)?)),
            BinningSpec::Json(v @ Value::Array(_)) => {
                let dims: Vec<OneDimBinning> = serde_json::from_value(v)?;
                Ok(Arc::new(MultiDimBinning::new(dims)?))
            }
            BinningSpec::Json(other) => {
                Err(Error::unsupported_type("binning", json_type_name(&other)))
            }
        }
    }
}

impl From<Arc<MultiDimBinning>> for BinningSpec {
    fn from(b: Arc<MultiDimBinning>) -> Self {
        BinningSpec::Shared(b)
    }
}

impl From<&Arc<MultiDimBinning>> for BinningSpec {
    fn from(b: &Arc<MultiDimBinning>) -> Self {
        BinningSpec::Shared(Arc::clone(b))
    }
}

impl From<MultiDimBinning> for BinningSpec {
    fn from(b: MultiDimBinning) -> Self {
        BinningSpec::Binning(b)
    }
}

impl From<&MultiDimBinning> for BinningSpec {
    fn from(b: &MultiDimBinning) -> Self {
        BinningSpec::Binning(b.clone())
    }
}

impl From<Vec<OneDimBinning>> for BinningSpec {
    fn from(dims: Vec<OneDimBinning>) -> Self {
        BinningSpec::Dimensions(dims)
    }
}

impl From<OneDimBinning> for BinningSpec {
    fn from(dim: OneDimBinning) -> Self {
        BinningSpec::Dimensions(vec![dim])
    }
}

impl From<Value> for BinningSpec {
    fn from(v: Value) -> Self {
        BinningSpec::Json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shared_binning_is_not_copied() {
        let b = Arc::new(
            MultiDimBinning::new(vec![OneDimBinning::linear("x", 2, 0.0, 1.0).unwrap()]).unwrap(),
        );
        let resolved = BinningSpec::from(&b).resolve().unwrap();
        assert!(Arc::ptr_eq(&b, &resolved));
    }

    #[test]
    fn test_json_mapping_and_sequence() {
        let dims = json!([
            {"name": "energy", "num_bins": 3, "domain": [1.0, 10.0], "is_log": true},
            {"name": "coszen", "bin_edges": [-1.0, 0.0, 1.0]}
        ]);
        let from_seq = BinningSpec::from(dims.clone()).resolve().unwrap();
        assert_eq!(from_seq.shape(), vec![3, 2]);

        let from_map = BinningSpec::from(json!({"dimensions": dims})).resolve().unwrap();
        assert_eq!(*from_seq, *from_map);
    }

    #[test]
    fn test_unrecognized_spec_is_type_error() {
        let err = BinningSpec::from(json!(42)).resolve().unwrap_err();
        assert!(matches!(err, Error::Type(_)));
        assert!(err.to_string().contains("number"));
    }
}
