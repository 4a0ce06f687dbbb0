//! Persisted (JSON) states of maps and map sets.

use hm_binning::MultiDimBinning;
use hm_core::IdentityHash;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::mapset::Collation;

fn default_true() -> bool {
    true
}

/// Everything needed to rebuild a [`crate::Map`].
///
/// Field order is the on-disk key order. `errors` is `null` when every standard deviation is
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapState {
    /// Map name.
    pub name: String,
    /// Nominal values as nested sequences.
    #[serde(with = "crate::nested")]
    pub values: ArrayD<f64>,
    /// Binning the values are laid out on.
    pub binning: MultiDimBinning,
    /// Per-bin standard deviations, if any are non-zero.
    #[serde(default, with = "crate::nested::option")]
    pub errors: Option<ArrayD<f64>>,
    /// Identity hash.
    #[serde(default)]
    pub hash: Option<IdentityHash>,
    /// TeX label; the default label is used when absent.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether comparisons always look at the full content.
    #[serde(default = "default_true")]
    pub exact_comparison: bool,
}

/// Everything needed to rebuild a [`crate::MapSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSetState {
    /// Member states, in order.
    pub maps: Vec<MapState>,
    /// Collection name.
    #[serde(default)]
    pub name: Option<String>,
    /// TeX label; the default label is used when absent.
    #[serde(default)]
    pub label: Option<String>,
    /// How members are paired with another collection's members.
    #[serde(default)]
    pub collation: Collation,
}
