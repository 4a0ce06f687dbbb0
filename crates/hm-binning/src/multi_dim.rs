//! Ordered set of axes describing the shape of a histogram.

use std::collections::HashSet;
use std::fmt;

use hm_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::index::BinIndex;
use crate::one_dim::OneDimBinning;

/// Binning over one or more named axes; axis `i` spans dimension `i` of a histogram array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MultiDimBinningRaw")]
pub struct MultiDimBinning {
    dimensions: Vec<OneDimBinning>,
}

#[derive(Deserialize)]
struct MultiDimBinningRaw {
    dimensions: Vec<OneDimBinning>,
}

impl TryFrom<MultiDimBinningRaw> for MultiDimBinning {
    type Error = Error;

    fn try_from(raw: MultiDimBinningRaw) -> Result<Self> {
        MultiDimBinning::new(raw.dimensions)
    }
}

impl MultiDimBinning {
    /// Build from axes; there must be at least one and axis names must be unique.
    pub fn new(dimensions: Vec<OneDimBinning>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(Error::Validation("a binning needs at least one dimension".to_string()));
        }
        let mut seen = HashSet::new();
        for d in &dimensions {
            if !seen.insert(d.name()) {
                return Err(Error::Validation(format!("duplicate dimension name {:?}", d.name())));
            }
        }
        Ok(Self { dimensions })
    }

    /// Axes in order.
    pub fn dimensions(&self) -> &[OneDimBinning] {
        &self.dimensions
    }

    /// Axis called `name`.
    pub fn dimension(&self, name: &str) -> Option<&OneDimBinning> {
        self.dimensions.iter().find(|d| d.name() == name)
    }

    /// Axis names in order.
    pub fn names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name()).collect()
    }

    /// Number of bins along each axis.
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.num_bins()).collect()
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.dimensions.len()
    }

    /// Total number of bins.
    pub fn size(&self) -> usize {
        self.dimensions.iter().map(|d| d.num_bins()).product()
    }

    /// Fail unless an array of `shape` lines up with this binning.
    pub fn assert_array_fits(&self, shape: &[usize]) -> Result<()> {
        let expected = self.shape();
        if shape != expected.as_slice() {
            return Err(Error::Shape(format!(
                "array shape {:?} does not match binning shape {:?}",
                shape, expected
            )));
        }
        Ok(())
    }

    /// Fail unless `other` has identical axis definitions.
    pub fn assert_compat(&self, other: &MultiDimBinning) -> Result<()> {
        if self.ndim() != other.ndim() {
            return Err(Error::Shape(format!(
                "binnings have different dimensionality: {} vs {}",
                self.ndim(),
                other.ndim()
            )));
        }
        for (i, (a, b)) in self.dimensions.iter().zip(&other.dimensions).enumerate() {
            if !a.is_compat(b) {
                return Err(Error::Shape(format!(
                    "dimension {} is incompatible: {:?} ({} bins) vs {:?} ({} bins)",
                    i,
                    a.name(),
                    a.num_bins(),
                    b.name(),
                    b.num_bins()
                )));
            }
        }
        Ok(())
    }

    /// Sub-binning selected by `index`; always has the same number of axes.
    pub fn index(&self, index: &BinIndex) -> Result<Self> {
        if index.len() != self.ndim() {
            return Err(Error::Shape(format!(
                "binning is {}-D; {}-D indexing is required, got {}",
                self.ndim(),
                self.ndim(),
                index
            )));
        }
        let dimensions = self
            .dimensions
            .iter()
            .zip(index.axes())
            .map(|(d, ax)| d.index(ax))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { dimensions })
    }

    /// Binning covering only the bin at `coords`.
    pub fn single_bin(&self, coords: &[usize]) -> Result<Self> {
        if coords.len() != self.ndim() {
            return Err(Error::Shape(format!(
                "binning is {}-D; got {} bin coordinates",
                self.ndim(),
                coords.len()
            )));
        }
        let dimensions = self
            .dimensions
            .iter()
            .zip(coords)
            .map(|(d, &i)| d.bin(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { dimensions })
    }

    /// The persisted state as a JSON value.
    pub fn serializable_state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Canonical copy used for structural comparison (edges rounded to
    /// [`hm_core::HASH_SIGFIGS`] significant figures).
    pub fn hashable_state(&self) -> Self {
        Self { dimensions: self.dimensions.iter().map(|d| d.hashable_state()).collect() }
    }
}

impl fmt::Display for MultiDimBinning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.dimensions.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            let (lo, hi) = d.domain();
            write!(f, "{}: {} bins spanning [{}, {}]", d.name(), d.num_bins(), lo, hi)?;
            if let Some(u) = d.units() {
                write!(f, " {}", u)?;
            }
            if d.is_log() {
                f.write_str(" (log)")?;
            }
        }
        Ok(())
    }
}
