//! A single binned axis.

use hm_core::numerical::normalize;
use hm_core::{Error, Result, validate_name};
use serde::{Deserialize, Serialize};

use crate::index::AxisIndex;

/// One axis of a binning: a name plus strictly increasing bin edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OneDimBinningRaw")]
pub struct OneDimBinning {
    name: String,
    tex: Option<String>,
    bin_edges: Vec<f64>,
    is_log: bool,
    units: Option<String>,
}

/// Accepted JSON forms: explicit `bin_edges`, or `num_bins` + `domain`.
#[derive(Deserialize)]
struct OneDimBinningRaw {
    name: String,
    #[serde(default)]
    tex: Option<String>,
    #[serde(default)]
    bin_edges: Option<Vec<f64>>,
    #[serde(default)]
    num_bins: Option<usize>,
    #[serde(default)]
    domain: Option<(f64, f64)>,
    #[serde(default)]
    is_log: bool,
    #[serde(default)]
    units: Option<String>,
}

impl TryFrom<OneDimBinningRaw> for OneDimBinning {
    type Error = Error;

    fn try_from(raw: OneDimBinningRaw) -> Result<Self> {
        let mut out = match (raw.bin_edges, raw.num_bins, raw.domain) {
            (Some(edges), _, _) => {
                let mut b = OneDimBinning::new(raw.name, edges)?;
                b.is_log = raw.is_log;
                b.validate()?;
                b
            }
            (None, Some(n), Some((lo, hi))) if raw.is_log => {
                OneDimBinning::logarithmic(raw.name, n, lo, hi)?
            }
            (None, Some(n), Some((lo, hi))) => OneDimBinning::linear(raw.name, n, lo, hi)?,
            _ => {
                return Err(Error::Validation(format!(
                    "axis {:?}: either `bin_edges` or `num_bins` + `domain` is required",
                    raw.name
                )));
            }
        };
        out.tex = raw.tex;
        out.units = raw.units;
        Ok(out)
    }
}

impl OneDimBinning {
    /// Axis with explicit bin edges (at least two, finite, strictly increasing).
    pub fn new(name: impl Into<String>, bin_edges: Vec<f64>) -> Result<Self> {
        let b = Self { name: name.into(), tex: None, bin_edges, is_log: false, units: None };
        b.validate()?;
        Ok(b)
    }

    /// `num_bins` equal-width bins spanning `[lo, hi]`.
    pub fn linear(name: impl Into<String>, num_bins: usize, lo: f64, hi: f64) -> Result<Self> {
        if num_bins == 0 {
            return Err(Error::Validation("num_bins must be > 0".to_string()));
        }
        let step = (hi - lo) / num_bins as f64;
        let mut edges: Vec<f64> = (0..num_bins).map(|i| lo + step * i as f64).collect();
        edges.push(hi);
        Self::new(name, edges)
    }

    /// `num_bins` bins spanning `[lo, hi]` that are equal-width in `ln(x)`.
    pub fn logarithmic(
        name: impl Into<String>,
        num_bins: usize,
        lo: f64,
        hi: f64,
    ) -> Result<Self> {
        if num_bins == 0 {
            return Err(Error::Validation("num_bins must be > 0".to_string()));
        }
        if lo.is_nan() || lo <= 0.0 {
            return Err(Error::Validation(format!(
                "logarithmic binning requires a positive lower edge, got {}",
                lo
            )));
        }
        let (llo, lhi) = (lo.ln(), hi.ln());
        let step = (lhi - llo) / num_bins as f64;
        let mut edges: Vec<f64> = std::iter::once(lo)
            .chain((1..num_bins).map(|i| (llo + step * i as f64).exp()))
            .collect();
        edges.push(hi);
        let mut b = Self::new(name, edges)?;
        b.is_log = true;
        Ok(b)
    }

    /// Set the TeX label.
    pub fn with_tex(mut self, tex: impl Into<String>) -> Self {
        self.tex = Some(tex.into());
        self
    }

    /// Set the physical units of the edges (e.g. `"GeV"`).
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    fn validate(&self) -> Result<()> {
        validate_name("axis", &self.name)?;
        if self.bin_edges.len() < 2 {
            return Err(Error::Validation(format!(
                "axis {:?}: at least two bin edges are required, got {}",
                self.name,
                self.bin_edges.len()
            )));
        }
        if self.bin_edges.iter().any(|e| !e.is_finite()) {
            return Err(Error::Validation(format!(
                "axis {:?}: bin edges must be finite",
                self.name
            )));
        }
        if self.bin_edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::Validation(format!(
                "axis {:?}: bin edges must be strictly increasing",
                self.name
            )));
        }
        if self.is_log && self.bin_edges[0] <= 0.0 {
            return Err(Error::Validation(format!(
                "axis {:?}: logarithmic axis requires positive edges",
                self.name
            )));
        }
        Ok(())
    }

    /// Axis name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// TeX label, if set.
    pub fn tex(&self) -> Option<&str> {
        self.tex.as_deref()
    }

    /// Units, if set.
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// `true` for logarithmically spaced axes.
    pub fn is_log(&self) -> bool {
        self.is_log
    }

    /// Bin edges (length = `num_bins() + 1`).
    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.bin_edges.len() - 1
    }

    /// `(first edge, last edge)`.
    pub fn domain(&self) -> (f64, f64) {
        (self.bin_edges[0], self.bin_edges[self.bin_edges.len() - 1])
    }

    /// Bin centers; geometric means for logarithmic axes.
    pub fn midpoints(&self) -> Vec<f64> {
        self.bin_edges
            .windows(2)
            .map(|w| if self.is_log { (w[0] * w[1]).sqrt() } else { 0.5 * (w[0] + w[1]) })
            .collect()
    }

    /// Sub-axis selected by `index`. A single position keeps a one-bin axis.
    pub fn index(&self, index: &AxisIndex) -> Result<Self> {
        let (start, stop) = index.resolve(self.num_bins())?;
        Ok(self.sub_range(start, stop))
    }

    /// One-bin axis for bin `i`.
    pub fn bin(&self, i: usize) -> Result<Self> {
        if i >= self.num_bins() {
            return Err(Error::Index(format!(
                "bin {} is out of bounds for axis {:?} with {} bins",
                i,
                self.name,
                self.num_bins()
            )));
        }
        Ok(self.sub_range(i, i + 1))
    }

    fn sub_range(&self, start: usize, stop: usize) -> Self {
        Self {
            name: self.name.clone(),
            tex: self.tex.clone(),
            bin_edges: self.bin_edges[start..=stop].to_vec(),
            is_log: self.is_log,
            units: self.units.clone(),
        }
    }

    /// Copy with edges rounded to [`hm_core::HASH_SIGFIGS`] significant figures.
    pub fn hashable_state(&self) -> Self {
        Self { bin_edges: normalize(self.bin_edges.iter().copied()), ..self.clone() }
    }

    /// Same name, spacing, units and (rounded) edges.
    pub fn is_compat(&self, other: &OneDimBinning) -> bool {
        self.name == other.name
            && self.is_log == other.is_log
            && self.units == other.units
            && self.hashable_state().bin_edges == other.hashable_state().bin_edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_edges() {
        let b = OneDimBinning::linear("coszen", 5, -1.0, 0.0).unwrap();
        assert_eq!(b.num_bins(), 5);
        assert_eq!(b.domain(), (-1.0, 0.0));
        assert_relative_eq!(b.bin_edges()[1], -0.8, epsilon = 1e-12);
        assert_relative_eq!(b.midpoints()[0], -0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_log_edges_and_midpoints() {
        let b = OneDimBinning::logarithmic("energy", 2, 1.0, 100.0).unwrap();
        assert!(b.is_log());
        assert_relative_eq!(b.bin_edges()[1], 10.0, epsilon = 1e-12);
        assert_relative_eq!(b.midpoints()[1], 1000f64.sqrt(), epsilon = 1e-9);
        assert!(OneDimBinning::logarithmic("energy", 2, 0.0, 100.0).is_err());
    }

    #[test]
    fn test_invalid_edges() {
        assert!(OneDimBinning::new("x", vec![1.0]).is_err());
        assert!(OneDimBinning::new("x", vec![1.0, 1.0]).is_err());
        assert!(OneDimBinning::new("x", vec![0.0, f64::NAN]).is_err());
        assert!(OneDimBinning::new("bad name", vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn test_index_keeps_single_bin_axis() {
        let b = OneDimBinning::linear("x", 4, 0.0, 4.0).unwrap();
        let one = b.index(&AxisIndex::At(2)).unwrap();
        assert_eq!(one.bin_edges(), &[2.0, 3.0]);
        let sub = b.index(&AxisIndex::range(1, 3)).unwrap();
        assert_eq!(sub.bin_edges(), &[1.0, 2.0, 3.0]);
        assert_eq!(b.bin(3).unwrap().bin_edges(), &[3.0, 4.0]);
        assert!(matches!(b.bin(4), Err(Error::Index(_))));
    }

    #[test]
    fn test_compat_absorbs_rounding() {
        let a = OneDimBinning::new("x", vec![0.0, 0.1 + 0.2]).unwrap();
        let b = OneDimBinning::new("x", vec![0.0, 0.3]).unwrap();
        assert!(a.is_compat(&b));
        let c = OneDimBinning::new("y", vec![0.0, 0.3]).unwrap();
        assert!(!a.is_compat(&c));
    }

    #[test]
    fn test_deserialize_constructor_arguments() {
        let b: OneDimBinning = serde_json::from_str(
            r#"{"name": "energy", "num_bins": 4, "domain": [1.0, 80.0], "is_log": true,
                "units": "GeV"}"#,
        )
        .unwrap();
        assert_eq!(b.num_bins(), 4);
        assert!(b.is_log());
        assert_eq!(b.units(), Some("GeV"));

        let err = serde_json::from_str::<OneDimBinning>(r#"{"name": "x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let b = OneDimBinning::linear("x", 3, 0.0, 1.5).unwrap().with_tex(r"\cos\theta");
        let json = serde_json::to_string(&b).unwrap();
        let back: OneDimBinning = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
