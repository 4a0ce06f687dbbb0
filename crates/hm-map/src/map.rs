//! The histogram entity: values with uncertainty laid out on a binning.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use hm_binning::{BinIndex, BinningSpec, MultiDimBinning};
use hm_core::numerical::normalize;
use hm_core::{Error, IdentityHash, Result, UFloat, validate_name};
use hm_prob::{Metric, poisson_fluctuate};
use ndarray::{ArrayD, IxDyn, Slice};

use crate::ops::Operand;
use crate::state::MapState;
use crate::tex::default_map_label;

/// A named N-dimensional histogram whose bins carry a nominal value and a standard deviation.
///
/// The shape of `values` always equals the binning shape. Operations return new maps; the
/// only in-place mutators are the `set_*` methods, [`Map::apply_poisson_errors`] and
/// [`Map::assign`].
#[derive(Debug, Clone)]
pub struct Map {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) values: ArrayD<UFloat>,
    pub(crate) binning: Arc<MultiDimBinning>,
    pub(crate) hash: Option<IdentityHash>,
    pub(crate) exact_comparison: bool,
    pub(crate) parent_index: Option<Vec<usize>>,
}

/// Builder for [`Map`]; also used to copy a map while overriding some of its fields.
#[derive(Debug, Clone)]
pub struct MapBuilder {
    name: String,
    values: ArrayD<UFloat>,
    binning: BinningSpec,
    errors: Option<ArrayD<f64>>,
    hash: Option<IdentityHash>,
    label: Option<String>,
    exact_comparison: bool,
}

impl MapBuilder {
    /// Replace the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the values.
    pub fn values(mut self, values: ArrayD<UFloat>) -> Self {
        self.values = values;
        self
    }

    /// Replace the binning.
    pub fn binning(mut self, binning: impl Into<BinningSpec>) -> Self {
        self.binning = binning.into();
        self
    }

    /// Per-bin standard deviations; broadcast to the values shape and replace any
    /// uncertainty already carried by the values.
    pub fn errors(mut self, errors: ArrayD<f64>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Set the identity hash.
    pub fn hash(mut self, hash: impl Into<IdentityHash>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Drop the identity hash.
    pub fn clear_hash(mut self) -> Self {
        self.hash = None;
        self
    }

    /// Set the TeX label (defaults from the name).
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set whether comparisons must look at the full content (default `true`).
    pub fn exact_comparison(mut self, exact: bool) -> Self {
        self.exact_comparison = exact;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Map> {
        validate_name("map", &self.name)?;
        let binning = self.binning.resolve()?;
        binning.assert_array_fits(self.values.shape())?;
        let label = self.label.unwrap_or_else(|| default_map_label(&self.name));
        let mut map = Map {
            name: self.name,
            label,
            values: self.values,
            binning,
            hash: self.hash,
            exact_comparison: self.exact_comparison,
            parent_index: None,
        };
        if let Some(errors) = &self.errors {
            map.set_errors(Some(errors))?;
        }
        Ok(map)
    }
}

/// How [`Map::fluctuate`] perturbs the bin contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fluctuation {
    /// Return an unchanged copy.
    None,
    /// Draw each bin from a Poisson distribution with the nominal value as mean.
    Poisson,
}

impl FromStr for Fluctuation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "poisson" => Ok(Fluctuation::Poisson),
            "" | "none" | "false" => Ok(Fluctuation::None),
            _ => Err(Error::NotImplemented(format!("fluctuation method {:?} not implemented", s))),
        }
    }
}

/// Comparable projection of a map: rounded values, canonical binning, and metadata.
#[derive(Debug, PartialEq)]
pub(crate) struct CanonicalState<'a> {
    name: &'a str,
    shape: &'a [usize],
    values: Vec<f64>,
    errors: Option<Vec<f64>>,
    binning: MultiDimBinning,
    label: &'a str,
    exact_comparison: bool,
}

fn all_zero(values: &[f64]) -> bool {
    values.iter().all(|&v| v == 0.0)
}

impl Map {
    /// Start building a map from uncertain values.
    pub fn builder(
        name: impl Into<String>,
        values: ArrayD<UFloat>,
        binning: impl Into<BinningSpec>,
    ) -> MapBuilder {
        MapBuilder {
            name: name.into(),
            values,
            binning: binning.into(),
            errors: None,
            hash: None,
            label: None,
            exact_comparison: true,
        }
    }

    /// Start building a map from nominal values without uncertainty.
    pub fn from_nominal(
        name: impl Into<String>,
        values: ArrayD<f64>,
        binning: impl Into<BinningSpec>,
    ) -> MapBuilder {
        Self::builder(name, values.mapv(UFloat::exact), binning)
    }

    /// Builder pre-filled with every field of this map.
    pub fn to_builder(&self) -> MapBuilder {
        MapBuilder {
            name: self.name.clone(),
            values: self.values.clone(),
            binning: BinningSpec::from(&self.binning),
            errors: None,
            hash: self.hash.clone(),
            label: Some(self.label.clone()),
            exact_comparison: self.exact_comparison,
        }
    }

    /// New map sharing this map's metadata, with fresh values and no hash.
    pub(crate) fn derived(&self, values: ArrayD<UFloat>, exact_comparison: bool) -> Map {
        Map {
            name: self.name.clone(),
            label: self.label.clone(),
            values,
            binning: Arc::clone(&self.binning),
            hash: None,
            exact_comparison,
            parent_index: None,
        }
    }

    // --- accessors ---

    /// Map name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// TeX label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Per-bin values.
    pub fn values(&self) -> &ArrayD<UFloat> {
        &self.values
    }

    /// Shared binning.
    pub fn binning(&self) -> &Arc<MultiDimBinning> {
        &self.binning
    }

    /// Identity hash, if any.
    pub fn hash(&self) -> Option<&IdentityHash> {
        self.hash.as_ref()
    }

    /// Identity hash, or a missing-hash error.
    pub fn identity_hash(&self) -> Result<&IdentityHash> {
        self.hash
            .as_ref()
            .ok_or_else(|| Error::MissingHash(format!("map {:?} has no hash", self.name)))
    }

    /// Whether comparisons always look at the full content.
    pub fn exact_comparison(&self) -> bool {
        self.exact_comparison
    }

    /// Coordinates of this bin in its parent, for maps produced by bin iteration.
    pub fn parent_index(&self) -> Option<&[usize]> {
        self.parent_index.as_deref()
    }

    /// Shape of the values (equal to the binning shape).
    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.values.ndim()
    }

    /// Total number of bins.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Value of the bin at `coords`.
    pub fn get(&self, coords: &[usize]) -> Option<UFloat> {
        self.values.get(coords).copied()
    }

    /// Nominal values.
    pub fn nominal_values(&self) -> ArrayD<f64> {
        self.values.mapv(|v| v.nominal())
    }

    /// Standard deviations.
    pub fn std_devs(&self) -> ArrayD<f64> {
        self.values.mapv(|v| v.std_dev())
    }

    // --- mutators ---

    /// Rename; the name must be an identifier.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        validate_name("map", &name)?;
        self.name = name;
        Ok(())
    }

    /// Replace the TeX label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Replace or remove the identity hash.
    pub fn set_hash(&mut self, hash: Option<IdentityHash>) {
        self.hash = hash;
    }

    /// Turn full-content comparison on or off.
    pub fn set_exact_comparison(&mut self, exact: bool) {
        self.exact_comparison = exact;
    }

    /// Attach standard deviations (broadcast to the values shape), or strip them with `None`.
    pub fn set_errors(&mut self, errors: Option<&ArrayD<f64>>) -> Result<()> {
        let Some(errors) = errors else {
            self.values.mapv_inplace(|v| UFloat::exact(v.nominal()));
            return Ok(());
        };
        self.attach_errors(errors, |e| e.is_nan() || e < 0.0)
    }

    /// Broadcast `errors` onto the values, refusing the whole array if any entry is `invalid`.
    fn attach_errors(&mut self, errors: &ArrayD<f64>, invalid: fn(f64) -> bool) -> Result<()> {
        let errors = errors.broadcast(self.values.raw_dim()).ok_or_else(|| {
            Error::Shape(format!(
                "errors of shape {:?} cannot be broadcast to map shape {:?}",
                errors.shape(),
                self.values.shape()
            ))
        })?;
        self.binning.assert_array_fits(errors.shape())?;
        if errors.iter().any(|&e| invalid(e)) {
            return Err(Error::Validation(format!(
                "map {:?}: standard deviations must be non-negative",
                self.name
            )));
        }
        self.values.zip_mut_with(&errors, |v, &e| *v = v.with_std_dev(e));
        Ok(())
    }

    /// Set every standard deviation to `sqrt(max(nominal, 0))`.
    pub fn apply_poisson_errors(&mut self) {
        self.values.mapv_inplace(|v| v.with_std_dev(v.nominal().max(0.0).sqrt()));
    }

    /// Overwrite the bins selected by `index`.
    ///
    /// A scalar fills the region; an array or map is broadcast to the region's shape.
    pub fn assign<'a>(&mut self, index: &BinIndex, value: impl Into<Operand<'a>>) -> Result<()> {
        let ranges = index.resolve(self.values.shape())?;
        let mut region = self.values.slice_each_axis_mut(|ax| {
            let (start, stop) = ranges[ax.axis.index()];
            Slice::from(start..stop)
        });
        let source = match value.into() {
            Operand::Scalar(v) => {
                region.fill(v);
                return Ok(());
            }
            Operand::Array(arr) => arr,
            Operand::Map(m) => m.values.view().into(),
        };
        let source = source.broadcast(region.raw_dim()).ok_or_else(|| {
            Error::Shape(format!(
                "value of shape {:?} cannot be assigned to region {} of shape {:?}",
                source.shape(),
                index,
                region.shape()
            ))
        })?;
        region.assign(&source);
        Ok(())
    }

    // --- derived maps ---

    /// Sub-map selected by `index`, one component per axis.
    ///
    /// Single-position components keep their axis with size 1, so the result always has the
    /// same number of dimensions. The hash is dropped.
    pub fn index(&self, index: &BinIndex) -> Result<Map> {
        let ranges = index.resolve(self.values.shape())?;
        let binning = self.binning.index(index)?;
        let values = self
            .values
            .slice_each_axis(|ax| {
                let (start, stop) = ranges[ax.axis.index()];
                Slice::from(start..stop)
            })
            .to_owned()
            .into_shape_with_order(IxDyn(&binning.shape()))
            .map_err(|e| Error::Shape(format!("indexing {} failed: {}", index, e)))?;
        Ok(Map {
            name: self.name.clone(),
            label: self.label.clone(),
            values,
            binning: Arc::new(binning),
            hash: None,
            exact_comparison: self.exact_comparison,
            parent_index: None,
        })
    }

    /// Randomly perturbed copy.
    ///
    /// `method` is `"poisson"` or one of `""`, `"none"`, `"false"` (case-insensitive). A
    /// Poisson draw gets `σ = sqrt(max(nominal, 0))` of the original bin and no hash; the
    /// unchanged copy keeps everything except a single-bin view's parent index.
    pub fn fluctuate(&self, method: &str, seed: Option<u64>) -> Result<Map> {
        match method.parse::<Fluctuation>()? {
            Fluctuation::None => {
                let mut copy = self.clone();
                copy.parent_index = None;
                Ok(copy)
            }
            Fluctuation::Poisson => {
                let means: Vec<f64> = self.values.iter().map(UFloat::nominal).collect();
                let draws = poisson_fluctuate(&means, seed);
                let values: Vec<UFloat> = draws
                    .into_iter()
                    .zip(&means)
                    .map(|(k, &mean)| UFloat::new(k, mean.max(0.0).sqrt()))
                    .collect();
                let values = ArrayD::from_shape_vec(self.values.raw_dim(), values)
                    .map_err(|e| Error::Shape(e.to_string()))?;
                Ok(self.derived(values, self.exact_comparison))
            }
        }
    }

    // --- metrics ---

    /// Summed per-bin `metric` with this map as the observation and `expected` (a map with a
    /// compatible binning, or an array of the binning shape) as the expectation.
    pub fn metric_total<'a>(
        &self,
        expected: impl Into<Operand<'a>>,
        metric: Metric,
    ) -> Result<f64> {
        let expected: Vec<f64> = match expected.into() {
            Operand::Map(m) => {
                self.binning.assert_compat(&m.binning)?;
                m.values.iter().map(UFloat::nominal).collect()
            }
            Operand::Array(arr) => {
                self.binning.assert_array_fits(arr.shape())?;
                arr.iter().map(UFloat::nominal).collect()
            }
            Operand::Scalar(_) => {
                return Err(Error::unsupported_type(metric.as_str(), "scalar"));
            }
        };
        let actual: Vec<f64> = self.values.iter().map(UFloat::nominal).collect();
        Ok(metric.per_bin(&actual, &expected)?.iter().sum())
    }

    /// Total Poisson log-likelihood of this map given `expected`.
    pub fn llh<'a>(&self, expected: impl Into<Operand<'a>>) -> Result<f64> {
        self.metric_total(expected, Metric::Llh)
    }

    /// Total chi-square of this map against `expected`.
    pub fn chi2<'a>(&self, expected: impl Into<Operand<'a>>) -> Result<f64> {
        self.metric_total(expected, Metric::Chi2)
    }

    // --- comparison and persistence ---

    pub(crate) fn canonical_state(&self) -> CanonicalState<'_> {
        let errors = normalize(self.values.iter().map(UFloat::std_dev));
        CanonicalState {
            name: &self.name,
            shape: self.values.shape(),
            values: normalize(self.values.iter().map(UFloat::nominal)),
            errors: if all_zero(&errors) { None } else { Some(errors) },
            binning: self.binning.hashable_state(),
            label: &self.label,
            exact_comparison: self.exact_comparison,
        }
    }

    /// Serializable state.
    pub fn to_state(&self) -> MapState {
        let errors = self.std_devs();
        let has_errors = errors.iter().any(|&e| e != 0.0);
        MapState {
            name: self.name.clone(),
            values: self.nominal_values(),
            binning: (*self.binning).clone(),
            errors: has_errors.then_some(errors),
            hash: self.hash.clone(),
            label: Some(self.label.clone()),
            exact_comparison: self.exact_comparison,
        }
    }

    /// Rebuild from a state produced by [`Map::to_state`].
    ///
    /// Persisted standard deviations may be infinite or NaN (e.g. after `log()` of an empty
    /// bin); only negative ones are rejected.
    pub fn from_state(state: MapState) -> Result<Map> {
        let mut builder = Map::from_nominal(state.name, state.values, state.binning)
            .exact_comparison(state.exact_comparison);
        if let Some(hash) = state.hash {
            builder = builder.hash(hash);
        }
        if let Some(label) = state.label {
            builder = builder.label(label);
        }
        let mut map = builder.build()?;
        if let Some(errors) = &state.errors {
            map.attach_errors(errors, |e| e < 0.0)?;
        }
        Ok(map)
    }

    /// Write the state as pretty-printed JSON.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::debug!("writing map {:?} to {}", self.name, path.display());
        std::fs::write(path, serde_json::to_string_pretty(&self.to_state())?)?;
        Ok(())
    }

    /// Read a map written by [`Map::to_json`].
    pub fn from_json(path: impl AsRef<Path>) -> Result<Map> {
        let path = path.as_ref();
        log::debug!("reading map from {}", path.display());
        let state: MapState = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        Map::from_state(state)
    }
}

impl PartialEq for Map {
    /// Hash shortcut when both maps have a hash and neither asks for exact comparison;
    /// otherwise the canonical states are compared.
    fn eq(&self, other: &Map) -> bool {
        match (&self.hash, &other.hash) {
            (Some(a), Some(b)) if !self.exact_comparison && !other.exact_comparison => a == b,
            _ => self.canonical_state() == other.canonical_state(),
        }
    }
}

/// Nominal values only.
impl PartialEq<f64> for Map {
    fn eq(&self, other: &f64) -> bool {
        self.values.iter().all(|v| v.nominal() == *other)
    }
}

impl PartialEq<UFloat> for Map {
    fn eq(&self, other: &UFloat) -> bool {
        self.values.iter().all(|v| v == other)
    }
}

impl PartialEq<ArrayD<UFloat>> for Map {
    fn eq(&self, other: &ArrayD<UFloat>) -> bool {
        self.values == *other
    }
}

/// An `f64` array has zero standard deviations.
impl PartialEq<ArrayD<f64>> for Map {
    fn eq(&self, other: &ArrayD<f64>) -> bool {
        self.values.shape() == other.shape()
            && self.values.iter().zip(other.iter()).all(|(v, &x)| *v == UFloat::exact(x))
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Map {:?} {:?}", self.name, self.values.shape())?;
        if let Some(h) = &self.hash {
            write!(f, " hash={}", h)?;
        }
        write!(f, "\n{}", self.binning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hm_binning::{AxisIndex, OneDimBinning};
    use ndarray::{ArrayD, array};

    fn binning_4x5() -> MultiDimBinning {
        MultiDimBinning::new(vec![
            OneDimBinning::logarithmic("energy", 4, 1.0, 80.0).unwrap(),
            OneDimBinning::linear("coszen", 5, -1.0, 0.0).unwrap(),
        ])
        .unwrap()
    }

    fn ramp() -> Map {
        let values = ArrayD::from_shape_fn(IxDyn(&[4, 5]), |ix| (ix[0] * 5 + ix[1]) as f64);
        Map::from_nominal("numu", values, binning_4x5()).build().unwrap()
    }

    #[test]
    fn test_construction_checks_shape_and_name() {
        let bad = Map::from_nominal("m", ArrayD::zeros(IxDyn(&[5, 4])), binning_4x5()).build();
        assert!(matches!(bad, Err(Error::Shape(_))));
        let bad = Map::from_nominal("2m", ArrayD::zeros(IxDyn(&[4, 5])), binning_4x5()).build();
        assert!(matches!(bad, Err(Error::Validation(_))));
    }

    #[test]
    fn test_default_label() {
        let m = ramp();
        assert_eq!(m.label(), r"\nu_{\mu}");
        let other = m.to_builder().name("bkg").label(r"\rm{bkg}").build().unwrap();
        assert_eq!(other.label(), r"\rm{bkg}");
    }

    #[test]
    fn test_set_errors_broadcasts_and_validates() {
        let mut m = ramp();
        m.set_errors(Some(&array![0.5].into_dyn())).unwrap();
        assert!(m.std_devs().iter().all(|&e| e == 0.5));
        assert!(matches!(m.set_errors(Some(&array![1.0, 2.0].into_dyn())), Err(Error::Shape(_))));
        assert!(matches!(
            m.set_errors(Some(&array![-1.0].into_dyn())),
            Err(Error::Validation(_))
        ));
        m.set_errors(None).unwrap();
        assert!(m.std_devs().iter().all(|&e| e == 0.0));
    }

    #[test]
    fn test_poisson_errors() {
        let mut m = ramp();
        m.apply_poisson_errors();
        assert_eq!(m.get(&[1, 4]), Some(UFloat::new(9.0, 3.0)));
        assert_eq!(m.get(&[0, 0]), Some(UFloat::exact(0.0)));
    }

    #[test]
    fn test_index_keeps_dimensions() {
        let m = ramp().to_builder().hash(3_i64).build().unwrap();
        let sub = m.index(&BinIndex::new(vec![AxisIndex::At(0), AxisIndex::range(0, 2)])).unwrap();
        assert_eq!(sub.shape(), &[1, 2]);
        assert_eq!(sub.binning().shape(), vec![1, 2]);
        assert_eq!(sub.nominal_values(), array![[0.0, 1.0]].into_dyn());
        assert!(sub.hash().is_none());
        assert_eq!(sub.name(), "numu");

        let one = m.index(&BinIndex::at(&[3, 4])).unwrap();
        assert_eq!(one.shape(), &[1, 1]);
        assert_eq!(one.get(&[0, 0]), Some(UFloat::exact(19.0)));

        assert!(matches!(m.index(&BinIndex::from(0usize)), Err(Error::Shape(_))));
        assert!(matches!(m.index(&BinIndex::from((9usize, 0usize))), Err(Error::Index(_))));
    }

    #[test]
    fn test_assign_region() {
        let mut m = ramp();
        m.assign(&BinIndex::from((0usize, ..)), UFloat::new(1.0, 0.1)).unwrap();
        assert!(m.index(&BinIndex::from((0usize, ..))).unwrap() == UFloat::new(1.0, 0.1));
        m.assign(&BinIndex::from((1..3usize, 0usize)), &array![[7.0], [8.0]].into_dyn()).unwrap();
        assert_eq!(m.get(&[2, 0]), Some(UFloat::exact(8.0)));
        let err = m.assign(&BinIndex::from((.., 0usize)), &array![1.0, 2.0].into_dyn());
        assert!(matches!(err, Err(Error::Shape(_))));
    }

    #[test]
    fn test_fluctuate() {
        let m = ramp().to_builder().hash("abc").build().unwrap();
        let same = m.fluctuate("None", Some(1)).unwrap();
        assert_eq!(same.hash(), m.hash());
        assert!(same == m);

        let a = m.fluctuate("poisson", Some(42)).unwrap();
        let b = m.fluctuate("POISSON", Some(42)).unwrap();
        assert!(a == b);
        assert!(a.hash().is_none());
        assert_eq!(a.get(&[0, 4]).unwrap().std_dev(), 2.0);
        assert!(a.nominal_values().iter().all(|&x| x >= 0.0 && x.fract() == 0.0));

        assert!(matches!(m.fluctuate("gauss", None), Err(Error::NotImplemented(_))));
    }

    #[test]
    fn test_identity_hash() {
        let m = ramp();
        assert!(matches!(m.identity_hash(), Err(Error::MissingHash(_))));
        let m = m.to_builder().hash(17_i64).build().unwrap();
        assert_eq!(m.identity_hash().unwrap(), &IdentityHash::Int(17));
    }

    #[test]
    fn test_hash_shortcut() {
        let a = ramp().to_builder().hash(1_i64).exact_comparison(false).build().unwrap();
        let b = (&a * 100.0).unwrap().to_builder().hash(1_i64).build().unwrap();
        assert!(a == b);

        let mut c = b.clone();
        c.set_exact_comparison(true);
        assert!(a != c);

        let mut d = b.clone();
        d.set_hash(None);
        assert!(a != d);
    }

    #[test]
    fn test_structural_equality_rounds() {
        let a = ramp();
        let b = (&(&a * 0.1).unwrap() * 10.0).unwrap();
        assert!(a == b);
        let mut c = a.clone();
        c.set_label("other");
        assert!(a != c);
    }

    #[test]
    fn test_scalar_and_array_equality() {
        let zeros = Map::from_nominal("z", ArrayD::zeros(IxDyn(&[4, 5])), binning_4x5())
            .errors(array![1.0].into_dyn())
            .build()
            .unwrap();
        assert!(zeros == 0.0);
        assert!(zeros == UFloat::new(0.0, 1.0));
        assert!(zeros != UFloat::exact(0.0));
        assert!(zeros != ArrayD::<f64>::zeros(IxDyn(&[4, 5])));
    }

    #[test]
    fn test_metrics_against_map_and_array() {
        let m = ramp();
        assert_eq!(m.chi2(&m).unwrap(), 0.0);
        let expected = m.nominal_values().mapv(|x| x + 1.0);
        let chi2 = m.chi2(&expected).unwrap();
        let by_hand: f64 = expected.iter().map(|e| 1.0 / e).sum();
        approx::assert_relative_eq!(chi2, by_hand, epsilon = 1e-12);
        assert!(m.llh(&m).unwrap().is_finite());
        assert!(matches!(m.llh(1.0), Err(Error::Type(_))));
    }

    #[test]
    fn test_state_collapses_zero_errors() {
        let m = ramp();
        assert!(m.to_state().errors.is_none());
        let mut e = m.clone();
        e.apply_poisson_errors();
        assert!(e.to_state().errors.is_some());
        assert!(Map::from_state(e.to_state()).unwrap() == e);
    }

    #[test]
    fn test_display() {
        let text = ramp().to_builder().hash(5_i64).build().unwrap().to_string();
        assert!(text.starts_with("Map \"numu\" [4, 5] hash=5"));
        assert!(text.contains("energy: 4 bins"));
    }
}
