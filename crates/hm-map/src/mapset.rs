//! Ordered, name-addressable collections of maps.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::path::Path;

use hm_binning::{AxisIndex, BinIndex};
use hm_core::{Error, IdentityHash, Result};
use hm_prob::Metric;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::dispatch::{Arg, Dispatched, MapOp, Value, apply_one, apply_one_mut};
use crate::map::Map;
use crate::state::{MapSetState, MapState};
use crate::tex::default_set_label;

/// How members of two collections are paired when one is passed to the other's operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collation {
    /// Pair maps with equal names.
    #[default]
    ByName,
    /// Pair maps at equal positions, whatever their names.
    ByPosition,
}

/// A built map or a state to build one from.
#[derive(Debug, Clone)]
pub enum MapOrState {
    /// Ready-made map.
    Map(Map),
    /// Persisted state.
    State(MapState),
}

impl From<Map> for MapOrState {
    fn from(m: Map) -> Self {
        MapOrState::Map(m)
    }
}

impl From<MapState> for MapOrState {
    fn from(s: MapState) -> Self {
        MapOrState::State(s)
    }
}

/// Result of [`MapSet::slice`].
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Exactly one member was selected.
    Map(Map),
    /// Several members were selected.
    Set(MapSet),
}

/// Ordered collection of maps that broadcasts operations over its members.
///
/// Member names may repeat; name lookups return the first match.
#[derive(Debug, Clone)]
pub struct MapSet {
    name: Option<String>,
    label: Option<String>,
    maps: Vec<Map>,
    collation: Collation,
}

impl MapSet {
    /// Unnamed collection, collated by name.
    pub fn new(maps: Vec<Map>) -> Self {
        Self { name: None, label: None, maps, collation: Collation::default() }
    }

    /// Collection from maps and/or map states, in order.
    pub fn from_members<I, M>(members: I) -> Result<Self>
    where
        I: IntoIterator<Item = M>,
        M: Into<MapOrState>,
    {
        let maps = members
            .into_iter()
            .map(|m| match m.into() {
                MapOrState::Map(m) => Ok(m),
                MapOrState::State(s) => Map::from_state(s),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(maps))
    }

    /// Set the collection name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the TeX label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set how members are paired with another collection's.
    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = collation;
        self
    }

    // --- accessors ---

    /// Collection name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rename the collection (not its members).
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// TeX label; `{\rm <name>}` unless set.
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| default_set_label(self.name()))
    }

    /// Relabel the collection.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Member pairing rule.
    pub fn collation(&self) -> Collation {
        self.collation
    }

    /// Change the member pairing rule.
    pub fn set_collation(&mut self, collation: Collation) {
        self.collation = collation;
    }

    /// Members, in order.
    pub fn maps(&self) -> &[Map] {
        &self.maps
    }

    /// Iterate over members.
    pub fn iter(&self) -> std::slice::Iter<'_, Map> {
        self.maps.iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// `true` without members.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Member names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.maps.iter().map(Map::name).collect()
    }

    /// Member hashes, in order.
    pub fn hashes(&self) -> Vec<Option<&IdentityHash>> {
        self.maps.iter().map(Map::hash).collect()
    }

    /// `true` if some member is called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.maps.iter().any(|m| m.name() == name)
    }

    /// Combined hash of every member, if every member has one.
    pub fn hash(&self) -> Option<IdentityHash> {
        combined_hash(self.maps.iter())
    }

    /// Combined hash of the members called one of `names`, if each of them has a hash.
    pub fn hash_maps(&self, names: &[&str]) -> Option<IdentityHash> {
        combined_hash(self.maps.iter().filter(|m| names.contains(&m.name())))
    }

    /// Pair each member name with the value at the same position.
    pub fn collate_with_names<T>(&self, values: impl IntoIterator<Item = T>) -> Vec<(String, T)> {
        self.maps.iter().map(|m| m.name().to_string()).zip(values).collect()
    }

    // --- lookup ---

    /// Member at `position`; negative positions count from the end.
    pub fn by_position(&self, position: isize) -> Result<&Map> {
        let (i, _) = AxisIndex::At(position).resolve(self.maps.len())?;
        Ok(&self.maps[i])
    }

    /// Members selected by a position or position range.
    ///
    /// A selection of one member yields that map; several yield a new collection with this
    /// collection's name, label and collation.
    pub fn slice(&self, selection: impl Into<AxisIndex>) -> Result<Selection> {
        let (start, stop) = selection.into().resolve(self.maps.len())?;
        if stop - start == 1 {
            return Ok(Selection::Map(self.maps[start].clone()));
        }
        Ok(Selection::Set(self.with_maps(self.maps[start..stop].to_vec())))
    }

    /// First member called `name`.
    pub fn by_name(&self, name: &str) -> Result<&Map> {
        self.maps.iter().find(|m| m.name() == name).ok_or_else(|| {
            Error::NotFound(format!("could not find map name {:?} in {}", name, self))
        })
    }

    /// Every member indexed by `index`.
    pub fn index_bins(&self, index: &BinIndex) -> Result<MapSet> {
        self.apply_to_maps(MapOp::Index, &[Arg::Index(index)])?.into_maps()
    }

    fn with_maps(&self, maps: Vec<Map>) -> MapSet {
        MapSet {
            name: self.name.clone(),
            label: self.label.clone(),
            maps,
            collation: self.collation,
        }
    }

    // --- dispatch ---

    fn member_args<'a>(&self, position: usize, args: &[Arg<'a>]) -> Result<Vec<Arg<'a>>> {
        let name = self.maps[position].name();
        args.iter()
            .map(|arg| match *arg {
                Arg::MapSet(other) => align(other, self.collation, name, position).map(Arg::Map),
                Arg::Map(_) => Err(Error::unsupported_type("MapSet argument", "Map")),
                other => Ok(other),
            })
            .collect()
    }

    fn collect_results(&self, op: MapOp, results: Vec<Value>) -> Dispatched {
        if results.iter().all(|r| matches!(r, Value::Map(_))) {
            let maps = results
                .into_iter()
                .filter_map(|r| match r {
                    Value::Map(m) => Some(m),
                    _ => None,
                })
                .collect();
            return Dispatched::Maps(self.with_maps(maps));
        }
        if !op.is_property() && results.iter().all(|r| matches!(r, Value::None)) {
            return Dispatched::None;
        }
        Dispatched::Collated(self.collate_with_names(results))
    }

    /// Apply `op` to every member.
    ///
    /// [`Arg::MapSet`] arguments are aligned per member by name or by position according to
    /// this collection's [`Collation`]; any member error aborts the whole call. In-place
    /// operations are rejected here; use [`MapSet::apply_to_maps_mut`].
    pub fn apply_to_maps(&self, op: MapOp, args: &[Arg<'_>]) -> Result<Dispatched> {
        log::debug!("applying {} to {} maps", op, self.maps.len());
        let mut results = Vec::with_capacity(self.maps.len());
        for (position, map) in self.maps.iter().enumerate() {
            let member_args = self.member_args(position, args)?;
            results.push(apply_one(map, op, &member_args)?);
        }
        Ok(self.collect_results(op, results))
    }

    /// [`MapSet::apply_to_maps`] that also accepts in-place operations.
    ///
    /// In-place operations are all-or-nothing: if any member fails, no member is changed.
    pub fn apply_to_maps_mut(&mut self, op: MapOp, args: &[Arg<'_>]) -> Result<Dispatched> {
        if !op.mutates() {
            return self.apply_to_maps(op, args);
        }
        log::debug!("applying {} in place to {} maps", op, self.maps.len());
        let per_member = (0..self.maps.len())
            .map(|position| self.member_args(position, args))
            .collect::<Result<Vec<_>>>()?;
        let mut maps = self.maps.clone();
        let mut results = Vec::with_capacity(maps.len());
        for (map, member_args) in maps.iter_mut().zip(&per_member) {
            results.push(apply_one_mut(map, op, member_args)?);
        }
        self.maps = maps;
        Ok(self.collect_results(op, results))
    }

    // --- broadcast conveniences ---

    /// `self ** rhs`
    pub fn pow<'a>(&self, rhs: impl Into<Arg<'a>>) -> Result<MapSet> {
        self.apply_to_maps(MapOp::Pow, &[rhs.into()])?.into_maps()
    }

    /// `lhs + self`
    pub fn radd<'a>(&self, lhs: impl Into<Arg<'a>>) -> Result<MapSet> {
        self.apply_to_maps(MapOp::RAdd, &[lhs.into()])?.into_maps()
    }

    /// `lhs - self`
    pub fn rsub<'a>(&self, lhs: impl Into<Arg<'a>>) -> Result<MapSet> {
        self.apply_to_maps(MapOp::RSub, &[lhs.into()])?.into_maps()
    }

    /// `lhs * self`
    pub fn rmul<'a>(&self, lhs: impl Into<Arg<'a>>) -> Result<MapSet> {
        self.apply_to_maps(MapOp::RMul, &[lhs.into()])?.into_maps()
    }

    /// `lhs / self`
    pub fn rdiv<'a>(&self, lhs: impl Into<Arg<'a>>) -> Result<MapSet> {
        self.apply_to_maps(MapOp::RDiv, &[lhs.into()])?.into_maps()
    }

    /// `lhs ** self`
    pub fn rpow<'a>(&self, lhs: impl Into<Arg<'a>>) -> Result<MapSet> {
        self.apply_to_maps(MapOp::RPow, &[lhs.into()])?.into_maps()
    }

    fn unary(&self, op: MapOp) -> Result<MapSet> {
        self.apply_to_maps(op, &[])?.into_maps()
    }

    /// Absolute value of every member.
    pub fn abs(&self) -> Result<MapSet> {
        self.unary(MapOp::Abs)
    }

    /// Square root of every member.
    pub fn sqrt(&self) -> Result<MapSet> {
        self.unary(MapOp::Sqrt)
    }

    /// Natural logarithm of every member.
    pub fn log(&self) -> Result<MapSet> {
        self.unary(MapOp::Log)
    }

    /// Base-10 logarithm of every member.
    pub fn log10(&self) -> Result<MapSet> {
        self.unary(MapOp::Log10)
    }

    /// Fluctuate every member; the same `seed` is used for each of them.
    pub fn fluctuate(&self, method: &str, seed: Option<u64>) -> Result<MapSet> {
        let seed = seed.map_or(Arg::None, |s| Arg::Int(s as i64));
        self.apply_to_maps(MapOp::Fluctuate, &[Arg::Str(method), seed])?.into_maps()
    }

    /// Give every member Poisson errors.
    pub fn set_poisson_errors(&mut self) -> Result<()> {
        self.apply_to_maps_mut(MapOp::SetPoissonErrors, &[])?;
        Ok(())
    }

    /// Set (or clear) the hash of every member.
    pub fn set_hashes(&mut self, hash: Option<&IdentityHash>) -> Result<()> {
        self.apply_to_maps_mut(MapOp::SetHash, &[hash.map_or(Arg::None, Arg::Hash)])?;
        Ok(())
    }

    /// Set the exact-comparison flag of every member.
    pub fn set_exact_comparison(&mut self, exact: bool) -> Result<()> {
        self.apply_to_maps_mut(MapOp::SetExactComparison, &[Arg::Bool(exact)])?;
        Ok(())
    }

    // --- metrics ---

    /// Per-member `metric` against `expected` (a collection, aligned per member, or an
    /// array), keyed by member name.
    pub fn metric_per_map<'a>(
        &self,
        expected: impl Into<Arg<'a>>,
        metric: Metric,
    ) -> Result<Vec<(String, f64)>> {
        let op = match metric {
            Metric::Llh => MapOp::Llh,
            Metric::Chi2 => MapOp::Chi2,
        };
        self.apply_to_maps(op, &[expected.into()])?
            .into_collated()?
            .into_iter()
            .map(|(name, value)| match value {
                Value::Float(v) => Ok((name, v)),
                other => Err(Error::unsupported_type(metric.as_str(), other.type_name())),
            })
            .collect()
    }

    /// Sum of [`MapSet::metric_per_map`].
    pub fn metric_total<'a>(&self, expected: impl Into<Arg<'a>>, metric: Metric) -> Result<f64> {
        Ok(self.metric_per_map(expected, metric)?.iter().map(|(_, v)| v).sum())
    }

    /// Per-member Poisson log-likelihood.
    pub fn llh_per_map<'a>(&self, expected: impl Into<Arg<'a>>) -> Result<Vec<(String, f64)>> {
        self.metric_per_map(expected, Metric::Llh)
    }

    /// Total Poisson log-likelihood.
    pub fn llh_total<'a>(&self, expected: impl Into<Arg<'a>>) -> Result<f64> {
        self.metric_total(expected, Metric::Llh)
    }

    /// Per-member chi-square.
    pub fn chi2_per_map<'a>(&self, expected: impl Into<Arg<'a>>) -> Result<Vec<(String, f64)>> {
        self.metric_per_map(expected, Metric::Chi2)
    }

    /// Total chi-square.
    pub fn chi2_total<'a>(&self, expected: impl Into<Arg<'a>>) -> Result<f64> {
        self.metric_total(expected, Metric::Chi2)
    }

    // --- persistence ---

    /// Serializable state.
    pub fn to_state(&self) -> MapSetState {
        MapSetState {
            maps: self.maps.iter().map(Map::to_state).collect(),
            name: self.name.clone(),
            label: Some(self.label()),
            collation: self.collation,
        }
    }

    /// Rebuild from a state produced by [`MapSet::to_state`].
    pub fn from_state(state: MapSetState) -> Result<MapSet> {
        let mut set = MapSet::from_members(state.maps)?.with_collation(state.collation);
        set.name = state.name;
        set.label = state.label;
        Ok(set)
    }

    /// Write the state as pretty-printed JSON.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::debug!("writing {} to {}", self, path.display());
        std::fs::write(path, serde_json::to_string_pretty(&self.to_state())?)?;
        Ok(())
    }

    /// Read a collection written by [`MapSet::to_json`].
    pub fn from_json(path: impl AsRef<Path>) -> Result<MapSet> {
        let path = path.as_ref();
        log::debug!("reading map set from {}", path.display());
        let state: MapSetState = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        MapSet::from_state(state)
    }
}

/// Member of `other` paired with this collection's member `name` at `position`.
fn align<'a>(
    other: &'a MapSet,
    collation: Collation,
    name: &str,
    position: usize,
) -> Result<&'a Map> {
    match collation {
        Collation::ByName => other.by_name(name),
        Collation::ByPosition => other.maps.get(position).ok_or_else(|| {
            Error::Index(format!(
                "position {} is out of range for {} with {} maps",
                position,
                other,
                other.len()
            ))
        }),
    }
}

fn combined_hash<'a>(maps: impl Iterator<Item = &'a Map>) -> Option<IdentityHash> {
    let hashes = maps.map(Map::hash).collect::<Option<Vec<_>>>()?;
    let json = serde_json::to_string(&hashes).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Some(IdentityHash::Text(format!("{:x}", hasher.finalize())))
}

/// Structural comparison of every member plus name, label and collation; hashes are not
/// consulted.
impl PartialEq for MapSet {
    fn eq(&self, other: &MapSet) -> bool {
        self.name == other.name
            && self.label() == other.label()
            && self.collation == other.collation
            && self.maps.len() == other.maps.len()
            && self
                .maps
                .iter()
                .zip(&other.maps)
                .all(|(a, b)| a.canonical_state() == b.canonical_state())
    }
}

impl fmt::Display for MapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MapSet ")?;
        if let Some(name) = &self.name {
            write!(f, "'{}' ", name)?;
        }
        write!(f, "containing maps ({})", self.names().join(", "))
    }
}

impl<'a> IntoIterator for &'a MapSet {
    type Item = &'a Map;
    type IntoIter = std::slice::Iter<'a, Map>;

    fn into_iter(self) -> Self::IntoIter {
        self.maps.iter()
    }
}

impl Neg for &MapSet {
    type Output = Result<MapSet>;

    fn neg(self) -> Result<MapSet> {
        self.unary(MapOp::Neg)
    }
}

macro_rules! impl_mapset_ops {
    ($($trait:ident::$method:ident => $op:expr),* $(,)?) => {
        $(
            impl<'a, T: Into<Arg<'a>>> $trait<T> for &MapSet {
                type Output = Result<MapSet>;

                fn $method(self, rhs: T) -> Result<MapSet> {
                    self.apply_to_maps($op, &[rhs.into()])?.into_maps()
                }
            }
        )*
    };
}

impl_mapset_ops!(
    Add::add => MapOp::Add,
    Sub::sub => MapOp::Sub,
    Mul::mul => MapOp::Mul,
    Div::div => MapOp::Div,
);

#[cfg(test)]
mod tests {
    use super::*;
    use hm_binning::{MultiDimBinning, OneDimBinning};
    use ndarray::array;

    fn binning() -> MultiDimBinning {
        MultiDimBinning::new(vec![OneDimBinning::linear("x", 3, 0.0, 3.0).unwrap()]).unwrap()
    }

    fn map(name: &str, scale: f64) -> Map {
        let values = array![1.0, 2.0, 3.0].into_dyn().mapv(|v| v * scale);
        Map::from_nominal(name, values, binning()).build().unwrap()
    }

    fn flavours() -> MapSet {
        MapSet::new(vec![map("nue", 1.0), map("numu", 10.0)]).with_name("nu")
    }

    #[test]
    fn test_lookup() {
        let set = flavours();
        assert_eq!(set.names(), vec!["nue", "numu"]);
        assert!(set.contains("numu"));
        assert!(!set.contains("nutau"));
        assert_eq!(set.by_position(-1).unwrap().name(), "numu");
        assert!(matches!(set.by_position(2), Err(Error::Index(_))));
        assert_eq!(set.by_name("nue").unwrap().get(&[2]).unwrap().nominal(), 3.0);
        assert!(matches!(set.by_name("nutau"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_slice() {
        let set = flavours();
        assert!(matches!(set.slice(1usize), Ok(Selection::Map(m)) if m.name() == "numu"));
        match set.slice(..).unwrap() {
            Selection::Set(s) => {
                assert_eq!(s.len(), 2);
                assert_eq!(s.name(), Some("nu"));
            }
            Selection::Map(_) => panic!("expected a set"),
        }
        assert!(matches!(set.slice(AxisIndex::range(2, 5)), Err(Error::Index(_))));
    }

    #[test]
    fn test_labels() {
        assert_eq!(flavours().label(), r"{\rm nu}");
        assert_eq!(flavours().with_label("L").label(), "L");
    }

    #[test]
    fn test_property_dispatch_collates() {
        let set = flavours();
        let names = set.apply_to_maps(MapOp::Name, &[]).unwrap().into_collated().unwrap();
        let expected: Vec<(String, Value)> = ["nue", "numu"]
            .iter()
            .map(|n| (n.to_string(), Value::Str(n.to_string())))
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_bare_map_argument_rejected() {
        let set = flavours();
        let m = map("nue", 1.0);
        let err = set.apply_to_maps(MapOp::Add, &[Arg::Map(&m)]).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_in_place_ops_are_all_or_nothing() {
        let mut set = flavours();
        assert!(matches!(
            set.apply_to_maps(MapOp::SetExactComparison, &[Arg::Bool(false)]),
            Err(Error::NotImplemented(_))
        ));
        let done = set.apply_to_maps_mut(MapOp::SetExactComparison, &[Arg::Bool(false)]).unwrap();
        assert_eq!(done, Dispatched::None);
        assert!(set.iter().all(|m| !m.exact_comparison()));

        let err = set.apply_to_maps_mut(MapOp::SetLabel, &[Arg::Int(1)]);
        assert!(matches!(err, Err(Error::Type(_))));
        assert_eq!(set.by_position(0).unwrap().label(), r"\nu_e");
    }

    #[test]
    fn test_combined_hash() {
        let mut set = flavours();
        assert!(set.hash().is_none());
        set.set_hashes(Some(&IdentityHash::Int(3))).unwrap();
        let h = set.hash().unwrap();
        match &h {
            IdentityHash::Text(hex) => assert_eq!(hex.len(), 64),
            other => panic!("unexpected hash {:?}", other),
        }
        assert_eq!(set.hash_maps(&["nue", "numu"]), Some(h.clone()));
        assert_ne!(set.hash_maps(&["nue"]), Some(h));
    }

    #[test]
    fn test_display() {
        assert_eq!(flavours().to_string(), "MapSet 'nu' containing maps (nue, numu)");
        assert_eq!(MapSet::new(vec![]).to_string(), "MapSet containing maps ()");
    }
}
