//! Bin-by-bin iteration over a map.

use std::sync::Arc;

use hm_binning::MultiDimBinning;
use hm_core::UFloat;
use ndarray::iter::IndexedIterMut;
use ndarray::{ArrayD, Dimension, IxDyn};

use crate::map::Map;

/// Single bin of a parent map, aliasing the parent's storage.
///
/// Writes through [`BinMut::value_mut`] or [`BinMut::set`] land in the parent.
#[derive(Debug)]
pub struct BinMut<'a> {
    name: &'a str,
    label: &'a str,
    binning: MultiDimBinning,
    exact_comparison: bool,
    parent_index: Vec<usize>,
    value: &'a mut UFloat,
}

impl BinMut<'_> {
    /// Name of the parent map.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Label of the parent map.
    pub fn label(&self) -> &str {
        self.label
    }

    /// One-bin binning covering this bin.
    pub fn binning(&self) -> &MultiDimBinning {
        &self.binning
    }

    /// Coordinates of this bin in the parent.
    pub fn parent_index(&self) -> &[usize] {
        &self.parent_index
    }

    /// Current content.
    pub fn value(&self) -> UFloat {
        *self.value
    }

    /// Mutable access to the parent's bin.
    pub fn value_mut(&mut self) -> &mut UFloat {
        &mut *self.value
    }

    /// Overwrite the parent's bin.
    pub fn set(&mut self, value: UFloat) {
        *self.value = value;
    }

    /// Detached one-bin map holding the current content.
    pub fn to_map(&self) -> Map {
        single_bin_map(
            self.name,
            self.label,
            &self.binning,
            self.exact_comparison,
            &self.parent_index,
            *self.value,
        )
    }
}

/// Read-only single bin of a parent map.
#[derive(Debug, Clone)]
pub struct BinRef<'a> {
    map: &'a Map,
    binning: MultiDimBinning,
    parent_index: Vec<usize>,
    value: &'a UFloat,
}

impl BinRef<'_> {
    /// One-bin binning covering this bin.
    pub fn binning(&self) -> &MultiDimBinning {
        &self.binning
    }

    /// Coordinates of this bin in the parent.
    pub fn parent_index(&self) -> &[usize] {
        &self.parent_index
    }

    /// Content.
    pub fn value(&self) -> UFloat {
        *self.value
    }

    /// Detached one-bin map.
    pub fn to_map(&self) -> Map {
        single_bin_map(
            &self.map.name,
            &self.map.label,
            &self.binning,
            self.map.exact_comparison,
            &self.parent_index,
            *self.value,
        )
    }
}

fn single_bin_map(
    name: &str,
    label: &str,
    binning: &MultiDimBinning,
    exact_comparison: bool,
    parent_index: &[usize],
    value: UFloat,
) -> Map {
    Map {
        name: name.to_string(),
        label: label.to_string(),
        values: ArrayD::from_elem(IxDyn(&vec![1; parent_index.len()]), value),
        binning: Arc::new(binning.clone()),
        hash: None,
        exact_comparison,
        parent_index: Some(parent_index.to_vec()),
    }
}

/// Iterator returned by [`Map::iter_bins_mut`].
pub struct BinsMut<'a> {
    inner: IndexedIterMut<'a, UFloat, IxDyn>,
    name: &'a str,
    label: &'a str,
    binning: &'a MultiDimBinning,
    exact_comparison: bool,
}

impl<'a> Iterator for BinsMut<'a> {
    type Item = BinMut<'a>;

    fn next(&mut self) -> Option<BinMut<'a>> {
        let (idx, value) = self.inner.next()?;
        let parent_index = idx.slice().to_vec();
        // Map values always fit the binning, so every index names a valid bin.
        let binning = self.binning.single_bin(&parent_index).ok()?;
        Some(BinMut {
            name: self.name,
            label: self.label,
            binning,
            exact_comparison: self.exact_comparison,
            parent_index,
            value,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl Map {
    /// Row-major sequence of single bins that write through to this map.
    pub fn iter_bins_mut(&mut self) -> BinsMut<'_> {
        let Map { name, label, values, binning, exact_comparison, .. } = self;
        BinsMut {
            inner: values.indexed_iter_mut(),
            name,
            label,
            binning,
            exact_comparison: *exact_comparison,
        }
    }

    /// Row-major sequence of read-only single bins.
    pub fn iter_bins(&self) -> impl Iterator<Item = BinRef<'_>> + '_ {
        self.values.indexed_iter().filter_map(move |(idx, value)| {
            let parent_index = idx.slice().to_vec();
            let binning = self.binning.single_bin(&parent_index).ok()?;
            Some(BinRef { map: self, binning, parent_index, value })
        })
    }

    /// Row-major sequence of bin coordinates.
    pub fn iter_indices(&self) -> impl Iterator<Item = Vec<usize>> {
        ndarray::indices(self.values.raw_dim()).into_iter().map(|idx| idx.slice().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hm_binning::OneDimBinning;

    fn map_2x3() -> Map {
        let binning = MultiDimBinning::new(vec![
            OneDimBinning::linear("x", 2, 0.0, 2.0).unwrap(),
            OneDimBinning::linear("y", 3, 0.0, 3.0).unwrap(),
        ])
        .unwrap();
        let values = ArrayD::from_shape_fn(IxDyn(&[2, 3]), |ix| (ix[0] * 3 + ix[1]) as f64);
        Map::from_nominal("nue_cc", values, binning).build().unwrap()
    }

    #[test]
    fn test_iteration_is_row_major_and_complete() {
        let m = map_2x3();
        let indices: Vec<Vec<usize>> = m.iter_indices().collect();
        assert_eq!(indices.len(), m.size());
        assert_eq!(indices[0], vec![0, 0]);
        assert_eq!(indices[1], vec![0, 1]);
        assert_eq!(indices[5], vec![1, 2]);

        let contents: Vec<f64> = m.iter_bins().map(|b| b.value().nominal()).collect();
        assert_eq!(contents, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_writes_are_visible_in_parent() {
        let mut m = map_2x3();
        for mut bin in m.iter_bins_mut() {
            let v = bin.value();
            bin.set(UFloat::new(v.nominal() * 10.0, 1.0));
        }
        assert_eq!(m.get(&[1, 2]), Some(UFloat::new(50.0, 1.0)));

        let mut bins = m.iter_bins_mut();
        let mut first = bins.next().unwrap();
        *first.value_mut() = UFloat::exact(-1.0);
        drop(bins);
        assert_eq!(m.get(&[0, 0]), Some(UFloat::exact(-1.0)));
    }

    #[test]
    fn test_bin_carries_parent_metadata() {
        let mut m = map_2x3();
        let bin = m.iter_bins_mut().nth(4).unwrap();
        assert_eq!(bin.parent_index(), &[1, 1]);
        assert_eq!(bin.name(), "nue_cc");
        assert_eq!(bin.label(), r"\nu_e\ CC");
        assert_eq!(bin.binning().shape(), vec![1, 1]);
        assert_eq!(bin.binning().dimensions()[1].bin_edges(), &[1.0, 2.0]);

        let single = bin.to_map();
        assert_eq!(single.shape(), &[1, 1]);
        assert_eq!(single.parent_index(), Some(&[1usize, 1][..]));
        assert!(single == 4.0);
    }

    #[test]
    fn test_unchanged_copy_of_bin_is_detached() {
        let m = map_2x3();
        let single = m.iter_bins().nth(5).unwrap().to_map();
        assert_eq!(single.parent_index(), Some(&[1usize, 2][..]));
        let copy = single.fluctuate("none", None).unwrap();
        assert_eq!(copy.parent_index(), None);
        assert_eq!(copy.values(), single.values());
        assert_eq!(copy.hash(), single.hash());
        assert!(copy == single);
    }

    #[test]
    fn test_read_only_bins_match_indexing() {
        let m = map_2x3();
        for bin in m.iter_bins() {
            let via_index = m.index(&hm_binning::BinIndex::at(bin.parent_index())).unwrap();
            let detached = bin.to_map();
            assert_eq!(detached.parent_index(), Some(bin.parent_index()));
            assert!(detached == via_index);
        }
    }
}
