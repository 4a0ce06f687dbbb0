//! # hm-binning
//!
//! Binning description consumed by HistoMap histograms.
//!
//! A [`MultiDimBinning`] is an ordered list of named [`OneDimBinning`] axes. It provides the
//! shape a histogram array must have, compatibility checks between histograms, sub-binnings
//! selected by a [`BinIndex`], and the serializable/hashable states used for persistence and
//! structural comparison.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod multi_dim;
pub mod one_dim;
pub mod spec;

pub use index::{AxisIndex, BinIndex};
pub use multi_dim::MultiDimBinning;
pub use one_dim::OneDimBinning;
pub use spec::BinningSpec;
