//! # hm-map
//!
//! Binned histograms with per-bin uncertainty, and ordered collections of them.
//!
//! A [`Map`] pairs an N-dimensional array of [`UFloat`] values with a shared
//! [`MultiDimBinning`]. Arithmetic propagates standard deviations bin by bin, indexing
//! yields sub-maps on the matching sub-binning, and bins can be visited one at a time with
//! writes landing in the parent. A [`MapSet`] broadcasts the same operations over its members,
//! pairing them with another collection's members by name or by position.
//!
//! Both types persist to JSON via [`MapState`] and [`MapSetState`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod iter;
pub mod map;
pub mod mapset;
pub mod nested;
pub mod ops;
pub mod state;
pub mod tex;

pub use dispatch::{Arg, Dispatched, MapOp, Value};
pub use iter::{BinMut, BinRef, BinsMut};
pub use map::{Fluctuation, Map, MapBuilder};
pub use mapset::{Collation, MapOrState, MapSet, Selection};
pub use ops::{BinaryOp, Operand};
pub use state::{MapSetState, MapState};

pub use hm_binning::{AxisIndex, BinIndex, BinningSpec, MultiDimBinning, OneDimBinning};
pub use hm_core::{Error, IdentityHash, Result, UFloat};
pub use hm_prob::Metric;
