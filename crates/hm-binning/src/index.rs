//! Multi-dimensional bin indices.

use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use hm_core::{Error, Result};

/// Selection along one axis.
///
/// Negative positions count from the end of the axis. Slices are clamped to the axis the way
/// sequence slicing usually is, but a slice that selects no bins is an error because a binning
/// cannot have an empty axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisIndex {
    /// A single bin. The axis is kept with size 1.
    At(isize),
    /// The half-open bin range `start..stop`; `None` means the axis boundary.
    Slice {
        /// First bin (inclusive).
        start: Option<isize>,
        /// Last bin (exclusive).
        stop: Option<isize>,
    },
}

impl AxisIndex {
    /// Every bin of the axis.
    pub const fn all() -> Self {
        AxisIndex::Slice { start: None, stop: None }
    }

    /// Bins `start..stop`.
    pub const fn range(start: isize, stop: isize) -> Self {
        AxisIndex::Slice { start: Some(start), stop: Some(stop) }
    }

    /// `true` for a single-position selection.
    pub fn is_scalar(&self) -> bool {
        matches!(self, AxisIndex::At(_))
    }

    /// Resolve against an axis of `len` bins into a half-open `(start, stop)` bin range.
    pub fn resolve(&self, len: usize) -> Result<(usize, usize)> {
        let n = len as isize;
        match *self {
            AxisIndex::At(i) => {
                let idx = if i < 0 { n + i } else { i };
                if idx < 0 || idx >= n {
                    return Err(Error::Index(format!(
                        "index {} is out of bounds for axis with {} bins",
                        i, len
                    )));
                }
                Ok((idx as usize, idx as usize + 1))
            }
            AxisIndex::Slice { start, stop } => {
                let clamp = |v: isize| if v < 0 { (n + v).max(0) } else { v.min(n) };
                let lo = start.map(clamp).unwrap_or(0);
                let hi = stop.map(clamp).unwrap_or(n);
                if lo >= hi {
                    return Err(Error::Index(format!(
                        "slice {} selects no bins of axis with {} bins",
                        self, len
                    )));
                }
                Ok((lo as usize, hi as usize))
            }
        }
    }
}

impl fmt::Display for AxisIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisIndex::At(i) => write!(f, "{}", i),
            AxisIndex::Slice { start, stop } => {
                if let Some(s) = start {
                    write!(f, "{}", s)?;
                }
                f.write_str(":")?;
                if let Some(s) = stop {
                    write!(f, "{}", s)?;
                }
                Ok(())
            }
        }
    }
}

impl From<usize> for AxisIndex {
    fn from(i: usize) -> Self {
        AxisIndex::At(i as isize)
    }
}

impl From<isize> for AxisIndex {
    fn from(i: isize) -> Self {
        AxisIndex::At(i)
    }
}

impl From<i32> for AxisIndex {
    fn from(i: i32) -> Self {
        AxisIndex::At(i as isize)
    }
}

impl From<Range<usize>> for AxisIndex {
    fn from(r: Range<usize>) -> Self {
        AxisIndex::range(r.start as isize, r.end as isize)
    }
}

impl From<RangeFrom<usize>> for AxisIndex {
    fn from(r: RangeFrom<usize>) -> Self {
        AxisIndex::Slice { start: Some(r.start as isize), stop: None }
    }
}

impl From<RangeTo<usize>> for AxisIndex {
    fn from(r: RangeTo<usize>) -> Self {
        AxisIndex::Slice { start: None, stop: Some(r.end as isize) }
    }
}

impl From<RangeFull> for AxisIndex {
    fn from(_: RangeFull) -> Self {
        AxisIndex::all()
    }
}

/// One [`AxisIndex`] per binning axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinIndex(Vec<AxisIndex>);

impl BinIndex {
    /// Build from per-axis components.
    pub fn new(axes: Vec<AxisIndex>) -> Self {
        Self(axes)
    }

    /// Index selecting exactly the bin at `coords`.
    pub fn at(coords: &[usize]) -> Self {
        Self(coords.iter().map(|&c| AxisIndex::from(c)).collect())
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if there are no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Per-axis components.
    pub fn axes(&self) -> &[AxisIndex] {
        &self.0
    }

    /// Resolve every component against `shape`; component count must equal `shape.len()`.
    pub fn resolve(&self, shape: &[usize]) -> Result<Vec<(usize, usize)>> {
        if self.0.len() != shape.len() {
            return Err(Error::Shape(format!(
                "index {} has {} components but the binning has {} dimensions",
                self,
                self.0.len(),
                shape.len()
            )));
        }
        self.0.iter().zip(shape).map(|(ax, &len)| ax.resolve(len)).collect()
    }
}

impl fmt::Display for BinIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, ax) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ax)?;
        }
        f.write_str("]")
    }
}

impl From<Vec<AxisIndex>> for BinIndex {
    fn from(axes: Vec<AxisIndex>) -> Self {
        Self(axes)
    }
}

impl From<AxisIndex> for BinIndex {
    fn from(ax: AxisIndex) -> Self {
        Self(vec![ax])
    }
}

impl From<usize> for BinIndex {
    fn from(i: usize) -> Self {
        Self(vec![AxisIndex::from(i)])
    }
}

impl<A: Into<AxisIndex>, B: Into<AxisIndex>> From<(A, B)> for BinIndex {
    fn from((a, b): (A, B)) -> Self {
        Self(vec![a.into(), b.into()])
    }
}

impl<A: Into<AxisIndex>, B: Into<AxisIndex>, C: Into<AxisIndex>> From<(A, B, C)> for BinIndex {
    fn from((a, b, c): (A, B, C)) -> Self {
        Self(vec![a.into(), b.into(), c.into()])
    }
}
