// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use num_integer::Integer;

use crate::dimension::{normalize_axis, size};
use crate::error::{bail, DatasetError, Result};
use crate::{Ix, Ixs};

/// Maximum-shape entry of an axis that may grow without bound.
pub const UNLIMITED: Ix = usize::MAX;

/// A slice (range with step size) of one axis.
///
/// Negative `start` or `stop` indexes are counted from the back of the axis.
/// `stop` is exclusive in the direction of `step`; a missing bound means the
/// end of the axis in that direction.
///
/// ## Examples
///
/// `Slice::new(None, None, 1)` is the full range of an axis. It can also be
/// created with `Slice::from(..)`. The Python equivalent is `[:]`.
///
/// `Slice::from(a..b).step_by(2)` is every second element from `a` until `b`.
/// The Python equivalent is `[a:b:2]`.
///
/// `Slice::from(..).step_by(-1)` is every element in reverse order. The
/// Python equivalent is `[::-1]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slice {
    pub start: Option<Ixs>,
    pub stop: Option<Ixs>,
    pub step: Ixs,
    /// Selects the single position `start`, which must lie on the axis.
    #[cfg_attr(feature = "serde", serde(default))]
    index: bool,
}

impl Slice {
    /// Create a new `Slice` with the given extents.
    ///
    /// `step` must be nonzero; this is checked when the slice is resolved
    /// against a shape.
    pub fn new(start: Option<Ixs>, stop: Option<Ixs>, step: Ixs) -> Slice {
        Slice {
            start,
            stop,
            step,
            index: false,
        }
    }

    /// A single index. Unlike a range, an index past either end of the axis
    /// is an error when the slice is resolved.
    pub fn index(i: Ixs) -> Slice {
        let stop = if i == -1 { None } else { Some(i + 1) };
        Slice {
            index: true,
            ..Slice::new(Some(i), stop, 1)
        }
    }

    pub fn is_index(&self) -> bool {
        self.index
    }

    /// Create a new `Slice` with the given step size (multiplied with the
    /// previous step size).
    #[inline]
    pub fn step_by(self, step: Ixs) -> Self {
        Slice {
            step: self.step * step,
            ..self
        }
    }

    /// Resolve against an axis of length `len` that may grow to `limit`.
    ///
    /// Returns start, stop, step and the number of elements selected.
    fn resolve(&self, len: Ix, limit: Ix) -> Result<(Ixs, Ixs, Ixs, Ix)> {
        let step = self.step;
        if step == 0 {
            bail!(DatasetError::InvalidSlice("step must be nonzero".to_string()));
        }
        let ilen = len as Ixs;
        let ilimit = limit.min(isize::MAX as usize) as Ixs;
        let wrap = |i: Ixs| if i < 0 { i + ilen } else { i };
        if let (true, Some(i)) = (self.index, self.start) {
            if !(0..ilimit).contains(&wrap(i)) {
                bail!(DatasetError::IndexOutOfRange { index: i, len });
            }
        }
        if step > 0 {
            let start = self.start.map_or(0, wrap).clamp(0, ilimit);
            let stop = self.stop.map_or(ilen, wrap).clamp(0, ilimit);
            let n = if stop > start {
                Integer::div_ceil(&(stop - start), &step) as Ix
            } else {
                0
            };
            Ok((start, stop, step, n))
        } else {
            let start = self.start.map_or(ilen - 1, wrap).clamp(-1, ilen - 1);
            let stop = self.stop.map_or(-1, wrap).clamp(-1, ilen - 1);
            let n = if start > stop {
                Integer::div_ceil(&(start - stop), &(-step)) as Ix
            } else {
                0
            };
            Ok((start, stop, step, n))
        }
    }
}

macro_rules! impl_slice_from_index_type {
    ($index:ty) => {
        impl From<Range<$index>> for Slice {
            #[inline]
            fn from(r: Range<$index>) -> Slice {
                Slice::new(Some(r.start as Ixs), Some(r.end as Ixs), 1)
            }
        }

        impl From<RangeFrom<$index>> for Slice {
            #[inline]
            fn from(r: RangeFrom<$index>) -> Slice {
                Slice::new(Some(r.start as Ixs), None, 1)
            }
        }

        impl From<RangeTo<$index>> for Slice {
            #[inline]
            fn from(r: RangeTo<$index>) -> Slice {
                Slice::new(None, Some(r.end as Ixs), 1)
            }
        }

        impl From<$index> for Slice {
            #[inline]
            fn from(i: $index) -> Slice {
                Slice::index(i as Ixs)
            }
        }
    };
}

impl_slice_from_index_type!(isize);
impl_slice_from_index_type!(usize);
impl_slice_from_index_type!(i32);

impl From<RangeFull> for Slice {
    #[inline]
    fn from(_: RangeFull) -> Slice {
        Slice::new(None, None, 1)
    }
}

/// Build an array of [`Slice`]s, one per axis: `s![1..4, ..;2, 3]`.
#[macro_export]
macro_rules! s {
    ($($r:expr $(;$step:expr)?),* $(,)?) => {
        [$($crate::Slice::from($r)$(.step_by($step as isize))?),*]
    };
}

/// A resolved rectangular region of a shape: per-axis start, stop and step,
/// plus the shape of the region.
///
/// With a maximum shape, a region may reach past the current source shape on
/// axes that can grow; the source shape then grows to contain it and the
/// region is *expanded*.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceND {
    source_shape: Vec<Ix>,
    max_shape: Option<Vec<Ix>>,
    start: Vec<Ixs>,
    stop: Vec<Ixs>,
    step: Vec<Ixs>,
    shape: Vec<Ix>,
    expanded: bool,
}

impl SliceND {
    /// The region covering all of `shape`.
    pub fn full(shape: &[Ix]) -> SliceND {
        SliceND {
            source_shape: shape.to_vec(),
            max_shape: None,
            start: vec![0; shape.len()],
            stop: shape.iter().map(|&d| d as Ixs).collect(),
            step: vec![1; shape.len()],
            shape: shape.to_vec(),
            expanded: false,
        }
    }

    /// Resolve one `Slice` per leading axis of `shape`; missing axes are full.
    pub fn new(shape: &[Ix], slices: &[Slice]) -> Result<SliceND> {
        Self::create(shape, None, slices)
    }

    /// Like [`new`](Self::new), but axes may grow up to `max_shape`.
    pub fn with_max_shape(shape: &[Ix], max_shape: &[Ix], slices: &[Slice]) -> Result<SliceND> {
        if max_shape.len() != shape.len()
            || max_shape.iter().zip(shape).any(|(&m, &d)| m < d)
        {
            bail!(DatasetError::shapes(shape, max_shape));
        }
        Self::create(shape, Some(max_shape), slices)
    }

    /// Build from optional start, stop and step arrays.
    pub fn from_arrays(
        shape: &[Ix],
        start: Option<&[Ixs]>,
        stop: Option<&[Ixs]>,
        step: Option<&[Ixs]>,
    ) -> Result<SliceND> {
        Self::create(shape, None, &Self::zip_arrays(shape.len(), start, stop, step)?)
    }

    pub(crate) fn zip_arrays(
        rank: usize,
        start: Option<&[Ixs]>,
        stop: Option<&[Ixs]>,
        step: Option<&[Ixs]>,
    ) -> Result<Vec<Slice>> {
        for a in [start, stop, step].iter().flatten() {
            if a.len() != rank {
                bail!(DatasetError::InvalidSlice(format!(
                    "slice array {:?} does not match rank {}",
                    a, rank
                )));
            }
        }
        Ok((0..rank)
            .map(|i| {
                Slice::new(
                    start.map(|s| s[i]),
                    stop.map(|s| s[i]),
                    step.map_or(1, |s| s[i]),
                )
            })
            .collect())
    }

    fn create(shape: &[Ix], max_shape: Option<&[Ix]>, slices: &[Slice]) -> Result<SliceND> {
        if slices.len() > shape.len() {
            bail!(DatasetError::InvalidSlice(format!(
                "{} slices given for rank {}",
                slices.len(),
                shape.len()
            )));
        }
        let mut out = SliceND::full(shape);
        out.max_shape = max_shape.map(|m| m.to_vec());
        for (axis, s) in slices.iter().enumerate() {
            out.set_axis(axis, *s)?;
        }
        Ok(out)
    }

    /// Replace the slice of one axis.
    pub fn set_axis(&mut self, axis: usize, slice: Slice) -> Result<()> {
        if axis >= self.rank() {
            bail!(DatasetError::InvalidAxis {
                axis: axis as Ixs,
                rank: self.rank(),
            });
        }
        let len = self.source_shape[axis];
        let limit = self.max_shape.as_ref().map_or(len, |m| m[axis]);
        let (start, stop, step, n) = slice.resolve(len, limit)?;
        if n > 0 && step > 0 {
            let last = (start + (n as Ixs - 1) * step) as Ix;
            if last >= len {
                self.source_shape[axis] = last + 1;
                self.expanded = true;
            }
        }
        self.start[axis] = start;
        self.stop[axis] = stop;
        self.step[axis] = step;
        self.shape[axis] = n;
        Ok(())
    }

    /// Reverse the traversal direction of `axis` over the same elements.
    pub fn flip(&mut self, axis: Ixs) -> Result<&mut Self> {
        let axis = normalize_axis(axis, self.rank())?;
        let n = self.shape[axis] as Ixs;
        if n > 0 {
            let (start, step) = (self.start[axis], self.step[axis]);
            let last = start + (n - 1) * step;
            self.start[axis] = last;
            self.stop[axis] = start - step;
            self.step[axis] = -step;
        }
        Ok(self)
    }

    /// Region selected by `inner`, a region of this region's shape, expressed
    /// in this region's source coordinates.
    pub fn compose(&self, inner: &SliceND) -> Result<SliceND> {
        if inner.source_shape != self.shape {
            bail!(DatasetError::shapes(&inner.source_shape, &self.shape));
        }
        let mut out = SliceND::full(&self.source_shape);
        for i in 0..self.rank() {
            let start = self.start[i] + inner.start[i] * self.step[i];
            let step = self.step[i] * inner.step[i];
            out.start[i] = start;
            out.step[i] = step;
            out.stop[i] = start + inner.shape[i] as Ixs * step;
            out.shape[i] = inner.shape[i];
        }
        Ok(out)
    }

    /// Region with axes reordered so that axis `i` is old axis `perm[i]`.
    pub fn permuted(&self, perm: &[usize]) -> SliceND {
        use crate::dimension::permute;
        SliceND {
            source_shape: permute(&self.source_shape, perm),
            max_shape: self.max_shape.as_ref().map(|m| permute(m, perm)),
            start: permute(&self.start, perm),
            stop: permute(&self.stop, perm),
            step: permute(&self.step, perm),
            shape: permute(&self.shape, perm),
            expanded: self.expanded,
        }
    }

    /// Slice of one axis with resolved bounds.
    pub fn axis_slice(&self, axis: usize) -> Slice {
        let stop = if self.stop[axis] < 0 {
            None
        } else {
            Some(self.stop[axis])
        };
        Slice::new(Some(self.start[axis]), stop, self.step[axis])
    }

    /// Shape of the selected region.
    pub fn shape(&self) -> &[Ix] {
        &self.shape
    }

    /// Shape of the dataset the region lies in, grown if expanded.
    pub fn source_shape(&self) -> &[Ix] {
        &self.source_shape
    }

    pub fn max_shape(&self) -> Option<&[Ix]> {
        self.max_shape.as_deref()
    }

    pub fn start(&self) -> &[Ixs] {
        &self.start
    }

    pub fn stop(&self) -> &[Ixs] {
        &self.stop
    }

    pub fn step(&self) -> &[Ixs] {
        &self.step
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        size(&self.shape)
    }

    /// The region reaches past the original source shape.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// The region is the whole source in forward order.
    pub fn is_all(&self) -> bool {
        self.shape == self.source_shape
            && self.start.iter().all(|&s| s == 0)
            && self.step.iter().all(|&s| s == 1)
    }
}

/// Renders as `[start:stop:step, ...]`, except that an axis stepping
/// backwards through its first element leaves the stop out, as in
/// `[3::-2]`, since no stop index can be written for it.
impl fmt::Display for SliceND {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.rank() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if self.step[i] < 0 && self.stop[i] < 0 {
                write!(f, "{}::{}", self.start[i], self.step[i])?;
            } else {
                write!(f, "{}:{}:{}", self.start[i], self.stop[i], self.step[i])?;
            }
        }
        write!(f, "]")
    }
}
