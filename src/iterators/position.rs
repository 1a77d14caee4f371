// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use super::Baseiter;
use crate::dimension::normalize_axes;
use crate::error::Result;
use crate::slice::SliceND;
use crate::{Ix, Ixs};

/// Yields multi-index positions of a region, holding a chosen set of axes
/// fixed at the region's start.
///
/// With axes omitted, each position names the origin of a sub-region that
/// spans the omitted axes, which is how data is copied axis by axis into a
/// destination of lower rank.
#[derive(Clone, Debug)]
pub struct PositionIter {
    inner: Baseiter,
    start: Vec<Ixs>,
    step: Vec<Ixs>,
    omit: Vec<bool>,
}

impl PositionIter {
    /// Every position of `shape`.
    pub fn new(shape: &[Ix]) -> Self {
        Self::from_slice(&SliceND::full(shape))
    }

    /// Every position of `shape`, leaving `omit` axes at zero.
    pub fn with_omit(shape: &[Ix], omit: &[Ixs]) -> Result<Self> {
        Self::with_slice(&SliceND::full(shape), omit)
    }

    pub fn from_slice(slice: &SliceND) -> Self {
        PositionIter {
            inner: Baseiter::new(slice.shape().to_vec(), Vec::new()),
            start: slice.start().to_vec(),
            step: slice.step().to_vec(),
            omit: vec![false; slice.rank()],
        }
    }

    pub fn with_slice(slice: &SliceND, omit: &[Ixs]) -> Result<Self> {
        let axes = normalize_axes(omit, slice.rank())?;
        let mut flags = vec![false; slice.rank()];
        let mut dim = slice.shape().to_vec();
        let empty = slice.size() == 0;
        for &a in &axes {
            flags[a] = true;
            if !empty {
                dim[a] = 1;
            }
        }
        Ok(PositionIter {
            inner: Baseiter::new(dim, Vec::new()),
            start: slice.start().to_vec(),
            step: slice.step().to_vec(),
            omit: flags,
        })
    }

    /// Flags of the axes that are held fixed.
    pub fn omit(&self) -> &[bool] {
        &self.omit
    }

    /// Position last yielded, in region coordinates.
    pub fn region_pos(&self) -> &[Ix] {
        &self.inner.pos
    }
}

impl Iterator for PositionIter {
    type Item = Vec<Ix>;

    fn next(&mut self) -> Option<Vec<Ix>> {
        if !self.inner.next() {
            return None;
        }
        Some(
            self.inner
                .pos
                .iter()
                .zip(self.start.iter().zip(&self.step))
                .map(|(&p, (&s, &st))| (s + p as Ixs * st) as Ix)
                .collect(),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.inner.len();
        (len, Some(len))
    }
}

impl ExactSizeIterator for PositionIter {}
