// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use super::Baseiter;
use crate::error::{bail, DatasetError, Result};
use crate::layout::Geometry;
use crate::slice::SliceND;
use crate::{Ix, Ixs};

/// Walks a rectangular region of a view given per-axis start, stop and step.
#[derive(Clone, Debug)]
pub struct SliceIter {
    inner: Baseiter,
    start: Vec<Ixs>,
    step: Vec<Ixs>,
}

impl SliceIter {
    pub fn new(g: &Geometry, slice: &SliceND) -> Result<Self> {
        if slice.source_shape() != &g.shape[..] {
            bail!(DatasetError::shapes(slice.source_shape(), &g.shape));
        }
        let mut offset = g.offset as Ixs;
        if slice.size() > 0 {
            offset += slice
                .start()
                .iter()
                .zip(&g.strides)
                .map(|(&s, &st)| s * st)
                .sum::<Ixs>();
        }
        let strides = g
            .strides
            .iter()
            .zip(slice.step())
            .map(|(&st, &s)| st * s)
            .collect();
        Ok(SliceIter {
            inner: Baseiter::new(slice.shape().to_vec(), vec![(offset as usize, strides)]),
            start: slice.start().to_vec(),
            step: slice.step().to_vec(),
        })
    }

    /// Position within the region of the item last yielded.
    pub fn pos(&self) -> &[Ix] {
        &self.inner.pos
    }

    /// Position within the whole view of the item last yielded.
    pub fn source_pos(&self) -> Vec<Ix> {
        self.inner
            .pos
            .iter()
            .zip(self.start.iter().zip(&self.step))
            .map(|(&p, (&s, &st))| (s + p as Ixs * st) as Ix)
            .collect()
    }
}

impl Iterator for SliceIter {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.inner.next() {
            Some(self.inner.current[0] as usize)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.inner.len();
        (len, Some(len))
    }
}

impl ExactSizeIterator for SliceIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s;

    #[test]
    fn stepped_region() {
        let g = Geometry::dense(&[4, 5], 1);
        let slice = SliceND::new(&g.shape, &s![1..4;2, ..;-2]).unwrap();
        let mut it = SliceIter::new(&g, &slice).unwrap();
        assert_eq!(it.next(), Some(9));
        assert_eq!(it.source_pos(), vec![1, 4]);
        assert_eq!(it.collect::<Vec<_>>(), vec![7, 5, 19, 17, 15]);
    }

    #[test]
    fn shape_mismatch() {
        let g = Geometry::dense(&[4, 5], 1);
        let slice = SliceND::full(&[5, 4]);
        assert!(SliceIter::new(&g, &slice).is_err());
    }
}
