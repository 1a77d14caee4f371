// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use super::Baseiter;
use crate::layout::Geometry;
use crate::Ix;

/// Walks a whole view end to end, yielding the buffer index of each item.
#[derive(Clone, Debug)]
pub struct IndexIter {
    inner: Baseiter,
}

impl IndexIter {
    pub fn new(g: &Geometry) -> Self {
        IndexIter {
            inner: Baseiter::new(g.shape.clone(), vec![(g.offset, g.strides.clone())]),
        }
    }

    /// Position of the item last yielded.
    pub fn pos(&self) -> &[Ix] {
        &self.inner.pos
    }
}

impl Iterator for IndexIter {
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

impl ExactSizeIterator for IndexIter {}
