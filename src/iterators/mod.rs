// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Index iterators.
//!
//! Every iterator yields absolute buffer indices (or positions) and never
//! touches element data, so one traversal can drive reads from one buffer
//! and writes to another.

mod broadcast;
mod plain;
mod position;
mod slice_iter;
mod slice_nd;

pub use self::broadcast::{BroadcastPairIter, BroadcastTripleIter, PairIndex, TripleIndex};
pub use self::plain::IndexIter;
pub use self::position::PositionIter;
pub use self::slice_iter::SliceIter;
pub use self::slice_nd::SliceNDIter;

use crate::dimension::size;
use crate::{Ix, Ixs};

/// Base for index iterators
///
/// Walks `dim` in row-major order, last axis fastest, and keeps one running
/// buffer index per operand.
#[derive(Clone, Debug)]
pub(crate) struct Baseiter {
    // Can have pub fields because it is not itself pub.
    pub dim: Vec<Ix>,
    pub strides: Vec<Vec<Ixs>>,
    /// next position to yield
    pub index: Option<Vec<Ix>>,
    offsets: Vec<Ixs>,
    /// last yielded position and operand indices
    pub pos: Vec<Ix>,
    pub current: Vec<Ixs>,
    remaining: usize,
}

impl Baseiter {
    /// `operands` holds the start index and strides of each operand.
    pub fn new(dim: Vec<Ix>, operands: Vec<(usize, Vec<Ixs>)>) -> Baseiter {
        let remaining = size(&dim);
        let rank = dim.len();
        let (offsets, strides): (Vec<Ixs>, Vec<Vec<Ixs>>) = operands
            .into_iter()
            .map(|(o, s)| (o as Ixs, s))
            .unzip();
        Baseiter {
            index: if remaining == 0 { None } else { Some(vec![0; rank]) },
            current: offsets.clone(),
            offsets,
            strides,
            pos: vec![0; rank],
            dim,
            remaining,
        }
    }

    /// Step to the next position; `pos` and `current` then describe it.
    #[inline]
    pub fn next(&mut self) -> bool {
        let index = match self.index {
            None => return false,
            Some(ref mut ix) => ix,
        };
        self.pos.copy_from_slice(index);
        self.current.copy_from_slice(&self.offsets);
        self.remaining -= 1;

        for j in (0..self.dim.len()).rev() {
            index[j] += 1;
            for (off, s) in self.offsets.iter_mut().zip(&self.strides) {
                *off += s[j];
            }
            if index[j] < self.dim[j] {
                return true;
            }
            for (off, s) in self.offsets.iter_mut().zip(&self.strides) {
                *off -= s[j] * self.dim[j] as Ixs;
            }
            index[j] = 0;
        }
        self.index = None;
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.remaining
    }
}
