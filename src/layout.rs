// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::borrow::Cow;

use crate::dimension::{default_strides, stride_offset};
use crate::{Ix, Ixs};

/// How a logical index maps onto the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout {
    /// Row-major and contiguous from the offset.
    Dense,
    /// Explicit per-axis element strides, possibly zero or negative.
    Strided(Vec<Ixs>),
}

impl Layout {
    /// `Dense` when `strides` are the row-major ones for `shape`.
    pub fn from_strides(shape: &[Ix], item_size: usize, strides: Vec<Ixs>) -> Layout {
        if strides == default_strides(shape, item_size) {
            Layout::Dense
        } else {
            Layout::Strided(strides)
        }
    }

    pub fn is_dense(&self) -> bool {
        matches!(self, Layout::Dense)
    }

    pub fn strides<'a>(&'a self, shape: &[Ix], item_size: usize) -> Cow<'a, [Ixs]> {
        match self {
            Layout::Dense => Cow::Owned(default_strides(shape, item_size)),
            Layout::Strided(s) => Cow::Borrowed(s),
        }
    }
}

/// Shape, item size, offset and strides of a view, detached from its buffer.
///
/// Iterators are built from this so they never touch element data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub shape: Vec<Ix>,
    pub item_size: usize,
    pub offset: usize,
    pub strides: Vec<Ixs>,
}

impl Geometry {
    pub fn dense(shape: &[Ix], item_size: usize) -> Self {
        Geometry {
            shape: shape.to_vec(),
            item_size,
            offset: 0,
            strides: default_strides(shape, item_size),
        }
    }

    /// Absolute buffer index of the item at `pos`.
    #[inline]
    pub fn index_of(&self, pos: &[Ix]) -> usize {
        (self.offset as Ixs + stride_offset(pos, &self.strides)) as usize
    }

    pub fn is_dense(&self) -> bool {
        self.strides == default_strides(&self.shape, self.item_size)
    }
}
