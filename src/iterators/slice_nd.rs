// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use super::PositionIter;
use crate::error::Result;
use crate::slice::{Slice, SliceND};
use crate::{Ix, Ixs};

/// Enumerates the sub-regions of a region that span a chosen set of axes
/// and take a single index along every other axis.
#[derive(Clone, Debug)]
pub struct SliceNDIter {
    positions: PositionIter,
    region: SliceND,
    omit: Vec<bool>,
}

impl SliceNDIter {
    /// Sub-regions of `region` spanning `axes`.
    pub fn new(region: &SliceND, axes: &[Ixs]) -> Result<Self> {
        let inner = SliceND::full(region.shape());
        let positions = PositionIter::with_slice(&inner, axes)?;
        let omit = positions.omit().to_vec();
        Ok(SliceNDIter {
            positions,
            region: region.clone(),
            omit,
        })
    }

    /// Position last yielded, within the region; spanned axes read 0.
    pub fn pos(&self) -> &[Ix] {
        self.positions.region_pos()
    }

    /// Position last yielded on the axes that are iterated.
    pub fn used_pos(&self) -> Vec<Ix> {
        self.pos()
            .iter()
            .zip(&self.omit)
            .filter(|(_, &o)| !o)
            .map(|(&p, _)| p)
            .collect()
    }

    /// Shape of the grid of sub-regions, spanned axes removed.
    pub fn used_shape(&self) -> Vec<Ix> {
        self.region
            .shape()
            .iter()
            .zip(&self.omit)
            .filter(|(_, &o)| !o)
            .map(|(&d, _)| d)
            .collect()
    }
}

impl Iterator for SliceNDIter {
    type Item = SliceND;

    fn next(&mut self) -> Option<SliceND> {
        let pos = self.positions.next()?;
        let shape = self.region.shape();
        let slices: Vec<Slice> = (0..shape.len())
            .map(|i| {
                if self.omit[i] {
                    Slice::from(..)
                } else {
                    Slice::index(pos[i] as Ixs)
                }
            })
            .collect();
        let inner = SliceND::new(shape, &slices).ok()?;
        self.region.compose(&inner).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }
}
