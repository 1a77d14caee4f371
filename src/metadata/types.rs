// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::collections::BTreeMap;

use super::{reshape_field, slice_field, transpose_field, Metadata};
use crate::dimension::{normalize_axis, permute, ReshapeMap};
use crate::element::Element;
use crate::error::{bail, DatasetError, Result};
use crate::slice::SliceND;
use crate::{Dataset, Ix, Ixs};

/// Per-element errors of the host, possibly with broadcast (length 1) axes.
#[derive(Clone, Debug)]
pub struct ErrorMetadata {
    errors: Dataset<f64>,
}

impl ErrorMetadata {
    pub fn new(errors: Dataset<f64>) -> Self {
        ErrorMetadata { errors }
    }

    pub fn errors(&self) -> &Dataset<f64> {
        &self.errors
    }
}

impl Metadata for ErrorMetadata {
    fn on_slice(&mut self, slice: &SliceND, as_view: bool) -> Result<()> {
        self.errors = slice_field(&self.errors, slice, as_view)?;
        Ok(())
    }

    fn on_reshape(&mut self, map: &ReshapeMap) -> Result<()> {
        self.errors = reshape_field(&self.errors, map)?;
        Ok(())
    }

    fn on_transpose(&mut self, axes: &[usize]) -> Result<()> {
        self.errors = transpose_field(&self.errors, axes)?;
        Ok(())
    }
}

/// Axis values, any number per axis.
///
/// Each axis dataset has the host's rank with length 1 on every axis but its
/// own, so it slices, reshapes and transposes like an element-wise field.
#[derive(Clone, Debug)]
pub struct AxesMetadata {
    shape: Vec<Ix>,
    axes: Vec<Vec<Dataset<f64>>>,
}

impl AxesMetadata {
    /// Empty axes for a host of `shape`.
    pub fn new(shape: &[Ix]) -> Self {
        AxesMetadata {
            shape: shape.to_vec(),
            axes: vec![Vec::new(); shape.len()],
        }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Add a one-dimensional dataset of values for `axis`.
    pub fn add_axis<B: Element>(&mut self, axis: Ixs, values: &Dataset<B>) -> Result<()> {
        let axis = normalize_axis(axis, self.rank())?;
        let n = self.shape[axis];
        if values.size() != n && values.size() != 1 {
            bail!(DatasetError::shapes(values.shape(), &[n]));
        }
        let mut shape = vec![1; self.rank()];
        shape[axis] = values.size();
        self.axes[axis].push(values.cast::<f64>().reshape(&shape)?);
        Ok(())
    }

    /// Replace the values of `axis`.
    pub fn set_axis<B: Element>(&mut self, axis: Ixs, values: &Dataset<B>) -> Result<()> {
        let a = normalize_axis(axis, self.rank())?;
        let old = std::mem::take(&mut self.axes[a]);
        if let Err(e) = self.add_axis(axis, values) {
            self.axes[a] = old;
            return Err(e);
        }
        Ok(())
    }

    /// Datasets attached to `axis`.
    pub fn axis(&self, axis: Ixs) -> Result<&[Dataset<f64>]> {
        let axis = normalize_axis(axis, self.rank())?;
        Ok(&self.axes[axis])
    }
}

impl Metadata for AxesMetadata {
    fn on_slice(&mut self, slice: &SliceND, as_view: bool) -> Result<()> {
        for d in self.axes.iter_mut().flatten() {
            *d = slice_field(d, slice, as_view)?;
        }
        self.shape = slice.shape().to_vec();
        Ok(())
    }

    fn on_reshape(&mut self, map: &ReshapeMap) -> Result<()> {
        let entries: Vec<Option<Vec<Dataset<f64>>>> =
            self.axes.drain(..).map(Some).collect();
        let mut axes = Vec::with_capacity(map.to_shape().len());
        for entry in map.remap_axes(&entries)? {
            let mut list = Vec::new();
            for d in entry.unwrap_or_default() {
                list.push(reshape_field(&d, map)?);
            }
            axes.push(list);
        }
        self.axes = axes;
        self.shape = map.to_shape().to_vec();
        Ok(())
    }

    fn on_transpose(&mut self, axes: &[usize]) -> Result<()> {
        let mut permuted = permute(&self.axes, axes);
        for d in permuted.iter_mut().flatten() {
            *d = transpose_field(d, axes)?;
        }
        self.axes = permuted;
        self.shape = permute(&self.shape, axes);
        Ok(())
    }
}

/// Cached summary values of the host's data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticsMetadata {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub sum: f64,
    pub count: usize,
    dirty: bool,
    /// Buffer generation the values were computed at.
    generation: usize,
}

impl StatisticsMetadata {
    /// Summarise every scalar element; NaNs are skipped for max and min.
    pub fn compute<A: Element>(data: &Dataset<A>) -> Self {
        let mut stats = StatisticsMetadata {
            generation: data.buffer.generation(),
            ..StatisticsMetadata::default()
        };
        for v in data.to_vec() {
            let v = v.to_f64();
            stats.sum += v;
            stats.count += 1;
            if !v.is_nan() {
                stats.max = Some(stats.max.map_or(v, |m| m.max(v)));
                stats.min = Some(stats.min.map_or(v, |m| m.min(v)));
            }
        }
        stats
    }

    /// Whether the values still describe `data`, which no handle on its
    /// buffer has written to since they were computed.
    pub fn is_current<A: Element>(&self, data: &Dataset<A>) -> bool {
        !self.dirty && self.generation == data.buffer.generation()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

impl Metadata for StatisticsMetadata {
    fn on_slice(&mut self, _slice: &SliceND, _as_view: bool) -> Result<()> {
        self.dirty = true;
        Ok(())
    }

    fn on_dirty(&mut self) {
        self.dirty = true;
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Named element-wise datasets that travel with the host.
#[derive(Clone, Debug, Default)]
pub struct AuxiliaryMetadata {
    entries: BTreeMap<String, Dataset<f64>>,
}

impl AuxiliaryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<B: Element>(&mut self, name: &str, data: &Dataset<B>) {
        self.entries.insert(name.to_string(), data.cast::<f64>());
    }

    pub fn get(&self, name: &str) -> Option<&Dataset<f64>> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }
}

impl Metadata for AuxiliaryMetadata {
    fn on_slice(&mut self, slice: &SliceND, as_view: bool) -> Result<()> {
        for d in self.entries.values_mut() {
            *d = slice_field(d, slice, as_view)?;
        }
        Ok(())
    }

    fn on_reshape(&mut self, map: &ReshapeMap) -> Result<()> {
        for d in self.entries.values_mut() {
            *d = reshape_field(d, map)?;
        }
        Ok(())
    }

    fn on_transpose(&mut self, axes: &[usize]) -> Result<()> {
        for d in self.entries.values_mut() {
            *d = transpose_field(d, axes)?;
        }
        Ok(())
    }
}
