// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Metadata attached to datasets.
//!
//! A metadata value follows its host through slicing, reshaping and
//! transposition by implementing the matching hook of [`Metadata`]. Every
//! hook defaults to doing nothing, so a type only overrides the transforms
//! it takes part in. Hooks run on a copy of the value attached to the new
//! view or copy, never on the host's own value.

mod types;

pub use self::types::{AuxiliaryMetadata, AxesMetadata, ErrorMetadata, StatisticsMetadata};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use log::trace;

use crate::dimension::ReshapeMap;
use crate::element::Element;
use crate::error::{bail, DatasetError, Result};
use crate::slice::{Slice, SliceND};
use crate::Dataset;

/// Object-safe cloning and downcasting, implemented for every `Clone`
/// metadata type.
pub trait MetadataClone {
    fn clone_box(&self) -> Box<dyn Metadata>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Metadata + Clone> MetadataClone for T {
    fn clone_box(&self) -> Box<dyn Metadata> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A value attached to a dataset.
pub trait Metadata: MetadataClone + fmt::Debug + Send + Sync + 'static {
    /// The host was sliced by `slice`, given in the host's coordinates.
    fn on_slice(&mut self, _slice: &SliceND, _as_view: bool) -> Result<()> {
        Ok(())
    }

    /// The host was reshaped.
    fn on_reshape(&mut self, _map: &ReshapeMap) -> Result<()> {
        Ok(())
    }

    /// The host was transposed; new axis `i` is old axis `axes[i]`.
    fn on_transpose(&mut self, _axes: &[usize]) -> Result<()> {
        Ok(())
    }

    /// The host's data was mutated.
    fn on_dirty(&mut self) {}

    /// Dirty values are dropped when the host is copied or sliced.
    fn is_dirty(&self) -> bool {
        false
    }
}

impl Clone for Box<dyn Metadata> {
    fn clone(&self) -> Self {
        (**self).clone_box()
    }
}

/// Thread-safe store of metadata values keyed by their type.
#[derive(Default)]
pub(crate) struct MetadataStore {
    map: RwLock<HashMap<TypeId, Vec<Box<dyn Metadata>>>>,
}

impl MetadataStore {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, Vec<Box<dyn Metadata>>>> {
        self.map.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<TypeId, Vec<Box<dyn Metadata>>>> {
        self.map.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Attach `m`; with `clear`, values of the same type are replaced.
    pub fn add(&self, m: Box<dyn Metadata>, clear: bool) {
        let key = (*m).as_any().type_id();
        let mut map = self.write();
        let entry = map.entry(key).or_default();
        if clear {
            entry.clear();
        }
        entry.push(m);
    }

    pub fn get<T: Metadata + Clone>(&self) -> Vec<T> {
        self.read()
            .get(&TypeId::of::<T>())
            .map(|v| {
                v.iter()
                    .filter_map(|m| (**m).as_any().downcast_ref::<T>().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn first<T: Metadata + Clone>(&self) -> Option<T> {
        self.read()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.first())
            .and_then(|m| (**m).as_any().downcast_ref::<T>().cloned())
    }

    /// Run `f` on the first value of type `T`.
    pub fn update<T: Metadata, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut map = self.write();
        let m = map.get_mut(&TypeId::of::<T>())?.first_mut()?;
        (**m).as_any_mut().downcast_mut::<T>().map(f)
    }

    pub fn clear<T: Metadata>(&self) {
        self.write().remove(&TypeId::of::<T>());
    }

    pub fn clear_all(&self) {
        self.write().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.read().values().all(|v| v.is_empty())
    }

    /// Deep copy of every value that is not dirty.
    pub fn copy_clean(&self) -> MetadataStore {
        let map = self
            .read()
            .iter()
            .map(|(k, v)| (*k, v.iter().filter(|m| !m.is_dirty()).cloned().collect::<Vec<_>>()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        MetadataStore {
            map: RwLock::new(map),
        }
    }

    /// Apply a transform hook to every value.
    pub fn process(&self, mut f: impl FnMut(&mut dyn Metadata) -> Result<()>) -> Result<()> {
        let mut map = self.write();
        for m in map.values_mut().flatten() {
            trace!("propagating transform to {:?}", m);
            f(&mut **m)?;
        }
        Ok(())
    }

    pub fn dirty(&self) {
        let mut map = self.write();
        for m in map.values_mut().flatten() {
            m.on_dirty();
        }
    }
}

impl Clone for MetadataStore {
    fn clone(&self) -> Self {
        MetadataStore {
            map: RwLock::new(self.read().clone()),
        }
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.read().values().flatten())
            .finish()
    }
}

/// Slice an element-wise field along with its host.
///
/// The field must have the host's rank. An axis of length 1 where the host's
/// is longer is broadcast and keeps its single element.
pub fn slice_field<B: Element>(field: &Dataset<B>, slice: &SliceND, as_view: bool) -> Result<Dataset<B>> {
    let host = slice.source_shape();
    let shape = field.shape();
    if shape.len() != host.len() {
        bail!(DatasetError::shapes(shape, host));
    }
    let mut slices = Vec::with_capacity(shape.len());
    for (i, (&d, &h)) in shape.iter().zip(host).enumerate() {
        if d == h || (d > h && d != 1) {
            slices.push(slice.axis_slice(i));
        } else if d == 1 {
            slices.push(Slice::from(0..1));
        } else {
            bail!(DatasetError::shapes(shape, host));
        }
    }
    let s = SliceND::new(shape, &slices)?;
    if as_view {
        field.get_slice_view(&s)
    } else {
        field.get_slice(&s)
    }
}

/// Reshape an element-wise field along with its host.
pub fn reshape_field<B: Element>(field: &Dataset<B>, map: &ReshapeMap) -> Result<Dataset<B>> {
    let shape = map.reshape_shape(field.shape())?;
    field.reshape(&shape)
}

/// Transpose an element-wise field along with its host.
pub fn transpose_field<B: Element>(field: &Dataset<B>, axes: &[usize]) -> Result<Dataset<B>> {
    let axes: Vec<isize> = axes.iter().map(|&a| a as isize).collect();
    field.get_transposed_view(&axes)
}
