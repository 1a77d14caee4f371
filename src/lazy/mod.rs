// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lazy datasets: handles whose data is read from a [`Loader`] one region at
//! a time, and written through a [`Saver`].
//!
//! Slicing and transposing a lazy dataset reads nothing. The region and axis
//! order are remembered and applied when data is finally requested with
//! [`get_slice`](LazyDataset::get_slice).

mod events;
mod saver;
mod writeable;

pub use self::events::{DataEvent, DataListener, ListenerDelegate};
pub use self::saver::{AsyncSaver, InMemorySaver, Loader, Saver, ThreadedSaver};
pub use self::writeable::LazyWriteableDataset;

use std::fmt;
use std::io;
use std::sync::Arc;

use log::debug;

use crate::dimension::{
    broadcast_shapes, check_permutation, inverse_permutation, is_identity, pad_shape, permute, size,
};
use crate::element::Element;
use crate::error::{bail, DatasetError, Result};
use crate::impl_methods::sliced_name;
use crate::metadata::{ErrorMetadata, Metadata, MetadataStore};
use crate::slice::{Slice, SliceND};
use crate::{Dataset, Ix, Ixs};

/// Read access to data by region, shared by in-memory and lazy datasets.
pub trait LazySource<A: Element> {
    fn name(&self) -> &str;
    fn shape(&self) -> &[Ix];
    fn item_size(&self) -> usize;

    /// Return a dense copy of a region.
    fn get_slice(&self, slice: &SliceND) -> Result<Dataset<A>>;

    fn rank(&self) -> usize {
        self.shape().len()
    }

    fn size(&self) -> usize {
        size(self.shape())
    }
}

impl<A: Element> LazySource<A> for Dataset<A> {
    fn name(&self) -> &str {
        Dataset::name(self)
    }

    fn shape(&self) -> &[Ix] {
        Dataset::shape(self)
    }

    fn item_size(&self) -> usize {
        Dataset::item_size(self)
    }

    fn get_slice(&self, slice: &SliceND) -> Result<Dataset<A>> {
        Dataset::get_slice(self, slice)
    }
}

/// A read-only lazy dataset.
///
/// A lazy view keeps the region of the loader's data it covers and, when
/// transposed, the order in which it presents the region's axes.
pub struct LazyDataset<A: Element> {
    name: String,
    shape: Vec<Ix>,
    item_size: usize,
    loader: Option<Arc<dyn Loader<A>>>,
    /// Region of the loader's data, in the loader's coordinates.
    base: Option<SliceND>,
    /// Axis `i` of this view is axis `perm[i]` of `base`.
    perm: Option<Vec<usize>>,
    metadata: MetadataStore,
}

impl<A: Element> LazyDataset<A> {
    /// A lazy dataset of `shape` read through `loader`.
    pub fn new(loader: Arc<dyn Loader<A>>, name: &str, item_size: usize, shape: &[Ix]) -> Self {
        LazyDataset {
            name: name.to_string(),
            shape: shape.to_vec(),
            item_size,
            loader: Some(loader),
            base: None,
            perm: None,
            metadata: MetadataStore::default(),
        }
    }

    /// A lazy dataset with nothing to read from yet.
    pub fn without_loader(name: &str, item_size: usize, shape: &[Ix]) -> Self {
        LazyDataset {
            name: name.to_string(),
            shape: shape.to_vec(),
            item_size,
            loader: None,
            base: None,
            perm: None,
            metadata: MetadataStore::default(),
        }
    }

    /// Present in-memory data through the lazy interface.
    pub fn from_dataset(data: Dataset<A>) -> Self {
        let name = data.name().to_string();
        let (item_size, shape) = (data.item_size(), data.shape().to_vec());
        LazyDataset::new(Arc::new(InMemorySaver::new(data)), &name, item_size, &shape)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn shape(&self) -> &[Ix] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        size(&self.shape)
    }

    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn set_loader(&mut self, loader: Arc<dyn Loader<A>>) {
        self.loader = Some(loader);
    }

    /// Region of the loader's data this dataset covers.
    fn base(&self) -> SliceND {
        match self.base {
            Some(ref b) => b.clone(),
            None => SliceND::full(&self.base_shape()),
        }
    }

    fn base_shape(&self) -> Vec<Ix> {
        match self.perm {
            Some(ref p) => permute(&self.shape, &inverse_permutation(p)),
            None => self.shape.clone(),
        }
    }

    /// `slice`, given in this dataset's coordinates, as a region of the
    /// loader's data.
    fn to_source(&self, slice: &SliceND) -> Result<SliceND> {
        if slice.source_shape() != &self.shape[..] {
            bail!(DatasetError::shapes(slice.source_shape(), &self.shape));
        }
        let inner = match self.perm {
            Some(ref p) => slice.permuted(&inverse_permutation(p)),
            None => slice.clone(),
        };
        match self.base {
            Some(ref b) => b.compose(&inner),
            None => Ok(inner),
        }
    }

    fn derive_metadata<F>(&self, f: F) -> Result<MetadataStore>
    where
        F: FnMut(&mut dyn Metadata) -> Result<()>,
    {
        let store = self.metadata.copy_clean();
        store.process(f)?;
        Ok(store)
    }

    /// Read a region into a new dense dataset.
    pub fn get_slice(&self, slice: &SliceND) -> Result<Dataset<A>> {
        let region = self.to_source(slice)?;
        let name = sliced_name(&self.name, slice);
        let loader = match self.loader {
            Some(ref l) => l,
            None => bail!(DatasetError::io(
                format!("reading {}", name),
                io::Error::new(io::ErrorKind::NotFound, "no loader"),
            )),
        };
        debug!("loading {} as {}", name, region);
        let mut data = loader
            .get_dataset(&region)
            .map_err(|e| DatasetError::io(format!("reading {}", name), e))?;
        if data.shape() != region.shape() {
            data = data.reshape(region.shape())?;
        }
        if let Some(ref p) = self.perm {
            let axes: Vec<Ixs> = p.iter().map(|&a| a as Ixs).collect();
            data = data.get_transposed_view(&axes)?.to_dense();
        }
        data.name = name;
        data.metadata = self.derive_metadata(|m| m.on_slice(slice, false))?;
        Ok(data)
    }

    pub fn slice(&self, slices: &[Slice]) -> Result<Dataset<A>> {
        self.get_slice(&SliceND::new(&self.shape, slices)?)
    }

    /// Read a region given by optional start, stop and step arrays.
    pub fn get_slice_from_arrays(
        &self,
        start: Option<&[Ixs]>,
        stop: Option<&[Ixs]>,
        step: Option<&[Ixs]>,
    ) -> Result<Dataset<A>> {
        self.get_slice(&SliceND::from_arrays(&self.shape, start, stop, step)?)
    }

    /// Read everything.
    pub fn get_all(&self) -> Result<Dataset<A>> {
        self.get_slice(&SliceND::full(&self.shape))
    }

    /// A lazy view of a region. Nothing is read.
    pub fn get_slice_view(&self, slice: &SliceND) -> Result<LazyDataset<A>> {
        let region = self.to_source(slice)?;
        debug!("lazy view {}", sliced_name(&self.name, slice));
        Ok(LazyDataset {
            name: sliced_name(&self.name, slice),
            shape: slice.shape().to_vec(),
            item_size: self.item_size,
            loader: self.loader.clone(),
            base: Some(region),
            perm: self.perm.clone(),
            metadata: self.derive_metadata(|m| m.on_slice(slice, true))?,
        })
    }

    pub fn slice_view(&self, slices: &[Slice]) -> Result<LazyDataset<A>> {
        self.get_slice_view(&SliceND::new(&self.shape, slices)?)
    }

    /// A lazy view with axes reordered; empty `axes` reverses them.
    pub fn get_transposed_view(&self, axes: &[Ixs]) -> Result<LazyDataset<A>> {
        let p = check_permutation(self.rank(), axes)?;
        let mut out = self.clone();
        if is_identity(&p) {
            return Ok(out);
        }
        let perm = match self.perm {
            Some(ref old) => permute(old, &p),
            None => p.clone(),
        };
        out.base = Some(self.base());
        out.perm = if is_identity(&perm) { None } else { Some(perm) };
        out.shape = permute(&self.shape, &p);
        out.metadata = self.derive_metadata(|m| m.on_transpose(&p))?;
        Ok(out)
    }

    pub fn transpose(&self, axes: &[Ixs]) -> Result<LazyDataset<A>> {
        self.get_transposed_view(axes)
    }

    pub fn set_metadata<M: Metadata>(&self, m: M) {
        self.metadata.add(Box::new(m), true);
    }

    pub fn add_metadata<M: Metadata>(&self, m: M) {
        self.metadata.add(Box::new(m), false);
    }

    pub fn metadata<M: Metadata + Clone>(&self) -> Vec<M> {
        self.metadata.get::<M>()
    }

    pub fn first_metadata<M: Metadata + Clone>(&self) -> Option<M> {
        self.metadata.first::<M>()
    }

    pub fn clear_metadata<M: Metadata>(&self) {
        self.metadata.clear::<M>();
    }

    /// Attach errors broadcastable to this dataset's shape.
    pub fn set_errors<E: Element>(&self, errors: &Dataset<E>) -> Result<()> {
        if errors.rank() > self.rank() || broadcast_shapes(errors.shape(), &self.shape)? != self.shape {
            bail!(DatasetError::shapes(errors.shape(), &self.shape));
        }
        let padded = pad_shape(errors.shape(), self.rank());
        let e = errors.cast::<f64>().reshape(&padded)?;
        self.set_metadata(ErrorMetadata::new(e));
        Ok(())
    }

    pub fn errors(&self) -> Option<Dataset<f64>> {
        self.metadata
            .first::<ErrorMetadata>()
            .map(|m| m.errors().clone())
    }

    pub fn has_errors(&self) -> bool {
        self.metadata.first::<ErrorMetadata>().is_some()
    }

    /// Change the shape. Only allowed before any view was taken.
    pub(crate) fn grow_to(&mut self, shape: &[Ix]) {
        debug!("{} grows from {:?} to {:?}", self.name, self.shape, shape);
        self.shape = shape.to_vec();
    }
}

impl<A: Element> LazySource<A> for LazyDataset<A> {
    fn name(&self) -> &str {
        LazyDataset::name(self)
    }

    fn shape(&self) -> &[Ix] {
        LazyDataset::shape(self)
    }

    fn item_size(&self) -> usize {
        LazyDataset::item_size(self)
    }

    fn get_slice(&self, slice: &SliceND) -> Result<Dataset<A>> {
        LazyDataset::get_slice(self, slice)
    }
}

impl<A: Element> Clone for LazyDataset<A> {
    fn clone(&self) -> Self {
        LazyDataset {
            name: self.name.clone(),
            shape: self.shape.clone(),
            item_size: self.item_size,
            loader: self.loader.clone(),
            base: self.base.clone(),
            perm: self.perm.clone(),
            metadata: self.metadata.copy_clean(),
        }
    }
}

impl<A: Element> fmt::Debug for LazyDataset<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyDataset")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("item_size", &self.item_size)
            .field("base", &self.base)
            .field("perm", &self.perm)
            .finish()
    }
}
