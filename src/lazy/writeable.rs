// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fmt;
use std::sync::Arc;

use log::debug;

use super::events::{DataEvent, DataListener, ListenerDelegate};
use super::saver::{InMemorySaver, Loader, Saver};
use super::{LazyDataset, LazySource};
use crate::element::Element;
use crate::error::{bail, DatasetError, Result};
use crate::impl_methods::sliced_name;
use crate::slice::{Slice, SliceND, UNLIMITED};
use crate::{Dataset, Ix, Ixs};

/// A lazy dataset that can be written to, and grown along axes whose
/// maximum length allows it.
///
/// Writes go to the [`Saver`]; listeners receive a [`DataEvent`] after each
/// one. Views taken with [`get_slice_view`](Self::get_slice_view) and
/// [`get_transposed_view`](Self::get_transposed_view) are read-only.
pub struct LazyWriteableDataset<A: Element> {
    lazy: LazyDataset<A>,
    max_shape: Vec<Ix>,
    chunks: Option<Vec<Ix>>,
    fill: A,
    write_async: bool,
    saver: Option<Arc<dyn Saver<A>>>,
    listeners: ListenerDelegate,
}

fn check_shapes(shape: &[Ix], max_shape: &[Ix], chunks: Option<&[Ix]>) -> Result<()> {
    if max_shape.len() != shape.len() || max_shape.iter().zip(shape).any(|(&m, &d)| m < d) {
        bail!(DatasetError::shapes(shape, max_shape));
    }
    if let Some(c) = chunks {
        if c.len() != shape.len() || c.contains(&0) {
            bail!(DatasetError::shapes(shape, c));
        }
    }
    Ok(())
}

impl<A: Element> LazyWriteableDataset<A> {
    /// A dataset stored by `saver`, which also serves reads.
    ///
    /// `max_shape` defaults to `shape`, so nothing can grow; use
    /// [`UNLIMITED`] for an axis without bound.
    pub fn new<S>(
        saver: Arc<S>,
        name: &str,
        item_size: usize,
        shape: &[Ix],
        max_shape: Option<&[Ix]>,
        chunks: Option<&[Ix]>,
    ) -> Result<Self>
    where
        S: Saver<A> + 'static,
    {
        let mut out = Self::without_saver(name, item_size, shape, max_shape, chunks)?;
        out.set_saver(saver);
        Ok(out)
    }

    /// A dataset with no saver yet. Writes fail with `NotWritable` until one
    /// is set.
    pub fn without_saver(
        name: &str,
        item_size: usize,
        shape: &[Ix],
        max_shape: Option<&[Ix]>,
        chunks: Option<&[Ix]>,
    ) -> Result<Self> {
        let max_shape = max_shape.unwrap_or(shape);
        check_shapes(shape, max_shape, chunks)?;
        Ok(LazyWriteableDataset {
            lazy: LazyDataset::without_loader(name, item_size, shape),
            max_shape: max_shape.to_vec(),
            chunks: chunks.map(|c| c.to_vec()),
            fill: A::zero(),
            write_async: false,
            saver: None,
            listeners: ListenerDelegate::default(),
        })
    }

    /// Keep `data` in memory behind the lazy interface.
    pub fn from_dataset(data: Dataset<A>, max_shape: Option<&[Ix]>) -> Result<Self> {
        let name = data.name().to_string();
        let (item_size, shape) = (data.item_size(), data.shape().to_vec());
        Self::new(
            Arc::new(InMemorySaver::new(data)),
            &name,
            item_size,
            &shape,
            max_shape,
            None,
        )
    }

    /// Set the saver, which also becomes the loader.
    pub fn set_saver<S>(&mut self, saver: Arc<S>)
    where
        S: Saver<A> + 'static,
    {
        saver.set_fill_value(self.fill);
        let loader: Arc<dyn Loader<A>> = saver.clone();
        self.lazy.set_loader(loader);
        self.saver = Some(saver);
    }

    pub fn name(&self) -> &str {
        self.lazy.name()
    }

    pub fn shape(&self) -> &[Ix] {
        self.lazy.shape()
    }

    pub fn rank(&self) -> usize {
        self.lazy.rank()
    }

    pub fn size(&self) -> usize {
        self.lazy.size()
    }

    pub fn item_size(&self) -> usize {
        self.lazy.item_size()
    }

    pub fn max_shape(&self) -> &[Ix] {
        &self.max_shape
    }

    pub fn chunking(&self) -> Option<&[Ix]> {
        self.chunks.as_deref()
    }

    pub fn fill_value(&self) -> A {
        self.fill
    }

    pub fn set_fill_value(&mut self, fill: A) {
        self.fill = fill;
        if let Some(ref s) = self.saver {
            s.set_fill_value(fill);
        }
    }

    pub fn is_writing_async(&self) -> bool {
        self.write_async
    }

    /// Hand writes to the saver without waiting, if it can take them.
    pub fn set_writing_async(&mut self, write_async: bool) {
        self.write_async = write_async;
    }

    pub fn add_listener(&self, listener: Arc<dyn DataListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn DataListener>) {
        self.listeners.remove(listener);
    }

    /// The read side of this dataset.
    pub fn as_lazy(&self) -> &LazyDataset<A> {
        &self.lazy
    }

    /// Resolve slices against the current shape, letting them reach up to
    /// the maximum shape.
    pub fn slice_nd(&self, slices: &[Slice]) -> Result<SliceND> {
        SliceND::with_max_shape(self.shape(), &self.max_shape, slices)
    }

    pub fn get_slice(&self, slice: &SliceND) -> Result<Dataset<A>> {
        self.lazy.get_slice(slice)
    }

    pub fn slice(&self, slices: &[Slice]) -> Result<Dataset<A>> {
        self.lazy.slice(slices)
    }

    pub fn get_all(&self) -> Result<Dataset<A>> {
        self.lazy.get_all()
    }

    pub fn get_slice_view(&self, slice: &SliceND) -> Result<LazyDataset<A>> {
        self.lazy.get_slice_view(slice)
    }

    pub fn get_transposed_view(&self, axes: &[Ixs]) -> Result<LazyDataset<A>> {
        self.lazy.get_transposed_view(axes)
    }

    pub fn set_errors<E: Element>(&self, errors: &Dataset<E>) -> Result<()> {
        self.lazy.set_errors(errors)
    }

    pub fn errors(&self) -> Option<Dataset<f64>> {
        self.lazy.errors()
    }

    /// Write `data` to a region, asynchronously if so configured.
    ///
    /// `data` may have the region's shape, its size, or broadcast to it. A
    /// region reaching past the current shape grows the dataset.
    pub fn set_slice(&mut self, slice: &SliceND, data: &Dataset<A>) -> Result<()> {
        self.write(slice, data, self.write_async)
    }

    /// Write `data` to a region and wait until it is stored.
    pub fn set_slice_sync(&mut self, slice: &SliceND, data: &Dataset<A>) -> Result<()> {
        self.write(slice, data, false)
    }

    /// Write `data` to a region given by optional start, stop and step
    /// arrays.
    pub fn set_slice_from_arrays(
        &mut self,
        data: &Dataset<A>,
        start: Option<&[Ixs]>,
        stop: Option<&[Ixs]>,
        step: Option<&[Ixs]>,
    ) -> Result<()> {
        let slices = SliceND::zip_arrays(self.rank(), start, stop, step)?;
        let slice = self.slice_nd(&slices)?;
        self.set_slice(&slice, data)
    }

    /// Wait for writes handed to an asynchronous saver.
    pub fn flush(&self) -> Result<()> {
        if let Some(a) = self.saver.as_ref().and_then(|s| s.as_async()) {
            a.flush()
                .map_err(|e| DatasetError::io(format!("flushing {}", self.name()), e))?;
        }
        Ok(())
    }

    fn check_region(&self, slice: &SliceND) -> Result<()> {
        let shape = self.shape();
        let source = slice.source_shape();
        let fits = source.len() == shape.len()
            && source
                .iter()
                .zip(shape)
                .zip(&self.max_shape)
                .all(|((&s, &d), &m)| s == d || (slice.is_expanded() && s > d && (m == UNLIMITED || s <= m)));
        if !fits {
            bail!(DatasetError::shapes(source, shape));
        }
        Ok(())
    }

    fn write(&mut self, slice: &SliceND, data: &Dataset<A>, write_async: bool) -> Result<()> {
        self.check_region(slice)?;
        let saver = match self.saver {
            Some(ref s) => s,
            None => bail!(DatasetError::NotWritable(format!("{} has no saver", self.name()))),
        };
        if !saver.is_file_writeable() {
            bail!(DatasetError::NotWritable(format!("saver of {} refuses writes", self.name())));
        }
        if slice.size() == 0 {
            return Ok(());
        }
        let name = sliced_name(self.name(), slice);
        let mut dense = Dataset::zeros_compound(self.item_size(), slice.shape())?;
        dense.set_slice(&SliceND::full(slice.shape()), data)?;

        let stored = match saver.as_async() {
            Some(a) if write_async => {
                debug!("writing {} asynchronously", name);
                a.set_slice_async(slice.clone(), dense)
            }
            _ => {
                debug!("writing {}", name);
                saver.set_slice(slice, &dense)
            }
        };
        stored.map_err(|e| DatasetError::io(format!("writing {}", name), e))?;

        if slice.source_shape() != self.shape() {
            self.lazy.grow_to(slice.source_shape());
        }
        self.listeners.fire(&DataEvent {
            name: self.name().to_string(),
            shape: self.shape().to_vec(),
        });
        Ok(())
    }
}

impl<A: Element> LazySource<A> for LazyWriteableDataset<A> {
    fn name(&self) -> &str {
        self.lazy.name()
    }

    fn shape(&self) -> &[Ix] {
        self.lazy.shape()
    }

    fn item_size(&self) -> usize {
        self.lazy.item_size()
    }

    fn get_slice(&self, slice: &SliceND) -> Result<Dataset<A>> {
        self.lazy.get_slice(slice)
    }
}

impl<A: Element> fmt::Debug for LazyWriteableDataset<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyWriteableDataset")
            .field("name", &self.name())
            .field("shape", &self.shape())
            .field("max_shape", &self.max_shape)
            .field("chunks", &self.chunks)
            .field("write_async", &self.write_async)
            .field("listeners", &self.listeners)
            .finish()
    }
}
