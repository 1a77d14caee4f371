// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fmt;
use std::sync::RwLockReadGuard;

use num_complex::Complex64;

use crate::buffer::{allocate, element_count, with_capacity, SharedBuffer};
use crate::dimension::{check_position, size};
use crate::element::{cast, complex_from_item, complex_to_item, Element};
use crate::error::{bail, DatasetError, Result};
use crate::iterators::{IndexIter, SliceIter};
use crate::layout::{Geometry, Layout};
use crate::metadata::MetadataStore;
use crate::slice::SliceND;
use crate::{Ix, Ixs};

/// An n-dimensional dataset of scalar or compound items.
///
/// A dataset is a view onto a shared root buffer: its shape, item size,
/// offset and [`Layout`] say where each item lives. Views made with
/// [`get_slice_view`](Self::get_slice_view), [`view`](Self::view),
/// transposition and friends alias the buffer, so writing through one is
/// visible through all. [`Clone`] and [`get_slice`](Self::get_slice) make
/// a dense copy with a buffer of its own.
///
/// An item is `item_size` consecutive scalar elements; a plain dataset has
/// item size 1.
pub struct Dataset<A> {
    pub(crate) name: String,
    pub(crate) shape: Vec<Ix>,
    pub(crate) item_size: usize,
    pub(crate) offset: usize,
    pub(crate) layout: Layout,
    pub(crate) buffer: SharedBuffer<A>,
    pub(crate) is_view: bool,
    pub(crate) metadata: MetadataStore,
}

impl<A: Element> Dataset<A> {
    pub(crate) fn from_parts(shape: &[Ix], item_size: usize, data: Vec<A>) -> Dataset<A> {
        Dataset {
            name: String::new(),
            shape: shape.to_vec(),
            item_size,
            offset: 0,
            layout: Layout::Dense,
            buffer: SharedBuffer::new(data),
            is_view: false,
            metadata: MetadataStore::default(),
        }
    }

    /// A dataset sharing this one's buffer with the given geometry.
    pub(crate) fn with_geometry(&self, shape: Vec<Ix>, offset: usize, strides: Vec<Ixs>) -> Dataset<A> {
        let layout = Layout::from_strides(&shape, self.item_size, strides);
        Dataset {
            name: self.name.clone(),
            shape,
            item_size: self.item_size,
            offset,
            layout,
            buffer: self.buffer.clone(),
            is_view: true,
            metadata: MetadataStore::default(),
        }
    }

    /// Create a dataset of zeros.
    pub fn zeros(shape: &[Ix]) -> Result<Self> {
        Self::zeros_compound(1, shape)
    }

    /// Create a dataset of zeros whose items hold `item_size` elements.
    pub fn zeros_compound(item_size: usize, shape: &[Ix]) -> Result<Self> {
        if item_size == 0 {
            bail!(DatasetError::IncompatibleItemSize { a: 0, b: 1 });
        }
        let data = allocate(shape, item_size, A::zero())?;
        Ok(Self::from_parts(shape, item_size, data))
    }

    /// Create a dataset with every element set to `elem`.
    pub fn from_elem(shape: &[Ix], elem: A) -> Result<Self> {
        let data = allocate(shape, 1, elem)?;
        Ok(Self::from_parts(shape, 1, data))
    }

    /// Create a dataset from row-major data.
    ///
    /// **Errors** if `data.len()` is not the size of `shape`.
    pub fn from_vec(shape: &[Ix], data: Vec<A>) -> Result<Self> {
        Self::from_compound_vec(1, shape, data)
    }

    /// Create a compound dataset from row-major data, `item_size` elements
    /// per item.
    pub fn from_compound_vec(item_size: usize, shape: &[Ix], data: Vec<A>) -> Result<Self> {
        if item_size == 0 {
            bail!(DatasetError::IncompatibleItemSize { a: 0, b: 1 });
        }
        if element_count(shape, item_size)? != data.len() {
            bail!(DatasetError::shapes(shape, &[data.len() / item_size]));
        }
        Ok(Self::from_parts(shape, item_size, data))
    }

    /// Create a dataset by calling `f` with each position, in row-major order.
    pub fn from_shape_fn<F>(shape: &[Ix], mut f: F) -> Result<Self>
    where
        F: FnMut(&[Ix]) -> A,
    {
        let mut data = with_capacity(shape, 1)?;
        let mut it = IndexIter::new(&Geometry::dense(shape, 1));
        while it.next().is_some() {
            data.push(f(it.pos()));
        }
        Ok(Self::from_parts(shape, 1, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Builder form of [`set_name`](Self::set_name).
    pub fn with_name(mut self, name: &str) -> Self {
        self.set_name(name);
        self
    }

    pub fn shape(&self) -> &[Ix] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of items.
    pub fn size(&self) -> usize {
        size(&self.shape)
    }

    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn is_compound(&self) -> bool {
        self.item_size > 1
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Buffer index of the first item.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Element strides, explicit even for a dense layout.
    pub fn strides(&self) -> Vec<Ixs> {
        self.layout.strides(&self.shape, self.item_size).into_owned()
    }

    /// Whether this dataset was derived from another and shares its buffer.
    pub fn is_view(&self) -> bool {
        self.is_view
    }

    /// Whether the two datasets read and write the same buffer.
    pub fn shares_buffer<B>(&self, other: &Dataset<B>) -> bool {
        self.buffer.id() == other.buffer.id()
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            shape: self.shape.clone(),
            item_size: self.item_size,
            offset: self.offset,
            strides: self.strides(),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<A>> {
        self.buffer.read()
    }

    /// Iterate the buffer index of every item in row-major order.
    pub fn indices(&self) -> IndexIter {
        IndexIter::new(&self.geometry())
    }

    fn index_of(&self, pos: &[Ix]) -> Result<usize> {
        check_position(pos, &self.shape)?;
        Ok(self.geometry().index_of(pos))
    }

    /// First element of the item at `pos`.
    pub fn get(&self, pos: &[Ix]) -> Result<A> {
        let i = self.index_of(pos)?;
        Ok(self.read()[i])
    }

    /// Every element of the item at `pos`.
    pub fn get_item(&self, pos: &[Ix]) -> Result<Vec<A>> {
        let i = self.index_of(pos)?;
        Ok(self.read()[i..i + self.item_size].to_vec())
    }

    pub fn get_f64(&self, pos: &[Ix]) -> Result<f64> {
        self.get(pos).map(Element::to_f64)
    }

    /// Element at an absolute buffer index.
    pub fn get_abs(&self, index: usize) -> Result<A> {
        let data = self.read();
        data.get(index).copied().ok_or_else(|| DatasetError::OutOfBounds {
            pos: vec![index],
            shape: vec![data.len()],
        })
    }

    /// Set the first element of the item at `pos`.
    pub fn set(&mut self, pos: &[Ix], value: A) -> Result<()> {
        let i = self.index_of(pos)?;
        self.buffer.write()[i] = value;
        self.set_dirty();
        Ok(())
    }

    /// Set every element of the item at `pos`.
    pub fn set_item(&mut self, pos: &[Ix], item: &[A]) -> Result<()> {
        if item.len() != self.item_size {
            bail!(DatasetError::IncompatibleItemSize {
                a: self.item_size,
                b: item.len(),
            });
        }
        let i = self.index_of(pos)?;
        self.buffer.write()[i..i + self.item_size].copy_from_slice(item);
        self.set_dirty();
        Ok(())
    }

    /// Set the element at an absolute buffer index.
    pub fn set_abs(&mut self, index: usize, value: A) -> Result<()> {
        {
            let mut data = self.buffer.write();
            let len = data.len();
            match data.get_mut(index) {
                Some(v) => *v = value,
                None => {
                    return Err(DatasetError::OutOfBounds {
                        pos: vec![index],
                        shape: vec![len],
                    })
                }
            }
        }
        self.set_dirty();
        Ok(())
    }

    /// Set every element of every item.
    pub fn fill(&mut self, value: A) {
        let g = self.geometry();
        {
            let mut data = self.buffer.write();
            for i in IndexIter::new(&g) {
                data[i..i + g.item_size].fill(value);
            }
        }
        self.set_dirty();
    }

    /// All elements in row-major order, items kept contiguous.
    pub fn to_vec(&self) -> Vec<A> {
        let data = self.read();
        let mut out = Vec::with_capacity(self.size() * self.item_size);
        for i in self.indices() {
            out.extend_from_slice(&data[i..i + self.item_size]);
        }
        out
    }

    /// Elements of a region in row-major order.
    pub(crate) fn copy_region(&self, slice: &SliceND) -> Result<Vec<A>> {
        let it = SliceIter::new(&self.geometry(), slice)?;
        let data = self.read();
        let mut out = with_capacity(slice.shape(), self.item_size)?;
        for i in it {
            out.extend_from_slice(&data[i..i + self.item_size]);
        }
        Ok(out)
    }

    /// A dense copy with a buffer of its own, without metadata.
    pub(crate) fn to_dense(&self) -> Dataset<A> {
        let mut d = Self::from_parts(&self.shape, self.item_size, self.to_vec());
        d.name = self.name.clone();
        d
    }

    /// Convert every element to another kind.
    pub fn cast<B: Element>(&self) -> Dataset<B> {
        let data = self.to_vec().into_iter().map(cast::<B, A>).collect();
        let mut d = Dataset::from_parts(&self.shape, self.item_size, data);
        d.name = self.name.clone();
        d
    }

    /// A view of the whole dataset sharing its buffer.
    pub fn view(&self) -> Dataset<A> {
        let mut v = self.with_geometry(self.shape.clone(), self.offset, self.strides());
        v.metadata = self.metadata.copy_clean();
        v
    }

    /// Mark attached metadata as stale after a mutation.
    pub fn set_dirty(&self) {
        self.metadata.dirty();
    }
}

impl Dataset<f64> {
    /// `0.0, 1.0, ... n-1` as a one-dimensional dataset.
    pub fn range(n: usize) -> Dataset<f64> {
        Self::from_parts(&[n], 1, (0..n).map(|i| i as f64).collect())
    }

    /// A compound dataset of item size 2 holding real and imaginary parts.
    pub fn from_complex(shape: &[Ix], data: &[Complex64]) -> Result<Self> {
        if element_count(shape, 1)? != data.len() {
            bail!(DatasetError::shapes(shape, &[data.len()]));
        }
        let flat = data.iter().flat_map(|&z| complex_to_item(z)).collect();
        Self::from_compound_vec(2, shape, flat)
    }

    /// The item at `pos` read as a complex number.
    pub fn get_complex(&self, pos: &[Ix]) -> Result<Complex64> {
        if self.item_size != 2 {
            bail!(DatasetError::IncompatibleItemSize {
                a: self.item_size,
                b: 2,
            });
        }
        Ok(complex_from_item(&self.get_item(pos)?))
    }
}

/// Deep copy: a dense buffer of its own and the metadata that is not dirty.
impl<A: Element> Clone for Dataset<A> {
    fn clone(&self) -> Self {
        let mut d = self.to_dense();
        d.metadata = self.metadata.copy_clean();
        d
    }
}

/// Equal shape, item size and elements; names and metadata are ignored.
impl<A: Element> PartialEq for Dataset<A> {
    fn eq(&self, rhs: &Self) -> bool {
        self.shape == rhs.shape && self.item_size == rhs.item_size && self.to_vec() == rhs.to_vec()
    }
}

impl<A: Element> fmt::Debug for Dataset<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("item_size", &self.item_size)
            .field("offset", &self.offset)
            .field("layout", &self.layout)
            .field("data", &self.to_vec())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// `name` followed by the shape and row-major elements.
impl<A: Element> fmt::Display for Dataset<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?} {:?}", self.name, self.shape, self.to_vec())
    }
}

impl<A: Element> From<Vec<A>> for Dataset<A> {
    /// A one-dimensional dataset.
    fn from(v: Vec<A>) -> Self {
        let n = v.len();
        Self::from_parts(&[n], 1, v)
    }
}
