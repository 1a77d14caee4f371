// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use log::{debug, warn};

use crate::buffer::element_count;
use crate::dimension::{
    broadcast_strides, check_permutation, co_broadcast, default_strides, is_identity,
    normalize_axis, pad_shape, permute, squeeze_axes, squeeze_shape, ReshapeMap,
};
use crate::element::{cast, Element};
use crate::error::{bail, DatasetError, Result};
use crate::iterators::SliceIter;
use crate::metadata::{ErrorMetadata, Metadata, MetadataStore, StatisticsMetadata};
use crate::slice::{Slice, SliceND};
use crate::{Dataset, Ix, Ixs};

/// Name of a region of a dataset named `name`, e.g. `x[0:10:1, 5:15:2]`.
pub(crate) fn sliced_name(name: &str, slice: &SliceND) -> String {
    format!("{}{}", name, slice)
}

/// # Slicing and transforms
///
/// Methods returning a view share the buffer; [`get_slice`](Self::get_slice)
/// and a reshape that cannot keep the layout make a copy. Attached metadata
/// is copied to the result and transformed along with it.
impl<A: Element> Dataset<A> {
    fn derive_metadata<F>(&self, f: F) -> Result<MetadataStore>
    where
        F: FnMut(&mut dyn Metadata) -> Result<()>,
    {
        let store = self.metadata.copy_clean();
        store.process(f)?;
        Ok(store)
    }

    fn check_slice(&self, slice: &SliceND) -> Result<()> {
        if slice.source_shape() != &self.shape[..] {
            bail!(DatasetError::shapes(slice.source_shape(), &self.shape));
        }
        Ok(())
    }

    /// Copy a region into a new dense dataset.
    pub fn get_slice(&self, slice: &SliceND) -> Result<Dataset<A>> {
        self.check_slice(slice)?;
        debug!("copying {}", sliced_name(&self.name, slice));
        let data = self.copy_region(slice)?;
        let mut d = Dataset::from_parts(slice.shape(), self.item_size, data);
        d.name = sliced_name(&self.name, slice);
        d.metadata = self.derive_metadata(|m| m.on_slice(slice, false))?;
        Ok(d)
    }

    /// A view of a region sharing this dataset's buffer.
    pub fn get_slice_view(&self, slice: &SliceND) -> Result<Dataset<A>> {
        self.check_slice(slice)?;
        debug!("viewing {}", sliced_name(&self.name, slice));
        let strides = self.strides();
        let mut offset = self.offset as Ixs;
        if slice.size() > 0 {
            offset += slice
                .start()
                .iter()
                .zip(&strides)
                .map(|(&s, &st)| s * st)
                .sum::<Ixs>();
        }
        let new_strides = strides
            .iter()
            .zip(slice.step())
            .map(|(&st, &s)| st * s)
            .collect();
        let mut v = self.with_geometry(slice.shape().to_vec(), offset as usize, new_strides);
        v.name = sliced_name(&self.name, slice);
        v.metadata = self.derive_metadata(|m| m.on_slice(slice, true))?;
        Ok(v)
    }

    /// Copy the region given by one `Slice` per leading axis.
    pub fn slice(&self, slices: &[Slice]) -> Result<Dataset<A>> {
        self.get_slice(&SliceND::new(&self.shape, slices)?)
    }

    /// View the region given by one `Slice` per leading axis.
    pub fn slice_view(&self, slices: &[Slice]) -> Result<Dataset<A>> {
        self.get_slice_view(&SliceND::new(&self.shape, slices)?)
    }

    /// View with axes permuted so that new axis `i` is old axis `axes[i]`;
    /// empty `axes` reverses them.
    ///
    /// **Errors** with `InvalidPermutation` unless `axes` is a bijection over
    /// the axes.
    pub fn get_transposed_view(&self, axes: &[Ixs]) -> Result<Dataset<A>> {
        let perm = check_permutation(self.rank(), axes)?;
        if is_identity(&perm) {
            return Ok(self.view());
        }
        debug!("transposing {}{:?} by {:?}", self.name, self.shape, perm);
        let mut v = self.with_geometry(
            permute(&self.shape, &perm),
            self.offset,
            permute(&self.strides(), &perm),
        );
        v.metadata = self.derive_metadata(|m| m.on_transpose(&perm))?;
        Ok(v)
    }

    /// Same as [`get_transposed_view`](Self::get_transposed_view).
    pub fn transpose(&self, axes: &[Ixs]) -> Result<Dataset<A>> {
        self.get_transposed_view(axes)
    }

    pub fn swap_axes(&self, a: Ixs, b: Ixs) -> Result<Dataset<A>> {
        let a = normalize_axis(a, self.rank())?;
        let b = normalize_axis(b, self.rank())?;
        let mut axes: Vec<Ixs> = (0..self.rank() as Ixs).collect();
        axes.swap(a, b);
        self.get_transposed_view(&axes)
    }

    /// Move `axis` so that it lies before `start`, as NumPy's `rollaxis`.
    pub fn roll_axis(&self, axis: Ixs, start: Ixs) -> Result<Dataset<A>> {
        let rank = self.rank();
        let axis = normalize_axis(axis, rank)?;
        let mut start = if start < 0 { start + rank as Ixs } else { start };
        if start < 0 || start > rank as Ixs {
            bail!(DatasetError::InvalidAxis { axis: start, rank });
        }
        if start > axis as Ixs {
            start -= 1;
        }
        let mut axes: Vec<Ixs> = (0..rank as Ixs).filter(|&a| a != axis as Ixs).collect();
        axes.insert(start as usize, axis as Ixs);
        self.get_transposed_view(&axes)
    }

    /// Reshape to `shape` of the same size.
    ///
    /// A dense dataset, or one whose shape only gains or loses unit axes,
    /// gives a view; otherwise the data is copied first.
    pub fn reshape(&self, shape: &[Ix]) -> Result<Dataset<A>> {
        let map = ReshapeMap::new(&self.shape, shape)?;
        debug!("reshaping {}{:?} to {:?}", self.name, self.shape, shape);
        let mut out = if self.layout.is_dense() {
            self.with_geometry(shape.to_vec(), self.offset, default_strides(shape, self.item_size))
        } else if let Some(strides) = map.unit_strides(&self.strides()) {
            self.with_geometry(shape.to_vec(), self.offset, strides)
        } else {
            let mut d = self.to_dense();
            d.shape = shape.to_vec();
            d
        };
        out.metadata = self.derive_metadata(|m| m.on_reshape(&map))?;
        Ok(out)
    }

    /// Reshape in place; views of this dataset are unaffected.
    pub fn set_shape(&mut self, shape: &[Ix]) -> Result<()> {
        if shape == &self.shape[..] {
            return Ok(());
        }
        let mut r = self.reshape(shape)?;
        r.is_view = self.is_view && r.shares_buffer(self);
        *self = r;
        Ok(())
    }

    /// Remove every unit axis.
    pub fn squeeze(&self) -> Result<Dataset<A>> {
        self.reshape(&squeeze_shape(&self.shape, false))
    }

    /// Remove the named unit axes.
    pub fn squeeze_axes(&self, axes: &[Ixs]) -> Result<Dataset<A>> {
        self.reshape(&squeeze_axes(&self.shape, axes)?)
    }

    /// Remove leading and trailing unit axes.
    pub fn squeeze_ends(&self) -> Result<Dataset<A>> {
        self.reshape(&squeeze_shape(&self.shape, true))
    }

    pub fn flatten(&self) -> Result<Dataset<A>> {
        self.reshape(&[self.size()])
    }

    /// View with the order of `axis` reversed.
    pub fn flip(&self, axis: Ixs) -> Result<Dataset<A>> {
        let mut slice = SliceND::full(&self.shape);
        slice.flip(axis)?;
        self.get_slice_view(&slice)
    }

    /// Reverse the columns (axis 1).
    pub fn flip_left_right(&self) -> Result<Dataset<A>> {
        if self.rank() < 2 {
            bail!(DatasetError::InvalidAxis {
                axis: 1,
                rank: self.rank(),
            });
        }
        self.flip(1)
    }

    /// Reverse the rows (axis 0).
    pub fn flip_up_down(&self) -> Result<Dataset<A>> {
        self.flip(0)
    }

    /// Rotate by 90 degrees `k` times in the plane of the first two axes,
    /// from axis 0 towards axis 1, as NumPy's `rot90`.
    pub fn rot90(&self, k: isize) -> Result<Dataset<A>> {
        if self.rank() < 2 {
            bail!(DatasetError::InvalidAxis {
                axis: 1,
                rank: self.rank(),
            });
        }
        match k.rem_euclid(4) {
            0 => Ok(self.view()),
            1 => self.swap_axes(0, 1)?.flip(0),
            2 => self.flip(0)?.flip(1),
            _ => self.swap_axes(0, 1)?.flip(1),
        }
    }

    /// Read-only style view repeating unit axes to `shape` with zero strides.
    ///
    /// Metadata is not carried over.
    pub fn broadcast_view(&self, shape: &[Ix]) -> Result<Dataset<A>> {
        element_count(shape, self.item_size)?;
        if co_broadcast(&self.shape, shape)? != shape {
            bail!(DatasetError::shapes(&self.shape, shape));
        }
        let strides = broadcast_strides(&self.shape, &self.strides(), shape)?;
        Ok(self.with_geometry(shape.to_vec(), self.offset, strides))
    }

    /// Write `data` into a region. `data` may have the region's shape, its
    /// size, or broadcast to it. A non-compound source fills the first
    /// element of each compound item and zeroes the rest.
    pub fn set_slice<B: Element>(&mut self, slice: &SliceND, data: &Dataset<B>) -> Result<()> {
        self.check_slice(slice)?;
        if data.item_size != self.item_size && data.item_size != 1 {
            bail!(DatasetError::IncompatibleItemSize {
                a: self.item_size,
                b: data.item_size,
            });
        }
        let target = slice.shape();
        let source = if data.shape() == target {
            data.view()
        } else if data.size() == slice.size() {
            data.reshape(target)?
        } else {
            data.broadcast_view(target)?
        };
        debug!("setting {}", sliced_name(&self.name, slice));
        let values = source.to_vec();
        let it = SliceIter::new(&self.geometry(), slice)?;
        {
            let mut buf = self.buffer.write();
            let n = self.item_size;
            if source.item_size == n {
                for (i, item) in it.zip(values.chunks(n)) {
                    for (dst, &v) in buf[i..i + n].iter_mut().zip(item) {
                        *dst = cast(v);
                    }
                }
            } else {
                for (i, &v) in it.zip(&values) {
                    buf[i] = cast(v);
                    buf[i + 1..i + n].fill(A::zero());
                }
            }
        }
        self.set_dirty();
        Ok(())
    }

    /// Set every element in a region.
    pub fn fill_slice(&mut self, slice: &SliceND, value: A) -> Result<()> {
        self.check_slice(slice)?;
        let it = SliceIter::new(&self.geometry(), slice)?;
        {
            let mut buf = self.buffer.write();
            for i in it {
                buf[i..i + self.item_size].fill(value);
            }
        }
        self.set_dirty();
        Ok(())
    }
}

/// # Metadata
impl<A: Element> Dataset<A> {
    /// Attach `m`, replacing values of the same type.
    pub fn set_metadata<M: Metadata>(&self, m: M) {
        self.metadata.add(Box::new(m), true);
    }

    /// Attach `m` alongside values of the same type.
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

    pub fn clear_all_metadata(&self) {
        self.metadata.clear_all();
    }

    /// Attach per-element errors that broadcast to this dataset's shape.
    ///
    /// Errors that are this dataset itself are ignored.
    pub fn set_errors<E: Element>(&self, errors: &Dataset<E>) -> Result<()> {
        if errors.shares_buffer(self) {
            warn!("ignoring errors of {} set to the dataset itself", self.name);
            return Ok(());
        }
        if errors.rank() > self.rank() || co_broadcast(&self.shape, errors.shape())? != self.shape {
            bail!(DatasetError::shapes(errors.shape(), &self.shape));
        }
        let e = errors
            .cast::<f64>()
            .reshape(&pad_shape(errors.shape(), self.rank()))?;
        self.metadata.add(Box::new(ErrorMetadata::new(e)), true);
        Ok(())
    }

    /// The same error for every element.
    pub fn set_error_value(&self, error: f64) -> Result<()> {
        let e = Dataset::from_elem(&vec![1; self.rank()], error)?;
        self.set_errors(&e)
    }

    /// Attached errors, in the (possibly broadcast) shape they were given.
    pub fn errors(&self) -> Option<Dataset<f64>> {
        self.metadata
            .first::<ErrorMetadata>()
            .map(|m| m.errors().clone())
    }

    /// Attached errors expanded to this dataset's shape.
    pub fn errors_broadcast(&self) -> Option<Dataset<f64>> {
        let e = self.metadata.first::<ErrorMetadata>()?;
        e.errors().broadcast_view(&self.shape).ok().map(|v| v.to_dense())
    }

    pub fn has_errors(&self) -> bool {
        self.metadata.first::<ErrorMetadata>().is_some()
    }

    /// Cached statistics, recomputed when the data has changed.
    pub fn statistics(&self) -> StatisticsMetadata {
        match self.metadata.first::<StatisticsMetadata>() {
            Some(s) if s.is_current(self) => s,
            _ => {
                let s = StatisticsMetadata::compute(self);
                self.set_metadata(s.clone());
                s
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::s;

    fn grid() -> Dataset<i32> {
        Dataset::from_shape_fn(&[3, 4], |p| (p[0] * 4 + p[1]) as i32).unwrap()
    }

    #[test]
    fn view_offsets_and_strides() {
        let a = grid().with_name("x");
        let v = a.slice_view(&s![1.., ..;-2]).unwrap();
        assert_eq!(v.shape(), &[2, 2]);
        assert_eq!(v.offset(), 7);
        assert_eq!(v.strides(), vec![4, -2]);
        assert_eq!(v.to_vec(), vec![7, 5, 11, 9]);
        assert_eq!(v.name(), "x[1:3:1, 3::-2]");
    }

    #[test]
    fn views_alias_copies_do_not() {
        let a = grid();
        let mut v = a.slice_view(&s![1..2]).unwrap();
        let mut c = a.slice(&s![1..2]).unwrap();
        v.set(&[0, 0], 100).unwrap();
        c.set(&[0, 1], 200).unwrap();
        assert_eq!(a.get(&[1, 0]).unwrap(), 100);
        assert_eq!(a.get(&[1, 1]).unwrap(), 5);
    }

    #[test]
    fn transposes() {
        let a = grid();
        let t = a.transpose(&[]).unwrap();
        assert_eq!(t.shape(), &[4, 3]);
        assert_eq!(t.get(&[3, 1]).unwrap(), 7);
        assert!(t.shares_buffer(&a));
        let e = a.get_transposed_view(&[0, 0]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidPermutation);
        let b = Dataset::<u8>::zeros(&[2, 3, 4, 5]).unwrap();
        assert_eq!(b.roll_axis(3, 1).unwrap().shape(), &[2, 5, 3, 4]);
        assert_eq!(b.roll_axis(0, 3).unwrap().shape(), &[3, 4, 2, 5]);
        assert_eq!(b.swap_axes(0, -1).unwrap().shape(), &[5, 3, 4, 2]);
    }

    #[test]
    fn reshape_views_or_copies() {
        let a = grid();
        let r = a.reshape(&[2, 6]).unwrap();
        assert!(r.shares_buffer(&a));
        let t = a.transpose(&[]).unwrap();
        let r = t.reshape(&[12]).unwrap();
        assert!(!r.shares_buffer(&a));
        assert_eq!(r.to_vec()[..4], [0, 4, 8, 1]);
        let u = t.reshape(&[4, 1, 3]).unwrap();
        assert!(u.shares_buffer(&a));
        assert_eq!(u.to_vec(), t.to_vec());
        assert_eq!(
            a.reshape(&[5]).unwrap_err().kind(),
            ErrorKind::IncompatibleShapes
        );
    }

    #[test]
    fn squeezes() {
        let a = Dataset::<f64>::zeros(&[1, 3, 1, 2, 1]).unwrap();
        assert_eq!(a.squeeze().unwrap().shape(), &[3, 2]);
        assert_eq!(a.squeeze_ends().unwrap().shape(), &[3, 1, 2]);
        assert_eq!(a.squeeze_axes(&[2]).unwrap().shape(), &[1, 3, 2, 1]);
        let mut b = a.clone();
        b.set_shape(&[6]).unwrap();
        assert_eq!(b.shape(), &[6]);
        assert!(!b.is_view());
    }

    #[test]
    fn flips_and_rotations() {
        let a = Dataset::from_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(a.rot90(1).unwrap().to_vec(), vec![2, 4, 1, 3]);
        assert_eq!(a.rot90(2).unwrap().to_vec(), vec![4, 3, 2, 1]);
        assert_eq!(a.rot90(-1).unwrap().to_vec(), vec![3, 1, 4, 2]);
        assert_eq!(a.flip_left_right().unwrap().to_vec(), vec![2, 1, 4, 3]);
        assert_eq!(a.flip_up_down().unwrap().to_vec(), vec![3, 4, 1, 2]);
        let v = Dataset::from_vec(&[3], vec![1, 2, 3]).unwrap();
        assert_eq!(v.flip_left_right().unwrap_err().kind(), ErrorKind::InvalidAxis);
    }

    #[test]
    fn broadcast_views() {
        let a = Dataset::from_vec(&[3, 1], vec![1, 2, 3]).unwrap();
        let b = a.broadcast_view(&[2, 3, 2]).unwrap();
        assert_eq!(b.to_vec(), vec![1, 1, 2, 2, 3, 3, 1, 1, 2, 2, 3, 3]);
        assert!(a.broadcast_view(&[4, 2]).is_err());
    }

    #[test]
    fn set_and_fill_slices() {
        let mut a = Dataset::<f64>::zeros(&[3, 4]).unwrap();
        let row = Dataset::from_vec(&[4], vec![1, 2, 3, 4]).unwrap();
        let s = SliceND::new(a.shape(), &s![..;2]).unwrap();
        a.set_slice(&s, &row).unwrap();
        assert_eq!(a.get(&[2, 3]).unwrap(), 4.);
        assert_eq!(a.get(&[1, 3]).unwrap(), 0.);
        let s = SliceND::new(a.shape(), &s![1, 1..3]).unwrap();
        a.fill_slice(&s, -1.).unwrap();
        assert_eq!(a.slice(&s![1]).unwrap().to_vec(), vec![0., -1., -1., 0.]);
        let bad = Dataset::from_vec(&[3], vec![1, 2, 3]).unwrap();
        let s = SliceND::full(a.shape());
        assert_eq!(a.set_slice(&s, &bad).unwrap_err().kind(), ErrorKind::IncompatibleShapes);
    }

    #[test]
    fn set_slice_from_overlapping_view() {
        let mut a = Dataset::from_vec(&[4], vec![1, 2, 3, 4]).unwrap();
        let rev = a.flip(0).unwrap();
        a.set_slice(&SliceND::full(&[4]), &rev).unwrap();
        assert_eq!(a.to_vec(), vec![4, 3, 2, 1]);
    }

    #[test]
    fn compound_set_slice() {
        let mut a = Dataset::<f64>::zeros_compound(2, &[2]).unwrap();
        a.fill(5.);
        let src = Dataset::from_vec(&[2], vec![1., 2.]).unwrap();
        a.set_slice(&SliceND::full(&[2]), &src).unwrap();
        assert_eq!(a.to_vec(), vec![1., 0., 2., 0.]);
    }

    #[test]
    fn errors_follow_slicing() {
        let a = Dataset::<f64>::range(100).reshape(&[10, 10]).unwrap();
        let e = Dataset::<f64>::range(100).reshape(&[10, 10]).unwrap();
        a.set_errors(&e).unwrap();
        let s = a.slice(&s![2..7]).unwrap();
        let se = s.errors().unwrap();
        assert_eq!(se.shape(), &[5, 10]);
        assert_eq!(se.get(&[0, 3]).unwrap(), 23.);

        let b = Dataset::<f64>::zeros(&[4, 3]).unwrap();
        b.set_error_value(0.5).unwrap();
        let t = b.transpose(&[]).unwrap().slice(&s![1..]).unwrap();
        assert_eq!(t.errors().unwrap().shape(), &[1, 1]);
        assert_eq!(t.errors_broadcast().unwrap().shape(), &[2, 4]);
        assert!(b.set_errors(&Dataset::<f64>::zeros(&[5]).unwrap()).is_err());
        b.set_errors(&b.view()).unwrap();
        assert_eq!(b.errors().unwrap().shape(), &[1, 1]);
    }
}
