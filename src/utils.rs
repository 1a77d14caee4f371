// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bulk reorganisation of datasets.
//!
//! Every function allocates a destination and fills it by copying regions
//! of its inputs; none of them modifies an input except [`put`].
use log::debug;

use crate::buffer::{element_count, with_capacity};
use crate::dimension::{are_shapes_compatible_except, normalize_axis, pad_shape};
use crate::element::Element;
use crate::error::{bail, DatasetError, Result};
use crate::iterators::{BroadcastTripleIter, PositionIter, TripleIndex};
use crate::slice::{Slice, SliceND};
use crate::{Dataset, Ix, Ixs};

/// Tiles along the last axis when rows are longer than this.
const MANY_COLUMNS: Ix = 64;

fn region(shape: &[Ix], axis: usize, slice: Slice) -> Result<SliceND> {
    let mut s = SliceND::full(shape);
    s.set_axis(axis, slice)?;
    Ok(s)
}

/// Position of the `i`th item of `shape` in row-major order.
fn unravel(mut i: usize, shape: &[Ix]) -> Vec<Ix> {
    let mut pos = vec![0; shape.len()];
    for (p, &d) in pos.iter_mut().zip(shape).rev() {
        *p = i % d;
        i /= d;
    }
    pos
}

/// Join datasets along `axis`. All must have the same rank and agree on
/// every other axis; the result has the largest item size.
///
/// ```
/// use ndset::{utils, Dataset};
///
/// let a = Dataset::from_vec(&[1, 2], vec![1, 2]).unwrap();
/// let b = Dataset::from_vec(&[2, 2], vec![3, 4, 5, 6]).unwrap();
/// let c = utils::concatenate(&[&a, &b], 0).unwrap();
/// assert_eq!(c.shape(), &[3, 2]);
/// assert_eq!(c.to_vec(), vec![1, 2, 3, 4, 5, 6]);
/// ```
pub fn concatenate<A: Element>(datasets: &[&Dataset<A>], axis: Ixs) -> Result<Dataset<A>> {
    let first = match datasets.first() {
        Some(d) => d,
        None => bail!(DatasetError::InvalidSlice("no datasets to concatenate".to_string())),
    };
    let axis = normalize_axis(axis, first.rank())?;
    let mut shape = first.shape().to_vec();
    let mut item_size = first.item_size();
    for d in &datasets[1..] {
        if !are_shapes_compatible_except(first.shape(), d.shape(), axis) {
            bail!(DatasetError::shapes(first.shape(), d.shape()));
        }
        shape[axis] += d.shape()[axis];
        item_size = item_size.max(d.item_size());
    }
    debug!("concatenating {} datasets to {:?}", datasets.len(), shape);

    let mut out = Dataset::zeros_compound(item_size, &shape)?;
    let mut start = 0;
    for d in datasets {
        let n = d.shape()[axis];
        let s = region(&shape, axis, Slice::from(start..start + n))?;
        out.set_slice(&s, *d)?;
        start += n;
    }
    out.name = first.name.clone();
    Ok(out)
}

/// Join `b` to the end of `a` along `axis`.
pub fn append<A: Element>(a: &Dataset<A>, b: &Dataset<A>, axis: Ixs) -> Result<Dataset<A>> {
    if a.rank() != b.rank() {
        bail!(DatasetError::shapes(a.shape(), b.shape()));
    }
    concatenate(&[a, b], axis)
}

/// Repeat `a` `reps[i]` times along each axis. Missing leading
/// repetitions count as 1; extra ones add leading axes.
pub fn tile<A: Element>(a: &Dataset<A>, reps: &[Ix]) -> Result<Dataset<A>> {
    let rank = a.rank().max(reps.len());
    let shape = pad_shape(a.shape(), rank);
    let reps = pad_shape(reps, rank);
    let new_shape: Vec<Ix> = shape.iter().zip(&reps).map(|(&d, &r)| d * r).collect();
    let mut out = Dataset::zeros_compound(a.item_size(), &new_shape)?;
    let src = a.reshape(&shape)?;

    let many_columns = rank == 1 || shape[rank - 1] > MANY_COLUMNS;
    if many_columns {
        // one copy of the whole source per tile
        for tile in PositionIter::new(&reps) {
            let slices: Vec<Slice> = tile
                .iter()
                .zip(&shape)
                .map(|(&t, &d)| Slice::from(t * d..(t + 1) * d))
                .collect();
            out.set_slice(&SliceND::new(&new_shape, &slices)?, &src)?;
        }
    } else {
        // each source item goes to every tile at once
        let skip: Vec<Ix> = (0..rank)
            .map(|i| if reps[i] == 1 { new_shape[i] } else { shape[i] })
            .collect();
        let data = src.to_vec();
        for (i, item) in data.chunks(a.item_size()).enumerate() {
            let pos = unravel(i, &shape);
            let slices: Vec<Slice> = pos
                .iter()
                .zip(&skip)
                .map(|(&p, &k)| Slice::new(Some(p as Ixs), None, k.max(1) as Ixs))
                .collect();
            let value = Dataset::from_compound_vec(a.item_size(), &[], item.to_vec())?;
            out.set_slice(&SliceND::new(&new_shape, &slices)?, &value)?;
        }
    }
    out.name = a.name.clone();
    Ok(out)
}

/// Repeat items along `axis`, or along the flattened dataset when `axis` is
/// `None`. `repeats` holds one count for every item or a single count.
///
/// ```
/// use ndset::{utils, Dataset};
///
/// let a = Dataset::from_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
/// let r = utils::repeat(&a, &[1, 2], Some(0)).unwrap();
/// assert_eq!(r.to_vec(), vec![1, 2, 3, 4, 3, 4]);
/// let f = utils::repeat(&a, &[2], None).unwrap();
/// assert_eq!(f.to_vec(), vec![1, 1, 2, 2, 3, 3, 4, 4]);
/// ```
pub fn repeat<A: Element>(a: &Dataset<A>, repeats: &[Ix], axis: Option<Ixs>) -> Result<Dataset<A>> {
    let (src, axis) = match axis {
        Some(axis) => (a.view(), axis),
        None => (a.flatten()?, 0),
    };
    let ax = normalize_axis(axis, src.rank())?;
    let n = src.shape()[ax];
    if repeats.len() != 1 && repeats.len() != n {
        bail!(DatasetError::shapes(&[repeats.len()], &[n]));
    }
    let mut indices = Vec::new();
    for j in 0..n {
        let r = if repeats.len() == 1 { repeats[0] } else { repeats[j] };
        indices.extend(std::iter::repeat(j).take(r));
    }
    gather(&src, &indices, ax)
}

/// Items at `indices` along `axis`, or at flat row-major indices when
/// `axis` is `None`.
///
/// **Errors** with `InvalidSlice` when no indices are given and
/// `OutOfBounds` when one is past the end.
pub fn take<A: Element>(a: &Dataset<A>, indices: &[Ix], axis: Option<Ixs>) -> Result<Dataset<A>> {
    if indices.is_empty() {
        bail!(DatasetError::InvalidSlice("no indices given".to_string()));
    }
    match axis {
        Some(axis) => gather(a, indices, normalize_axis(axis, a.rank())?),
        None => gather(&a.flatten()?, indices, 0),
    }
}

fn gather<A: Element>(a: &Dataset<A>, indices: &[Ix], axis: usize) -> Result<Dataset<A>> {
    let n = a.shape()[axis];
    if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
        bail!(DatasetError::OutOfBounds {
            pos: vec![bad],
            shape: vec![n],
        });
    }
    let mut shape = a.shape().to_vec();
    shape[axis] = indices.len();
    let mut out = Dataset::zeros_compound(a.item_size(), &shape)?;
    for (i, &j) in indices.iter().enumerate() {
        let part = a.get_slice_view(&region(a.shape(), axis, Slice::index(j as Ixs))?)?;
        out.set_slice(&region(&shape, axis, Slice::index(i as Ixs))?, &part)?;
    }
    out.name = a.name.clone();
    Ok(out)
}

/// Set the items at flat row-major `indices` from `values`, cycling through
/// `values` when there are more indices than values.
///
/// Nothing is written unless every index is in bounds.
pub fn put<A: Element>(a: &mut Dataset<A>, indices: &[Ix], values: &Dataset<A>) -> Result<()> {
    let n = a.size();
    if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
        bail!(DatasetError::OutOfBounds {
            pos: vec![bad],
            shape: vec![n],
        });
    }
    let is = a.item_size();
    if values.item_size() != is && values.item_size() != 1 {
        bail!(DatasetError::IncompatibleItemSize {
            a: is,
            b: values.item_size(),
        });
    }
    if values.size() == 0 {
        if indices.is_empty() {
            return Ok(());
        }
        bail!(DatasetError::InvalidSlice("no values to put".to_string()));
    }
    let data = values.to_vec();
    let items: Vec<Vec<A>> = data
        .chunks(values.item_size())
        .map(|v| {
            let mut item = v.to_vec();
            item.resize(is, A::zero());
            item
        })
        .collect();
    let shape = a.shape().to_vec();
    for (&i, item) in indices.iter().zip(items.iter().cycle()) {
        a.set_item(&unravel(i, &shape), item)?;
    }
    Ok(())
}

/// Split along `axis` before each of `indices`. An index past the end gives
/// an empty part.
pub fn split<A: Element>(a: &Dataset<A>, indices: &[Ix], axis: Ixs) -> Result<Vec<Dataset<A>>> {
    let axis = normalize_axis(axis, a.rank())?;
    let imax = a.shape()[axis];
    let mut parts = Vec::with_capacity(indices.len() + 1);
    let mut last = 0;
    for &ind in indices {
        if ind > imax {
            let mut shape = a.shape().to_vec();
            shape[axis] = 0;
            parts.push(Dataset::zeros_compound(a.item_size(), &shape)?);
        } else {
            parts.push(a.get_slice(&region(a.shape(), axis, Slice::from(last..ind.max(last)))?)?);
            last = ind.max(last);
        }
    }
    if imax > last {
        parts.push(a.get_slice(&region(a.shape(), axis, Slice::from(last..imax))?)?);
    }
    Ok(parts)
}

/// Split along `axis` into `sections` parts of equal length, the last
/// possibly shorter. With `check_equal` an uneven split is an error.
pub fn split_sections<A: Element>(
    a: &Dataset<A>,
    sections: usize,
    axis: Ixs,
    check_equal: bool,
) -> Result<Vec<Dataset<A>>> {
    let ax = normalize_axis(axis, a.rank())?;
    let imax = a.shape()[ax];
    if sections == 0 || (check_equal && imax % sections != 0) {
        bail!(DatasetError::InvalidSlice(format!(
            "cannot split length {} into {} equal sections",
            imax, sections
        )));
    }
    let n = (imax + sections - 1) / sections;
    let indices: Vec<Ix> = (1..sections).map(|i| n * i).collect();
    split(a, &indices, axis)
}

/// Shift items cyclically by `shift` along `axis`, or along the flattened
/// dataset when `axis` is `None`.
pub fn roll<A: Element>(a: &Dataset<A>, shift: Ixs, axis: Option<Ixs>) -> Result<Dataset<A>> {
    let (src, axis) = match axis {
        Some(axis) => (a.view(), normalize_axis(axis, a.rank())?),
        None => (a.flatten()?, 0),
    };
    let n = src.shape()[axis];
    if n == 0 {
        return Ok(a.clone());
    }
    let k = shift.rem_euclid(n as Ixs) as Ix;
    let head = src.get_slice_view(&region(src.shape(), axis, Slice::from(n - k..n))?)?;
    let tail = src.get_slice_view(&region(src.shape(), axis, Slice::from(0..n - k))?)?;
    let mut out = concatenate(&[&head, &tail], axis as Ixs)?;
    out.set_shape(a.shape())?;
    out.name = a.name.clone();
    Ok(out)
}

/// A dataset of `shape` filled with the items of `a` in row-major order,
/// repeated cyclically or truncated as needed.
pub fn resize<A: Element>(a: &Dataset<A>, shape: &[Ix]) -> Result<Dataset<A>> {
    let is = a.item_size();
    let src = a.to_vec();
    let n = element_count(shape, is)?;
    let mut data = with_capacity(shape, is)?;
    if src.is_empty() {
        data.resize(n, A::zero());
    } else {
        data.extend(src.iter().copied().cycle().take(n));
    }
    let mut out = Dataset::from_compound_vec(is, shape, data)?;
    out.name = a.name.clone();
    Ok(out)
}

/// Items of `x` where `condition` holds and of `y` elsewhere, all three
/// broadcast together.
pub fn select<A: Element>(condition: &Dataset<bool>, x: &Dataset<A>, y: &Dataset<A>) -> Result<Dataset<A>> {
    if condition.item_size() != 1 {
        bail!(DatasetError::IncompatibleItemSize {
            a: 1,
            b: condition.item_size(),
        });
    }
    let copy;
    let y = if y.shares_buffer(x) {
        copy = y.clone();
        &copy
    } else {
        y
    };
    let it = BroadcastTripleIter::new(condition, x, y)?;
    let shape = it.shape().to_vec();
    let is = it.item_size();
    let (sx, sy) = (x.item_size() > 1, y.item_size() > 1);

    let mut data = with_capacity(&shape, is)?;
    {
        let dc = condition.read();
        let dx = x.read();
        let dy = y.read();
        for TripleIndex { a, b, c, .. } in it {
            for j in 0..is {
                data.push(if dc[a] {
                    dx[b + if sx { j } else { 0 }]
                } else {
                    dy[c + if sy { j } else { 0 }]
                });
            }
        }
    }
    Dataset::from_compound_vec(is, &shape, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::s;

    fn grid() -> Dataset<i32> {
        Dataset::from_shape_fn(&[2, 3], |p| (p[0] * 3 + p[1]) as i32).unwrap()
    }

    #[test]
    fn concatenate_and_append() {
        let a = grid();
        let c = concatenate(&[&a, &a.slice(&s![.., ..1]).unwrap()], 1).unwrap();
        assert_eq!(c.shape(), &[2, 4]);
        assert_eq!(c.to_vec(), vec![0, 1, 2, 0, 3, 4, 5, 3]);
        let e = append(&a, &Dataset::zeros(&[3]).unwrap(), 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::IncompatibleShapes);
        let e = concatenate(&[&a, &Dataset::zeros(&[2, 2]).unwrap()], 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::IncompatibleShapes);
        assert!(concatenate::<i32>(&[], 0).is_err());
    }

    #[test]
    fn tile_both_ways() {
        let a = Dataset::from_vec(&[2], vec![1, 2]).unwrap();
        assert_eq!(tile(&a, &[3]).unwrap().to_vec(), vec![1, 2, 1, 2, 1, 2]);
        let t = tile(&a, &[2, 2]).unwrap();
        assert_eq!(t.shape(), &[2, 4]);
        assert_eq!(t.to_vec(), vec![1, 2, 1, 2, 1, 2, 1, 2]);

        let g = grid();
        let t = tile(&g, &[2, 1]).unwrap();
        assert_eq!(t.shape(), &[4, 3]);
        assert_eq!(t.to_vec(), vec![0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5]);
        let wide = Dataset::<f64>::range(130).reshape(&[2, 65]).unwrap();
        let t = tile(&wide, &[1, 2]).unwrap();
        assert_eq!(t.shape(), &[2, 130]);
        assert_eq!(t.get(&[1, 65 + 3]).unwrap(), 68.);
        let narrow = tile(&g, &[1, 2]).unwrap();
        assert_eq!(narrow.to_vec(), vec![0, 1, 2, 0, 1, 2, 3, 4, 5, 3, 4, 5]);
    }

    #[test]
    fn take_and_put() {
        let g = grid();
        let t = take(&g, &[2, 0], Some(1)).unwrap();
        assert_eq!(t.to_vec(), vec![2, 0, 5, 3]);
        assert_eq!(take(&g, &[5, 1], None).unwrap().to_vec(), vec![5, 1]);
        assert_eq!(take(&g, &[], None).unwrap_err().kind(), ErrorKind::InvalidSlice);
        assert_eq!(take(&g, &[3], Some(1)).unwrap_err().kind(), ErrorKind::OutOfBounds);

        let mut g = grid();
        put(&mut g, &[0, 2, 4], &Dataset::from_vec(&[2], vec![-1, -2]).unwrap()).unwrap();
        assert_eq!(g.to_vec(), vec![-1, 1, -2, 3, -1, 5]);
        let e = put(&mut g, &[1, 6], &Dataset::from_vec(&[1], vec![9]).unwrap()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::OutOfBounds);
        assert_eq!(g.get(&[0, 1]).unwrap(), 1);
    }

    #[test]
    fn repeat_counts() {
        let g = grid();
        let r = repeat(&g, &[2], Some(1)).unwrap();
        assert_eq!(r.shape(), &[2, 6]);
        assert_eq!(r.slice(&s![0]).unwrap().to_vec(), vec![0, 0, 1, 1, 2, 2]);
        assert!(repeat(&g, &[1, 2], Some(1)).is_err());
    }

    #[test]
    fn splits() {
        let a = Dataset::<f64>::range(7);
        let parts = split(&a, &[2, 5, 9], 0).unwrap();
        let shapes: Vec<_> = parts.iter().map(|p| p.shape().to_vec()).collect();
        assert_eq!(shapes, vec![vec![2], vec![3], vec![0], vec![2]]);
        let parts = split_sections(&a, 3, 0, false).unwrap();
        assert_eq!(parts.iter().map(|p| p.size()).collect::<Vec<_>>(), vec![3, 3, 1]);
        assert!(split_sections(&a, 3, 0, true).is_err());
    }

    #[test]
    fn roll_resize_select() {
        let g = grid();
        assert_eq!(roll(&g, 1, None).unwrap().to_vec(), vec![5, 0, 1, 2, 3, 4]);
        assert_eq!(roll(&g, -1, Some(1)).unwrap().to_vec(), vec![1, 2, 0, 4, 5, 3]);
        assert_eq!(roll(&g, 3, Some(0)).unwrap().to_vec(), vec![3, 4, 5, 0, 1, 2]);
        assert_eq!(resize(&g, &[4]).unwrap().to_vec(), vec![0, 1, 2, 3]);
        assert_eq!(resize(&g, &[2, 4]).unwrap().to_vec(), vec![0, 1, 2, 3, 4, 5, 0, 1]);

        let cond = Dataset::from_vec(&[3], vec![true, false, true]).unwrap();
        let y = Dataset::from_vec(&[2, 1], vec![-1, -2]).unwrap();
        let s = select(&cond, &g, &y).unwrap();
        assert_eq!(s.to_vec(), vec![0, -1, 2, 3, -2, 5]);
    }
}
