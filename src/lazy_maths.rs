// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reductions over any [`LazySource`], reading one slice at a time.
//!
//! Only one slice of the source is held in memory at once, so these work on
//! lazy datasets larger than memory. Results are `f64` datasets.
use log::debug;

use crate::dimension::{normalize_axes, normalize_axis};
use crate::element::Element;
use crate::error::{bail, DatasetError, Result};
use crate::iterators::{PositionIter, SliceNDIter};
use crate::lazy::LazySource;
use crate::slice::{Slice, SliceND};
use crate::{Dataset, Ix, Ixs};

/// Accumulate the index-slices along `axis` into a dataset of the source's
/// shape with `axis` of length one, then drop that axis.
fn accumulate<A, S, F>(data: &S, axis: Ixs, init: f64, mut f: F) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
    F: FnMut(&mut Dataset<f64>, &Dataset<A>) -> Result<()>,
{
    let ax = normalize_axis(axis, data.rank())?;
    let shape = data.shape().to_vec();
    let mut kept = shape.clone();
    kept[ax] = 1;
    let mut result = Dataset::zeros_compound(data.item_size(), &kept)?;
    result.fill(init);

    let mut slices = vec![Slice::from(..); shape.len()];
    for i in 0..shape[ax] {
        slices[ax] = Slice::index(i as Ixs);
        let part = data.get_slice(&SliceND::new(&shape, &slices)?)?;
        f(&mut result, &part)?;
    }
    kept.remove(ax);
    result.set_shape(&kept)?;
    Ok(result)
}

/// Sum along `axis`.
pub fn sum<A, S>(data: &S, axis: Ixs) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    debug!("lazy sum of {}{:?} along {}", data.name(), data.shape(), axis);
    accumulate(data, axis, 0., |r, d| r.iadd(d))
}

/// Product along `axis`.
pub fn product<A, S>(data: &S, axis: Ixs) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    debug!("lazy product of {}{:?} along {}", data.name(), data.shape(), axis);
    accumulate(data, axis, 1., |r, d| r.imultiply(d))
}

/// Sum over several axes.
///
/// With `ignore`, `axes` are the ones kept and every other axis is summed
/// over; otherwise `axes` are summed over.
pub fn sum_axes<A, S>(data: &S, ignore: bool, axes: &[Ixs]) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    let rank = data.rank();
    let mut named = normalize_axes(axes, rank)?;
    named.sort_unstable();
    named.dedup();
    let reduce: Vec<usize> = if ignore {
        (0..rank).filter(|a| !named.contains(a)).collect()
    } else {
        named
    };
    let mut reduced = reduce.iter().enumerate().map(|(i, &a)| (a - i) as Ixs);
    let mut result = match reduced.next() {
        Some(a) => sum(data, a)?,
        None => return Ok(data.get_slice(&SliceND::full(data.shape()))?.cast()),
    };
    for a in reduced {
        result = sum(&result, a)?;
    }
    Ok(result)
}

fn extremum<A, S>(data: &S, axes: &[Ixs], pick: fn(&Dataset<A>) -> Option<f64>) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    if axes.is_empty() {
        bail!(DatasetError::InvalidSlice("no axes to reduce over".to_string()));
    }
    let mut it = SliceNDIter::new(&SliceND::full(data.shape()), axes)?;
    let mut result = Dataset::<f64>::zeros(&it.used_shape())?;
    while let Some(slice) = it.next() {
        let part = data.get_slice(&slice)?;
        result.set(&it.used_pos(), pick(&part).unwrap_or(f64::NAN))?;
    }
    Ok(result)
}

/// Maximum along `axis`, ignoring NaNs. An all-NaN slice gives NaN.
pub fn max<A, S>(data: &S, axis: Ixs) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    extremum(data, &[axis], Dataset::max)
}

/// Minimum along `axis`, ignoring NaNs. An all-NaN slice gives NaN.
pub fn min<A, S>(data: &S, axis: Ixs) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    extremum(data, &[axis], Dataset::min)
}

/// Maximum over the sub-regions spanning `axes`.
pub fn max_axes<A, S>(data: &S, axes: &[Ixs]) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    extremum(data, axes, Dataset::max)
}

/// Minimum over the sub-regions spanning `axes`.
pub fn min_axes<A, S>(data: &S, axes: &[Ixs]) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    extremum(data, axes, Dataset::min)
}

/// Mean of the sub-regions spanning `ignore_axes`, averaged over every other
/// axis, with the length-one axes squeezed away.
///
/// When the slices carry errors the result's errors are the root of the
/// sum of their squares divided by the number of slices.
pub fn mean<A, S>(data: &S, ignore_axes: &[Ixs]) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    mean_range(data, 0, usize::MAX, ignore_axes)
}

/// Like [`mean`], using only the sub-regions numbered `start..stop` in
/// row-major order.
pub fn mean_range<A, S>(data: &S, start: usize, stop: usize, ignore_axes: &[Ixs]) -> Result<Dataset<f64>>
where
    A: Element,
    S: LazySource<A> + ?Sized,
{
    let shape = data.shape().to_vec();
    let positions = PositionIter::with_omit(&shape, ignore_axes)?;
    let omit = positions.omit().to_vec();
    debug!("lazy mean of {}{:?} keeping {:?}", data.name(), shape, ignore_axes);

    let mut total: Option<Dataset<f64>> = None;
    let mut variance: Option<Dataset<f64>> = None;
    let mut n: Ix = 0;
    for pos in positions.take(stop).skip(start) {
        let slices: Vec<Slice> = pos
            .iter()
            .zip(&omit)
            .map(|(&p, &o)| if o { Slice::from(..) } else { Slice::index(p as Ixs) })
            .collect();
        let part = data.get_slice(&SliceND::new(&shape, &slices)?)?;
        match total {
            Some(ref mut t) => t.iadd(&part)?,
            None => total = Some(part.cast()),
        }
        if let Some(e) = part.errors_broadcast() {
            let sq: Dataset<f64> = crate::maths::multiply(&e, &e)?;
            match variance {
                Some(ref mut v) => v.iadd(&sq)?,
                None => variance = Some(sq),
            }
        }
        n += 1;
    }

    let mut total = match total {
        Some(t) => t,
        None => bail!(DatasetError::InvalidSlice(format!(
            "no slices in {}..{} to average",
            start, stop
        ))),
    };
    let count = Dataset::from_elem(&[], n as f64)?;
    total.idivide(&count)?;
    if let Some(v) = variance {
        let roots = v.to_vec().into_iter().map(f64::sqrt).collect();
        let mut e = Dataset::from_compound_vec(v.item_size(), v.shape(), roots)?;
        e.idivide(&count)?;
        total.set_errors(&e)?;
    }
    total.squeeze()
}
