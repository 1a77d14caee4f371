// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Shape and stride arithmetic.
//!
//! Shapes are plain `&[Ix]` slices. Strides are signed and count scalar
//! elements, so a compound item of size `n` advances the innermost stride
//! by `n`.

use crate::error::{bail, DatasetError, Result};
use crate::{Ix, Ixs};

pub use self::broadcast::{
    broadcast_all, broadcast_shapes, broadcast_shapes3, broadcast_strides, broadcast_to_axes,
    co_broadcast, pad_shape,
};
pub use self::reshape::{AxisGroup, ReshapeMap};

pub mod broadcast;
pub mod reshape;

/// Number of items described by `shape`; the empty shape is a scalar of size 1.
#[inline]
pub fn size(shape: &[Ix]) -> usize {
    shape.iter().product()
}

/// Compute the size while checking for overflow.
pub fn size_checked(shape: &[Ix]) -> Option<usize> {
    shape.iter().try_fold(1usize, |s, &a| s.checked_mul(a))
}

/// Wrap a negative axis by adding `rank`, failing if still out of `[0, rank)`.
pub fn normalize_axis(axis: Ixs, rank: usize) -> Result<usize> {
    let a = if axis < 0 { axis + rank as Ixs } else { axis };
    if a < 0 || a >= rank as Ixs {
        bail!(DatasetError::InvalidAxis { axis, rank });
    }
    Ok(a as usize)
}

/// Normalize every axis and reject duplicates.
pub fn normalize_axes(axes: &[Ixs], rank: usize) -> Result<Vec<usize>> {
    let mut out = Vec::with_capacity(axes.len());
    for &axis in axes {
        let a = normalize_axis(axis, rank)?;
        if out.contains(&a) {
            bail!(DatasetError::InvalidAxis { axis, rank });
        }
        out.push(a);
    }
    Ok(out)
}

/// Row-major strides for `shape`, measured in scalar elements.
pub fn default_strides(shape: &[Ix], item_size: usize) -> Vec<Ixs> {
    let mut strides = vec![0; shape.len()];
    let mut cum = item_size as Ixs;
    for (s, &d) in strides.iter_mut().zip(shape).rev() {
        *s = cum;
        cum *= d.max(1) as Ixs;
    }
    strides
}

/// Buffer delta of `index` under `strides`.
#[inline]
pub fn stride_offset(index: &[Ix], strides: &[Ixs]) -> Ixs {
    index
        .iter()
        .zip(strides)
        .map(|(&i, &s)| i as Ixs * s)
        .sum()
}

/// Check `pos` lies inside `shape`.
pub fn check_position(pos: &[Ix], shape: &[Ix]) -> Result<()> {
    if pos.len() != shape.len() || pos.iter().zip(shape).any(|(&p, &d)| p >= d) {
        return Err(DatasetError::OutOfBounds {
            pos: pos.to_vec(),
            shape: shape.to_vec(),
        });
    }
    Ok(())
}

/// Remove unit axes; with `only_ends` only the leading and trailing ones go.
pub fn squeeze_shape(shape: &[Ix], only_ends: bool) -> Vec<Ix> {
    if !only_ends {
        return shape.iter().copied().filter(|&d| d != 1).collect();
    }
    let first = shape.iter().position(|&d| d != 1);
    let last = shape.iter().rposition(|&d| d != 1);
    match (first, last) {
        (Some(f), Some(l)) => shape[f..=l].to_vec(),
        _ => Vec::new(),
    }
}

/// Remove exactly the named axes, each of which must have length 1.
pub fn squeeze_axes(shape: &[Ix], axes: &[Ixs]) -> Result<Vec<Ix>> {
    let axes = normalize_axes(axes, shape.len())?;
    if let Some(&a) = axes.iter().find(|&&a| shape[a] != 1) {
        let mut unit = shape.to_vec();
        unit[a] = 1;
        bail!(DatasetError::shapes(shape, &unit));
    }
    Ok(shape
        .iter()
        .enumerate()
        .filter(|(i, _)| !axes.contains(i))
        .map(|(_, &d)| d)
        .collect())
}

/// Validate an axis permutation; an empty one means full reversal.
pub fn check_permutation(rank: usize, axes: &[Ixs]) -> Result<Vec<usize>> {
    if axes.is_empty() {
        return Ok((0..rank).rev().collect());
    }
    let invalid = || DatasetError::InvalidPermutation {
        axes: axes.to_vec(),
        rank,
    };
    if axes.len() != rank {
        bail!(invalid());
    }
    let mut seen = vec![false; rank];
    let mut perm = Vec::with_capacity(rank);
    for &a in axes {
        let a = match normalize_axis(a, rank) {
            Ok(a) => a,
            Err(_) => bail!(invalid()),
        };
        if seen[a] {
            bail!(invalid());
        }
        seen[a] = true;
        perm.push(a);
    }
    Ok(perm)
}

pub fn is_identity(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(i, &p)| i == p)
}

pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inv[p] = i;
    }
    inv
}

/// `out[i] = items[perm[i]]`
pub fn permute<T: Clone>(items: &[T], perm: &[usize]) -> Vec<T> {
    perm.iter().map(|&p| items[p].clone()).collect()
}

/// Shapes agree on every axis except possibly `axis`.
pub fn are_shapes_compatible_except(a: &[Ix], b: &[Ix], axis: usize) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .enumerate()
            .all(|(i, (x, y))| i == axis || x == y)
}

/// Both shapes have the same non-unit dimensions in the same order.
pub fn differs_by_ones(a: &[Ix], b: &[Ix]) -> bool {
    squeeze_shape(a, false) == squeeze_shape(b, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn scalar_size() {
        assert_eq!(size(&[]), 1);
        assert_eq!(size(&[3, 0, 2]), 0);
        assert_eq!(size_checked(&[usize::MAX, 2]), None);
    }

    #[test]
    fn axis_wrapping() {
        assert_eq!(normalize_axis(-1, 3).unwrap(), 2);
        assert_eq!(normalize_axis(2, 3).unwrap(), 2);
        assert_eq!(normalize_axis(3, 3).unwrap_err().kind(), ErrorKind::InvalidAxis);
        assert_eq!(normalize_axis(-4, 3).unwrap_err().kind(), ErrorKind::InvalidAxis);
        assert_eq!(normalize_axes(&[0, -3], 3).unwrap_err().kind(), ErrorKind::InvalidAxis);
    }

    #[test]
    fn strides_row_major() {
        assert_eq!(default_strides(&[2, 3, 4], 1), vec![12, 4, 1]);
        assert_eq!(default_strides(&[2, 3], 2), vec![6, 2]);
        assert_eq!(default_strides(&[], 1), Vec::<isize>::new());
        assert_eq!(stride_offset(&[1, 2, 3], &[12, 4, 1]), 23);
    }

    #[test]
    fn squeezing() {
        assert_eq!(squeeze_shape(&[1, 3, 1, 4, 1], false), vec![3, 4]);
        assert_eq!(squeeze_shape(&[1, 3, 1, 4, 1], true), vec![3, 1, 4]);
        assert_eq!(squeeze_shape(&[1, 1], true), Vec::<usize>::new());
        assert_eq!(squeeze_axes(&[1, 3, 1], &[-1]).unwrap(), vec![1, 3]);
        assert_eq!(
            squeeze_axes(&[1, 3, 1], &[1]).unwrap_err().kind(),
            ErrorKind::IncompatibleShapes
        );
    }

    #[test]
    fn permutations() {
        assert_eq!(check_permutation(3, &[]).unwrap(), vec![2, 1, 0]);
        assert_eq!(check_permutation(3, &[1, -1, 0]).unwrap(), vec![1, 2, 0]);
        for bad in [&[0, 1][..], &[0, 0, 1], &[0, 1, 3]] {
            assert_eq!(
                check_permutation(3, bad).unwrap_err().kind(),
                ErrorKind::InvalidPermutation
            );
        }
        let p = vec![2, 0, 1];
        let inv = inverse_permutation(&p);
        assert_eq!(permute(&permute(&[5, 6, 7], &p), &inv), vec![5, 6, 7]);
        assert!(is_identity(&[0, 1, 2]));
    }
}
