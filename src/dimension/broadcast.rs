// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use crate::dimension::normalize_axes;
use crate::error::{bail, DatasetError, Result};
use crate::{Ix, Ixs};

/// Calculate the common shape for a pair of shapes, that they can be broadcasted
/// to. Return an error if the shapes are not compatible.
///
/// Uses the [NumPy broadcasting rules]
//  (https://docs.scipy.org/doc/numpy/user/basics.broadcasting.html#general-broadcasting-rules).
pub fn co_broadcast(shape1: &[Ix], shape2: &[Ix]) -> Result<Vec<Ix>> {
    let (k, overflow) = shape1.len().overflowing_sub(shape2.len());
    // Swap the order if shape2 is longer.
    if overflow {
        return co_broadcast(shape2, shape1);
    }
    // The output should be the same length as shape1.
    let mut out = shape1.to_vec();
    for (out, &s2) in out[k..].iter_mut().zip(shape2) {
        if *out != s2 {
            if *out == 1 {
                *out = s2
            } else if s2 != 1 {
                bail!(DatasetError::shapes(shape1, shape2));
            }
        }
    }
    Ok(out)
}

/// Broadcast two shapes.
pub fn broadcast_shapes(a: &[Ix], b: &[Ix]) -> Result<Vec<Ix>> {
    co_broadcast(a, b)
}

/// Broadcast three shapes, e.g. a condition and two choices.
pub fn broadcast_shapes3(a: &[Ix], b: &[Ix], c: &[Ix]) -> Result<Vec<Ix>> {
    co_broadcast(&co_broadcast(a, b)?, c)
}

/// Broadcast any number of shapes; no shapes gives the scalar shape.
pub fn broadcast_all(shapes: &[&[Ix]]) -> Result<Vec<Ix>> {
    shapes
        .iter()
        .try_fold(Vec::new(), |acc, s| co_broadcast(&acc, s))
}

/// Left-pad `shape` with unit axes up to `rank`.
pub fn pad_shape(shape: &[Ix], rank: usize) -> Vec<Ix> {
    let mut out = vec![1; rank.saturating_sub(shape.len())];
    out.extend_from_slice(shape);
    out
}

/// Strides that make a view of `shape` read as `target`: padded and stretched
/// axes get a zero stride.
pub fn broadcast_strides(shape: &[Ix], strides: &[Ixs], target: &[Ix]) -> Result<Vec<Ixs>> {
    if shape.len() > target.len() {
        bail!(DatasetError::shapes(shape, target));
    }
    let k = target.len() - shape.len();
    let mut out = vec![0; target.len()];
    for (i, (&d, &s)) in shape.iter().zip(strides).enumerate() {
        let t = target[k + i];
        if d == t {
            out[k + i] = s;
        } else if d != 1 {
            bail!(DatasetError::shapes(shape, target));
        }
    }
    Ok(out)
}

/// Place the axes of `shape` at positions `axes` of `target`, with unit axes
/// elsewhere. Used to line up a partially reduced operand with its source.
pub fn broadcast_to_axes(shape: &[Ix], target: &[Ix], axes: &[Ixs]) -> Result<Vec<Ix>> {
    let axes = normalize_axes(axes, target.len())?;
    if axes.len() != shape.len() {
        bail!(DatasetError::shapes(shape, target));
    }
    let mut out = vec![1; target.len()];
    for (&a, &d) in axes.iter().zip(shape) {
        if d != target[a] && d != 1 {
            bail!(DatasetError::shapes(shape, target));
        }
        out[a] = d;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn numpy_rules() {
        assert_eq!(broadcast_shapes(&[3, 1, 5], &[1, 4, 1]).unwrap(), vec![3, 4, 5]);
        assert_eq!(broadcast_shapes(&[5], &[2, 3, 1]).unwrap(), vec![2, 3, 5]);
        assert_eq!(broadcast_shapes(&[], &[2]).unwrap(), vec![2]);
        assert_eq!(
            broadcast_shapes(&[2, 3], &[4, 5]).unwrap_err().kind(),
            ErrorKind::IncompatibleShapes
        );
        assert_eq!(broadcast_shapes3(&[1, 3], &[2, 1], &[3]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_all(&[&[4, 1], &[1, 6], &[6]]).unwrap(), vec![4, 6]);
    }

    #[test]
    fn zero_strides() {
        assert_eq!(broadcast_strides(&[3, 1], &[1, 1], &[2, 3, 4]).unwrap(), vec![0, 1, 0]);
        assert!(broadcast_strides(&[3], &[1], &[4]).is_err());
    }

    #[test]
    fn named_axes() {
        assert_eq!(broadcast_to_axes(&[4, 6], &[4, 5, 6], &[0, -1]).unwrap(), vec![4, 1, 6]);
        assert!(broadcast_to_axes(&[4, 5], &[4, 5, 6], &[0, 2]).is_err());
    }
}
