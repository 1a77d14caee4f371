// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::ops::Range;

use crate::dimension::{differs_by_ones, size_checked};
use crate::error::{bail, DatasetError, Result};
use crate::{Ix, Ixs};

/// A run of source axes that becomes a run of target axes under a reshape.
///
/// An empty `from` is an inserted unit axis, an empty `to` a removed one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisGroup {
    pub from: Range<usize>,
    pub to: Range<usize>,
}

impl AxisGroup {
    /// One source axis maps to one target axis.
    pub fn is_single(&self) -> bool {
        self.from.len() == 1 && self.to.len() == 1
    }
}

/// Correspondence between the axes of two shapes of equal size.
///
/// Every reshape that row-major ordering allows without reinterpreting more
/// than one run of axes at a time is representable: unit axes inserted or
/// removed, and contiguous runs of axes merged into one or one axis split
/// into a run.
#[derive(Clone, Debug)]
pub struct ReshapeMap {
    from: Vec<Ix>,
    to: Vec<Ix>,
    groups: std::result::Result<Vec<AxisGroup>, &'static str>,
}

impl ReshapeMap {
    /// **Errors** if the shapes differ in size. An ambiguous regrouping is
    /// reported only when the axis correspondence is asked for.
    pub fn new(from: &[Ix], to: &[Ix]) -> Result<Self> {
        let n = match (size_checked(from), size_checked(to)) {
            (Some(a), Some(b)) if a == b => a,
            _ => bail!(DatasetError::shapes(from, to)),
        };
        let groups = if n == 0 && !differs_by_ones(from, to) {
            Err("empty shapes can only gain or lose unit axes")
        } else {
            axis_groups(from, to)
        };
        Ok(ReshapeMap {
            from: from.to_vec(),
            to: to.to_vec(),
            groups,
        })
    }

    pub fn from_shape(&self) -> &[Ix] {
        &self.from
    }

    pub fn to_shape(&self) -> &[Ix] {
        &self.to
    }

    pub fn groups(&self) -> Result<&[AxisGroup]> {
        match &self.groups {
            Ok(g) => Ok(g),
            Err(reason) => bail!(DatasetError::UnsupportedReshape {
                from: self.from.clone(),
                to: self.to.clone(),
                reason: *reason,
            }),
        }
    }

    /// Only unit axes are inserted or removed.
    pub fn is_ones_only(&self) -> bool {
        match &self.groups {
            Ok(g) => g.iter().all(|g| g.from.len() <= 1 && g.to.len() <= 1),
            Err(_) => false,
        }
    }

    /// Carry per-axis entries across; new or reinterpreted axes get `None`.
    pub fn remap_axes<T: Clone>(&self, items: &[Option<T>]) -> Result<Vec<Option<T>>> {
        let mut out = Vec::with_capacity(self.to.len());
        for g in self.groups()? {
            if g.is_single() {
                out.push(items.get(g.from.start).cloned().flatten());
            } else {
                out.extend(g.to.clone().map(|_| None));
            }
        }
        Ok(out)
    }

    /// Target shape for an element-wise field whose shape broadcasts to the
    /// source shape.
    pub fn reshape_shape(&self, shape: &[Ix]) -> Result<Vec<Ix>> {
        if shape == &self.from[..] {
            return Ok(self.to.clone());
        }
        if shape.len() != self.from.len() {
            bail!(DatasetError::shapes(shape, &self.from));
        }
        let mut out = Vec::with_capacity(self.to.len());
        for g in self.groups()? {
            let dims = &shape[g.from.clone()];
            if g.is_single() {
                out.push(dims[0]);
            } else if dims == &self.from[g.from.clone()] {
                out.extend_from_slice(&self.to[g.to.clone()]);
            } else if dims.iter().all(|&d| d == 1) {
                out.extend(g.to.clone().map(|_| 1));
            } else {
                bail!(DatasetError::UnsupportedReshape {
                    from: shape.to_vec(),
                    to: self.to.clone(),
                    reason: "broadcast axes cannot be merged or split",
                });
            }
        }
        Ok(out)
    }

    /// Strides for the target shape when only unit axes change.
    pub fn unit_strides(&self, strides: &[Ixs]) -> Option<Vec<Ixs>> {
        if !self.is_ones_only() {
            return None;
        }
        let groups = self.groups.as_ref().ok()?;
        let mut out = Vec::with_capacity(self.to.len());
        for g in groups {
            match (g.from.len(), g.to.len()) {
                (1, 1) => out.push(strides[g.from.start]),
                (0, 1) => out.push(0),
                _ => {}
            }
        }
        Some(out)
    }
}

/// Walk both shapes with a cursor each, pairing equal axes, skipping unit
/// axes and otherwise growing a run on the smaller side until the products
/// agree.
fn axis_groups(from: &[Ix], to: &[Ix]) -> std::result::Result<Vec<AxisGroup>, &'static str> {
    let mut groups = Vec::new();
    let mut fi = 0;
    let mut ti = 0;

    while fi < from.len() || ti < to.len() {
        if fi < from.len() && ti < to.len() && from[fi] == to[ti] {
            groups.push(AxisGroup { from: fi..fi + 1, to: ti..ti + 1 });
            fi += 1;
            ti += 1;
            continue;
        }
        if fi < from.len() && from[fi] == 1 {
            groups.push(AxisGroup { from: fi..fi + 1, to: ti..ti });
            fi += 1;
            continue;
        }
        if ti < to.len() && to[ti] == 1 {
            groups.push(AxisGroup { from: fi..fi, to: ti..ti + 1 });
            ti += 1;
            continue;
        }
        if fi >= from.len() || ti >= to.len() {
            return Err("axis products do not line up");
        }

        let (f0, t0) = (fi, ti);
        let mut fp = from[fi];
        let mut tp = to[ti];
        fi += 1;
        ti += 1;
        while fp != tp {
            if fp < tp {
                if fi >= from.len() {
                    return Err("axis products do not line up");
                }
                fp *= from[fi];
                fi += 1;
            } else {
                if ti >= to.len() {
                    return Err("axis products do not line up");
                }
                tp *= to[ti];
                ti += 1;
            }
        }
        if fi - f0 > 1 && ti - t0 > 1 {
            return Err("axes are regrouped rather than merged or split");
        }
        groups.push(AxisGroup { from: f0..fi, to: t0..ti });
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    macro_rules! test_groups {
        ($from:expr => $to:expr, [$(($f:expr, $t:expr)),*]) => {
            let map = ReshapeMap::new(&$from, &$to).unwrap();
            let expected: Vec<AxisGroup> = vec![$(AxisGroup { from: $f, to: $t }),*];
            assert_eq!(map.groups().unwrap(), &expected[..]);
        };
    }

    #[test]
    fn groupings() {
        test_groups!([4, 5, 6] => [4, 30], [(0..1, 0..1), (1..3, 1..2)]);
        test_groups!([4, 30] => [4, 5, 6], [(0..1, 0..1), (1..2, 1..3)]);
        test_groups!([1, 3, 1] => [3, 1], [(0..1, 0..0), (1..2, 0..1), (2..3, 1..2)]);
        test_groups!([3] => [1, 3], [(0..0, 0..1), (0..1, 1..2)]);
    }

    #[test]
    fn ones_only() {
        assert!(ReshapeMap::new(&[1, 3, 1], &[3, 1]).unwrap().is_ones_only());
        assert!(!ReshapeMap::new(&[4, 5, 6], &[20, 6]).unwrap().is_ones_only());
        let map = ReshapeMap::new(&[3, 1, 4], &[1, 3, 4]).unwrap();
        assert_eq!(map.unit_strides(&[4, 4, 1]).unwrap(), vec![0, 4, 1]);
    }

    #[test]
    fn ambiguous() {
        let map = ReshapeMap::new(&[2, 3], &[3, 2]).unwrap();
        assert!(!map.is_ones_only());
        assert_eq!(map.groups().unwrap_err().kind(), ErrorKind::UnsupportedReshape);
        assert_eq!(map.reshape_shape(&[2, 3]).unwrap(), vec![3, 2]);
        let e = ReshapeMap::new(&[2, 3], &[7]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::IncompatibleShapes);
    }

    #[test]
    fn field_shapes() {
        let map = ReshapeMap::new(&[4, 5, 6], &[4, 30]).unwrap();
        assert_eq!(map.reshape_shape(&[4, 5, 6]).unwrap(), vec![4, 30]);
        assert_eq!(map.reshape_shape(&[4, 1, 1]).unwrap(), vec![4, 1]);
        assert_eq!(map.reshape_shape(&[1, 5, 6]).unwrap(), vec![1, 30]);
        assert_eq!(
            map.reshape_shape(&[4, 5, 1]).unwrap_err().kind(),
            ErrorKind::UnsupportedReshape
        );
        assert_eq!(
            map.remap_axes(&[Some('a'), Some('b'), Some('c')]).unwrap(),
            vec![Some('a'), None]
        );
    }
}
