// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use ndset::prelude::*;

use itertools::enumerate;

#[test]
fn reshape() {
    let data = (1..=8).collect::<Vec<i32>>();
    let v = Dataset::from_vec(&[8], data).unwrap();
    assert_eq!(v.reshape(&[3, 3]).unwrap_err().kind(), ErrorKind::IncompatibleShapes);
    let u = v.reshape(&[2, 2, 2]).unwrap();
    assert_eq!(u.shape(), &[2, 2, 2]);
    assert!(u.shares_buffer(&v));
    let s = u.reshape(&[4, 2]).unwrap();
    assert_eq!(s.shape(), &[4, 2]);
    assert_eq!(s.get(&[2, 1]).unwrap(), 6);
}

#[test]
fn reshape_and_back_keeps_order() {
    let a = Dataset::range(120).reshape(&[4, 5, 6]).unwrap();
    let b = a.reshape(&[4, 30]).unwrap();
    for (i, x) in enumerate(b.to_vec()) {
        assert_eq!(x, i as f64);
    }
    let c = b.reshape(&[4, 5, 6]).unwrap();
    assert_eq!(c, a);
    assert_eq!(c.get(&[3, 4, 5]).unwrap(), 119.);
}

#[test]
fn reshape_strided_view_copies() {
    let a = Dataset::range(12).reshape(&[3, 4]).unwrap();
    let t = a.transpose(&[]).unwrap();
    let f = t.flatten().unwrap();
    assert!(!f.shares_buffer(&a));
    assert_eq!(f.to_vec(), vec![0., 4., 8., 1., 5., 9., 2., 6., 10., 3., 7., 11.]);

    // only unit axes change, so the strided view is kept
    let col = a.slice_view(&s![.., 1..2]).unwrap();
    let sq = col.squeeze().unwrap();
    assert_eq!(sq.shape(), &[3]);
    assert!(sq.shares_buffer(&a));
    assert_eq!(sq.to_vec(), vec![1., 5., 9.]);
}

#[test]
fn squeeze_variants() {
    let a = Dataset::<f32>::zeros(&[1, 3, 1, 4, 1]).unwrap();
    assert_eq!(a.squeeze().unwrap().shape(), &[3, 4]);
    assert_eq!(a.squeeze_ends().unwrap().shape(), &[3, 1, 4]);
    assert_eq!(a.squeeze_axes(&[0, -1]).unwrap().shape(), &[3, 1, 4]);
    assert_eq!(
        a.squeeze_axes(&[1]).unwrap_err().kind(),
        ErrorKind::IncompatibleShapes
    );
}

#[test]
fn set_shape_in_place() {
    let mut a = Dataset::range(6);
    let v = a.view();
    a.set_shape(&[2, 3]).unwrap();
    assert_eq!(a.shape(), &[2, 3]);
    assert_eq!(v.shape(), &[6]);
    assert_eq!(a.set_shape(&[4]).unwrap_err().kind(), ErrorKind::IncompatibleShapes);
}

#[test]
fn errors_follow_reshape() {
    let a = Dataset::range(6).reshape(&[2, 3]).unwrap();
    a.set_errors(&Dataset::from_vec(&[2, 1], vec![0.5, 1.5]).unwrap()).unwrap();
    let b = a.reshape(&[1, 2, 1, 3]).unwrap();
    let e = b.errors().unwrap();
    assert_eq!(e.shape(), &[1, 2, 1, 1]);
    assert_eq!(e.to_vec(), vec![0.5, 1.5]);
}

#[test]
fn regrouped_broadcast_errors_are_unsupported() {
    let a = Dataset::range(6).reshape(&[2, 3]).unwrap();
    a.set_errors(&Dataset::from_vec(&[3], vec![1., 2., 3.]).unwrap()).unwrap();
    let err = a.reshape(&[3, 2]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedReshape);

    // without errors the same reshape is fine
    let b = Dataset::range(6).reshape(&[2, 3]).unwrap();
    assert_eq!(b.reshape(&[3, 2]).unwrap().shape(), &[3, 2]);
}

#[test]
fn reshape_to_overflowing_shape() {
    let a = Dataset::range(4);
    let e = a.reshape(&[usize::MAX, 2, 2]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::IncompatibleShapes);
    let mut b = a.clone();
    assert!(b.set_shape(&[2, usize::MAX]).is_err());
    assert_eq!(b.shape(), &[4]);
}
