// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use ndset::prelude::*;
use ndset::utils;
use quickcheck::{quickcheck, TestResult};

quickcheck! {
    fn split_then_concatenate(rows: u8, cols: u8, cuts: Vec<u8>) -> TestResult {
        let (r, c) = (rows as Ix % 7 + 1, cols as Ix % 5 + 1);
        let a = Dataset::range(r * c).reshape(&[r, c]).unwrap();
        let mut indices: Vec<Ix> = cuts.iter().map(|&i| i as Ix % (r + 1)).collect();
        indices.sort_unstable();
        let parts = utils::split(&a, &indices, 0).unwrap();
        let refs: Vec<&Dataset<f64>> = parts.iter().collect();
        let joined = utils::concatenate(&refs, 0).unwrap();
        TestResult::from_bool(joined == a)
    }
}

#[test]
fn concatenate_checks_shapes() {
    let a = Dataset::<i32>::zeros(&[2, 3]).unwrap();
    let b = Dataset::<i32>::zeros(&[2, 4]).unwrap();
    assert_eq!(utils::concatenate(&[&a, &b], -1).unwrap().shape(), &[2, 7]);
    assert_eq!(
        utils::concatenate(&[&a, &b], 0).unwrap_err().kind(),
        ErrorKind::IncompatibleShapes
    );
    assert_eq!(
        utils::concatenate::<i32>(&[], 0).unwrap_err().kind(),
        ErrorKind::InvalidSlice
    );
    let line = Dataset::<i32>::zeros(&[3]).unwrap();
    assert_eq!(
        utils::append(&a, &line, 0).unwrap_err().kind(),
        ErrorKind::IncompatibleShapes
    );
}

#[test]
fn tile_wide_and_narrow_rows() {
    let narrow = Dataset::from_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
    let t = utils::tile(&narrow, &[2, 1]).unwrap();
    assert_eq!(t.shape(), &[4, 2]);
    assert_eq!(t.to_vec(), vec![1, 2, 3, 4, 1, 2, 3, 4]);
    let t = utils::tile(&narrow, &[2, 1, 2]).unwrap();
    assert_eq!(t.shape(), &[2, 2, 4]);
    assert_eq!(&t.to_vec()[..8], &[1, 2, 1, 2, 3, 4, 3, 4]);

    let wide = Dataset::range(200).reshape(&[2, 100]).unwrap();
    let t = utils::tile(&wide, &[1, 3]).unwrap();
    assert_eq!(t.shape(), &[2, 300]);
    assert_eq!(t.get(&[1, 250]).unwrap(), 150.);
    assert_eq!(t.get(&[0, 199]).unwrap(), 99.);
}

#[test]
fn take_from_views() {
    let a = Dataset::range(12).reshape(&[3, 4]).unwrap();
    let v = a.transpose(&[]).unwrap();
    let t = utils::take(&v, &[3, 0], Some(0)).unwrap();
    assert_eq!(t.shape(), &[2, 3]);
    assert_eq!(t.to_vec(), vec![3., 7., 11., 0., 4., 8.]);
    let flat = utils::take(&v, &[1, 11], None).unwrap();
    assert_eq!(flat.to_vec(), vec![4., 11.]);
    assert_eq!(utils::take(&v, &[], None).unwrap_err().kind(), ErrorKind::InvalidSlice);
    assert_eq!(utils::take(&v, &[12], None).unwrap_err().kind(), ErrorKind::OutOfBounds);
}

#[test]
fn put_through_view() {
    let a = Dataset::<i32>::zeros(&[2, 3]).unwrap();
    let mut v = a.transpose(&[]).unwrap();
    utils::put(&mut v, &[0, 1, 2], &Dataset::from_vec(&[2], vec![7, 8]).unwrap()).unwrap();
    assert_eq!(a.to_vec(), vec![7, 7, 0, 8, 0, 0]);
    let err = utils::put(&mut v, &[1, 6], &Dataset::from_vec(&[1], vec![9]).unwrap()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    assert_eq!(a.get(&[1, 0]).unwrap(), 8);
}

#[test]
fn roll_and_resize() {
    let a = Dataset::from_vec(&[2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(utils::roll(&a, 1, Some(1)).unwrap().to_vec(), vec![3, 1, 2, 6, 4, 5]);
    assert_eq!(utils::roll(&a, -2, None).unwrap().to_vec(), vec![3, 4, 5, 6, 1, 2]);
    assert_eq!(utils::roll(&a, -2, None).unwrap().shape(), &[2, 3]);
    let r = utils::resize(&a, &[4, 2]).unwrap();
    assert_eq!(r.to_vec(), vec![1, 2, 3, 4, 5, 6, 1, 2]);
    let empty = Dataset::<i32>::zeros(&[0]).unwrap();
    assert_eq!(utils::resize(&empty, &[3]).unwrap().to_vec(), vec![0, 0, 0]);
}

#[test]
fn select_broadcasts_condition() {
    let cond = Dataset::from_vec(&[1, 3], vec![true, false, true]).unwrap();
    let x = Dataset::from_vec(&[2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
    let y = Dataset::from_elem(&[], -1).unwrap();
    let s = utils::select(&cond, &x, &y).unwrap();
    assert_eq!(s.to_vec(), vec![1, -1, 3, 4, -1, 6]);
}
