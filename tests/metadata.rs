// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use ndset::prelude::*;
use ndset::{AuxiliaryMetadata, AxesMetadata};

#[test]
fn errors_are_sliced_with_the_data() {
    let a = Dataset::range(100).reshape(&[10, 10]).unwrap();
    let e = Dataset::from_shape_fn(&[10, 10], |p| (1000 + p[0] * 10 + p[1]) as f64).unwrap();
    a.set_errors(&e).unwrap();

    let b = a.slice(&s![5..]).unwrap();
    assert_eq!(b.shape(), &[5, 10]);
    let be = b.errors().unwrap();
    assert_eq!(be.shape(), &[5, 10]);
    for i in 0..5 {
        for j in 0..10 {
            assert_eq!(be.get(&[i, j]).unwrap(), (1000 + (i + 5) * 10 + j) as f64);
        }
    }

    let t = b.transpose(&[]).unwrap();
    assert_eq!(t.errors().unwrap().get(&[3, 1]).unwrap(), 1063.);
}

#[test]
fn broadcast_errors_stay_small() {
    let a = Dataset::<f32>::zeros(&[4, 3]).unwrap();
    a.set_error_value(0.5).unwrap();
    let e = a.errors().unwrap();
    assert_eq!(e.shape(), &[1, 1]);
    let v = a.slice_view(&s![1..3]).unwrap();
    assert_eq!(v.errors().unwrap().shape(), &[1, 1]);
    let eb = v.errors_broadcast().unwrap();
    assert_eq!(eb.shape(), &[2, 3]);
    assert_eq!(eb.to_vec(), vec![0.5; 6]);

    let wrong = Dataset::<f64>::zeros(&[3, 3]).unwrap();
    assert_eq!(a.set_errors(&wrong).unwrap_err().kind(), ErrorKind::IncompatibleShapes);
}

#[test]
fn errors_set_to_self_are_ignored() {
    let a = Dataset::range(4);
    a.set_errors(&a.view()).unwrap();
    assert!(!a.has_errors());
}

#[test]
fn axes_follow_transpose_and_slice() {
    let a = Dataset::<f64>::zeros(&[2, 3]).unwrap();
    let mut axes = AxesMetadata::new(a.shape());
    axes.add_axis(0, &Dataset::from_vec(&[2], vec![10, 20]).unwrap()).unwrap();
    axes.add_axis(-1, &Dataset::from_vec(&[3], vec![0.1, 0.2, 0.3]).unwrap()).unwrap();
    assert_eq!(
        axes.add_axis(1, &Dataset::from_vec(&[2], vec![1, 2]).unwrap()).unwrap_err().kind(),
        ErrorKind::IncompatibleShapes
    );
    a.set_metadata(axes);

    let t = a.transpose(&[1, 0]).unwrap();
    let m = t.first_metadata::<AxesMetadata>().unwrap();
    assert_eq!(m.axis(0).unwrap()[0].to_vec(), vec![0.1, 0.2, 0.3]);
    assert_eq!(m.axis(1).unwrap()[0].shape(), &[1, 2]);

    let s = t.slice(&s![..;2]).unwrap();
    let m = s.first_metadata::<AxesMetadata>().unwrap();
    assert_eq!(m.axis(0).unwrap()[0].to_vec(), vec![0.1, 0.3]);
}

#[test]
fn auxiliary_and_statistics() {
    let mut a = Dataset::from_vec(&[2, 2], vec![1, 5, 3, 2]).unwrap();
    let mut aux = AuxiliaryMetadata::new();
    aux.insert("mask", &Dataset::from_vec(&[2, 2], vec![1, 0, 0, 1]).unwrap());
    a.add_metadata(aux);
    let r = a.slice(&s![1..]).unwrap();
    let aux = r.first_metadata::<AuxiliaryMetadata>().unwrap();
    assert_eq!(aux.get("mask").unwrap().to_vec(), vec![0., 1.]);
    assert_eq!(aux.names().collect::<Vec<_>>(), vec!["mask"]);

    let stats = a.statistics();
    assert_eq!(stats.max, Some(5.));
    assert_eq!(stats.mean(), Some(2.75));
    a.set(&[0, 1], 9).unwrap();
    assert_eq!(a.statistics().max, Some(9.));
}

#[test]
fn statistics_see_writes_through_views() {
    let a = Dataset::from_vec(&[3], vec![1, 5, 2]).unwrap();
    assert_eq!(a.statistics().max, Some(5.));
    a.view().set(&[0], 9).unwrap();
    assert_eq!(a.get(&[0]).unwrap(), 9);
    assert_eq!(a.statistics().max, Some(9.));

    let mut v = a.slice_view(&s![1..]).unwrap();
    assert_eq!(v.statistics().min, Some(2.));
    let s = SliceND::new(a.shape(), &s![..]).unwrap();
    let mut b = a.view();
    b.set_slice(&s, &Dataset::from_vec(&[3], vec![-1, -2, -3]).unwrap())
        .unwrap();
    assert_eq!(a.statistics().sum, -6.);
    assert_eq!(v.statistics().min, Some(-3.));
    v.set(&[0], 4).unwrap();
    assert_eq!(a.statistics().max, Some(4.));
}

#[derive(Clone, Debug, Default)]
struct Tag(Vec<String>);

impl Metadata for Tag {
    fn on_slice(&mut self, slice: &SliceND, _as_view: bool) -> ndset::Result<()> {
        self.0.push(slice.to_string());
        Ok(())
    }
}

#[test]
fn custom_metadata_sees_operations() {
    let a = Dataset::<u8>::zeros(&[4]).unwrap();
    a.set_metadata(Tag::default());
    let b = a.slice_view(&s![1..;2]).unwrap();
    assert_eq!(b.first_metadata::<Tag>().unwrap().0, vec!["[1:4:2]".to_string()]);
    a.clear_metadata::<Tag>();
    assert!(a.first_metadata::<Tag>().is_none());
    assert!(b.first_metadata::<Tag>().is_some());
    assert!(a.clone().metadata::<Tag>().is_empty());
}
