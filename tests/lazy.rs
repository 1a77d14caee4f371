// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use ndset::iterators::SliceNDIter;
use ndset::lazy::{DataEvent, InMemorySaver, ThreadedSaver};
use ndset::lazy_maths;
use ndset::prelude::*;

/// Frames of a `[64, 64, 100, 100]` scan, each filled with its frame number.
struct Scan {
    reads: AtomicUsize,
}

impl Loader<f64> for Scan {
    fn is_file_readable(&self) -> bool {
        true
    }

    fn get_dataset(&self, slice: &SliceND) -> io::Result<Dataset<f64>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let frame = (slice.start()[0] * 64 + slice.start()[1]) as f64;
        Dataset::from_elem(slice.shape(), frame).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

#[test]
fn iterate_frames_of_large_scan() {
    let scan = Arc::new(Scan {
        reads: AtomicUsize::new(0),
    });
    let lazy = LazyDataset::new(scan.clone(), "scan", 1, &[64, 64, 100, 100]);
    let mut it = SliceNDIter::new(&SliceND::full(lazy.shape()), &[2, 3]).unwrap();
    assert_eq!(it.used_shape(), vec![64, 64]);

    let mut seen = vec![false; 64 * 64];
    while let Some(region) = it.next() {
        let frame = lazy.get_slice(&region).unwrap().squeeze().unwrap();
        assert_eq!(frame.shape(), &[100, 100]);
        let pos = it.used_pos();
        let id = frame.get(&[0, 0]).unwrap() as usize;
        assert_eq!(id, pos[0] * 64 + pos[1]);
        assert!(!seen[id]);
        seen[id] = true;
    }
    assert!(seen.iter().all(|&s| s));
    assert_eq!(scan.reads.load(Ordering::SeqCst), 4096);
}

#[test]
fn lazy_sum_matches_eager() {
    let data = Dataset::from_shape_fn(&[4, 5, 5], |p| {
        (p[0] as f64 * 0.37).sin() + p[1] as f64 * 1.5 - (p[2] as f64).sqrt()
    })
    .unwrap();
    let lazy = LazyDataset::from_dataset(data.clone());
    for axis in 0..3 {
        let l = lazy_maths::sum(&lazy, axis).unwrap();
        let e = data.sum_axis(axis).unwrap();
        assert_eq!(l.shape(), e.shape());
        for (x, y) in l.to_vec().into_iter().zip(e.to_vec()) {
            assert_relative_eq!(x, y, epsilon = 1e-15, max_relative = 1e-9);
        }
    }

    let both = lazy_maths::sum_axes(&lazy, false, &[0, 2]).unwrap();
    assert_eq!(both.shape(), &[5]);
    let kept = lazy_maths::sum_axes(&lazy, true, &[1]).unwrap();
    for (x, y) in both.to_vec().into_iter().zip(kept.to_vec()) {
        assert_relative_eq!(x, y, epsilon = 1e-12);
    }
}

#[test]
fn lazy_product_and_extrema() {
    let data = Dataset::from_vec(&[3, 2], vec![1., 4., f64::NAN, 2., 3., f64::NAN]).unwrap();
    let p = lazy_maths::product(&data, 1).unwrap();
    assert_eq!(p.get(&[0]).unwrap(), 4.);
    assert_eq!(lazy_maths::max(&data, 0).unwrap().to_vec(), vec![3., 4.]);
    assert_eq!(lazy_maths::min(&data, 0).unwrap().to_vec(), vec![1., 2.]);
    assert_eq!(lazy_maths::max(&data, 1).unwrap().to_vec(), vec![4., 2., 3.]);

    let nans = Dataset::from_elem(&[2, 2], f64::NAN).unwrap();
    assert!(lazy_maths::max(&nans, 0).unwrap().to_vec().iter().all(|v| v.is_nan()));
    assert_eq!(
        lazy_maths::max_axes(&data, &[]).unwrap_err().kind(),
        ErrorKind::InvalidSlice
    );
}

#[test]
fn mean_with_errors() {
    let data = Dataset::from_vec(&[3, 2], vec![1., 10., 2., 20., 3., 30.]).unwrap();
    data.set_error_value(2.).unwrap();
    let m = lazy_maths::mean(&data, &[1]).unwrap();
    assert_eq!(m.shape(), &[2]);
    assert_eq!(m.to_vec(), vec![2., 20.]);
    let e = m.errors().unwrap();
    for v in e.to_vec() {
        assert_relative_eq!(v, 2. / 3f64.sqrt(), epsilon = 1e-12);
    }

    let part = lazy_maths::mean_range(&data, 1, 3, &[1]).unwrap();
    assert_eq!(part.to_vec(), vec![2.5, 25.]);
    assert_eq!(
        lazy_maths::mean_range(&data, 3, 5, &[1]).unwrap_err().kind(),
        ErrorKind::InvalidSlice
    );
}

#[test]
fn views_of_lazy_data() {
    let data = Dataset::range(60).reshape(&[3, 4, 5]).unwrap().with_name("d");
    let lazy = LazyDataset::from_dataset(data.clone());
    let view = lazy
        .slice_view(&s![1.., ..;-1, 2])
        .unwrap()
        .transpose(&[2, 0, 1])
        .unwrap();
    assert_eq!(view.shape(), &[1, 2, 4]);
    let eager = data
        .slice_view(&s![1.., ..;-1, 2])
        .unwrap()
        .transpose(&[2, 0, 1])
        .unwrap();
    assert_eq!(view.get_all().unwrap(), eager);
    assert_eq!(view.slice(&s![.., 1, 1..3]).unwrap(), eager.slice(&s![.., 1, 1..3]).unwrap());
    assert_eq!(view.slice(&s![.., 2]).unwrap_err().kind(), ErrorKind::OutOfBounds);
    assert_eq!(lazy.slice(&s![-4]).unwrap_err().kind(), ErrorKind::OutOfBounds);
}

/// Records every region written and fails when asked to.
#[derive(Default)]
struct Recorder {
    regions: Mutex<Vec<String>>,
    fail: bool,
}

impl Loader<i32> for Recorder {
    fn is_file_readable(&self) -> bool {
        true
    }

    fn get_dataset(&self, slice: &SliceND) -> io::Result<Dataset<i32>> {
        Dataset::zeros(slice.shape()).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

impl Saver<i32> for Recorder {
    fn is_file_writeable(&self) -> bool {
        true
    }

    fn set_slice(&self, slice: &SliceND, _data: &Dataset<i32>) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.regions.lock().unwrap().push(slice.to_string());
        Ok(())
    }
}

#[test]
fn writes_reach_custom_saver() {
    let saver = Arc::new(Recorder::default());
    let max = [UNLIMITED, 4];
    let mut w = LazyWriteableDataset::new(saver.clone(), "rec", 1, &[1, 4], Some(&max[..]), None).unwrap();
    let events = Arc::new(AtomicUsize::new(0));
    let counter = events.clone();
    w.add_listener(Arc::new(move |_: &DataEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let row = Dataset::from_vec(&[4], vec![1, 2, 3, 4]).unwrap();
    for i in 0..3 {
        let region = w.slice_nd(&[Slice::index(i)]).unwrap();
        w.set_slice(&region, &row).unwrap();
    }
    assert_eq!(w.shape(), &[3, 4]);
    assert_eq!(events.load(Ordering::SeqCst), 3);
    assert_eq!(
        *saver.regions.lock().unwrap(),
        vec!["[0:1:1, 0:4:1]", "[1:2:1, 0:4:1]", "[2:3:1, 0:4:1]"]
    );
}

#[test]
fn failed_write_does_not_grow() {
    let saver = Arc::new(Recorder {
        fail: true,
        ..Recorder::default()
    });
    let max = [UNLIMITED];
    let mut w = LazyWriteableDataset::new(saver, "bad", 1, &[2], Some(&max[..]), None).unwrap();
    let region = w.slice_nd(&s![2..4]).unwrap();
    let err = w
        .set_slice(&region, &Dataset::from_vec(&[2], vec![1, 2]).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DatasetIOFailure);
    assert_eq!(w.shape(), &[2]);
}

#[test]
fn threaded_saver_flushes() {
    let store = Arc::new(InMemorySaver::new(Dataset::<i32>::zeros(&[2]).unwrap()));
    let threaded = Arc::new(ThreadedSaver::new(store.clone()).unwrap());
    let mut w = LazyWriteableDataset::new(threaded, "t", 1, &[2], None, None).unwrap();
    w.set_writing_async(true);
    assert!(w.is_writing_async());

    let ok = SliceND::full(&[2]);
    w.set_slice(&ok, &Dataset::from_vec(&[2], vec![3, 4]).unwrap()).unwrap();
    w.flush().unwrap();
    assert_eq!(store.dataset().to_vec(), vec![3, 4]);
    assert_eq!(w.get_all().unwrap().to_vec(), vec![3, 4]);
}

#[test]
fn lazy_errors_follow_views() {
    let lazy = LazyDataset::from_dataset(Dataset::range(12).reshape(&[3, 4]).unwrap());
    lazy.set_errors(&Dataset::from_vec(&[4], vec![0.1, 0.2, 0.3, 0.4]).unwrap())
        .unwrap();
    let v = lazy.slice_view(&s![.., 1..3]).unwrap();
    let d = v.get_all().unwrap();
    assert_eq!(d.errors_broadcast().unwrap().to_vec(), vec![0.2, 0.3, 0.2, 0.3, 0.2, 0.3]);
    let t = lazy.transpose(&[]).unwrap();
    assert_eq!(t.get_all().unwrap().errors().unwrap().shape(), &[4, 1]);
}
