// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Storage back ends of lazy datasets.
//!
//! A [`Loader`] reads regions, a [`Saver`] also writes them. Regions are
//! [`SliceND`]s in the storage's own coordinates. A write may carry an
//! expanded region whose source shape is larger than what is stored; the
//! saver grows its storage to that shape.
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use log::{debug, error};

use crate::element::Element;
use crate::slice::{Slice, SliceND};
use crate::{Dataset, DatasetError};

/// Reads regions of stored data.
pub trait Loader<A: Element>: Send + Sync {
    fn is_file_readable(&self) -> bool;

    /// Return a dense dataset of the region's shape.
    fn get_dataset(&self, slice: &SliceND) -> io::Result<Dataset<A>>;
}

/// Reads and writes regions of stored data.
pub trait Saver<A: Element>: Loader<A> {
    fn is_file_writeable(&self) -> bool;

    /// Write `data`, of the region's shape, and return once it is stored.
    fn set_slice(&self, slice: &SliceND, data: &Dataset<A>) -> io::Result<()>;

    /// Value of elements that exist but were never written.
    fn set_fill_value(&self, _fill: A) {}

    /// The asynchronous interface, if this saver has one.
    fn as_async(&self) -> Option<&dyn AsyncSaver<A>> {
        None
    }
}

/// A saver that can accept writes without waiting for them.
pub trait AsyncSaver<A: Element>: Saver<A> {
    /// Hand `data` over for writing and return. Failures surface at the
    /// next [`flush`](Self::flush).
    fn set_slice_async(&self, slice: SliceND, data: Dataset<A>) -> io::Result<()>;

    /// Wait until every write handed over so far is stored.
    fn flush(&self) -> io::Result<()>;
}

fn to_io(e: DatasetError) -> io::Error {
    match e {
        DatasetError::DatasetIOFailure { source, .. } => source,
        e => io::Error::new(io::ErrorKind::InvalidInput, e),
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// A saver keeping its data in a [`Dataset`]. Useful for tests and for
/// presenting in-memory data through the lazy interface.
#[derive(Debug)]
pub struct InMemorySaver<A: Element> {
    data: Mutex<Dataset<A>>,
    fill: Mutex<A>,
    writeable: AtomicBool,
}

impl<A: Element> InMemorySaver<A> {
    pub fn new(data: Dataset<A>) -> Self {
        InMemorySaver {
            data: Mutex::new(data),
            fill: Mutex::new(A::zero()),
            writeable: AtomicBool::new(true),
        }
    }

    /// Value of elements created when the storage grows.
    pub fn with_fill(self, fill: A) -> Self {
        *lock(&self.fill) = fill;
        self
    }

    pub fn set_writeable(&self, writeable: bool) {
        self.writeable.store(writeable, Ordering::SeqCst);
    }

    /// A copy of the stored data.
    pub fn dataset(&self) -> Dataset<A> {
        lock(&self.data).clone()
    }

    fn grow(&self, d: &mut Dataset<A>, shape: &[usize]) -> crate::Result<()> {
        debug!("growing in-memory {}{:?} to {:?}", d.name(), d.shape(), shape);
        let mut grown = Dataset::zeros_compound(d.item_size(), shape)?;
        grown.fill(*lock(&self.fill));
        let old: Vec<Slice> = d.shape().iter().map(|&n| Slice::from(..n)).collect();
        grown.set_slice(&SliceND::new(shape, &old)?, d)?;
        grown.set_name(d.name());
        *d = grown;
        Ok(())
    }
}

impl<A: Element> Loader<A> for InMemorySaver<A> {
    fn is_file_readable(&self) -> bool {
        true
    }

    fn get_dataset(&self, slice: &SliceND) -> io::Result<Dataset<A>> {
        lock(&self.data).get_slice(slice).map_err(to_io)
    }
}

impl<A: Element> Saver<A> for InMemorySaver<A> {
    fn is_file_writeable(&self) -> bool {
        self.writeable.load(Ordering::SeqCst)
    }

    fn set_slice(&self, slice: &SliceND, data: &Dataset<A>) -> io::Result<()> {
        let mut d = lock(&self.data);
        if slice.source_shape() != d.shape() {
            let grows = slice.rank() == d.rank()
                && slice.source_shape().iter().zip(d.shape()).all(|(&n, &o)| n >= o);
            if !grows {
                return Err(to_io(DatasetError::shapes(slice.source_shape(), d.shape())));
            }
            self.grow(&mut d, slice.source_shape()).map_err(to_io)?;
        }
        d.set_slice(slice, data).map_err(to_io)
    }

    fn set_fill_value(&self, fill: A) {
        *lock(&self.fill) = fill;
    }
}

enum Job<A> {
    Write(SliceND, Dataset<A>),
    Flush(Sender<Option<io::Error>>),
}

/// Adapts a [`Saver`] to [`AsyncSaver`] by writing on a worker thread.
///
/// Writes are stored in the order they were handed over. The first failed
/// write is reported by the next [`flush`](AsyncSaver::flush); later writes
/// are still attempted. Dropping the saver waits for pending writes.
pub struct ThreadedSaver<A: Element> {
    inner: Arc<dyn Saver<A>>,
    jobs: Mutex<Option<Sender<Job<A>>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<A: Element> ThreadedSaver<A> {
    pub fn new(inner: Arc<dyn Saver<A>>) -> io::Result<Self> {
        let (tx, rx) = channel();
        let saver = Arc::clone(&inner);
        let worker = thread::Builder::new()
            .name("ndset-saver".to_string())
            .spawn(move || Self::run(saver, rx))?;
        Ok(ThreadedSaver {
            inner,
            jobs: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    fn run(saver: Arc<dyn Saver<A>>, rx: Receiver<Job<A>>) {
        let mut failure: Option<io::Error> = None;
        for job in rx {
            match job {
                Job::Write(slice, data) => {
                    if let Err(e) = saver.set_slice(&slice, &data) {
                        error!("background write of {} failed: {}", slice, e);
                        failure.get_or_insert(e);
                    }
                }
                Job::Flush(reply) => {
                    let _ = reply.send(failure.take());
                }
            }
        }
    }

    fn send(&self, job: Job<A>) -> io::Result<()> {
        let jobs = lock(&self.jobs);
        let tx = jobs
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "saver is closed"))?;
        tx.send(job)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "saver thread has stopped"))
    }
}

impl<A: Element> Loader<A> for ThreadedSaver<A> {
    fn is_file_readable(&self) -> bool {
        self.inner.is_file_readable()
    }

    fn get_dataset(&self, slice: &SliceND) -> io::Result<Dataset<A>> {
        self.inner.get_dataset(slice)
    }
}

impl<A: Element> Saver<A> for ThreadedSaver<A> {
    fn is_file_writeable(&self) -> bool {
        self.inner.is_file_writeable()
    }

    fn set_slice(&self, slice: &SliceND, data: &Dataset<A>) -> io::Result<()> {
        self.flush()?;
        self.inner.set_slice(slice, data)
    }

    fn set_fill_value(&self, fill: A) {
        self.inner.set_fill_value(fill)
    }

    fn as_async(&self) -> Option<&dyn AsyncSaver<A>> {
        Some(self)
    }
}

impl<A: Element> AsyncSaver<A> for ThreadedSaver<A> {
    fn set_slice_async(&self, slice: SliceND, data: Dataset<A>) -> io::Result<()> {
        if !self.inner.is_file_writeable() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "saver is not writeable",
            ));
        }
        self.send(Job::Write(slice, data))
    }

    fn flush(&self) -> io::Result<()> {
        let (tx, rx) = channel();
        self.send(Job::Flush(tx))?;
        match rx.recv() {
            Ok(None) => Ok(()),
            Ok(Some(e)) => Err(e),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "saver thread has stopped",
            )),
        }
    }
}

impl<A: Element> Drop for ThreadedSaver<A> {
    fn drop(&mut self) {
        lock(&self.jobs).take();
        if let Some(worker) = lock(&self.worker).take() {
            if worker.join().is_err() {
                error!("saver thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s;

    #[test]
    fn in_memory_grows_with_fill() {
        let saver = InMemorySaver::new(Dataset::from_vec(&[2], vec![1, 2]).unwrap()).with_fill(-1);
        let slice = SliceND::with_max_shape(&[2], &[crate::UNLIMITED], &s![4..5]).unwrap();
        saver
            .set_slice(&slice, &Dataset::from_vec(&[1], vec![9]).unwrap())
            .unwrap();
        assert_eq!(saver.dataset().to_vec(), vec![1, 2, -1, -1, 9]);
        let read = saver.get_dataset(&SliceND::new(&[5], &s![1..3]).unwrap()).unwrap();
        assert_eq!(read.to_vec(), vec![2, -1]);
    }

    #[test]
    fn in_memory_rejects_mismatched_region() {
        let saver = InMemorySaver::new(Dataset::<f64>::zeros(&[3]).unwrap());
        let e = saver
            .set_slice(&SliceND::full(&[2]), &Dataset::zeros(&[2]).unwrap())
            .unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn threaded_writes_land_after_flush() {
        let store = Arc::new(InMemorySaver::new(Dataset::<f64>::zeros(&[4]).unwrap()));
        let threaded = ThreadedSaver::new(store.clone()).unwrap();
        for i in 0..4 {
            let slice = SliceND::new(&[4], &[Slice::index(i)]).unwrap();
            threaded
                .set_slice_async(slice, Dataset::from_vec(&[1], vec![i as f64]).unwrap())
                .unwrap();
        }
        threaded.flush().unwrap();
        assert_eq!(store.dataset().to_vec(), vec![0., 1., 2., 3.]);
    }

    #[test]
    fn threaded_reports_failure_at_flush() {
        let store = Arc::new(InMemorySaver::new(Dataset::<f64>::zeros(&[4]).unwrap()));
        let threaded = ThreadedSaver::new(store.clone()).unwrap();
        threaded
            .set_slice_async(SliceND::full(&[2]), Dataset::zeros(&[2]).unwrap())
            .unwrap();
        assert!(threaded.flush().is_err());
        threaded.flush().unwrap();
    }
}
