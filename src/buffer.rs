// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{DatasetError, Result};
use crate::Ix;

/// Largest buffer, in scalar elements, that a dataset will try to allocate.
const MAX_ELEMENTS: usize = isize::MAX as usize / 16;

/// The slot holding a root buffer. Every view of one root holds a handle to
/// the same slot and reads and writes through it.
///
/// The generation counts write locks taken on the slot, so cached values
/// derived from the data can tell whether any handle has written since.
pub(crate) struct SharedBuffer<A> {
    slot: Arc<RwLock<Vec<A>>>,
    generation: Arc<AtomicUsize>,
}

impl<A> Clone for SharedBuffer<A> {
    fn clone(&self) -> Self {
        SharedBuffer {
            slot: Arc::clone(&self.slot),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<A> SharedBuffer<A> {
    pub fn new(data: Vec<A>) -> Self {
        SharedBuffer {
            slot: Arc::new(RwLock::new(data)),
            generation: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<A>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<A>> {
        let guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::Release);
        guard
    }

    pub fn generation(&self) -> usize {
        self.generation.load(Ordering::Acquire)
    }

    /// Identity of the slot, comparable across element types.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.slot) as *const () as usize
    }
}

fn allocation_failure(shape: &[Ix], item_size: usize) -> DatasetError {
    DatasetError::AllocationFailure {
        shape: shape.to_vec(),
        item_size,
    }
}

/// Number of scalar elements in `shape` with `item_size` elements per item.
///
/// **Errors** with `AllocationFailure` if the count overflows or exceeds
/// what a buffer may hold.
pub(crate) fn element_count(shape: &[Ix], item_size: usize) -> Result<usize> {
    crate::dimension::size_checked(shape)
        .and_then(|n| n.checked_mul(item_size))
        .filter(|&n| n <= MAX_ELEMENTS)
        .ok_or_else(|| allocation_failure(shape, item_size))
}

/// An empty vector with room for `size(shape) * item_size` elements.
pub(crate) fn with_capacity<A>(shape: &[Ix], item_size: usize) -> Result<Vec<A>> {
    let n = element_count(shape, item_size)?;
    let mut v = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|_| allocation_failure(shape, item_size))?;
    Ok(v)
}

/// Allocate `size(shape) * item_size` copies of `fill`.
pub(crate) fn allocate<A: Clone>(shape: &[Ix], item_size: usize, fill: A) -> Result<Vec<A>> {
    let n = element_count(shape, item_size)?;
    let mut v = with_capacity(shape, item_size)?;
    v.resize(n, fill);
    Ok(v)
}
