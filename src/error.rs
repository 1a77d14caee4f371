// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::io;

/// An error raised by a dataset, view, iterator or lazy dataset operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DatasetError {
    #[error("axis {axis} is out of range for rank {rank}")]
    InvalidAxis { axis: isize, rank: usize },

    #[error("axes {axes:?} are not a permutation of 0..{rank}")]
    InvalidPermutation { axes: Vec<isize>, rank: usize },

    #[error("incompatible shapes: {a:?} and {b:?}")]
    IncompatibleShapes { a: Vec<usize>, b: Vec<usize> },

    #[error("incompatible item sizes: {a} and {b}")]
    IncompatibleItemSize { a: usize, b: usize },

    #[error("cannot reshape {from:?} to {to:?}: {reason}")]
    UnsupportedReshape {
        from: Vec<usize>,
        to: Vec<usize>,
        reason: &'static str,
    },

    #[error("cannot allocate buffer of shape {shape:?} (item size {item_size})")]
    AllocationFailure { shape: Vec<usize>, item_size: usize },

    #[error("dataset I/O failure: {context}")]
    DatasetIOFailure {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("dataset is not writable: {0}")]
    NotWritable(String),

    #[error("position {pos:?} is out of bounds for shape {shape:?}")]
    OutOfBounds { pos: Vec<usize>, shape: Vec<usize> },

    #[error("index {index} is out of range for axis of length {len}")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("invalid slice: {0}")]
    InvalidSlice(String),

    #[error("integer division by zero")]
    DivideByZero,
}

/// Error code for a [`DatasetError`].
///
/// This enumeration is not exhaustive. The representation of the enum
/// is not guaranteed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// axis out of range
    InvalidAxis,
    /// axes are not a bijection over the rank
    InvalidPermutation,
    /// shapes cannot be broadcast or combined
    IncompatibleShapes,
    /// compound item widths cannot be combined
    IncompatibleItemSize,
    /// ambiguous merge or split of axes
    UnsupportedReshape,
    /// backing buffer too large
    AllocationFailure,
    /// saver or loader failed
    DatasetIOFailure,
    /// no saver, or saver refuses writes
    NotWritable,
    /// position outside the shape
    OutOfBounds,
    /// malformed slice
    InvalidSlice,
    /// integer division by zero
    DivideByZero,
}

impl DatasetError {
    /// Return the `ErrorKind` of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatasetError::InvalidAxis { .. } => ErrorKind::InvalidAxis,
            DatasetError::InvalidPermutation { .. } => ErrorKind::InvalidPermutation,
            DatasetError::IncompatibleShapes { .. } => ErrorKind::IncompatibleShapes,
            DatasetError::IncompatibleItemSize { .. } => ErrorKind::IncompatibleItemSize,
            DatasetError::UnsupportedReshape { .. } => ErrorKind::UnsupportedReshape,
            DatasetError::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            DatasetError::DatasetIOFailure { .. } => ErrorKind::DatasetIOFailure,
            DatasetError::NotWritable(_) => ErrorKind::NotWritable,
            DatasetError::OutOfBounds { .. } | DatasetError::IndexOutOfRange { .. } => {
                ErrorKind::OutOfBounds
            }
            DatasetError::InvalidSlice(_) => ErrorKind::InvalidSlice,
            DatasetError::DivideByZero => ErrorKind::DivideByZero,
        }
    }

    pub(crate) fn shapes(a: &[usize], b: &[usize]) -> Self {
        DatasetError::IncompatibleShapes {
            a: a.to_vec(),
            b: b.to_vec(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        DatasetError::DatasetIOFailure {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// Log and return a validation error.
macro_rules! bail {
    ($err:expr) => {{
        let err = $err;
        log::error!("{}", err);
        return Err(err);
    }};
}

pub(crate) use bail;
