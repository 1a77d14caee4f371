// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
#![crate_name = "ndset"]
#![doc(html_root_url = "https://docs.rs/ndset/0.1/")]
#![allow(clippy::many_single_char_names, clippy::len_zero)]

//! The `ndset` crate provides an *n*-dimensional dataset type, [`Dataset`],
//! for scalar and compound items, with views that share data, broadcasting
//! arithmetic, and lazy datasets read and written one region at a time.
//!
//! - [`Dataset`]: an element type, a shape, an item size, and a view onto a
//!   shared buffer.
//!   - Slicing, transposition, flipping and broadcasting make views without
//!     copying; writes through a view are seen by every view of the buffer.
//!   - [`get_slice`](Dataset::get_slice) and [`Clone`] copy.
//!   - Reshaping keeps a view whenever the layout allows, and copies
//!     otherwise.
//! - Slices are [`Slice`] per axis (with negative steps and indices counting
//!   from the end) or a resolved [`SliceND`]; the [`s!`] macro builds them
//!   with range syntax.
//! - Metadata ([`Metadata`]) attached to a dataset, such as its errors,
//!   follows it through slicing, reshaping and transposition.
//! - [`maths`] has element-wise broadcasting arithmetic and [`utils`] has
//!   concatenation, tiling, repetition, selection and friends.
//! - [`lazy`] has datasets backed by a [`Loader`](lazy::Loader) or
//!   [`Saver`](lazy::Saver), and [`lazy_maths`] reduces them slice by slice.
//!
//! ## Crate Feature Flags
//!
//! The following crate feature flags are available. They are configured in
//! your `Cargo.toml`.
//!
//! - `serde`
//!   - Optional, compatible with Rust stable
//!   - Enables serialization support for serde 1.x
//! - `approx`
//!   - Optional, compatible with Rust stable
//!   - Enables implementations of traits from the [`approx`] crate.
//!
//! ## Example
//!
//! ```
//! use ndset::{s, Dataset};
//!
//! let a = Dataset::<f64>::range(12).reshape(&[3, 4]).unwrap().with_name("a");
//! let v = a.slice_view(&s![1.., ..;2]).unwrap();
//! assert_eq!(v.shape(), &[2, 2]);
//! assert_eq!(v.to_vec(), vec![4., 6., 8., 10.]);
//! assert_eq!(v.name(), "a[1:3:1, 0:4:2]");
//! ```

/// Index of an element along an axis, or the length of an axis.
pub type Ix = usize;
/// Signed index: an axis number or slice bound that may count from the end.
pub type Ixs = isize;

#[macro_use]
mod slice;

#[cfg(feature = "approx")]
mod array_approx;
#[cfg(feature = "serde")]
mod array_serde;
mod buffer;
mod dataset;
pub mod dimension;
mod element;
mod error;
mod impl_methods;
pub mod iterators;
mod layout;
pub mod lazy;
pub mod lazy_maths;
pub mod maths;
pub mod metadata;
mod numeric;
pub mod prelude;
pub mod utils;

#[cfg(feature = "serde")]
pub use crate::array_serde::DATASET_FORMAT_VERSION;
pub use crate::dataset::Dataset;
pub use crate::dimension::{broadcast_shapes, ReshapeMap};
pub use crate::element::Element;
pub use crate::error::{DatasetError, ErrorKind, Result};
pub use crate::layout::{Geometry, Layout};
pub use crate::lazy::{LazyDataset, LazySource, LazyWriteableDataset};
pub use crate::metadata::{AuxiliaryMetadata, AxesMetadata, ErrorMetadata, Metadata, StatisticsMetadata};
pub use crate::slice::{Slice, SliceND, UNLIMITED};
