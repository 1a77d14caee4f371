// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! ndset prelude.
//!
//! This module contains the most used types, traits and macros that you can
//! import easily as a group.
//!
//! ```
//! use ndset::prelude::*;
//!
//! let d = Dataset::<f64>::zeros(&[2, 3]).unwrap();
//! assert_eq!(d.slice(&s![.., 1]).unwrap().shape(), &[2, 1]);
//! ```

#[doc(no_inline)]
pub use crate::{Dataset, Element, Ix, Ixs, Slice, SliceND, UNLIMITED};

#[doc(no_inline)]
pub use crate::{DatasetError, ErrorKind};

#[doc(no_inline)]
pub use crate::lazy::{LazyDataset, LazySource, LazyWriteableDataset, Loader, Saver};

#[doc(no_inline)]
pub use crate::metadata::{ErrorMetadata, Metadata};

pub use crate::s;
