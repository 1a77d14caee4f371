// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use crate::dimension::normalize_axis;
use crate::element::Element;
use crate::error::Result;
use crate::{Dataset, Ixs};

/// Numerical methods for datasets.
///
/// Results are `f64`. Compound items reduce element by element, so the
/// axis reductions keep the item size.
impl<A: Element> Dataset<A> {
    /// Return the sum of all elements.
    ///
    /// ```
    /// use ndset::Dataset;
    ///
    /// let a = Dataset::from_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
    /// assert_eq!(a.sum(), 10.);
    /// ```
    pub fn sum(&self) -> f64 {
        self.to_vec().into_iter().map(Element::to_f64).sum()
    }

    pub fn product(&self) -> f64 {
        self.to_vec().into_iter().map(Element::to_f64).product()
    }

    /// Largest element, ignoring NaNs; `None` when there is none.
    pub fn max(&self) -> Option<f64> {
        self.to_vec()
            .into_iter()
            .map(Element::to_f64)
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }

    /// Smallest element, ignoring NaNs; `None` when there is none.
    pub fn min(&self) -> Option<f64> {
        self.to_vec()
            .into_iter()
            .map(Element::to_f64)
            .filter(|v| !v.is_nan())
            .reduce(f64::min)
    }

    /// Mean of all elements; NaN when empty.
    pub fn mean(&self) -> f64 {
        self.sum() / (self.size() * self.item_size) as f64
    }

    /// Fold the elements along `axis` with `f`, starting from `init`.
    ///
    /// The result has `axis` removed.
    pub fn fold_axis<F>(&self, axis: Ixs, init: f64, mut f: F) -> Result<Dataset<f64>>
    where
        F: FnMut(f64, f64) -> f64,
    {
        let rank = self.rank();
        let ax = normalize_axis(axis, rank)?;
        let n = self.shape[ax];
        let is = self.item_size;
        let mut shape = self.shape.clone();
        shape.remove(ax);

        // with `axis` last, each output item's inputs are consecutive
        let moved = self.roll_axis(ax as Ixs, rank as Ixs)?;
        let data = moved.to_vec();
        let mut out = Vec::with_capacity(crate::dimension::size(&shape) * is);
        if n == 0 {
            out.resize(crate::dimension::size(&shape) * is, init);
        } else {
            for run in data.chunks(n * is) {
                for j in 0..is {
                    let acc = run.iter().skip(j).step_by(is).fold(init, |acc, &v| f(acc, v.to_f64()));
                    out.push(acc);
                }
            }
        }
        let mut d = Dataset::from_compound_vec(is, &shape, out)?;
        d.name = self.name.clone();
        Ok(d)
    }

    /// Return sum along `axis`.
    ///
    /// ```
    /// use ndset::Dataset;
    ///
    /// let a = Dataset::from_vec(&[2, 2], vec![1., 2., 3., 4.]).unwrap();
    /// assert_eq!(a.sum_axis(0).unwrap().to_vec(), vec![4., 6.]);
    /// assert_eq!(a.sum_axis(-1).unwrap().to_vec(), vec![3., 7.]);
    /// ```
    pub fn sum_axis(&self, axis: Ixs) -> Result<Dataset<f64>> {
        self.fold_axis(axis, 0., |a, b| a + b)
    }

    pub fn product_axis(&self, axis: Ixs) -> Result<Dataset<f64>> {
        self.fold_axis(axis, 1., |a, b| a * b)
    }

    /// Maximum along `axis`, ignoring NaNs.
    pub fn max_axis(&self, axis: Ixs) -> Result<Dataset<f64>> {
        self.fold_axis(axis, f64::NEG_INFINITY, f64::max)
    }

    /// Minimum along `axis`, ignoring NaNs.
    pub fn min_axis(&self, axis: Ixs) -> Result<Dataset<f64>> {
        self.fold_axis(axis, f64::INFINITY, f64::min)
    }

    /// Return mean along `axis`.
    pub fn mean_axis(&self, axis: Ixs) -> Result<Dataset<f64>> {
        let n = self.shape[normalize_axis(axis, self.rank())?] as f64;
        self.fold_axis(axis, 0., |a, b| a + b / n)
    }
}
