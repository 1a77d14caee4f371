// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use approx::{AbsDiffEq, RelativeEq, UlpsEq};

use crate::element::Element;
use crate::Dataset;

impl<A> Dataset<A>
where
    A: Element,
{
    /// A test for equality that uses the elementwise absolute difference to
    /// compute the approximate equality of two datasets.
    ///
    /// **Requires crate feature `"approx"`**
    pub fn abs_diff_eq(&self, other: &Dataset<A>, epsilon: A::Epsilon) -> bool
    where
        A: AbsDiffEq,
        A::Epsilon: Clone,
    {
        <Self as AbsDiffEq>::abs_diff_eq(self, other, epsilon)
    }

    /// A test for equality that uses an elementwise relative comparison if
    /// the values are far apart; and the absolute difference otherwise.
    ///
    /// **Requires crate feature `"approx"`**
    pub fn relative_eq(&self, other: &Dataset<A>, epsilon: A::Epsilon, max_relative: A::Epsilon) -> bool
    where
        A: RelativeEq,
        A::Epsilon: Clone,
    {
        <Self as RelativeEq>::relative_eq(self, other, epsilon, max_relative)
    }
}

/// Elements of both datasets, in logical order, when shape and item size
/// agree.
fn paired<A: Element>(a: &Dataset<A>, b: &Dataset<A>) -> Option<Vec<(A, A)>> {
    if a.shape() != b.shape() || a.item_size() != b.item_size() {
        return None;
    }
    Some(a.to_vec().into_iter().zip(b.to_vec()).collect())
}

/// **Requires crate feature `"approx"`**
impl<A> AbsDiffEq for Dataset<A>
where
    A: Element + AbsDiffEq,
    A::Epsilon: Clone,
{
    type Epsilon = A::Epsilon;

    fn default_epsilon() -> A::Epsilon {
        A::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Dataset<A>, epsilon: A::Epsilon) -> bool {
        match paired(self, other) {
            Some(p) => p.iter().all(|(a, b)| A::abs_diff_eq(a, b, epsilon.clone())),
            None => false,
        }
    }
}

/// **Requires crate feature `"approx"`**
impl<A> RelativeEq for Dataset<A>
where
    A: Element + RelativeEq,
    A::Epsilon: Clone,
{
    fn default_max_relative() -> A::Epsilon {
        A::default_max_relative()
    }

    fn relative_eq(&self, other: &Dataset<A>, epsilon: A::Epsilon, max_relative: A::Epsilon) -> bool {
        match paired(self, other) {
            Some(p) => p
                .iter()
                .all(|(a, b)| A::relative_eq(a, b, epsilon.clone(), max_relative.clone())),
            None => false,
        }
    }
}

/// **Requires crate feature `"approx"`**
impl<A> UlpsEq for Dataset<A>
where
    A: Element + UlpsEq,
    A::Epsilon: Clone,
{
    fn default_max_ulps() -> u32 {
        A::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Dataset<A>, epsilon: A::Epsilon, max_ulps: u32) -> bool {
        match paired(self, other) {
            Some(p) => p
                .iter()
                .all(|(a, b)| A::ulps_eq(a, b, epsilon.clone(), max_ulps)),
            None => false,
        }
    }
}
