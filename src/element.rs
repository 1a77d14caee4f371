// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Scalar element kinds.
use std::fmt;

use num_complex::Complex64;
use num_traits::AsPrimitive;

/// A scalar kind that a dataset can hold.
///
/// Arithmetic runs in `f64` when any operand is floating point and in `i64`
/// otherwise, so every element converts to and from both.
pub trait Element: Copy + Default + PartialEq + PartialOrd + fmt::Debug + Send + Sync + 'static {
    /// Whether arithmetic on this kind promotes to double precision.
    fn is_float() -> bool;
    fn to_f64(self) -> f64;
    fn to_i64(self) -> i64;
    fn from_f64(v: f64) -> Self;
    fn from_i64(v: i64) -> Self;

    #[inline]
    fn zero() -> Self {
        Self::default()
    }
}

macro_rules! impl_element {
    ($float:expr; $($t:ty),*) => {$(
        impl Element for $t {
            #[inline]
            fn is_float() -> bool { $float }
            #[inline]
            fn to_f64(self) -> f64 { AsPrimitive::<f64>::as_(self) }
            #[inline]
            fn to_i64(self) -> i64 { AsPrimitive::<i64>::as_(self) }
            #[inline]
            fn from_f64(v: f64) -> Self { AsPrimitive::<$t>::as_(v) }
            #[inline]
            fn from_i64(v: i64) -> Self { AsPrimitive::<$t>::as_(v) }
        }
    )*}
}

impl_element!(false; i8, i16, i32, i64, u8, u16, u32, u64);
impl_element!(true; f32, f64);

impl Element for bool {
    fn is_float() -> bool {
        false
    }
    fn to_f64(self) -> f64 {
        if self { 1. } else { 0. }
    }
    fn to_i64(self) -> i64 {
        self as i64
    }
    fn from_f64(v: f64) -> Self {
        v != 0.
    }
    fn from_i64(v: i64) -> Self {
        v != 0
    }
}

/// Convert between kinds through `f64` for floats and `i64` otherwise.
#[inline]
pub fn cast<A: Element, B: Element>(v: B) -> A {
    if B::is_float() {
        A::from_f64(v.to_f64())
    } else {
        A::from_i64(v.to_i64())
    }
}

/// Real and imaginary parts as a compound item of size 2.
#[inline]
pub fn complex_to_item(z: Complex64) -> [f64; 2] {
    [z.re, z.im]
}

#[inline]
pub fn complex_from_item(item: &[f64]) -> Complex64 {
    Complex64::new(item[0], item.get(1).copied().unwrap_or(0.))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert!(f32::is_float());
        assert!(!i16::is_float());
        assert_eq!(i8::from_i64(300), 44);
        assert_eq!(u8::from_f64(-3.), 0);
        assert_eq!(i32::from_f64(2.9), 2);
        assert_eq!(bool::from_i64(4), true);
        assert_eq!(true.to_f64(), 1.);
        assert_eq!(u64::zero(), 0);
    }

    #[test]
    fn complex_items() {
        let z = Complex64::new(1.5, -2.);
        assert_eq!(complex_from_item(&complex_to_item(z)), z);
    }
}
