// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Element-wise arithmetic between broadcast-compatible datasets.
//!
//! Arithmetic runs in `f64` when either operand is floating point and in
//! wrapping `i64` otherwise. [`divide`] and [`power`] into a floating point
//! output always run in `f64`. Integer division or remainder by zero is an
//! error.
//!
//! For compound operands a non-compound operand applies to every element of
//! the other's items; equal item sizes pair element by element.
//!
//! The in-place forms (`iadd`, ...) compute every result before writing, so a
//! failing operation leaves the destination untouched.
use log::debug;

use crate::buffer::with_capacity;
use crate::element::Element;
use crate::error::{bail, DatasetError, Result};
use crate::iterators::{BroadcastPairIter, PairIndex};
use crate::Dataset;

/// A binary element-wise operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Power,
}

impl BinaryOp {
    /// Runs in double precision whenever the output can hold a fraction.
    fn promotes(self) -> bool {
        matches!(self, BinaryOp::Divide | BinaryOp::Power)
    }

    #[inline]
    fn apply_f64(self, x: f64, y: f64) -> f64 {
        match self {
            BinaryOp::Add => x + y,
            BinaryOp::Subtract => x - y,
            BinaryOp::Multiply => x * y,
            BinaryOp::Divide => x / y,
            BinaryOp::Remainder => x % y,
            BinaryOp::Power => x.powf(y),
        }
    }

    #[inline]
    fn apply_i64(self, x: i64, y: i64) -> Result<i64> {
        Ok(match self {
            BinaryOp::Add => x.wrapping_add(y),
            BinaryOp::Subtract => x.wrapping_sub(y),
            BinaryOp::Multiply => x.wrapping_mul(y),
            BinaryOp::Divide | BinaryOp::Remainder if y == 0 => {
                bail!(DatasetError::DivideByZero)
            }
            BinaryOp::Divide => x.wrapping_div(y),
            BinaryOp::Remainder => x.wrapping_rem(y),
            BinaryOp::Power => {
                if y >= 0 {
                    x.wrapping_pow(y.min(u32::MAX as i64) as u32)
                } else {
                    (x as f64).powf(y as f64) as i64
                }
            }
        })
    }
}

/// Evaluate `op` at every broadcast position, returning output buffer
/// indices paired with results, in output order.
///
/// `a` and `b` must not share a buffer.
fn evaluate<O, A, B>(
    op: BinaryOp,
    a: &Dataset<A>,
    b: &Dataset<B>,
    mut it: BroadcastPairIter,
) -> Result<Vec<(usize, O)>>
where
    O: Element,
    A: Element,
    B: Element,
{
    it.set_output_double(op.promotes() && O::is_float());
    let double = it.is_output_double();
    let n = it.item_size();
    let (sa, sb) = (a.item_size() > 1, b.item_size() > 1);

    let mut out = Vec::with_capacity(it.len() * n);
    let da = a.read();
    let db = b.read();
    for PairIndex { a: ia, b: ib, o } in it {
        for j in 0..n {
            let x = da[ia + if sa { j } else { 0 }];
            let y = db[ib + if sb { j } else { 0 }];
            let v = if double {
                O::from_f64(op.apply_f64(x.to_f64(), y.to_f64()))
            } else {
                O::from_i64(op.apply_i64(x.to_i64(), y.to_i64())?)
            };
            out.push((o + j, v));
        }
    }
    Ok(out)
}

/// Apply `op` to `a` and `b`, returning a new dense dataset of their
/// broadcast shape.
pub fn binary<O, A, B>(op: BinaryOp, a: &Dataset<A>, b: &Dataset<B>) -> Result<Dataset<O>>
where
    O: Element,
    A: Element,
    B: Element,
{
    let copy;
    let b = if b.shares_buffer(a) {
        copy = b.clone();
        &copy
    } else {
        b
    };
    let it = BroadcastPairIter::new(a, b)?;
    let shape = it.shape().to_vec();
    let item_size = it.item_size();
    debug!("{:?} of {}{:?} and {}{:?}", op, a.name(), a.shape(), b.name(), b.shape());
    let values = evaluate::<O, A, B>(op, a, b, it)?;
    let mut data = with_capacity(&shape, item_size)?;
    data.extend(values.into_iter().map(|(_, v)| v));
    Dataset::from_compound_vec(item_size, &shape, data)
}

macro_rules! binary_fns {
    ($($(#[$meta:meta])* $name:ident => $op:ident),*) => {$(
        $(#[$meta])*
        pub fn $name<O, A, B>(a: &Dataset<A>, b: &Dataset<B>) -> Result<Dataset<O>>
        where
            O: Element,
            A: Element,
            B: Element,
        {
            binary(BinaryOp::$op, a, b)
        }
    )*}
}

binary_fns! {
    /// `a + b`
    add => Add,
    /// `a - b`
    subtract => Subtract,
    /// `a * b`
    multiply => Multiply,
    /// `a / b`; into an integer output with integer operands this is
    /// truncating division.
    divide => Divide,
    /// `a % b`, with the sign of `a`.
    remainder => Remainder,
    /// `a` raised to `b`.
    power => Power
}

/// # In-place arithmetic
///
/// `other` must broadcast to this dataset's shape and item size.
impl<A: Element> Dataset<A> {
    /// Apply `op` with `other` as the right operand, writing into `self`.
    pub fn apply_in_place<B: Element>(&mut self, op: BinaryOp, other: &Dataset<B>) -> Result<()> {
        let copy;
        let other = if other.shares_buffer(self) {
            copy = other.clone();
            &copy
        } else {
            other
        };
        let it = BroadcastPairIter::with_output(self, other, self)?;
        debug!("in-place {:?} of {}{:?} by {:?}", op, self.name, self.shape, other.shape());
        let values = evaluate::<A, A, B>(op, self, other, it)?;
        {
            let mut buf = self.buffer.write();
            for (i, v) in values {
                buf[i] = v;
            }
        }
        self.set_dirty();
        Ok(())
    }

    pub fn iadd<B: Element>(&mut self, other: &Dataset<B>) -> Result<()> {
        self.apply_in_place(BinaryOp::Add, other)
    }

    pub fn isubtract<B: Element>(&mut self, other: &Dataset<B>) -> Result<()> {
        self.apply_in_place(BinaryOp::Subtract, other)
    }

    pub fn imultiply<B: Element>(&mut self, other: &Dataset<B>) -> Result<()> {
        self.apply_in_place(BinaryOp::Multiply, other)
    }

    pub fn idivide<B: Element>(&mut self, other: &Dataset<B>) -> Result<()> {
        self.apply_in_place(BinaryOp::Divide, other)
    }

    pub fn iremainder<B: Element>(&mut self, other: &Dataset<B>) -> Result<()> {
        self.apply_in_place(BinaryOp::Remainder, other)
    }

    pub fn ipower<B: Element>(&mut self, other: &Dataset<B>) -> Result<()> {
        self.apply_in_place(BinaryOp::Power, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::s;

    #[test]
    fn broadcast_add() {
        let a = Dataset::from_vec(&[3, 1], vec![1, 2, 3]).unwrap();
        let b = Dataset::from_vec(&[2], vec![10., 20.]).unwrap();
        let c: Dataset<f64> = add(&a, &b).unwrap();
        assert_eq!(c.shape(), &[3, 2]);
        assert_eq!(c.to_vec(), vec![11., 21., 12., 22., 13., 23.]);
    }

    #[test]
    fn integer_and_double_modes() {
        let a = Dataset::from_vec(&[3], vec![7, -7, 1]).unwrap();
        let b = Dataset::from_vec(&[3], vec![2, 2, 4]).unwrap();
        let q: Dataset<i32> = divide(&a, &b).unwrap();
        assert_eq!(q.to_vec(), vec![3, -3, 0]);
        let q: Dataset<f64> = divide(&a, &b).unwrap();
        assert_eq!(q.to_vec(), vec![3.5, -3.5, 0.25]);
        let r: Dataset<i64> = remainder(&a, &b).unwrap();
        assert_eq!(r.to_vec(), vec![1, -1, 1]);
        let p: Dataset<i64> = power(&a, &b).unwrap();
        assert_eq!(p.to_vec(), vec![49, 49, 1]);
        let m: Dataset<u8> = multiply(&a, &b).unwrap();
        assert_eq!(m.to_vec(), vec![14, 242, 4]);
    }

    #[test]
    fn integer_divide_by_zero() {
        let a = Dataset::from_vec(&[2], vec![1, 2]).unwrap();
        let z = Dataset::from_vec(&[2], vec![1, 0]).unwrap();
        let e = divide::<i32, _, _>(&a, &z).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::DivideByZero);
        let f: Dataset<f64> = divide(&a, &z).unwrap();
        assert!(f.to_vec()[1].is_infinite());
    }

    #[test]
    fn failed_in_place_leaves_data_alone() {
        let mut a = Dataset::from_vec(&[4], vec![8, 6, 4, 2]).unwrap();
        let b = Dataset::from_vec(&[4], vec![2, 2, 0, 2]).unwrap();
        assert_eq!(a.idivide(&b).unwrap_err().kind(), ErrorKind::DivideByZero);
        assert_eq!(a.to_vec(), vec![8, 6, 4, 2]);
        let wide = Dataset::from_vec(&[2, 4], vec![1; 8]).unwrap();
        assert_eq!(a.iadd(&wide).unwrap_err().kind(), ErrorKind::IncompatibleShapes);
    }

    #[test]
    fn in_place_with_broadcast_and_views() {
        let base = Dataset::<f64>::range(6).reshape(&[2, 3]).unwrap();
        let mut v = base.slice_view(&s![.., 1..]).unwrap();
        v.imultiply(&Dataset::from_vec(&[2, 1], vec![10, 100]).unwrap()).unwrap();
        assert_eq!(base.to_vec(), vec![0., 10., 20., 3., 400., 500.]);

        let mut a = Dataset::from_vec(&[3], vec![1, 2, 3]).unwrap();
        let rev = a.flip(0).unwrap();
        a.iadd(&rev).unwrap();
        assert_eq!(a.to_vec(), vec![4, 4, 4]);
        a.ipower(&Dataset::from_vec(&[], vec![0.5]).unwrap()).unwrap();
        assert_eq!(a.to_vec(), vec![2, 2, 2]);
    }

    #[test]
    fn compound_operands() {
        let a = Dataset::from_compound_vec(2, &[2], vec![1., 2., 3., 4.]).unwrap();
        let s = Dataset::from_vec(&[2], vec![10., 100.]).unwrap();
        let c: Dataset<f64> = multiply(&a, &s).unwrap();
        assert_eq!(c.item_size(), 2);
        assert_eq!(c.to_vec(), vec![10., 20., 300., 400.]);
        let d: Dataset<f64> = subtract(&a, &a).unwrap();
        assert_eq!(d.to_vec(), vec![0.; 4]);
        let three = Dataset::<f64>::zeros_compound(3, &[2]).unwrap();
        assert_eq!(
            add::<f64, _, _>(&a, &three).unwrap_err().kind(),
            ErrorKind::IncompatibleItemSize
        );
    }
}
